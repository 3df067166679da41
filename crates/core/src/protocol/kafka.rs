use super::{channel_with_fields, decode_bindings, BindingsOutput, ProtocolBuilder};
use crate::context::CompileContext;
use crate::document::ChannelDecl;
use crate::error::CompileError;
use crate::model::Renderer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

const PROTOCOL: &str = "kafka";

pub struct KafkaBuilder;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ServerBindings {
    schema_registry_url: Option<String>,
    schema_registry_vendor: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ChannelBindings {
    topic: Option<String>,
    partitions: Option<u32>,
    replicas: Option<u32>,
    topic_configuration: Option<TopicConfiguration>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct TopicConfiguration {
    #[serde(rename = "cleanup.policy")]
    cleanup_policy: Vec<String>,
    #[serde(rename = "retention.ms")]
    retention_ms: Option<i64>,
    #[serde(rename = "retention.bytes")]
    retention_bytes: Option<i64>,
    #[serde(rename = "delete.retention.ms")]
    delete_retention_ms: Option<i64>,
    #[serde(rename = "max.message.bytes")]
    max_message_bytes: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OperationBindings {
    #[serde(skip_serializing)]
    group_id: Option<Value>,
    #[serde(skip_serializing)]
    client_id: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MessageBindings {
    #[serde(skip_serializing)]
    key: Option<Value>,
    schema_id_location: Option<String>,
    schema_id_payload_encoding: Option<String>,
    schema_lookup_strategy: Option<String>,
}

impl ProtocolBuilder for KafkaBuilder {
    fn protocol_name(&self) -> &'static str {
        PROTOCOL
    }

    fn protocol_title(&self) -> &'static str {
        "Apache Kafka"
    }

    fn build_channel(
        &self,
        ctx: &CompileContext<'_>,
        decl: &ChannelDecl,
        channel_name: &str,
    ) -> Result<Rc<dyn Renderer>, CompileError> {
        Ok(channel_with_fields(
            self,
            ctx,
            decl,
            channel_name,
            &[("topic", "string")],
        ))
    }

    fn build_server_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<ServerBindings>(ctx, PROTOCOL, raw, "kafka.ServerBindings", &[])
    }

    fn build_channel_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<ChannelBindings>(ctx, PROTOCOL, raw, "kafka.ChannelBindings", &[])
    }

    fn build_operation_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<OperationBindings>(
            ctx,
            PROTOCOL,
            raw,
            "kafka.OperationBindings",
            &["groupId", "clientId"],
        )
    }

    fn build_message_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<MessageBindings>(ctx, PROTOCOL, raw, "kafka.MessageBindings", &["key"])
    }
}
