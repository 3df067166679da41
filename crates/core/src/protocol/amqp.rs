use super::{channel_with_fields, decode_bindings, BindingsOutput, ProtocolBuilder};
use crate::context::CompileContext;
use crate::document::ChannelDecl;
use crate::error::CompileError;
use crate::model::Renderer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

const PROTOCOL: &str = "amqp";

pub struct AmqpBuilder;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ChannelBindings {
    /// `routingKey` or `queue`.
    is: Option<String>,
    exchange: Option<Exchange>,
    queue: Option<Queue>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Exchange {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    durable: Option<bool>,
    auto_delete: Option<bool>,
    vhost: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Queue {
    name: Option<String>,
    durable: Option<bool>,
    exclusive: Option<bool>,
    auto_delete: Option<bool>,
    vhost: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OperationBindings {
    expiration: Option<u64>,
    user_id: Option<String>,
    cc: Vec<String>,
    priority: Option<u8>,
    delivery_mode: Option<u8>,
    mandatory: Option<bool>,
    bcc: Vec<String>,
    reply_to: Option<String>,
    timestamp: Option<bool>,
    ack: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MessageBindings {
    content_encoding: Option<String>,
    message_type: Option<String>,
}

impl ProtocolBuilder for AmqpBuilder {
    fn protocol_name(&self) -> &'static str {
        PROTOCOL
    }

    fn protocol_title(&self) -> &'static str {
        "AMQP"
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
            &[("exchange", "string"), ("queue", "string")],
        ))
    }

    fn build_channel_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<ChannelBindings>(ctx, PROTOCOL, raw, "amqp.ChannelBindings", &[])
    }

    fn build_operation_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<OperationBindings>(ctx, PROTOCOL, raw, "amqp.OperationBindings", &[])
    }

    fn build_message_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<MessageBindings>(ctx, PROTOCOL, raw, "amqp.MessageBindings", &[])
    }
}
