//! Protocol builders: per-protocol plugins that contribute fields and types
//! to the generic Server, Channel and Bindings entities.
//!
//! A builder is selected by the protocol string of a server or by the key of
//! a bindings container. Builders know nothing about each other; a protocol
//! without a builder is skipped with a warning by the caller.

pub mod amqp;
pub mod http;
pub mod ip;
pub mod kafka;
pub mod mqtt;
pub mod redis;
pub mod ws;

use crate::context::CompileContext;
use crate::document::{ChannelDecl, ServerDecl};
use crate::error::CompileError;
use crate::model::{ProtoChannel, ProtoField, ProtoServer, Renderer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::rc::Rc;

// ──────────────────────────────────────────────
// BindingsOutput
// ──────────────────────────────────────────────

/// What a bindings hook returns for one protocol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingsOutput {
    /// Typed value object embedded in the generated output.
    pub value: Option<Value>,
    /// Field name -> raw schema fragment, for fields whose shape is
    /// re-exposed as user schema instead of being part of `value`.
    pub schema_fields: Map<String, Value>,
}

impl BindingsOutput {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.schema_fields.is_empty()
    }
}

// ──────────────────────────────────────────────
// ProtocolBuilder trait
// ──────────────────────────────────────────────

/// The hook set every protocol plugin exposes.
///
/// Every hook has a default: the base protocol server/channel with no extra
/// fields, and no binding values. A builder overrides only what its protocol
/// adds.
pub trait ProtocolBuilder {
    /// Discriminator used in documents, e.g. `"kafka"`.
    fn protocol_name(&self) -> &'static str;

    /// Human-readable name, e.g. `"Apache Kafka"`.
    fn protocol_title(&self) -> &'static str;

    fn build_server(
        &self,
        ctx: &CompileContext<'_>,
        decl: &ServerDecl,
        server_name: &str,
    ) -> Result<Rc<dyn Renderer>, CompileError> {
        Ok(Rc::new(self.base_server(ctx, decl, server_name)))
    }

    fn build_channel(
        &self,
        ctx: &CompileContext<'_>,
        decl: &ChannelDecl,
        channel_name: &str,
    ) -> Result<Rc<dyn Renderer>, CompileError> {
        Ok(Rc::new(self.base_channel(ctx, decl, channel_name)))
    }

    fn build_server_bindings(
        &self,
        _ctx: &CompileContext<'_>,
        _raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        Ok(BindingsOutput::default())
    }

    fn build_channel_bindings(
        &self,
        _ctx: &CompileContext<'_>,
        _raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        Ok(BindingsOutput::default())
    }

    fn build_operation_bindings(
        &self,
        _ctx: &CompileContext<'_>,
        _raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        Ok(BindingsOutput::default())
    }

    fn build_message_bindings(
        &self,
        _ctx: &CompileContext<'_>,
        _raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        Ok(BindingsOutput::default())
    }

    fn base_server(&self, ctx: &CompileContext<'_>, decl: &ServerDecl, server_name: &str) -> ProtoServer {
        ProtoServer {
            id: format!("{}/{}", ctx.here(), self.protocol_name()),
            protocol: self.protocol_name().to_owned(),
            protocol_title: self.protocol_title().to_owned(),
            server_name: server_name.to_owned(),
            url: decl.url.clone(),
            protocol_version: decl.protocol_version.clone(),
            fields: Vec::new(),
        }
    }

    fn base_channel(&self, ctx: &CompileContext<'_>, _decl: &ChannelDecl, channel_name: &str) -> ProtoChannel {
        ProtoChannel {
            id: format!("{}/{}", ctx.here(), self.protocol_name()),
            protocol: self.protocol_name().to_owned(),
            protocol_title: self.protocol_title().to_owned(),
            channel_name: channel_name.to_owned(),
            fields: Vec::new(),
        }
    }
}

/// Channel contribution with extra string fields, shared by the builders
/// that only add addressing fields (topic, queue, channel name).
pub(crate) fn channel_with_fields<B: ProtocolBuilder + ?Sized>(
    builder: &B,
    ctx: &CompileContext<'_>,
    decl: &ChannelDecl,
    channel_name: &str,
    fields: &[(&str, &str)],
) -> Rc<dyn Renderer> {
    let mut channel = builder.base_channel(ctx, decl, channel_name);
    channel
        .fields
        .extend(fields.iter().map(|(name, ty)| ProtoField::new(*name, *ty)));
    Rc::new(channel)
}

/// Decode a raw binding payload into `T` and split it into the typed value
/// (tagged with `type_name`) and the schema-bearing fields named in
/// `schema_fields`. Those fields must be `#[serde(skip_serializing)]` on `T`.
pub(crate) fn decode_bindings<T>(
    ctx: &CompileContext<'_>,
    protocol: &str,
    raw: &Value,
    type_name: &str,
    schema_fields: &[&str],
) -> Result<BindingsOutput, CompileError>
where
    T: DeserializeOwned + Serialize,
{
    let typed: T = serde_json::from_value(raw.clone())
        .map_err(|e| CompileError::binding(ctx.here(), protocol, e.to_string()))?;
    let mut value = serde_json::to_value(&typed)
        .map_err(|e| CompileError::binding(ctx.here(), protocol, e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.insert("$type".to_owned(), Value::String(type_name.to_owned()));
    }

    let mut schemas = Map::new();
    for field in schema_fields {
        if let Some(fragment) = raw.get(*field).filter(|v| !v.is_null()) {
            schemas.insert((*field).to_owned(), fragment.clone());
        }
    }

    Ok(BindingsOutput {
        value: Some(value),
        schema_fields: schemas,
    })
}

// ──────────────────────────────────────────────
// ProtocolRegistry
// ──────────────────────────────────────────────

/// Maps a protocol name to its builder.
pub struct ProtocolRegistry {
    builders: BTreeMap<String, Box<dyn ProtocolBuilder>>,
}

impl ProtocolRegistry {
    /// An empty registry: every protocol is unsupported.
    pub fn new() -> Self {
        ProtocolRegistry {
            builders: BTreeMap::new(),
        }
    }

    /// Registry with every builder this crate ships.
    pub fn with_default_builders() -> Self {
        let mut registry = ProtocolRegistry::new();
        registry.register(Box::new(amqp::AmqpBuilder));
        registry.register(Box::new(http::HttpBuilder));
        registry.register(Box::new(kafka::KafkaBuilder));
        registry.register(Box::new(mqtt::MqttBuilder));
        registry.register(Box::new(redis::RedisBuilder));
        registry.register(Box::new(ip::IpBuilder::tcp()));
        registry.register(Box::new(ip::IpBuilder::udp()));
        registry.register(Box::new(ws::WsBuilder));
        registry
    }

    /// Add or replace the builder for `builder.protocol_name()`.
    pub fn register(&mut self, builder: Box<dyn ProtocolBuilder>) {
        self.builders
            .insert(builder.protocol_name().to_owned(), builder);
    }

    pub fn get(&self, protocol: &str) -> Option<&dyn ProtocolBuilder> {
        self.builders.get(protocol).map(|b| b.as_ref())
    }

    /// (name, title) of every registered builder, sorted by name.
    pub fn names(&self) -> Vec<(&'static str, &'static str)> {
        self.builders
            .values()
            .map(|b| (b.protocol_name(), b.protocol_title()))
            .collect()
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        ProtocolRegistry::with_default_builders()
    }
}
