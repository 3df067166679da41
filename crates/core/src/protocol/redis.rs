use super::{channel_with_fields, decode_bindings, BindingsOutput, ProtocolBuilder};
use crate::context::CompileContext;
use crate::document::ChannelDecl;
use crate::error::CompileError;
use crate::model::Renderer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

const PROTOCOL: &str = "redis";

pub struct RedisBuilder;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ChannelBindings {
    channel: Option<String>,
    /// `subscribe` (pub/sub) or `stream`.
    publish_mode: Option<String>,
}

impl ProtocolBuilder for RedisBuilder {
    fn protocol_name(&self) -> &'static str {
        PROTOCOL
    }

    fn protocol_title(&self) -> &'static str {
        "Redis"
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
            &[("channel", "string")],
        ))
    }

    fn build_channel_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<ChannelBindings>(ctx, PROTOCOL, raw, "redis.ChannelBindings", &[])
    }
}
