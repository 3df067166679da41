use super::{decode_bindings, BindingsOutput, ProtocolBuilder};
use crate::context::CompileContext;
use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PROTOCOL: &str = "ws";

pub struct WsBuilder;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ChannelBindings {
    method: Option<String>,
    #[serde(skip_serializing)]
    query: Option<Value>,
    #[serde(skip_serializing)]
    headers: Option<Value>,
}

impl ProtocolBuilder for WsBuilder {
    fn protocol_name(&self) -> &'static str {
        PROTOCOL
    }

    fn protocol_title(&self) -> &'static str {
        "WebSocket"
    }

    fn build_channel_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<ChannelBindings>(
            ctx,
            PROTOCOL,
            raw,
            "ws.ChannelBindings",
            &["query", "headers"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::with_ctx;
    use serde_json::json;

    #[test]
    fn query_and_headers_become_schemas() {
        let out = with_ctx(|ctx| {
            WsBuilder.build_channel_bindings(
                ctx,
                &json!({ "method": "GET", "headers": { "type": "object" } }),
            )
        })
        .unwrap();
        assert_eq!(out.value.unwrap()["method"], "GET");
        assert_eq!(out.schema_fields.keys().collect::<Vec<_>>(), ["headers"]);
    }
}
