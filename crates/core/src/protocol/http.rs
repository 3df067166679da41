use super::{decode_bindings, BindingsOutput, ProtocolBuilder};
use crate::context::CompileContext;
use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PROTOCOL: &str = "http";

pub struct HttpBuilder;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct OperationBindings {
    #[serde(rename = "type")]
    kind: Option<String>,
    method: Option<String>,
    #[serde(skip_serializing)]
    query: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct MessageBindings {
    #[serde(skip_serializing)]
    headers: Option<Value>,
}

impl ProtocolBuilder for HttpBuilder {
    fn protocol_name(&self) -> &'static str {
        PROTOCOL
    }

    fn protocol_title(&self) -> &'static str {
        "HTTP"
    }

    fn build_operation_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        let out = decode_bindings::<OperationBindings>(
            ctx,
            PROTOCOL,
            raw,
            "http.OperationBindings",
            &["query"],
        )?;
        if let Some(method) = raw.get("method").and_then(Value::as_str) {
            if !method.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(CompileError::binding(
                    ctx.here(),
                    PROTOCOL,
                    format!("method '{method}' must be an upper-case HTTP verb"),
                ));
            }
        }
        Ok(out)
    }

    fn build_message_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        decode_bindings::<MessageBindings>(ctx, PROTOCOL, raw, "http.MessageBindings", &["headers"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::with_ctx;
    use serde_json::json;

    #[test]
    fn query_schema_is_split_off() {
        let out = with_ctx(|ctx| {
            HttpBuilder.build_operation_bindings(
                ctx,
                &json!({ "type": "request", "method": "GET", "query": { "type": "object" } }),
            )
        })
        .unwrap();
        let value = out.value.unwrap();
        assert_eq!(value["method"], "GET");
        assert!(value.get("query").is_none());
        assert_eq!(out.schema_fields["query"], json!({ "type": "object" }));
    }

    #[test]
    fn lower_case_method_is_rejected() {
        let err = with_ctx(|ctx| {
            HttpBuilder.build_operation_bindings(ctx, &json!({ "method": "get" }))
        })
        .unwrap_err();
        assert_eq!(err.protocol(), Some("http"));
    }
}
