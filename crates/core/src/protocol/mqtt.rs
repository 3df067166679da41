use super::{channel_with_fields, decode_bindings, BindingsOutput, ProtocolBuilder};
use crate::context::CompileContext;
use crate::document::ChannelDecl;
use crate::error::CompileError;
use crate::model::Renderer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

const PROTOCOL: &str = "mqtt";

pub struct MqttBuilder;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ServerBindings {
    client_id: Option<String>,
    clean_session: Option<bool>,
    last_will: Option<LastWill>,
    keep_alive: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct LastWill {
    topic: Option<String>,
    qos: Option<u8>,
    message: Option<String>,
    retain: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct OperationBindings {
    qos: u8,
    retain: bool,
}

impl ProtocolBuilder for MqttBuilder {
    fn protocol_name(&self) -> &'static str {
        PROTOCOL
    }

    fn protocol_title(&self) -> &'static str {
        "MQTT"
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
        decode_bindings::<ServerBindings>(ctx, PROTOCOL, raw, "mqtt.ServerBindings", &[])
    }

    fn build_operation_bindings(
        &self,
        ctx: &CompileContext<'_>,
        raw: &Value,
    ) -> Result<BindingsOutput, CompileError> {
        let out =
            decode_bindings::<OperationBindings>(ctx, PROTOCOL, raw, "mqtt.OperationBindings", &[])?;
        if let Some(qos) = raw.get("qos").and_then(Value::as_u64) {
            if qos > 2 {
                return Err(CompileError::binding(
                    ctx.here(),
                    PROTOCOL,
                    format!("qos must be 0, 1 or 2, got {qos}"),
                ));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::with_ctx;
    use serde_json::json;

    #[test]
    fn operation_bindings_default_missing_fields() {
        let out = with_ctx(|ctx| MqttBuilder.build_operation_bindings(ctx, &json!({ "qos": 1 })))
            .unwrap();
        let value = out.value.unwrap();
        assert_eq!(value["qos"], 1);
        assert_eq!(value["retain"], false);
    }

    #[test]
    fn qos_out_of_range() {
        let err = with_ctx(|ctx| MqttBuilder.build_operation_bindings(ctx, &json!({ "qos": 3 })))
            .unwrap_err();
        assert!(err.to_string().contains("qos must be"));
    }
}
