//! The typed document tree consumed by the compiler.
//!
//! Every map keeps document order (`IndexMap`), which is the order objects
//! are registered in and therefore the order list promises resolve in.
//! Unknown keys are ignored so documents carrying fields the compiler has no
//! use for (tags, security, external docs) still decode.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    pub asyncapi: Option<String>,
    pub info: Option<Info>,
    pub default_content_type: Option<String>,
    pub servers: IndexMap<String, ServerDecl>,
    pub channels: IndexMap<String, ChannelDecl>,
    pub components: Option<Components>,
}

impl Document {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Components {
    pub servers: IndexMap<String, ServerDecl>,
    pub channels: IndexMap<String, ChannelDecl>,
    pub messages: IndexMap<String, MessageDecl>,
    pub schemas: IndexMap<String, SchemaDecl>,
    pub parameters: IndexMap<String, ParameterDecl>,
    pub correlation_ids: IndexMap<String, CorrelationIdDecl>,
    pub server_variables: IndexMap<String, ServerVariableDecl>,
    pub server_bindings: IndexMap<String, BindingsDecl>,
    pub channel_bindings: IndexMap<String, BindingsDecl>,
    pub operation_bindings: IndexMap<String, BindingsDecl>,
    pub message_bindings: IndexMap<String, BindingsDecl>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerDecl {
    pub url: String,
    pub protocol: String,
    pub protocol_version: Option<String>,
    pub description: Option<String>,
    pub variables: IndexMap<String, ServerVariableDecl>,
    pub bindings: Option<BindingsDecl>,
    #[serde(rename = "x-name")]
    pub x_name: Option<String>,
    #[serde(rename = "x-ignore")]
    pub x_ignore: bool,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerVariableDecl {
    #[serde(rename = "enum")]
    pub enum_values: Vec<String>,
    pub default: Option<String>,
    pub description: Option<String>,
    pub examples: Vec<String>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelDecl {
    pub description: Option<String>,
    pub servers: Vec<String>,
    pub parameters: IndexMap<String, ParameterDecl>,
    pub bindings: Option<BindingsDecl>,
    pub publish: Option<OperationDecl>,
    pub subscribe: Option<OperationDecl>,
    #[serde(rename = "x-name")]
    pub x_name: Option<String>,
    #[serde(rename = "x-ignore")]
    pub x_ignore: bool,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationDecl {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub message: Option<MessageDecl>,
    pub bindings: Option<BindingsDecl>,
    #[serde(rename = "x-ignore")]
    pub x_ignore: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageDecl {
    pub name: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub headers: Option<SchemaDecl>,
    pub payload: Option<SchemaDecl>,
    pub correlation_id: Option<CorrelationIdDecl>,
    pub bindings: Option<BindingsDecl>,
    #[serde(rename = "x-name")]
    pub x_name: Option<String>,
    #[serde(rename = "x-ignore")]
    pub x_ignore: bool,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaDecl {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub properties: IndexMap<String, SchemaDecl>,
    pub required: Vec<String>,
    pub items: Option<Box<SchemaDecl>>,
    #[serde(rename = "enum")]
    pub enum_values: Vec<Value>,
    #[serde(rename = "x-name")]
    pub x_name: Option<String>,
    #[serde(rename = "x-ignore")]
    pub x_ignore: bool,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParameterDecl {
    pub description: Option<String>,
    pub schema: Option<SchemaDecl>,
    pub location: Option<String>,
    #[serde(rename = "x-name")]
    pub x_name: Option<String>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorrelationIdDecl {
    pub description: Option<String>,
    pub location: String,
    #[serde(rename = "x-ignore")]
    pub x_ignore: bool,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

/// A bindings container: protocol name -> raw payload, handed opaquely to
/// the protocol builder. The `$ref` key is split off while decoding so it
/// never reaches a builder as a protocol named `$ref`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "IndexMap<String, Value>")]
pub struct BindingsDecl {
    pub reference: Option<String>,
    pub protocols: IndexMap<String, Value>,
}

impl TryFrom<IndexMap<String, Value>> for BindingsDecl {
    type Error = String;

    fn try_from(mut protocols: IndexMap<String, Value>) -> Result<Self, String> {
        let reference = match protocols.shift_remove("$ref") {
            None => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => return Err(format!("bindings $ref must be a string, got {}", other)),
        };
        Ok(BindingsDecl {
            reference,
            protocols,
        })
    }
}
