use crate::error::RuntimeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Header name -> header value.
pub type Headers = BTreeMap<String, Value>;

/// Read side of an envelope, handed to subscriber callbacks.
pub trait EnvelopeReader {
    fn payload(&self) -> &[u8];

    fn headers(&self) -> &Headers;

    fn content_type(&self) -> Option<&str>;

    /// Binding metadata for `protocol`, e.g. the Kafka key or the AMQP
    /// delivery mode of the message.
    fn binding(&self, protocol: &str) -> Option<&Value>;

    /// Decode a JSON payload.
    fn decode_json<T: DeserializeOwned>(&self) -> Result<T, RuntimeError>
    where
        Self: Sized,
    {
        Ok(serde_json::from_slice(self.payload())?)
    }
}

/// Write side of an envelope, filled in by generated code before sending.
pub trait EnvelopeWriter {
    fn set_payload(&mut self, payload: Vec<u8>);

    fn set_header(&mut self, name: &str, value: Value);

    fn set_content_type(&mut self, content_type: &str);

    fn set_binding(&mut self, protocol: &str, value: Value);

    /// Encode `value` as the JSON payload.
    fn encode_json<T: Serialize>(&mut self, value: &T) -> Result<(), RuntimeError>
    where
        Self: Sized,
    {
        let payload = serde_json::to_vec(value)?;
        self.set_payload(payload);
        self.set_content_type("application/json");
        Ok(())
    }
}

/// The in-process envelope. Transport adapters convert between this and
/// their wire representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub payload: Vec<u8>,
    pub headers: Headers,
    pub content_type: Option<String>,
    pub bindings: BTreeMap<String, Value>,
}

impl Envelope {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Envelope {
            payload: payload.into(),
            ..Envelope::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_header(name, value.into());
        self
    }
}

impl EnvelopeReader for Envelope {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn binding(&self, protocol: &str) -> Option<&Value> {
        self.bindings.get(protocol)
    }
}

impl EnvelopeWriter for Envelope {
    fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }

    fn set_header(&mut self, name: &str, value: Value) {
        self.headers.insert(name.to_owned(), value);
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_owned());
    }

    fn set_binding(&mut self, protocol: &str, value: Value) {
        self.bindings.insert(protocol.to_owned(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct LightMeasured {
        id: u32,
        lumens: u32,
    }

    #[test]
    fn json_payload_sets_content_type() {
        let mut env = Envelope::default();
        env.encode_json(&LightMeasured { id: 7, lumens: 300 }).unwrap();
        assert_eq!(env.content_type(), Some("application/json"));
        let back: LightMeasured = env.decode_json().unwrap();
        assert_eq!(back, LightMeasured { id: 7, lumens: 300 });
    }

    #[test]
    fn headers_and_bindings() {
        let mut env = Envelope::new(b"raw".to_vec()).with_header("correlationId", "abc");
        env.set_binding("kafka", json!({ "key": "light-7" }));
        assert_eq!(env.headers()["correlationId"], "abc");
        assert_eq!(env.binding("kafka").unwrap()["key"], "light-7");
        assert!(env.binding("amqp").is_none());
    }

    #[test]
    fn invalid_json_is_an_encoding_error() {
        let env = Envelope::new(b"{ nope".to_vec());
        let err = env.decode_json::<LightMeasured>().unwrap_err();
        assert!(matches!(err, RuntimeError::Encoding(_)));
    }
}
