//! Pass 1: read a document through a provider and decode it.

use crate::document::Document;
use crate::error::CompileError;
use crate::source::DocumentProvider;

/// Load `name` through `provider`. `requested_at` is the path that asked
/// for the document; empty for the root document.
pub fn load_document(
    provider: &dyn DocumentProvider,
    name: &str,
    requested_at: &str,
) -> Result<Document, CompileError> {
    log::debug!("pass 1: loading document '{}'", name);
    let text = provider
        .read_document(name)
        .map_err(|e| CompileError::Load {
            path: requested_at.to_owned(),
            document: name.to_owned(),
            message: e.to_string(),
        })?;
    decode_document(&text, name, requested_at)
}

pub fn decode_document(
    text: &str,
    name: &str,
    requested_at: &str,
) -> Result<Document, CompileError> {
    Document::from_json_str(text).map_err(|e| CompileError::Decode {
        path: requested_at.to_owned(),
        document: name.to_owned(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryProvider;

    #[test]
    fn missing_document_is_a_load_error() {
        let err = load_document(&InMemoryProvider::new(), "nope.json", "#/a").unwrap_err();
        assert_eq!(err.pass(), 1);
        assert!(matches!(err, CompileError::Load { ref document, .. } if document == "nope.json"));
        assert_eq!(err.path(), "#/a");
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let provider = InMemoryProvider::new().with_document("bad.json", "{ not json");
        let err = load_document(&provider, "bad.json", "").unwrap_err();
        assert!(matches!(err, CompileError::Decode { .. }));
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let err = decode_document(r#"{ "channels": [] }"#, "api.json", "").unwrap_err();
        assert!(matches!(err, CompileError::Decode { .. }));
    }
}
