//! Reference strings: a small address language over the document tree.
//!
//! A reference is an optional document qualifier followed by a pointer:
//! `common.json#/components/messages/userSignedUp`. Segments use JSON
//! pointer escaping (`~0` for `~`, `~1` for `/`), so channel names such as
//! `user/signedup` stay a single segment. A string without `#` is read as a
//! pointer into the current document (`components/messages/foo`).
//!
//! Parsing and [`fmt::Display`] are symmetric: every [`ObjectKey`] the
//! storage holds can be addressed by the string its reference displays as.

use std::fmt;

/// An absolute reference: document name (empty for the root document) plus
/// the pointer segments, unescaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub document: String,
    pub segments: Vec<String>,
}

/// A reference string that does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ReferenceError {
    pub message: String,
}

impl ReferenceError {
    fn new(message: impl Into<String>) -> Self {
        ReferenceError {
            message: message.into(),
        }
    }
}

impl Reference {
    pub fn new(document: impl Into<String>, segments: Vec<String>) -> Self {
        Reference {
            document: document.into(),
            segments,
        }
    }

    /// Parse `raw`, filling in `current_document` when the string carries no
    /// document qualifier.
    pub fn parse(raw: &str, current_document: &str) -> Result<Self, ReferenceError> {
        let (document, pointer) = match raw.split_once('#') {
            Some((doc, fragment)) => {
                if !fragment.is_empty() && !fragment.starts_with('/') {
                    return Err(ReferenceError::new("fragment must start with '/'"));
                }
                let doc = if doc.is_empty() { current_document } else { doc };
                (doc, fragment.strip_prefix('/').unwrap_or(fragment))
            }
            None => (current_document, raw.strip_prefix('/').unwrap_or(raw)),
        };

        if pointer.is_empty() {
            return Err(ReferenceError::new(
                "reference must point inside a document, not at its root",
            ));
        }

        let mut segments = Vec::new();
        for raw_segment in pointer.split('/') {
            if raw_segment.is_empty() {
                return Err(ReferenceError::new("empty path segment"));
            }
            segments.push(unescape(raw_segment)?);
        }

        Ok(Reference {
            document: document.to_owned(),
            segments,
        })
    }

    /// A reference one level deeper.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Reference {
            document: self.document.clone(),
            segments,
        }
    }

    /// Split into the (scope, name) key the storage registers objects under.
    /// `None` for the document root.
    pub fn key(&self) -> Option<ObjectKey> {
        let (name, scope) = self.segments.split_last()?;
        Some(ObjectKey {
            document: self.document.clone(),
            scope: scope.to_vec(),
            name: name.clone(),
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#", self.document)?;
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

/// Registration key in the storage object table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub document: String,
    pub scope: Vec<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn reference(&self) -> Reference {
        let mut segments = self.scope.clone();
        segments.push(self.name.clone());
        Reference::new(self.document.clone(), segments)
    }

    /// The scope rendered as a reference string, e.g. `#/components/messages`.
    pub fn scope_string(&self) -> String {
        Reference::new(self.document.clone(), self.scope.clone()).to_string()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.reference().fmt(f)
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> Result<String, ReferenceError> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(ReferenceError::new(format!(
                    "invalid escape in segment '{}'",
                    segment
                )))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_pointer() {
        let r = Reference::parse("#/components/messages/foo", "").unwrap();
        assert_eq!(r.document, "");
        assert_eq!(r.segments, vec!["components", "messages", "foo"]);
        let key = r.key().unwrap();
        assert_eq!(key.scope, vec!["components", "messages"]);
        assert_eq!(key.name, "foo");
    }

    #[test]
    fn bare_pointer_is_relative_to_current_document() {
        let r = Reference::parse("components/messages/foo", "common.json").unwrap();
        assert_eq!(r.document, "common.json");
        assert_eq!(r.to_string(), "common.json#/components/messages/foo");
    }

    #[test]
    fn document_qualifier_overrides_current() {
        let r = Reference::parse("common.json#/components/schemas/User", "").unwrap();
        assert_eq!(r.document, "common.json");
        assert_eq!(r.segments, vec!["components", "schemas", "User"]);
    }

    #[test]
    fn escaped_segments_round_trip() {
        let r = Reference::parse("#/channels/user~1signedup/publish", "").unwrap();
        assert_eq!(r.segments[1], "user/signedup");
        assert_eq!(r.to_string(), "#/channels/user~1signedup/publish");

        let key = Reference::new("", vec!["a~b".into(), "c/d".into()]).key().unwrap();
        let again = Reference::parse(&key.to_string(), "").unwrap();
        assert_eq!(again.key().unwrap(), key);
    }

    #[test]
    fn rejects_root_and_malformed_pointers() {
        assert!(Reference::parse("#", "").is_err());
        assert!(Reference::parse("other.json#", "").is_err());
        assert!(Reference::parse("#components", "").is_err());
        assert!(Reference::parse("#/a//b", "").is_err());
        assert!(Reference::parse("#/a/b~2", "").is_err());
    }
}
