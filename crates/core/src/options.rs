//! Compile-time options: per-entity-kind enable flags and name lists.

use serde::Deserialize;

/// Options for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntityOptions {
    pub enable: bool,
    /// When set, only these names compile; everything else becomes a placeholder.
    pub allow: Option<Vec<String>>,
    /// Names that never compile, checked after `allow`.
    pub deny: Vec<String>,
}

impl Default for EntityOptions {
    fn default() -> Self {
        EntityOptions {
            enable: true,
            allow: None,
            deny: Vec::new(),
        }
    }
}

impl EntityOptions {
    pub fn disabled() -> Self {
        EntityOptions {
            enable: false,
            ..EntityOptions::default()
        }
    }

    pub fn allowing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EntityOptions {
            allow: Some(names.into_iter().map(Into::into).collect()),
            ..EntityOptions::default()
        }
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        if let Some(allow) = &self.allow {
            if !allow.iter().any(|n| n == name) {
                return false;
            }
        }
        !self.deny.iter().any(|n| n == name)
    }

    /// Enabled and allowed.
    pub fn accepts(&self, name: &str) -> bool {
        self.enable && self.is_allowed(name)
    }
}

/// Options for one compile run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    pub servers: EntityOptions,
    pub channels: EntityOptions,
    pub messages: EntityOptions,
    pub schemas: EntityOptions,
    /// Overrides the document's `defaultContentType`.
    pub default_content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_accept_everything() {
        let opts = CompileOptions::default();
        assert!(opts.servers.accepts("prod"));
        assert!(opts.messages.accepts("anything"));
    }

    #[test]
    fn allow_and_deny_lists() {
        let mut opts = EntityOptions::allowing(["prod", "staging"]);
        assert!(opts.is_allowed("prod"));
        assert!(!opts.is_allowed("dev"));
        opts.deny.push("staging".to_owned());
        assert!(!opts.is_allowed("staging"));
        assert!(!EntityOptions::disabled().accepts("prod"));
    }

    #[test]
    fn deserializes_partial_tables() {
        let opts: CompileOptions = serde_json::from_value(serde_json::json!({
            "servers": { "allow": ["prod"] },
            "schemas": { "enable": false }
        }))
        .unwrap();
        assert!(opts.servers.enable);
        assert_eq!(opts.servers.allow, Some(vec!["prod".to_owned()]));
        assert!(!opts.schemas.enable);
        assert!(opts.channels.enable);
    }
}
