use serde::Serialize;

/// A compile error. The first error encountered aborts the run; no partial
/// model is ever handed to the next pass.
///
/// Every variant carries `path`, the reference string of the path cursor
/// (or of the promise) at the point of failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompileError {
    /// The document could not be read.
    #[error("{path}: cannot load document '{document}': {message}")]
    Load {
        path: String,
        document: String,
        message: String,
    },

    /// The document bytes are not a valid document tree.
    #[error("{path}: cannot decode document '{document}': {message}")]
    Decode {
        path: String,
        document: String,
        message: String,
    },

    /// A declaration is malformed (e.g. a correlation-id location without a fragment).
    #[error("{path}: {message}")]
    Structural { path: String, message: String },

    /// A protocol builder rejected its binding payload.
    #[error("{path}: {protocol} bindings: {message}")]
    Binding {
        path: String,
        protocol: String,
        message: String,
    },

    /// Two objects were registered under the same scope and name.
    #[error("{path}: name '{name}' is already registered in scope '{scope}'")]
    NameCollision {
        path: String,
        scope: String,
        name: String,
    },

    /// A reference string does not follow the pointer grammar.
    #[error("{path}: malformed reference '{reference}': {message}")]
    MalformedReference {
        path: String,
        reference: String,
        message: String,
    },

    /// A reference names an object that was never registered.
    #[error("{path}: unresolved reference '{reference}'")]
    UnresolvedReference { path: String, reference: String },

    /// A chain of references revisits a reference string.
    #[error("{path}: reference cycle: {}", chain.join(" -> "))]
    ReferenceCycle { path: String, chain: Vec<String> },

    /// An internal structural lookup found no matching object.
    #[error("{path}: no registered object matches {description}")]
    UnmatchedPredicate { path: String, description: String },
}

impl CompileError {
    pub fn structural(path: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::Structural {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn binding(
        path: impl Into<String>,
        protocol: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CompileError::Binding {
            path: path.into(),
            protocol: protocol.into(),
            message: message.into(),
        }
    }

    /// The number of the pass that produced this error.
    pub fn pass(&self) -> u8 {
        match self {
            CompileError::Load { .. } | CompileError::Decode { .. } => 1,
            CompileError::Structural { .. }
            | CompileError::Binding { .. }
            | CompileError::NameCollision { .. }
            | CompileError::MalformedReference { .. } => 2,
            CompileError::UnresolvedReference { .. }
            | CompileError::ReferenceCycle { .. }
            | CompileError::UnmatchedPredicate { .. } => 3,
        }
    }

    /// Document path at the point of failure.
    pub fn path(&self) -> &str {
        match self {
            CompileError::Load { path, .. }
            | CompileError::Decode { path, .. }
            | CompileError::Structural { path, .. }
            | CompileError::Binding { path, .. }
            | CompileError::NameCollision { path, .. }
            | CompileError::MalformedReference { path, .. }
            | CompileError::UnresolvedReference { path, .. }
            | CompileError::ReferenceCycle { path, .. }
            | CompileError::UnmatchedPredicate { path, .. } => path,
        }
    }

    /// Protocol responsible for the error, if any.
    pub fn protocol(&self) -> Option<&str> {
        match self {
            CompileError::Binding { protocol, .. } => Some(protocol),
            _ => None,
        }
    }

    /// Structured form used by `--output json`. Always carries `pass`,
    /// `path`, `protocol` (null when absent) and the display `message`.
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("pass".to_owned(), serde_json::json!(self.pass()));
            obj.insert("protocol".to_owned(), serde_json::json!(self.protocol()));
            obj.insert("message".to_owned(), serde_json::json!(self.to_string()));
        }
        value
    }
}

/// Severity of a non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
}

/// A non-fatal finding recorded during the walk, e.g. an unsupported protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub message: String,
}
