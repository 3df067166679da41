/// All errors a transport adapter can return.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The publisher or subscriber was used after `close`.
    #[error("{channel}: endpoint is closed")]
    Closed { channel: String },

    /// `close` was called on an endpoint that is already closed.
    #[error("{channel}: endpoint is already closed")]
    AlreadyClosed { channel: String },

    /// No channel with this name is known to the transport.
    #[error("unknown channel: {channel}")]
    UnknownChannel { channel: String },

    /// A transport-specific failure (connection, broker, I/O).
    #[error("transport error on {channel}: {message}")]
    Transport { channel: String, message: String },

    /// A payload could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for RuntimeError {
    fn from(e: serde_json::Error) -> Self {
        RuntimeError::Encoding(e.to_string())
    }
}
