use async_trait::async_trait;
use serde_json::Value;
use std::ops::ControlFlow;

use crate::envelope::Envelope;
use crate::error::RuntimeError;

/// Outbound side of a transport.
///
/// Generated channel code asks the producer for one [`Publisher`] per
/// channel, passing the channel's compiled bindings for the transport's
/// protocol (`Value::Null` when the channel declares none).
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` so one producer can be shared by
/// every generated channel across async tasks.
#[async_trait]
pub trait Producer: Send + Sync {
    type Publisher: Publisher;

    /// Open a publisher for `channel`.
    ///
    /// Returns `Err(RuntimeError::UnknownChannel)` when the transport does
    /// not serve the channel.
    async fn publisher(
        &self,
        channel: &str,
        bindings: &Value,
    ) -> Result<Self::Publisher, RuntimeError>;
}

/// An open outbound endpoint for one channel.
///
/// ## Lifecycle
///
/// A publisher is open when created. `close` releases it; after that every
/// `send` returns `Err(RuntimeError::Closed)` and a second `close` returns
/// `Err(RuntimeError::AlreadyClosed)`.
#[async_trait]
pub trait Publisher: Send {
    /// Send envelopes in order.
    async fn send(&mut self, envelopes: Vec<Envelope>) -> Result<(), RuntimeError>;

    async fn close(&mut self) -> Result<(), RuntimeError>;
}

/// Inbound side of a transport.
#[async_trait]
pub trait Consumer: Send + Sync {
    type Subscriber: Subscriber;

    /// Open a subscriber for `channel`. Only envelopes published after the
    /// subscriber is opened are delivered.
    async fn subscriber(
        &self,
        channel: &str,
        bindings: &Value,
    ) -> Result<Self::Subscriber, RuntimeError>;
}

/// An open inbound endpoint for one channel.
#[async_trait]
pub trait Subscriber: Send {
    /// Deliver envelopes to `handler` until it returns
    /// `ControlFlow::Break(())` or the transport ends. Dropping the returned
    /// future cancels delivery.
    async fn receive<F>(&mut self, handler: F) -> Result<(), RuntimeError>
    where
        F: FnMut(Envelope) -> ControlFlow<()> + Send;

    /// Same lifecycle as [`Publisher::close`].
    async fn close(&mut self) -> Result<(), RuntimeError>;
}
