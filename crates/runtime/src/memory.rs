//! In-process transport over `tokio::sync::broadcast` channels.
//!
//! Every channel must be declared before publishers or subscribers are
//! opened for it. Envelopes fan out to every subscriber open at send time.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::envelope::Envelope;
use crate::error::RuntimeError;
use crate::traits::{Consumer, Producer, Publisher, Subscriber};

const DEFAULT_CAPACITY: usize = 64;

/// Shared handle to the in-memory channels. Clones share the same channels.
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Envelope>>>>,
    capacity: usize,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        MemoryBroker::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        MemoryBroker::default()
    }

    /// `capacity` is the number of envelopes a slow subscriber may fall
    /// behind before it starts skipping.
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryBroker {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Declare `channel`. Declaring an existing channel is a no-op.
    pub fn declare(&self, channel: &str) -> Result<(), RuntimeError> {
        let mut channels = self.lock(channel)?;
        channels
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(())
    }

    /// Remove `channel`. Its subscribers finish once every publisher on it
    /// is closed or dropped.
    pub fn shutdown(&self, channel: &str) -> Result<(), RuntimeError> {
        let mut channels = self.lock(channel)?;
        match channels.remove(channel) {
            Some(_) => Ok(()),
            None => Err(RuntimeError::UnknownChannel {
                channel: channel.to_owned(),
            }),
        }
    }

    fn sender(&self, channel: &str) -> Result<broadcast::Sender<Envelope>, RuntimeError> {
        self.lock(channel)?
            .get(channel)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownChannel {
                channel: channel.to_owned(),
            })
    }

    fn lock(
        &self,
        channel: &str,
    ) -> Result<MutexGuard<'_, HashMap<String, broadcast::Sender<Envelope>>>, RuntimeError> {
        self.channels.lock().map_err(|_| RuntimeError::Transport {
            channel: channel.to_owned(),
            message: "channel table lock poisoned".to_owned(),
        })
    }
}

#[async_trait]
impl Producer for MemoryBroker {
    type Publisher = MemoryPublisher;

    async fn publisher(
        &self,
        channel: &str,
        _bindings: &Value,
    ) -> Result<MemoryPublisher, RuntimeError> {
        let sender = self.sender(channel)?;
        log::debug!("memory publisher opened on {}", channel);
        Ok(MemoryPublisher {
            channel: channel.to_owned(),
            sender: Some(sender),
        })
    }
}

#[async_trait]
impl Consumer for MemoryBroker {
    type Subscriber = MemorySubscriber;

    async fn subscriber(
        &self,
        channel: &str,
        _bindings: &Value,
    ) -> Result<MemorySubscriber, RuntimeError> {
        let receiver = self.sender(channel)?.subscribe();
        log::debug!("memory subscriber opened on {}", channel);
        Ok(MemorySubscriber {
            channel: channel.to_owned(),
            receiver: Some(receiver),
        })
    }
}

#[derive(Debug)]
pub struct MemoryPublisher {
    channel: String,
    sender: Option<broadcast::Sender<Envelope>>,
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn send(&mut self, envelopes: Vec<Envelope>) -> Result<(), RuntimeError> {
        let sender = self.sender.as_ref().ok_or_else(|| RuntimeError::Closed {
            channel: self.channel.clone(),
        })?;
        for envelope in envelopes {
            // No open subscriber: the envelope is dropped, as on a real broker
            // without consumers.
            if sender.send(envelope).is_err() {
                log::trace!("{}: no subscribers", self.channel);
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RuntimeError> {
        match self.sender.take() {
            Some(_) => Ok(()),
            None => Err(RuntimeError::AlreadyClosed {
                channel: self.channel.clone(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct MemorySubscriber {
    channel: String,
    receiver: Option<broadcast::Receiver<Envelope>>,
}

#[async_trait]
impl Subscriber for MemorySubscriber {
    async fn receive<F>(&mut self, mut handler: F) -> Result<(), RuntimeError>
    where
        F: FnMut(Envelope) -> ControlFlow<()> + Send,
    {
        let receiver = self.receiver.as_mut().ok_or_else(|| RuntimeError::Closed {
            channel: self.channel.clone(),
        })?;
        loop {
            match receiver.recv().await {
                Ok(envelope) => {
                    if handler(envelope).is_break() {
                        return Ok(());
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("{}: subscriber skipped {} envelopes", self.channel, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    log::debug!("{}: transport ended", self.channel);
                    return Ok(());
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), RuntimeError> {
        match self.receiver.take() {
            Some(_) => Ok(()),
            None => Err(RuntimeError::AlreadyClosed {
                channel: self.channel.clone(),
            }),
        }
    }
}
