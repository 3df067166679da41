//! The object registry for one compile run.
//!
//! Registration is append-only: objects are never removed or replaced, so
//! the resolution pass sees exactly what the walk registered, in walk order.

use crate::model::{ListPromise, Promise, Renderer};
use crate::reference::{ObjectKey, Reference};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// Two objects registered under the same (scope, name).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("name '{name}' is already registered in scope '{scope}'")]
pub struct NameCollision {
    pub scope: String,
    pub name: String,
}

/// One registered object.
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: ObjectKey,
    pub object: Rc<dyn Renderer>,
}

/// A channel visible for binding to servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveChannel {
    /// Document the channel is declared in; empty for the root document.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub document: String,
    pub name: String,
    /// Servers the channel is restricted to; empty means every server.
    pub servers: Vec<String>,
}

impl ActiveChannel {
    pub fn reference(&self) -> Reference {
        Reference::new(
            self.document.clone(),
            vec!["channels".to_owned(), self.name.clone()],
        )
    }

    pub fn attaches_to(&self, server: &str) -> bool {
        self.servers.is_empty() || self.servers.iter().any(|s| s == server)
    }
}

/// A document-level server, recorded before channels are walked so channel
/// compilers know which protocols they are served over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveServer {
    pub name: String,
    pub protocol: String,
}

#[derive(Debug, Default)]
pub struct Storage {
    entries: Vec<Entry>,
    index: HashMap<ObjectKey, usize>,
    promises: Vec<Rc<Promise>>,
    list_promises: Vec<Rc<ListPromise>>,
    protocols: BTreeSet<String>,
    active_channels: Vec<ActiveChannel>,
    active_servers: Vec<ActiveServer>,
    walked_documents: BTreeSet<String>,
    default_content_type: Option<String>,
}

impl Storage {
    pub fn new() -> Self {
        Storage::default()
    }

    // ── Object table ─────────────────────────────────────────────────

    pub fn register(&mut self, key: ObjectKey, object: Rc<dyn Renderer>) -> Result<(), NameCollision> {
        if self.index.contains_key(&key) {
            return Err(NameCollision {
                scope: key.scope_string(),
                name: key.name,
            });
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(Entry { key, object });
        Ok(())
    }

    pub fn lookup(&self, key: &ObjectKey) -> Option<&Rc<dyn Renderer>> {
        self.index.get(key).map(|&i| &self.entries[i].object)
    }

    pub fn lookup_reference(&self, reference: &Reference) -> Option<&Rc<dyn Renderer>> {
        self.lookup(&reference.key()?)
    }

    /// Every registered object in registration order.
    pub fn all_objects(&self) -> &[Entry] {
        &self.entries
    }

    // ── Promises ─────────────────────────────────────────────────────

    pub fn add_promise(&mut self, promise: Rc<Promise>) {
        self.promises.push(promise);
    }

    pub fn add_list_promise(&mut self, promise: Rc<ListPromise>) {
        self.list_promises.push(promise);
    }

    pub fn promises(&self) -> &[Rc<Promise>] {
        &self.promises
    }

    pub fn list_promises(&self) -> &[Rc<ListPromise>] {
        &self.list_promises
    }

    // ── Cross-cutting query state ────────────────────────────────────

    pub fn register_protocol(&mut self, protocol: impl Into<String>) {
        self.protocols.insert(protocol.into());
    }

    pub fn protocols(&self) -> &BTreeSet<String> {
        &self.protocols
    }

    pub fn add_active_channel(&mut self, channel: ActiveChannel) {
        self.active_channels.push(channel);
    }

    pub fn active_channels(&self) -> &[ActiveChannel] {
        &self.active_channels
    }

    pub fn add_active_server(&mut self, server: ActiveServer) {
        self.active_servers.push(server);
    }

    pub fn active_servers(&self) -> &[ActiveServer] {
        &self.active_servers
    }

    pub fn set_default_content_type(&mut self, content_type: Option<String>) {
        self.default_content_type = content_type;
    }

    pub fn default_content_type(&self) -> Option<&str> {
        self.default_content_type.as_deref()
    }

    // ── Documents ────────────────────────────────────────────────────

    pub fn mark_walked(&mut self, document: impl Into<String>) {
        self.walked_documents.insert(document.into());
    }

    pub fn is_walked(&self, document: &str) -> bool {
        self.walked_documents.contains(document)
    }

    /// Documents named by a reference promise that have not been walked yet.
    pub fn pending_documents(&self) -> Vec<String> {
        let mut pending = BTreeSet::new();
        for prm in &self.promises {
            if let Some(reference) = prm.reference() {
                if !self.is_walked(&reference.document) {
                    pending.insert(reference.document.clone());
                }
            }
        }
        pending.into_iter().collect()
    }

    /// Where the first promise into `document` was created.
    pub fn requested_at(&self, document: &str) -> Option<&str> {
        self.promises
            .iter()
            .find(|p| p.reference().is_some_and(|r| r.document == document))
            .map(|p| p.created_at())
    }

    pub(crate) fn into_parts(self) -> StorageParts {
        StorageParts {
            entries: self.entries,
            index: self.index,
            promises: self.promises,
            list_promises: self.list_promises,
            protocols: self.protocols,
            active_channels: self.active_channels,
            active_servers: self.active_servers,
        }
    }
}

/// What the resolution pass takes over from the storage.
pub(crate) struct StorageParts {
    pub entries: Vec<Entry>,
    pub index: HashMap<ObjectKey, usize>,
    pub promises: Vec<Rc<Promise>>,
    pub list_promises: Vec<Rc<ListPromise>>,
    pub protocols: BTreeSet<String>,
    pub active_channels: Vec<ActiveChannel>,
    pub active_servers: Vec<ActiveServer>,
}
