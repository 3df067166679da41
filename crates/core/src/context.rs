//! Per-walk compile context: path cursor, storage handle, options and the
//! diagnostic sink.

use crate::error::{CompileError, Diagnostic, Severity};
use crate::model::{Capability, ListPromise, Matcher, Promise, PromiseOrigin, Renderer};
use crate::options::CompileOptions;
use crate::path::{FrameTag, PathCursor};
use crate::protocol::ProtocolRegistry;
use crate::reference::Reference;
use crate::storage::Storage;
use std::rc::Rc;

pub struct CompileContext<'a> {
    pub path: PathCursor,
    pub storage: &'a mut Storage,
    pub options: &'a CompileOptions,
    pub protocols: &'a ProtocolRegistry,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CompileContext<'a> {
    pub fn new(
        document: impl Into<String>,
        storage: &'a mut Storage,
        options: &'a CompileOptions,
        protocols: &'a ProtocolRegistry,
    ) -> Self {
        CompileContext {
            path: PathCursor::new(document),
            storage,
            options,
            protocols,
            diagnostics: Vec::new(),
        }
    }

    /// The current location as a reference string.
    pub fn here(&self) -> String {
        self.path.to_string()
    }

    /// Run `f` one frame deeper. The frame is popped whatever `f` returns.
    pub fn within<T>(
        &mut self,
        segment: &str,
        tags: &[FrameTag],
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        self.path.push(segment, tags);
        let result = f(self);
        self.path.pop();
        result
    }

    /// Register `object` under the current path.
    pub fn register(&mut self, object: Rc<dyn Renderer>) -> Result<(), CompileError> {
        let key = self
            .path
            .reference()
            .key()
            .ok_or_else(|| self.error("cannot register an object at the document root"))?;
        log::trace!("register {} ({})", key, object.kind());
        self.storage
            .register(key, object)
            .map_err(|collision| CompileError::NameCollision {
                path: self.here(),
                scope: collision.scope,
                name: collision.name,
            })
    }

    pub fn parse_reference(&self, raw: &str) -> Result<Reference, CompileError> {
        Reference::parse(raw, self.path.document()).map_err(|e| {
            CompileError::MalformedReference {
                path: self.here(),
                reference: raw.to_owned(),
                message: e.message,
            }
        })
    }

    /// Promise for an explicit `$ref` written by the document author.
    pub fn user_promise(&mut self, raw: &str, requires: Capability) -> Result<Promise, CompileError> {
        let reference = self.parse_reference(raw)?;
        log::trace!("$ref {} at {}", reference, self.path);
        Ok(Promise::by_reference(
            reference,
            PromiseOrigin::User,
            requires,
            self.here(),
        ))
    }

    /// Promise for the object that will be registered at `segments` below
    /// the current location.
    pub fn child_promise(&mut self, segments: &[&str], requires: Capability) -> Rc<Promise> {
        let reference = self.path.reference_to(segments);
        let prm = Promise::by_reference(reference, PromiseOrigin::Internal, requires, self.here());
        self.track(prm)
    }

    /// Internal promise to an arbitrary location, e.g. a channel attached to
    /// a server.
    pub fn internal_promise(&mut self, reference: Reference, requires: Capability) -> Rc<Promise> {
        let prm = Promise::by_reference(reference, PromiseOrigin::Internal, requires, self.here());
        self.track(prm)
    }

    pub fn predicate_promise(
        &mut self,
        matcher: Matcher,
        description: &str,
        requires: Capability,
    ) -> Rc<Promise> {
        let prm = Promise::matching(matcher, description, requires, self.here());
        self.track(prm)
    }

    pub fn list_promise(
        &mut self,
        matcher: Matcher,
        description: &str,
        requires: Capability,
    ) -> Rc<ListPromise> {
        let prm = Rc::new(ListPromise::new(matcher, description, requires, self.here()));
        self.storage.add_list_promise(Rc::clone(&prm));
        prm
    }

    /// Hand a promise to the storage so the resolution pass sees it.
    pub fn track(&mut self, promise: Promise) -> Rc<Promise> {
        let prm = Rc::new(promise);
        self.storage.add_promise(Rc::clone(&prm));
        prm
    }

    pub fn warn(&mut self, protocol: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}: {}", self.path, message);
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            path: self.here(),
            protocol: protocol.map(str::to_owned),
            message,
        });
    }

    /// A structural error at the current location.
    pub fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::structural(self.here(), message)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
