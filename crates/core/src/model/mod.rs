//! Compiled objects and the rendering capability every one of them satisfies.
//!
//! The backend calls [`Renderer::render_definition`] once for every object
//! whose [`Renderer::is_directly_rendered`] is true and
//! [`Renderer::render_usage`] at every other site. Usage of a direct object
//! is a `{"$use": identity}` fragment; any other object is inlined.

pub mod bindings;
pub mod channel;
pub mod message;
pub mod promise;
pub mod schema;
pub mod server;

pub use bindings::{Bindings, BindingsKind};
pub use channel::{Channel, Operation, OperationKind, Parameter, ParameterType, ProtoChannel};
pub use message::{CorrelationId, Message, MessageField, MessageIndex};
pub use promise::{ListPromise, Matcher, Promise, PromiseOrigin};
pub use schema::{Schema, SchemaField, SchemaShape};
pub use server::{ProtoServer, Server, ServerVariable};

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Output of a render call. Concrete output syntax belongs to the backend;
/// the core describes declarations as JSON trees.
pub type Fragment = Value;

/// What a compiled object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Server,
    ProtoServer,
    ServerVariable,
    Channel,
    ProtoChannel,
    Parameter,
    Message,
    CorrelationId,
    MessageIndex,
    Schema,
    Bindings,
    /// A scalar promise that has not been assigned yet.
    Promise,
    /// A list promise.
    List,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Server => "server",
            ObjectKind::ProtoServer => "proto_server",
            ObjectKind::ServerVariable => "server_variable",
            ObjectKind::Channel => "channel",
            ObjectKind::ProtoChannel => "proto_channel",
            ObjectKind::Parameter => "parameter",
            ObjectKind::Message => "message",
            ObjectKind::CorrelationId => "correlation_id",
            ObjectKind::MessageIndex => "message_index",
            ObjectKind::Schema => "schema",
            ObjectKind::Bindings => "bindings",
            ObjectKind::Promise => "promise",
            ObjectKind::List => "list",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capability a promise requires of whatever it resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Any,
    Server,
    ServerVariable,
    Channel,
    Parameter,
    Message,
    CorrelationId,
    Bindings,
    /// Can be rendered as a type usage (schemas).
    Type,
}

impl Capability {
    pub fn accepts(self, kind: ObjectKind) -> bool {
        match self {
            Capability::Any => true,
            Capability::Server => kind == ObjectKind::Server,
            Capability::ServerVariable => kind == ObjectKind::ServerVariable,
            Capability::Channel => kind == ObjectKind::Channel,
            Capability::Parameter => kind == ObjectKind::Parameter,
            Capability::Message => kind == ObjectKind::Message,
            Capability::CorrelationId => kind == ObjectKind::CorrelationId,
            Capability::Bindings => kind == ObjectKind::Bindings,
            Capability::Type => kind == ObjectKind::Schema,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Any => "any",
            Capability::Server => "server",
            Capability::ServerVariable => "server variable",
            Capability::Channel => "channel",
            Capability::Parameter => "parameter",
            Capability::Message => "message",
            Capability::CorrelationId => "correlation id",
            Capability::Bindings => "bindings",
            Capability::Type => "type usage",
        };
        f.write_str(s)
    }
}

/// The rendering capability.
pub trait Renderer: fmt::Debug {
    fn kind(&self) -> ObjectKind;

    /// Emitted once as a standalone declaration, or only inlined.
    fn is_directly_rendered(&self) -> bool;

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment;

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment;

    /// Stable identity used for deduplication: the reference string the
    /// object was registered under.
    fn identity(&self) -> String;

    fn as_promise(&self) -> Option<&Promise> {
        None
    }

    /// Inert stand-in for an ignored entity.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// State threaded through one rendering run.
///
/// Only [`crate::pass3_resolve::LinkedModel::render_context`] creates one,
/// so nothing renders before every promise has been assigned.
#[derive(Debug, Default)]
pub struct RenderContext {
    inlining: Vec<String>,
    definitions: usize,
    usages: usize,
}

impl RenderContext {
    pub(crate) fn new() -> Self {
        RenderContext::default()
    }

    pub fn definitions_rendered(&self) -> usize {
        self.definitions
    }

    pub fn usages_rendered(&self) -> usize {
        self.usages
    }

    /// Render `obj` as a standalone declaration.
    pub fn definition(&mut self, obj: &dyn Renderer) -> Fragment {
        self.definitions += 1;
        let identity = obj.identity();
        self.inlining.push(identity);
        let fragment = obj.render_definition(self);
        self.inlining.pop();
        fragment
    }

    /// A usage-site reference to a declaration.
    pub fn reference(&self, identity: &str) -> Fragment {
        serde_json::json!({ "$use": identity })
    }

    /// Inline `obj` at its usage site. An object already being rendered
    /// further up the stack is referenced instead of recursing.
    pub fn inline(&mut self, obj: &dyn Renderer) -> Fragment {
        let identity = obj.identity();
        if self.inlining.contains(&identity) {
            return self.reference(&identity);
        }
        self.inlining.push(identity);
        let fragment = obj.render_definition(self);
        self.inlining.pop();
        fragment
    }
}

/// Default usage rendering shared by every concrete object.
pub fn usage(obj: &dyn Renderer, ctx: &mut RenderContext) -> Fragment {
    ctx.usages += 1;
    if obj.is_directly_rendered() {
        ctx.reference(&obj.identity())
    } else {
        ctx.inline(obj)
    }
}

pub(crate) fn usage_opt(prm: &Option<Rc<Promise>>, ctx: &mut RenderContext) -> Fragment {
    match prm {
        Some(p) => p.render_usage(ctx),
        None => Value::Null,
    }
}

pub(crate) fn usage_map(entries: &[(String, Rc<Promise>)], ctx: &mut RenderContext) -> Fragment {
    let mut map = serde_json::Map::new();
    for (name, prm) in entries {
        map.insert(name.clone(), prm.render_usage(ctx));
    }
    Value::Object(map)
}

/// A protocol-specific field a builder adds to a generic entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoField {
    pub name: String,
    pub type_name: String,
}

impl ProtoField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        ProtoField {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

pub(crate) fn render_fields(fields: &[ProtoField]) -> Fragment {
    let mut map = serde_json::Map::new();
    for f in fields {
        map.insert(f.name.clone(), Value::String(f.type_name.clone()));
    }
    Value::Object(map)
}

/// Inert object standing in for an ignored entity. Satisfies the capability
/// of the entity it replaces and renders nothing.
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub id: String,
    pub kind: ObjectKind,
}

impl Placeholder {
    pub fn new(id: impl Into<String>, kind: ObjectKind) -> Self {
        Placeholder {
            id: id.into(),
            kind,
        }
    }
}

impl Renderer for Placeholder {
    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn is_directly_rendered(&self) -> bool {
        false
    }

    fn render_definition(&self, _ctx: &mut RenderContext) -> Fragment {
        Value::Null
    }

    fn render_usage(&self, _ctx: &mut RenderContext) -> Fragment {
        Value::Null
    }

    fn identity(&self) -> String {
        self.id.clone()
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}
