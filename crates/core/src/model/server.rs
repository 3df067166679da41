use super::{
    render_fields, usage, usage_map, usage_opt, Fragment, ObjectKind, Promise, ProtoField,
    RenderContext, Renderer,
};
use serde_json::json;
use std::rc::Rc;

/// A compiled server. Servers declared in the top-level `servers` section
/// are direct-rendered; servers under `components` only appear when a
/// top-level server references them.
#[derive(Debug)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub raw_name: String,
    pub direct_render: bool,
    pub url: String,
    pub protocol: String,
    pub protocol_version: Option<String>,
    pub description: Option<String>,
    pub variables: Vec<(String, Rc<Promise>)>,
    pub bindings: Option<Rc<Promise>>,
    /// Channels attached to this server, taken from the active-channel index.
    pub channels: Vec<Rc<Promise>>,
    /// Contribution of the protocol builder, when the protocol is supported.
    pub proto: Option<Rc<dyn Renderer>>,
}

impl Renderer for Server {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Server
    }

    fn is_directly_rendered(&self) -> bool {
        self.direct_render
    }

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment {
        let channels: Vec<Fragment> = self.channels.iter().map(|c| c.render_usage(ctx)).collect();
        let proto = self.proto.as_ref().map(|p| p.render_usage(ctx));
        json!({
            "kind": "server",
            "name": self.name,
            "rawName": self.raw_name,
            "url": self.url,
            "protocol": self.protocol,
            "protocolVersion": self.protocol_version,
            "description": self.description,
            "variables": usage_map(&self.variables, ctx),
            "bindings": usage_opt(&self.bindings, ctx),
            "channels": channels,
            "protocolServer": proto,
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}

/// Protocol-specific part of a server, produced by a protocol builder.
/// Always inlined into its server.
#[derive(Debug, Clone)]
pub struct ProtoServer {
    pub id: String,
    pub protocol: String,
    pub protocol_title: String,
    pub server_name: String,
    pub url: String,
    pub protocol_version: Option<String>,
    pub fields: Vec<ProtoField>,
}

impl Renderer for ProtoServer {
    fn kind(&self) -> ObjectKind {
        ObjectKind::ProtoServer
    }

    fn is_directly_rendered(&self) -> bool {
        false
    }

    fn render_definition(&self, _ctx: &mut RenderContext) -> Fragment {
        json!({
            "kind": "proto_server",
            "protocol": self.protocol,
            "title": self.protocol_title,
            "server": self.server_name,
            "url": self.url,
            "protocolVersion": self.protocol_version,
            "fields": render_fields(&self.fields),
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone)]
pub struct ServerVariable {
    pub id: String,
    pub name: String,
    pub enum_values: Vec<String>,
    pub default: Option<String>,
    pub description: Option<String>,
    pub examples: Vec<String>,
}

impl Renderer for ServerVariable {
    fn kind(&self) -> ObjectKind {
        ObjectKind::ServerVariable
    }

    fn is_directly_rendered(&self) -> bool {
        false
    }

    fn render_definition(&self, _ctx: &mut RenderContext) -> Fragment {
        json!({
            "kind": "server_variable",
            "name": self.name,
            "enum": self.enum_values,
            "default": self.default,
            "description": self.description,
            "examples": self.examples,
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}
