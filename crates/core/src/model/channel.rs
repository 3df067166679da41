use super::{
    render_fields, usage, usage_map, usage_opt, Fragment, ObjectKind, Promise, ProtoField,
    RenderContext, Renderer,
};
use serde_json::json;
use std::rc::Rc;

#[derive(Debug)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub raw_name: String,
    pub direct_render: bool,
    pub description: Option<String>,
    /// Servers the channel is restricted to; empty means every server.
    pub servers: Vec<String>,
    pub parameters: Vec<(String, Rc<Promise>)>,
    pub bindings: Option<Rc<Promise>>,
    pub publish: Option<Operation>,
    pub subscribe: Option<Operation>,
    /// One entry per protocol the channel is served over.
    pub proto: Vec<Rc<dyn Renderer>>,
}

impl Renderer for Channel {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Channel
    }

    fn is_directly_rendered(&self) -> bool {
        self.direct_render
    }

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment {
        let publish = self.publish.as_ref().map(|op| op.render(ctx));
        let subscribe = self.subscribe.as_ref().map(|op| op.render(ctx));
        let proto: Vec<Fragment> = self.proto.iter().map(|p| p.render_usage(ctx)).collect();
        json!({
            "kind": "channel",
            "name": self.name,
            "rawName": self.raw_name,
            "description": self.description,
            "servers": self.servers,
            "parameters": usage_map(&self.parameters, ctx),
            "bindings": usage_opt(&self.bindings, ctx),
            "publish": publish,
            "subscribe": subscribe,
            "protocolChannels": proto,
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Publish,
    Subscribe,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Publish => "publish",
            OperationKind::Subscribe => "subscribe",
        }
    }
}

/// A `publish` or `subscribe` operation, embedded in its channel.
#[derive(Debug)]
pub struct Operation {
    pub kind: OperationKind,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub message: Option<Rc<Promise>>,
    pub bindings: Option<Rc<Promise>>,
}

impl Operation {
    fn render(&self, ctx: &mut RenderContext) -> Fragment {
        json!({
            "operationId": self.operation_id,
            "summary": self.summary,
            "message": usage_opt(&self.message, ctx),
            "bindings": usage_opt(&self.bindings, ctx),
        })
    }
}

/// Protocol-specific part of a channel, produced by a protocol builder.
#[derive(Debug, Clone)]
pub struct ProtoChannel {
    pub id: String,
    pub protocol: String,
    pub protocol_title: String,
    pub channel_name: String,
    pub fields: Vec<ProtoField>,
}

impl Renderer for ProtoChannel {
    fn kind(&self) -> ObjectKind {
        ObjectKind::ProtoChannel
    }

    fn is_directly_rendered(&self) -> bool {
        false
    }

    fn render_definition(&self, _ctx: &mut RenderContext) -> Fragment {
        json!({
            "kind": "proto_channel",
            "protocol": self.protocol,
            "title": self.protocol_title,
            "channel": self.channel_name,
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

#[derive(Debug)]
pub enum ParameterType {
    /// Wrapper around the parameter schema's type.
    Schema(Rc<Promise>),
    /// No schema: an opaque string value.
    PlainString,
}

#[derive(Debug)]
pub struct Parameter {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub ty: ParameterType,
}

impl Parameter {
    pub fn is_plain_string(&self) -> bool {
        matches!(self.ty, ParameterType::PlainString)
    }
}

impl Renderer for Parameter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Parameter
    }

    fn is_directly_rendered(&self) -> bool {
        true
    }

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment {
        let ty = match &self.ty {
            ParameterType::Schema(prm) => json!({ "value": prm.render_usage(ctx) }),
            ParameterType::PlainString => json!("string"),
        };
        json!({
            "kind": "parameter",
            "name": self.name,
            "description": self.description,
            "location": self.location,
            "type": ty,
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}
