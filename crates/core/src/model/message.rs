use super::{usage, usage_opt, Fragment, ListPromise, ObjectKind, Promise, RenderContext, Renderer};
use serde_json::json;
use std::rc::Rc;

/// A compiled message. Messages are always emitted as declarations so the
/// encoder/decoder table can name them.
#[derive(Debug)]
pub struct Message {
    pub id: String,
    pub name: String,
    pub raw_name: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub payload: Option<Rc<Promise>>,
    pub headers: Option<Rc<Promise>>,
    pub correlation_id: Option<Rc<Promise>>,
    pub bindings: Option<Rc<Promise>>,
}

impl Renderer for Message {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Message
    }

    fn is_directly_rendered(&self) -> bool {
        true
    }

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment {
        json!({
            "kind": "message",
            "name": self.name,
            "rawName": self.raw_name,
            "title": self.title,
            "summary": self.summary,
            "description": self.description,
            "contentType": self.content_type,
            "payload": usage_opt(&self.payload, ctx),
            "headers": usage_opt(&self.headers, ctx),
            "correlationId": usage_opt(&self.correlation_id, ctx),
            "bindings": usage_opt(&self.bindings, ctx),
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}

/// The part of a message a correlation id location points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageField {
    Headers,
    Payload,
}

impl MessageField {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageField::Headers => "headers",
            MessageField::Payload => "payload",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationId {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub field: MessageField,
    /// Path below `field`, one entry per pointer segment.
    pub location: Vec<String>,
}

impl Renderer for CorrelationId {
    fn kind(&self) -> ObjectKind {
        ObjectKind::CorrelationId
    }

    fn is_directly_rendered(&self) -> bool {
        false
    }

    fn render_definition(&self, _ctx: &mut RenderContext) -> Fragment {
        json!({
            "kind": "correlation_id",
            "name": self.name,
            "description": self.description,
            "field": self.field.as_str(),
            "path": self.location,
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}

/// Encoder/decoder table over every compiled message of the run.
#[derive(Debug)]
pub struct MessageIndex {
    pub id: String,
    pub default_content_type: Option<String>,
    pub messages: Rc<ListPromise>,
}

impl Renderer for MessageIndex {
    fn kind(&self) -> ObjectKind {
        ObjectKind::MessageIndex
    }

    fn is_directly_rendered(&self) -> bool {
        true
    }

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment {
        json!({
            "kind": "message_index",
            "defaultContentType": self.default_content_type,
            "messages": self.messages.render_usage(ctx),
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}
