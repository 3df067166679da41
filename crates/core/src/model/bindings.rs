use super::{usage, Fragment, ObjectKind, RenderContext, Renderer};
use serde_json::{json, Map, Value};

/// Which generic entity a bindings container belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingsKind {
    Server,
    Channel,
    Operation,
    Message,
}

impl BindingsKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BindingsKind::Server => "server",
            BindingsKind::Channel => "channel",
            BindingsKind::Operation => "operation",
            BindingsKind::Message => "message",
        }
    }
}

/// Protocol binding values of one entity, keyed by protocol name.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub id: String,
    pub name: String,
    pub kind: BindingsKind,
    /// Component bindings are declarations; inline ones are inlined.
    pub direct_render: bool,
    /// Typed value objects, one per supported protocol.
    pub values: Vec<(String, Value)>,
    /// Per protocol: field name -> raw schema fragment re-exposed as user schema.
    pub schema_values: Vec<(String, Map<String, Value>)>,
}

impl Bindings {
    pub fn value(&self, protocol: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(p, _)| p == protocol)
            .map(|(_, v)| v)
    }

    pub fn schema_fields(&self, protocol: &str) -> Option<&Map<String, Value>> {
        self.schema_values
            .iter()
            .find(|(p, _)| p == protocol)
            .map(|(_, v)| v)
    }
}

impl Renderer for Bindings {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Bindings
    }

    fn is_directly_rendered(&self) -> bool {
        self.direct_render
    }

    fn render_definition(&self, _ctx: &mut RenderContext) -> Fragment {
        let values: Map<String, Value> = self.values.iter().cloned().collect();
        let schemas: Map<String, Value> = self
            .schema_values
            .iter()
            .map(|(p, fields)| (p.clone(), Value::Object(fields.clone())))
            .collect();
        json!({
            "kind": "bindings",
            "name": self.name,
            "bindingsKind": self.kind.as_str(),
            "values": values,
            "schemas": schemas,
        })
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        usage(self, ctx)
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}
