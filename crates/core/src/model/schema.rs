use super::{usage, usage_opt, Fragment, ObjectKind, Promise, RenderContext, Renderer};
use serde_json::{json, Value};
use std::rc::Rc;

/// A compiled schema, usable wherever a type is expected.
#[derive(Debug)]
pub struct Schema {
    pub id: String,
    pub name: String,
    /// Component schemas are declarations; nested ones are inlined.
    pub direct_render: bool,
    pub description: Option<String>,
    pub shape: SchemaShape,
}

#[derive(Debug)]
pub enum SchemaShape {
    Object { fields: Vec<SchemaField> },
    Array { items: Option<Rc<Promise>> },
    Simple {
        type_name: String,
        format: Option<String>,
        enum_values: Vec<Value>,
    },
    /// No `type` and no structure: any JSON value.
    Any,
}

#[derive(Debug)]
pub struct SchemaField {
    pub name: String,
    pub required: bool,
    pub ty: Rc<Promise>,
}

impl Renderer for Schema {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Schema
    }

    fn is_directly_rendered(&self) -> bool {
        self.direct_render
    }

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment {
        let ty = match &self.shape {
            SchemaShape::Object { fields } => {
                let mut rendered = serde_json::Map::new();
                for f in fields {
                    rendered.insert(
                        f.name.clone(),
                        json!({ "required": f.required, "type": f.ty.render_usage(ctx) }),
                    );
                }
                json!({ "object": rendered })
            }
            SchemaShape::Array { items } => json!({ "array": usage_opt(items, ctx) }),
            SchemaShape::Simple {
                type_name,
                format,
                enum_values,
            } => json!({ "simple": type_name, "format": format, "enum": enum_values }),
            SchemaShape::Any => json!("any"),
        };
        json!({
            "kind": "schema",
            "name": self.name,
            "description": self.description,
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
