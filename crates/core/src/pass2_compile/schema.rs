use super::{compile_at, entity_name, link_child, placeholder, user_ref, Compile};
use crate::context::CompileContext;
use crate::document::SchemaDecl;
use crate::error::CompileError;
use crate::model::{Capability, ObjectKind, Renderer, Schema, SchemaField, SchemaShape};
use std::rc::Rc;

impl Compile for SchemaDecl {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError> {
        if self.x_ignore || !ctx.options.schemas.enable {
            return Ok(placeholder(ctx, ObjectKind::Schema));
        }
        if let Some(raw) = &self.reference {
            return user_ref(ctx, raw, Capability::Type, false);
        }

        let name = entity_name(ctx, self.x_name.as_deref());
        let shape = match self.type_name.as_deref() {
            Some("object") | None if !self.properties.is_empty() => self.object_shape(ctx)?,
            Some("object") => SchemaShape::Object { fields: Vec::new() },
            Some("array") => SchemaShape::Array {
                items: match &self.items {
                    Some(items) => Some(link_child(ctx, "items", items.as_ref(), Capability::Type)?),
                    None => None,
                },
            },
            Some(type_name) => SchemaShape::Simple {
                type_name: type_name.to_owned(),
                format: self.format.clone(),
                enum_values: self.enum_values.clone(),
            },
            None => SchemaShape::Any,
        };

        Ok(Rc::new(Schema {
            id: ctx.here(),
            name,
            direct_render: is_component_schema(ctx),
            description: self.description.clone(),
            shape,
        }))
    }
}

impl SchemaDecl {
    fn object_shape(&self, ctx: &mut CompileContext<'_>) -> Result<SchemaShape, CompileError> {
        let fields = ctx.within("properties", &[], |ctx| {
            let mut fields = Vec::with_capacity(self.properties.len());
            for (field_name, decl) in &self.properties {
                let ty = ctx.child_promise(&[field_name], Capability::Type);
                compile_at(ctx, field_name, &[], decl)?;
                fields.push(SchemaField {
                    name: field_name.clone(),
                    required: self.required.contains(field_name),
                    ty,
                });
            }
            Ok(fields)
        })?;
        Ok(SchemaShape::Object { fields })
    }
}

/// `#/components/schemas/<name>`: reusable declarations. Everything else is
/// inlined where it is used.
fn is_component_schema(ctx: &CompileContext<'_>) -> bool {
    let reference = ctx.path.reference();
    matches!(
        reference.segments.as_slice(),
        [components, schemas, _] if components == "components" && schemas == "schemas"
    )
}
