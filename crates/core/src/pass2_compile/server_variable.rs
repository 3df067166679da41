use super::{user_ref, Compile};
use crate::context::CompileContext;
use crate::document::ServerVariableDecl;
use crate::error::CompileError;
use crate::model::{Capability, Renderer, ServerVariable};
use std::rc::Rc;

impl Compile for ServerVariableDecl {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError> {
        if let Some(raw) = &self.reference {
            return user_ref(ctx, raw, Capability::ServerVariable, false);
        }
        if let Some(default) = &self.default {
            if !self.enum_values.is_empty() && !self.enum_values.contains(default) {
                ctx.warn(
                    None,
                    format!("default value '{}' is not one of the enum values", default),
                );
            }
        }
        Ok(Rc::new(ServerVariable {
            id: ctx.here(),
            name: ctx.path.top_segment().to_owned(),
            enum_values: self.enum_values.clone(),
            default: self.default.clone(),
            description: self.description.clone(),
            examples: self.examples.clone(),
        }))
    }
}
