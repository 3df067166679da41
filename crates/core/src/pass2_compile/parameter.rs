use super::{link_child, placeholder, user_ref, Compile};
use crate::context::CompileContext;
use crate::document::ParameterDecl;
use crate::error::CompileError;
use crate::model::{Capability, ObjectKind, Parameter, ParameterType, Renderer};
use std::rc::Rc;

impl Compile for ParameterDecl {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError> {
        // Parameters live and die with channels.
        if !ctx.options.channels.enable {
            return Ok(placeholder(ctx, ObjectKind::Parameter));
        }
        if let Some(raw) = &self.reference {
            return user_ref(ctx, raw, Capability::Parameter, false);
        }

        let name = self
            .x_name
            .clone()
            .unwrap_or_else(|| ctx.path.top_segment().to_owned());

        let ty = match &self.schema {
            Some(schema) => {
                ParameterType::Schema(link_child(ctx, "schema", schema, Capability::Type)?)
            }
            None => {
                log::trace!("parameter {} has no schema", name);
                ParameterType::PlainString
            }
        };

        Ok(Rc::new(Parameter {
            id: ctx.here(),
            name,
            description: self.description.clone(),
            location: self.location.clone(),
            ty,
        }))
    }
}
