use super::{entity_name, link_child, placeholder, user_ref, BindingsNode, Compile};
use crate::context::CompileContext;
use crate::document::MessageDecl;
use crate::error::CompileError;
use crate::model::{BindingsKind, Capability, Message, ObjectKind, Renderer};
use std::rc::Rc;

impl Compile for MessageDecl {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError> {
        let name = entity_name(ctx, self.x_name.as_deref().or(self.name.as_deref()));

        if self.x_ignore {
            return Ok(placeholder(ctx, ObjectKind::Message));
        }
        // The allow-list applies to the referenced message, not the usage site.
        if let Some(raw) = &self.reference {
            return user_ref(ctx, raw, Capability::Message, false);
        }
        if !ctx.options.messages.accepts(&name) {
            return Ok(placeholder(ctx, ObjectKind::Message));
        }

        let content_type = self
            .content_type
            .clone()
            .or_else(|| ctx.storage.default_content_type().map(str::to_owned));

        let payload = match &self.payload {
            Some(schema) => Some(link_child(ctx, "payload", schema, Capability::Type)?),
            None => None,
        };
        let headers = match &self.headers {
            Some(schema) => Some(link_child(ctx, "headers", schema, Capability::Type)?),
            None => None,
        };
        let correlation_id = match &self.correlation_id {
            Some(decl) => Some(link_child(
                ctx,
                "correlationId",
                decl,
                Capability::CorrelationId,
            )?),
            None => None,
        };
        let bindings = match &self.bindings {
            Some(decl) => Some(link_child(
                ctx,
                "bindings",
                &BindingsNode {
                    decl,
                    kind: BindingsKind::Message,
                },
                Capability::Bindings,
            )?),
            None => None,
        };

        Ok(Rc::new(Message {
            id: ctx.here(),
            name,
            raw_name: ctx.path.top_segment().to_owned(),
            title: self.title.clone(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            content_type,
            payload,
            headers,
            correlation_id,
            bindings,
        }))
    }
}
