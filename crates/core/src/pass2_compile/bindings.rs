use super::{entity_name, user_ref, Compile};
use crate::context::CompileContext;
use crate::document::BindingsDecl;
use crate::error::CompileError;
use crate::model::{Bindings, BindingsKind, Capability, Renderer};
use crate::path::FrameTag;
use std::rc::Rc;

/// A bindings container together with the entity kind it belongs to, which
/// selects the builder hook.
pub(crate) struct BindingsNode<'d> {
    pub decl: &'d BindingsDecl,
    pub kind: BindingsKind,
}

impl Compile for BindingsNode<'_> {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError> {
        if let Some(raw) = &self.decl.reference {
            return user_ref(ctx, raw, Capability::Bindings, false);
        }

        let mut values = Vec::new();
        let mut schema_values = Vec::new();
        let protocols = ctx.protocols;
        for (protocol, raw) in &self.decl.protocols {
            let Some(builder) = protocols.get(protocol) else {
                ctx.warn(
                    Some(protocol.as_str()),
                    format!("skip bindings for unsupported protocol '{}'", protocol),
                );
                continue;
            };
            log::trace!("{} bindings for {}", self.kind.as_str(), protocol);
            let out = match self.kind {
                BindingsKind::Server => builder.build_server_bindings(ctx, raw)?,
                BindingsKind::Channel => builder.build_channel_bindings(ctx, raw)?,
                BindingsKind::Operation => builder.build_operation_bindings(ctx, raw)?,
                BindingsKind::Message => builder.build_message_bindings(ctx, raw)?,
            };
            if let Some(value) = out.value {
                values.push((protocol.clone(), value));
            }
            if !out.schema_fields.is_empty() {
                schema_values.push((protocol.clone(), out.schema_fields));
            }
        }

        Ok(Rc::new(Bindings {
            id: ctx.here(),
            name: entity_name(ctx, None),
            kind: self.kind,
            direct_render: ctx.path.in_component() && ctx.path.top_has(FrameTag::Declaration),
            values,
            schema_values,
        }))
    }
}
