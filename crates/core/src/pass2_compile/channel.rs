use super::{compile_at, entity_name, link_child, placeholder, user_ref, BindingsNode, Compile};
use crate::context::CompileContext;
use crate::document::{ChannelDecl, OperationDecl};
use crate::error::CompileError;
use crate::model::{BindingsKind, Capability, Channel, ObjectKind, Operation, OperationKind, Renderer};
use crate::path::FrameTag;
use std::rc::Rc;

impl Compile for ChannelDecl {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError> {
        let key = ctx.path.top_segment().to_owned();
        let in_component = ctx.path.in_component();

        if self.x_ignore || !ctx.options.channels.accepts(&key) {
            return Ok(placeholder(ctx, ObjectKind::Channel));
        }
        if let Some(raw) = &self.reference {
            return user_ref(ctx, raw, Capability::Channel, false);
        }

        let name = entity_name(ctx, self.x_name.as_deref());

        let mut parameters = Vec::with_capacity(self.parameters.len());
        if !self.parameters.is_empty() {
            ctx.within("parameters", &[], |ctx| {
                for (param_name, decl) in &self.parameters {
                    let prm = ctx.child_promise(&[param_name], Capability::Parameter);
                    compile_at(ctx, param_name, &[FrameTag::Declaration], decl)?;
                    parameters.push((param_name.clone(), prm));
                }
                Ok(())
            })?;
        }

        let bindings = match &self.bindings {
            Some(decl) => Some(link_child(
                ctx,
                "bindings",
                &BindingsNode {
                    decl,
                    kind: BindingsKind::Channel,
                },
                Capability::Bindings,
            )?),
            None => None,
        };

        let publish = compile_operation(ctx, OperationKind::Publish, self.publish.as_ref())?;
        let subscribe = compile_operation(ctx, OperationKind::Subscribe, self.subscribe.as_ref())?;

        // One protocol contribution per protocol the channel is served over.
        let mut served: Vec<String> = Vec::new();
        for server in ctx.storage.active_servers() {
            let listed = self.servers.is_empty() || self.servers.contains(&server.name);
            if listed && !served.contains(&server.protocol) {
                served.push(server.protocol.clone());
            }
        }
        let protocols = ctx.protocols;
        let mut proto = Vec::new();
        for protocol in &served {
            if let Some(builder) = protocols.get(protocol) {
                log::trace!("channel {} served over {}", name, protocol);
                proto.push(builder.build_channel(ctx, self, &name)?);
            }
        }

        Ok(Rc::new(Channel {
            id: ctx.here(),
            name,
            raw_name: key,
            direct_render: !in_component,
            description: self.description.clone(),
            servers: self.servers.clone(),
            parameters,
            bindings,
            publish,
            subscribe,
            proto,
        }))
    }
}

fn compile_operation(
    ctx: &mut CompileContext<'_>,
    kind: OperationKind,
    decl: Option<&OperationDecl>,
) -> Result<Option<Operation>, CompileError> {
    let Some(decl) = decl else {
        return Ok(None);
    };
    if decl.x_ignore {
        log::debug!("{} operation of {} is ignored", kind.as_str(), ctx.path);
        return Ok(None);
    }
    ctx.within(kind.as_str(), &[], |ctx| {
        let message = match &decl.message {
            Some(msg) => Some(link_child(ctx, "message", msg, Capability::Message)?),
            None => None,
        };
        let bindings = match &decl.bindings {
            Some(b) => Some(link_child(
                ctx,
                "bindings",
                &BindingsNode {
                    decl: b,
                    kind: BindingsKind::Operation,
                },
                Capability::Bindings,
            )?),
            None => None,
        };
        Ok(Some(Operation {
            kind,
            operation_id: decl.operation_id.clone(),
            summary: decl.summary.clone(),
            message,
            bindings,
        }))
    })
}
