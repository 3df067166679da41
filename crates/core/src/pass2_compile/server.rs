use super::{compile_at, link_child, placeholder, user_ref, BindingsNode, Compile};
use crate::context::CompileContext;
use crate::document::ServerDecl;
use crate::error::CompileError;
use crate::model::{BindingsKind, Capability, ObjectKind, Renderer, Server};
use crate::path::FrameTag;
use std::rc::Rc;

impl Compile for ServerDecl {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError> {
        let key = ctx.path.top_segment().to_owned();
        // Only top-level servers of the root document are emitted on their own
        // and count toward the protocols in use.
        let standalone = !ctx.path.in_component() && ctx.path.document().is_empty();

        if self.x_ignore || !ctx.options.servers.accepts(&key) {
            return Ok(placeholder(ctx, ObjectKind::Server));
        }
        if let Some(raw) = &self.reference {
            // A root `servers` entry pointing into components is what makes
            // the component server appear in the output.
            return user_ref(ctx, raw, Capability::Server, standalone);
        }

        let name = self.x_name.clone().unwrap_or_else(|| key.clone());

        let attached: Vec<_> = ctx
            .storage
            .active_channels()
            .iter()
            .filter(|c| c.attaches_to(&key))
            .map(|c| c.reference())
            .collect();
        let channels = attached
            .into_iter()
            .map(|r| ctx.internal_promise(r, Capability::Channel))
            .collect();

        let bindings = match &self.bindings {
            Some(decl) => Some(link_child(
                ctx,
                "bindings",
                &BindingsNode {
                    decl,
                    kind: BindingsKind::Server,
                },
                Capability::Bindings,
            )?),
            None => None,
        };

        let mut variables = Vec::with_capacity(self.variables.len());
        if !self.variables.is_empty() {
            ctx.within("variables", &[], |ctx| {
                for (var_name, decl) in &self.variables {
                    let prm = ctx.child_promise(&[var_name], Capability::ServerVariable);
                    compile_at(ctx, var_name, &[FrameTag::Declaration], decl)?;
                    variables.push((var_name.clone(), prm));
                }
                Ok(())
            })?;
        }

        let protocols = ctx.protocols;
        let proto = match protocols.get(&self.protocol) {
            Some(builder) => {
                log::trace!("server {} uses {}", name, builder.protocol_name());
                let proto = builder.build_server(ctx, self, &name)?;
                if standalone {
                    ctx.storage.register_protocol(self.protocol.clone());
                }
                Some(proto)
            }
            None => {
                ctx.warn(
                    Some(self.protocol.as_str()),
                    format!("skip unsupported server protocol '{}'", self.protocol),
                );
                None
            }
        };

        Ok(Rc::new(Server {
            id: ctx.here(),
            name,
            raw_name: key,
            direct_render: standalone,
            url: self.url.clone(),
            protocol: self.protocol.clone(),
            protocol_version: self.protocol_version.clone(),
            description: self.description.clone(),
            variables,
            bindings,
            channels,
            proto,
        }))
    }
}
