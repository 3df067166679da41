//! Pass 2: the depth-first tree walk.
//!
//! Every declaration type implements [`Compile`]. The cursor is positioned
//! on the declaration's own frame when `compile` runs; the caller registers
//! whatever it returns at that location. Cross-references become promises
//! and are left for pass 3.

mod bindings;
mod channel;
mod correlation_id;
mod message;
mod parameter;
mod schema;
mod server;
mod server_variable;

pub(crate) use bindings::BindingsNode;
pub use correlation_id::parse_location;

use crate::context::CompileContext;
use crate::document::{BindingsDecl, Document};
use crate::error::CompileError;
use crate::model::{
    BindingsKind, Capability, MessageIndex, ObjectKind, Placeholder, Promise, Renderer,
};
use crate::path::FrameTag;
use crate::reference::ObjectKey;
use crate::storage::{ActiveChannel, ActiveServer};
use indexmap::IndexMap;
use std::rc::Rc;

/// Key the message index is registered under, at the root document.
pub const MESSAGE_INDEX_NAME: &str = "$messages";

/// One entity compiler.
pub trait Compile {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError>;
}

/// Walk one document: active-channel pre-scan, then `servers`, `channels`
/// and `components`, in that order.
pub fn walk(ctx: &mut CompileContext<'_>, doc: &Document) -> Result<(), CompileError> {
    let document = ctx.path.document().to_owned();
    log::debug!("pass 2: walking document '{}'", document);
    ctx.storage.mark_walked(document.clone());

    if ctx.storage.default_content_type().is_none() {
        let content_type = ctx
            .options
            .default_content_type
            .clone()
            .or_else(|| doc.default_content_type.clone());
        ctx.storage.set_default_content_type(content_type);
    }

    // Only the root document contributes servers and channels to bind.
    if document.is_empty() {
        prescan(ctx, doc);
    }

    compile_section(ctx, "servers", &[], &doc.servers)?;
    compile_section(ctx, "channels", &[], &doc.channels)?;

    if let Some(components) = &doc.components {
        ctx.within("components", &[FrameTag::Component], |ctx| {
            compile_section(ctx, "servers", &[], &components.servers)?;
            compile_section(ctx, "serverVariables", &[], &components.server_variables)?;
            compile_section(ctx, "channels", &[], &components.channels)?;
            compile_section(ctx, "parameters", &[], &components.parameters)?;
            compile_section(ctx, "messages", &[], &components.messages)?;
            compile_section(ctx, "correlationIds", &[], &components.correlation_ids)?;
            compile_section(ctx, "schemas", &[], &components.schemas)?;
            compile_bindings_section(
                ctx,
                "serverBindings",
                BindingsKind::Server,
                &components.server_bindings,
            )?;
            compile_bindings_section(
                ctx,
                "channelBindings",
                BindingsKind::Channel,
                &components.channel_bindings,
            )?;
            compile_bindings_section(
                ctx,
                "operationBindings",
                BindingsKind::Operation,
                &components.operation_bindings,
            )?;
            compile_bindings_section(
                ctx,
                "messageBindings",
                BindingsKind::Message,
                &components.message_bindings,
            )
        })?;
    }
    Ok(())
}

/// Register the message index once every document has been walked.
pub fn finish(ctx: &mut CompileContext<'_>) -> Result<(), CompileError> {
    if !ctx.options.messages.enable {
        log::debug!("messages disabled, no message index");
        return Ok(());
    }
    ctx.within(MESSAGE_INDEX_NAME, &[], |ctx| {
        let messages = ctx.list_promise(
            Box::new(|obj: &dyn Renderer, _: &ObjectKey| {
                obj.kind() == ObjectKind::Message && !obj.is_placeholder()
            }),
            "every compiled message",
            Capability::Message,
        );
        let index = MessageIndex {
            id: ctx.here(),
            default_content_type: ctx.storage.default_content_type().map(str::to_owned),
            messages,
        };
        ctx.register(Rc::new(index))
    })
}

/// Channels and servers visible before the walk reaches them.
fn prescan(ctx: &mut CompileContext<'_>, doc: &Document) {
    for (name, decl) in &doc.servers {
        if decl.x_ignore || decl.reference.is_some() || !ctx.options.servers.accepts(name) {
            continue;
        }
        ctx.storage.add_active_server(ActiveServer {
            name: name.clone(),
            protocol: decl.protocol.clone(),
        });
    }
    for (name, decl) in &doc.channels {
        if decl.x_ignore || !ctx.options.channels.accepts(name) {
            continue;
        }
        ctx.storage.add_active_channel(ActiveChannel {
            document: String::new(),
            name: name.clone(),
            servers: decl.servers.clone(),
        });
    }
}

fn compile_section<T: Compile>(
    ctx: &mut CompileContext<'_>,
    section: &str,
    tags: &[FrameTag],
    entries: &IndexMap<String, T>,
) -> Result<(), CompileError> {
    if entries.is_empty() {
        return Ok(());
    }
    ctx.within(section, tags, |ctx| {
        for (name, decl) in entries {
            compile_at(ctx, name, &[FrameTag::Declaration], decl)?;
        }
        Ok(())
    })
}

fn compile_bindings_section(
    ctx: &mut CompileContext<'_>,
    section: &str,
    kind: BindingsKind,
    entries: &IndexMap<String, BindingsDecl>,
) -> Result<(), CompileError> {
    let nodes: IndexMap<String, BindingsNode<'_>> = entries
        .iter()
        .map(|(name, decl)| (name.clone(), BindingsNode { decl, kind }))
        .collect();
    compile_section(ctx, section, &[], &nodes)
}

/// Compile `decl` one frame below the cursor and register the result there.
pub(crate) fn compile_at<T: Compile + ?Sized>(
    ctx: &mut CompileContext<'_>,
    segment: &str,
    tags: &[FrameTag],
    decl: &T,
) -> Result<(), CompileError> {
    ctx.within(segment, tags, |ctx| {
        log::trace!("compile {}", ctx.path);
        let object = decl.compile(ctx)?;
        ctx.register(object)
    })
}

/// Link a child declaration: promise to the child location, then compile the
/// child there.
pub(crate) fn link_child<T: Compile + ?Sized>(
    ctx: &mut CompileContext<'_>,
    segment: &str,
    decl: &T,
    requires: Capability,
) -> Result<Rc<Promise>, CompileError> {
    let prm = ctx.child_promise(&[segment], requires);
    compile_at(ctx, segment, &[], decl)?;
    Ok(prm)
}

/// Inert stand-in registered in place of an ignored entity.
pub(crate) fn placeholder(ctx: &CompileContext<'_>, kind: ObjectKind) -> Rc<dyn Renderer> {
    log::debug!("{} at {} is ignored", kind, ctx.path);
    Rc::new(Placeholder::new(ctx.here(), kind))
}

/// Promise for an explicit `$ref`. Direct-rendered promises emit their
/// target as a declaration even when the target itself is not direct.
pub(crate) fn user_ref(
    ctx: &mut CompileContext<'_>,
    raw: &str,
    requires: Capability,
    direct_render: bool,
) -> Result<Rc<dyn Renderer>, CompileError> {
    let prm = ctx.user_promise(raw, requires)?.with_direct_render(direct_render);
    let prm: Rc<dyn Renderer> = ctx.track(prm);
    Ok(prm)
}

/// Name of the entity at the cursor: the explicit name when given, the map
/// key for a declaration, otherwise an identifier built from the path below
/// the section (`channels/user~1signedup/publish/message` becomes
/// `UserSignedupPublishMessage`).
pub(crate) fn entity_name(ctx: &CompileContext<'_>, explicit: Option<&str>) -> String {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return name.to_owned();
    }
    if ctx.path.top_has(FrameTag::Declaration) {
        return ctx.path.top_segment().to_owned();
    }
    let reference = ctx.path.reference();
    let mut segments = reference.segments.as_slice();
    if segments.first().map(String::as_str) == Some("components") {
        segments = &segments[1..];
    }
    segments
        .iter()
        .skip(1)
        .map(|s| identifier(s))
        .collect()
}

fn identifier(segment: &str) -> String {
    segment
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompileOptions;
    use crate::protocol::ProtocolRegistry;
    use crate::storage::Storage;

    #[test]
    fn inline_names_come_from_the_path() {
        let mut storage = Storage::new();
        let options = CompileOptions::default();
        let protocols = ProtocolRegistry::new();
        let mut ctx = CompileContext::new("", &mut storage, &options, &protocols);
        ctx.path.push("channels", &[]);
        ctx.path.push("user/signedup", &[FrameTag::Declaration]);
        assert_eq!(entity_name(&ctx, None), "user/signedup");
        assert_eq!(entity_name(&ctx, Some("UserSignedUp")), "UserSignedUp");
        ctx.path.push("publish", &[]);
        ctx.path.push("message", &[]);
        assert_eq!(entity_name(&ctx, None), "UserSignedupPublishMessage");
    }

    #[test]
    fn component_prefix_is_skipped() {
        let mut storage = Storage::new();
        let options = CompileOptions::default();
        let protocols = ProtocolRegistry::new();
        let mut ctx = CompileContext::new("", &mut storage, &options, &protocols);
        ctx.path.push("components", &[FrameTag::Component]);
        ctx.path.push("messages", &[]);
        ctx.path.push("light_measured", &[FrameTag::Declaration]);
        ctx.path.push("payload", &[]);
        assert_eq!(entity_name(&ctx, None), "LightMeasuredPayload");
    }
}
