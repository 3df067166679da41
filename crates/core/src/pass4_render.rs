//! Pass 4: JSON rendering backend.
//!
//! Emits one declaration per direct-rendered identity, in registration
//! order. Everything else appears only inside the declarations that use it.

use crate::model::Fragment;
use crate::pass3_resolve::LinkedModel;
use crate::storage::ActiveChannel;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    pub identity: String,
    pub kind: String,
    pub definition: Fragment,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedModel {
    pub declarations: Vec<Declaration>,
    /// Runtime support modules the output needs.
    pub protocols: Vec<String>,
    pub active_channels: Vec<ActiveChannel>,
    #[serde(skip)]
    pub definitions_rendered: usize,
    #[serde(skip)]
    pub usages_rendered: usize,
}

impl RenderedModel {
    pub fn declaration(&self, identity: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.identity == identity)
    }
}

pub fn render(model: &LinkedModel) -> RenderedModel {
    let mut ctx = model.render_context();
    let mut seen = HashSet::new();
    let mut declarations = Vec::new();

    for entry in model.objects() {
        let object = entry.object.as_ref();
        if !object.is_directly_rendered() || object.is_placeholder() {
            continue;
        }
        let identity = object.identity();
        if !seen.insert(identity.clone()) {
            log::trace!("{} already declared", identity);
            continue;
        }
        let definition = ctx.definition(object);
        declarations.push(Declaration {
            identity,
            kind: object.kind().to_string(),
            definition,
        });
    }
    log::debug!(
        "pass 4: {} declarations, {} usage sites",
        declarations.len(),
        ctx.usages_rendered()
    );

    RenderedModel {
        declarations,
        protocols: model.protocols().iter().cloned().collect(),
        active_channels: model.active_channels().to_vec(),
        definitions_rendered: ctx.definitions_rendered(),
        usages_rendered: ctx.usages_rendered(),
    }
}
