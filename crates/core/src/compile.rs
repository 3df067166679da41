//! Pipeline orchestrator: chains the passes in order.

use crate::context::CompileContext;
use crate::document::Document;
use crate::error::{CompileError, Diagnostic};
use crate::options::CompileOptions;
use crate::pass1_load;
use crate::pass2_compile;
use crate::pass3_resolve::{self, LinkedModel};
use crate::protocol::ProtocolRegistry;
use crate::source::{DocumentProvider, FileSystemProvider};
use crate::storage::Storage;
use std::path::Path;

/// A linked model plus the warnings collected on the way.
#[derive(Debug)]
pub struct CompileOutput {
    pub model: LinkedModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile one already-decoded document. Nothing is loaded: references into
/// other documents surface as unresolved references.
pub fn compile_document(
    doc: &Document,
    options: &CompileOptions,
    protocols: &ProtocolRegistry,
) -> Result<CompileOutput, CompileError> {
    let mut storage = Storage::new();
    let mut diagnostics = Vec::new();
    walk_document(&mut storage, "", doc, options, protocols, &mut diagnostics)?;
    finish(&mut storage, options, protocols, &mut diagnostics)?;
    let model = pass3_resolve::resolve(storage)?;
    Ok(CompileOutput { model, diagnostics })
}

/// Compile the document `root` and every document it references, loaded
/// through `provider`. The root document is addressed as `""`; every other
/// document by the name references use for it.
pub fn compile_bundle(
    provider: &dyn DocumentProvider,
    root: &str,
    options: &CompileOptions,
    protocols: &ProtocolRegistry,
) -> Result<CompileOutput, CompileError> {
    let root_doc = pass1_load::load_document(provider, root, "")?;

    let mut storage = Storage::new();
    let mut diagnostics = Vec::new();
    walk_document(&mut storage, "", &root_doc, options, protocols, &mut diagnostics)?;

    // Walking a document can reference further documents.
    loop {
        let pending = storage.pending_documents();
        if pending.is_empty() {
            break;
        }
        for name in pending {
            let requested_at = storage.requested_at(&name).unwrap_or_default().to_owned();
            let doc = pass1_load::load_document(provider, &name, &requested_at)?;
            walk_document(&mut storage, &name, &doc, options, protocols, &mut diagnostics)?;
        }
    }

    finish(&mut storage, options, protocols, &mut diagnostics)?;
    let model = pass3_resolve::resolve(storage)?;
    Ok(CompileOutput { model, diagnostics })
}

/// [`compile_bundle`] for a document on disk; other documents are read
/// relative to its directory.
pub fn compile_file(
    path: &Path,
    options: &CompileOptions,
    protocols: &ProtocolRegistry,
) -> Result<CompileOutput, CompileError> {
    let (provider, root) = FileSystemProvider::for_root(path);
    compile_bundle(&provider, &root, options, protocols)
}

fn walk_document(
    storage: &mut Storage,
    name: &str,
    doc: &Document,
    options: &CompileOptions,
    protocols: &ProtocolRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), CompileError> {
    let mut ctx = CompileContext::new(name, storage, options, protocols);
    pass2_compile::walk(&mut ctx, doc)?;
    diagnostics.extend(ctx.into_diagnostics());
    Ok(())
}

fn finish(
    storage: &mut Storage,
    options: &CompileOptions,
    protocols: &ProtocolRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), CompileError> {
    let mut ctx = CompileContext::new("", storage, options, protocols);
    pass2_compile::finish(&mut ctx)?;
    diagnostics.extend(ctx.into_diagnostics());
    Ok(())
}
