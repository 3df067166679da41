#![allow(clippy::result_large_err)]
//! asyncgen-core: AsyncAPI document to linked, render-ready model.
//!
//! Four passes, chained by [`compile`]:
//!
//! 1. [`pass1_load`] reads and decodes documents into the [`document`] tree.
//! 2. [`pass2_compile`] walks the tree, registering compiled objects in
//!    [`storage::Storage`] and leaving promises for every cross-reference.
//! 3. [`pass3_resolve`] links every promise and returns a
//!    [`pass3_resolve::LinkedModel`].
//! 4. [`pass4_render`] renders the linked model through the
//!    [`model::Renderer`] capability.
//!
//! Protocol-specific behavior lives in [`protocol`] builders.

pub mod compile;
pub mod context;
pub mod document;
pub mod error;
pub mod model;
pub mod options;
pub mod pass1_load;
pub mod pass2_compile;
pub mod pass3_resolve;
pub mod pass4_render;
pub mod path;
pub mod protocol;
pub mod reference;
pub mod source;
pub mod storage;

// ── Convenience re-exports: key types ────────────────────────────────

pub use document::Document;
pub use error::{CompileError, Diagnostic, Severity};
pub use model::{Capability, ObjectKind, Renderer};
pub use options::{CompileOptions, EntityOptions};
pub use pass3_resolve::LinkedModel;
pub use pass4_render::RenderedModel;
pub use protocol::{ProtocolBuilder, ProtocolRegistry};
pub use reference::{ObjectKey, Reference};
pub use source::{DocumentProvider, FileSystemProvider, InMemoryProvider};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use compile::{compile_bundle, compile_document, compile_file, CompileOutput};
pub use pass3_resolve::resolve;
pub use pass4_render::render;
