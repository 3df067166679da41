//! Document provider abstraction.
//!
//! The [`DocumentProvider`] trait abstracts document I/O so bundles can be
//! compiled from disk or entirely from memory (tests, embedding).

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Reads documents by the name they are referenced under
/// (`common.json` in `common.json#/components/messages/x`).
pub trait DocumentProvider {
    fn read_document(&self, name: &str) -> Result<String, std::io::Error>;
}

/// Reads documents relative to a base directory, normally the directory of
/// the root document.
pub struct FileSystemProvider {
    base: PathBuf,
}

impl FileSystemProvider {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        FileSystemProvider { base: base.into() }
    }

    /// Provider for the directory holding `root`, plus the file name to
    /// load the root document under.
    pub fn for_root(root: &Path) -> (Self, String) {
        let base = root.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (FileSystemProvider::new(base), name)
    }
}

impl DocumentProvider for FileSystemProvider {
    fn read_document(&self, name: &str) -> Result<String, std::io::Error> {
        std::fs::read_to_string(self.base.join(name))
    }
}

/// Maps document names to their text.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    documents: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        InMemoryProvider::default()
    }

    pub fn with_document(mut self, name: &str, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: &str, text: impl Into<String>) {
        self.documents
            .insert(normalize_path(Path::new(name)), text.into());
    }
}

impl DocumentProvider for InMemoryProvider {
    fn read_document(&self, name: &str) -> Result<String, std::io::Error> {
        let normalized = normalize_path(Path::new(name));
        self.documents.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("document not found in memory: {}", normalized.display()),
            )
        })
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        let normalized = normalize_path(Path::new("schemas/../common/./events.json"));
        assert_eq!(normalized, PathBuf::from("common/events.json"));
    }

    #[test]
    fn in_memory_lookup_is_normalized() {
        let provider = InMemoryProvider::new().with_document("common/events.json", "{}");
        assert_eq!(
            provider.read_document("./common/events.json").unwrap(),
            "{}"
        );
    }

    #[test]
    fn in_memory_missing_document() {
        let err = InMemoryProvider::new()
            .read_document("missing.json")
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn root_splits_into_directory_and_name() {
        let (_, name) = FileSystemProvider::for_root(Path::new("/specs/api.json"));
        assert_eq!(name, "api.json");
    }
}
