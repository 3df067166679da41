//! The path cursor: where in the document compilation currently is.

use crate::reference::Reference;
use std::collections::BTreeSet;
use std::fmt;

/// Boolean tags attached to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameTag {
    /// Set on the `components` frame. Everything below is only emitted when
    /// referenced (servers) or emitted as a reusable declaration (schemas).
    Component,
    /// Set on a frame that is a named entry of a section map
    /// (`servers/<name>`, `components/schemas/<name>`, ...), as opposed to a
    /// structural field such as `payload` or `properties/<name>`.
    Declaration,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub segment: String,
    pub tags: BTreeSet<FrameTag>,
}

/// An ordered stack of frames for one document.
#[derive(Debug, Clone)]
pub struct PathCursor {
    document: String,
    frames: Vec<Frame>,
}

impl PathCursor {
    pub fn new(document: impl Into<String>) -> Self {
        PathCursor {
            document: document.into(),
            frames: Vec::new(),
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn push(&mut self, segment: impl Into<String>, tags: &[FrameTag]) {
        self.frames.push(Frame {
            segment: segment.into(),
            tags: tags.iter().copied().collect(),
        });
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Segment of the innermost frame, empty at the document root.
    pub fn top_segment(&self) -> &str {
        self.top().map(|f| f.segment.as_str()).unwrap_or("")
    }

    pub fn top_has(&self, tag: FrameTag) -> bool {
        self.top().is_some_and(|f| f.tags.contains(&tag))
    }

    /// True when any frame on the stack carries `tag`.
    pub fn has(&self, tag: FrameTag) -> bool {
        self.frames.iter().any(|f| f.tags.contains(&tag))
    }

    pub fn in_component(&self) -> bool {
        self.has(FrameTag::Component)
    }

    /// Reference to the current location.
    pub fn reference(&self) -> Reference {
        Reference::new(
            self.document.clone(),
            self.frames.iter().map(|f| f.segment.clone()).collect(),
        )
    }

    /// Reference to a location below the current one.
    pub fn reference_to(&self, extra: &[&str]) -> Reference {
        let mut reference = self.reference();
        reference
            .segments
            .extend(extra.iter().map(|s| (*s).to_owned()));
        reference
    }
}

impl fmt::Display for PathCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.reference().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_tracks_reference() {
        let mut cursor = PathCursor::new("");
        cursor.push("components", &[FrameTag::Component]);
        cursor.push("servers", &[]);
        cursor.push("prod", &[FrameTag::Declaration]);
        assert_eq!(cursor.to_string(), "#/components/servers/prod");
        assert!(cursor.in_component());
        assert!(cursor.top_has(FrameTag::Declaration));
        assert_eq!(cursor.top_segment(), "prod");

        assert_eq!(
            cursor.reference_to(&["variables", "port"]).to_string(),
            "#/components/servers/prod/variables/port"
        );

        cursor.pop();
        cursor.pop();
        cursor.pop();
        assert_eq!(cursor.depth(), 0);
        assert!(!cursor.in_component());
        assert_eq!(cursor.top_segment(), "");
    }

    #[test]
    fn external_document_prefix() {
        let mut cursor = PathCursor::new("common.json");
        cursor.push("channels", &[]);
        cursor.push("a/b", &[FrameTag::Declaration]);
        assert_eq!(cursor.to_string(), "common.json#/channels/a~1b");
    }
}
