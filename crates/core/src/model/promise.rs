//! Promises: placeholders for objects supplied later by the resolution pass.

use super::{Capability, Fragment, ObjectKind, RenderContext, Renderer};
use crate::reference::{ObjectKey, Reference};
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

/// Who asked for the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseOrigin {
    /// An explicit `$ref` written by the document author.
    User,
    /// Synthesized by a compiler step (links to child nodes, active channels).
    Internal,
}

/// Structural match used instead of a reference string.
pub type Matcher = Box<dyn Fn(&dyn Renderer, &ObjectKey) -> bool>;

enum Locator {
    Reference(Reference),
    Predicate { matcher: Matcher, description: String },
}

/// A scalar promise. Assigned exactly once by the resolution pass.
pub struct Promise {
    locator: Locator,
    origin: PromiseOrigin,
    requires: Capability,
    direct_render: bool,
    assign_note: Option<String>,
    created_at: String,
    target: OnceCell<Rc<dyn Renderer>>,
}

impl Promise {
    pub fn by_reference(
        reference: Reference,
        origin: PromiseOrigin,
        requires: Capability,
        created_at: impl Into<String>,
    ) -> Self {
        Promise {
            locator: Locator::Reference(reference),
            origin,
            requires,
            direct_render: false,
            assign_note: None,
            created_at: created_at.into(),
            target: OnceCell::new(),
        }
    }

    /// Predicate promises are always internal; a match is structurally
    /// guaranteed wherever one is created.
    pub fn matching(
        matcher: Matcher,
        description: impl Into<String>,
        requires: Capability,
        created_at: impl Into<String>,
    ) -> Self {
        Promise {
            locator: Locator::Predicate {
                matcher,
                description: description.into(),
            },
            origin: PromiseOrigin::Internal,
            requires,
            direct_render: false,
            assign_note: None,
            created_at: created_at.into(),
            target: OnceCell::new(),
        }
    }

    /// Emit the target as a declaration through this promise. Only set it
    /// when the target itself is not direct-rendered, or the declaration
    /// appears twice.
    pub fn with_direct_render(mut self, direct: bool) -> Self {
        self.direct_render = direct;
        self
    }

    /// Extra text for the panic raised on a capability mismatch.
    pub fn with_assign_note(mut self, note: impl Into<String>) -> Self {
        self.assign_note = Some(note.into());
        self
    }

    pub fn reference(&self) -> Option<&Reference> {
        match &self.locator {
            Locator::Reference(r) => Some(r),
            Locator::Predicate { .. } => None,
        }
    }

    pub fn matcher(&self) -> Option<(&Matcher, &str)> {
        match &self.locator {
            Locator::Predicate {
                matcher,
                description,
            } => Some((matcher, description)),
            Locator::Reference(_) => None,
        }
    }

    /// The reference string, or the predicate description.
    pub fn describe(&self) -> String {
        match &self.locator {
            Locator::Reference(r) => r.to_string(),
            Locator::Predicate { description, .. } => description.clone(),
        }
    }

    pub fn origin(&self) -> PromiseOrigin {
        self.origin
    }

    pub fn requires(&self) -> Capability {
        self.requires
    }

    /// Path of the cursor when the promise was created.
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn is_assigned(&self) -> bool {
        self.target.get().is_some()
    }

    pub fn resolved(&self) -> Option<&Rc<dyn Renderer>> {
        self.target.get()
    }

    /// The assigned object.
    ///
    /// # Panics
    /// When called before the resolution pass assigned the promise.
    pub fn target(&self) -> &Rc<dyn Renderer> {
        match self.target.get() {
            Some(t) => t,
            None => panic!(
                "promise {} created at {} read before resolution",
                self.describe(),
                self.created_at
            ),
        }
    }

    /// # Panics
    /// When `obj` does not satisfy the required capability, or the promise
    /// is already assigned. Both are compiler bugs, not document errors.
    pub(crate) fn assign(&self, obj: Rc<dyn Renderer>) {
        let kind = obj.kind();
        if !self.requires.accepts(kind) {
            panic!(
                "cannot assign {} object {} to promise {} created at {}: requires {}{}",
                kind,
                obj.identity(),
                self.describe(),
                self.created_at,
                self.requires,
                self.assign_note
                    .as_deref()
                    .map(|n| format!(". {}", n))
                    .unwrap_or_default()
            );
        }
        if self.target.set(obj).is_err() {
            panic!("promise {} assigned twice", self.describe());
        }
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("locator", &self.describe())
            .field("origin", &self.origin)
            .field("requires", &self.requires)
            .field("assigned", &self.is_assigned())
            .finish()
    }
}

impl Renderer for Promise {
    fn kind(&self) -> ObjectKind {
        self.target
            .get()
            .map(|t| t.kind())
            .unwrap_or(ObjectKind::Promise)
    }

    fn is_directly_rendered(&self) -> bool {
        // Never the target's flag: the target is emitted on its own.
        self.direct_render
    }

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment {
        self.target().render_definition(ctx)
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        if self.direct_render {
            return super::usage(self, ctx);
        }
        self.target().render_usage(ctx)
    }

    fn identity(&self) -> String {
        self.target
            .get()
            .map(|t| t.identity())
            .unwrap_or_default()
    }

    fn as_promise(&self) -> Option<&Promise> {
        Some(self)
    }

    fn is_placeholder(&self) -> bool {
        self.target.get().is_some_and(|t| t.is_placeholder())
    }
}

/// Resolves to every registered object matching a predicate, in
/// registration order. Never fails; the result may be empty.
pub struct ListPromise {
    matcher: Matcher,
    description: String,
    requires: Capability,
    created_at: String,
    targets: OnceCell<Vec<Rc<dyn Renderer>>>,
}

impl ListPromise {
    pub fn new(
        matcher: Matcher,
        description: impl Into<String>,
        requires: Capability,
        created_at: impl Into<String>,
    ) -> Self {
        ListPromise {
            matcher,
            description: description.into(),
            requires,
            created_at: created_at.into(),
            targets: OnceCell::new(),
        }
    }

    pub fn matches(&self, obj: &dyn Renderer, key: &ObjectKey) -> bool {
        (self.matcher)(obj, key)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn is_assigned(&self) -> bool {
        self.targets.get().is_some()
    }

    /// # Panics
    /// When called before the resolution pass.
    pub fn targets(&self) -> &[Rc<dyn Renderer>] {
        match self.targets.get() {
            Some(t) => t,
            None => panic!(
                "list promise '{}' created at {} read before resolution",
                self.description, self.created_at
            ),
        }
    }

    pub(crate) fn assign(&self, objs: Vec<Rc<dyn Renderer>>) {
        if let Some(bad) = objs.iter().find(|o| !self.requires.accepts(o.kind())) {
            panic!(
                "cannot assign {} object {} to list promise '{}': requires {}",
                bad.kind(),
                bad.identity(),
                self.description,
                self.requires
            );
        }
        if self.targets.set(objs).is_err() {
            panic!("list promise '{}' assigned twice", self.description);
        }
    }
}

impl fmt::Debug for ListPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListPromise")
            .field("description", &self.description)
            .field("requires", &self.requires)
            .field("targets", &self.targets.get().map(Vec::len))
            .finish()
    }
}

impl Renderer for ListPromise {
    fn kind(&self) -> ObjectKind {
        ObjectKind::List
    }

    fn is_directly_rendered(&self) -> bool {
        false
    }

    fn render_definition(&self, ctx: &mut RenderContext) -> Fragment {
        self.render_usage(ctx)
    }

    fn render_usage(&self, ctx: &mut RenderContext) -> Fragment {
        let items = self
            .targets()
            .iter()
            .map(|t| t.render_usage(ctx))
            .collect();
        Fragment::Array(items)
    }

    fn identity(&self) -> String {
        format!("list:{}", self.description)
    }
}
