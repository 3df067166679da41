//! Pass 3: promise resolution.
//!
//! Runs once, after every document has been walked, so a promise may name an
//! object declared anywhere in the bundle. Consumes the [`Storage`] and hands
//! back a [`LinkedModel`]: the only way to get a render context, which keeps
//! unassigned promises out of rendering.

use crate::error::CompileError;
use crate::model::{Promise, RenderContext, Renderer};
use crate::reference::{ObjectKey, Reference};
use crate::storage::{ActiveChannel, ActiveServer, Entry, Storage, StorageParts};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// The fully linked object graph.
#[derive(Debug)]
pub struct LinkedModel {
    entries: Vec<Entry>,
    index: HashMap<ObjectKey, usize>,
    protocols: BTreeSet<String>,
    active_channels: Vec<ActiveChannel>,
    active_servers: Vec<ActiveServer>,
}

impl LinkedModel {
    /// Every registered object, in registration order.
    pub fn objects(&self) -> &[Entry] {
        &self.entries
    }

    /// Look an object up by reference string, relative to the root document.
    pub fn lookup(&self, raw: &str) -> Option<&Rc<dyn Renderer>> {
        let key = Reference::parse(raw, "").ok()?.key()?;
        self.index.get(&key).map(|&i| &self.entries[i].object)
    }

    /// Protocols used by document-level servers.
    pub fn protocols(&self) -> &BTreeSet<String> {
        &self.protocols
    }

    pub fn active_channels(&self) -> &[ActiveChannel] {
        &self.active_channels
    }

    pub fn active_servers(&self) -> &[ActiveServer] {
        &self.active_servers
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext::new()
    }
}

/// Resolve every promise held by `storage`.
///
/// Reference promises come first, then predicate promises, then list
/// promises. The first unresolved reference, cycle or unmatched predicate
/// aborts the pass.
///
/// # Panics
/// When a resolved object lacks the capability its promise requires.
pub fn resolve(storage: Storage) -> Result<LinkedModel, CompileError> {
    let parts = storage.into_parts();
    log::debug!(
        "pass 3: {} objects, {} promises, {} list promises",
        parts.entries.len(),
        parts.promises.len(),
        parts.list_promises.len()
    );

    for prm in parts.promises.iter().filter(|p| p.reference().is_some()) {
        if prm.is_assigned() {
            continue;
        }
        let target = follow(&parts, prm)?;
        prm.assign(target);
    }

    for prm in &parts.promises {
        if prm.is_assigned() {
            continue;
        }
        let target = first_match(&parts, prm)?;
        prm.assign(target);
    }

    for list in &parts.list_promises {
        let targets: Vec<Rc<dyn Renderer>> = concrete(&parts.entries)
            .filter(|e| list.matches(e.object.as_ref(), &e.key))
            .map(|e| Rc::clone(&e.object))
            .collect();
        log::trace!("list '{}' matched {} objects", list.description(), targets.len());
        list.assign(targets);
    }

    Ok(LinkedModel {
        entries: parts.entries,
        index: parts.index,
        protocols: parts.protocols,
        active_channels: parts.active_channels,
        active_servers: parts.active_servers,
    })
}

/// Follow a chain of reference promises down to a concrete object.
fn follow(parts: &StorageParts, start: &Promise) -> Result<Rc<dyn Renderer>, CompileError> {
    let mut visited: Vec<String> = Vec::new();
    let mut current = start;
    loop {
        let Some(reference) = current.reference() else {
            return first_match(parts, current);
        };
        let raw = reference.to_string();
        if visited.contains(&raw) {
            visited.push(raw);
            return Err(CompileError::ReferenceCycle {
                path: start.created_at().to_owned(),
                chain: visited,
            });
        }
        visited.push(raw);

        let found = reference
            .key()
            .and_then(|key| parts.index.get(&key))
            .map(|&i| &parts.entries[i].object)
            .ok_or_else(|| CompileError::UnresolvedReference {
                path: current.created_at().to_owned(),
                reference: current.describe(),
            })?;

        match found.as_promise() {
            None => return Ok(Rc::clone(found)),
            Some(inner) => {
                if let Some(target) = inner.resolved() {
                    return Ok(Rc::clone(target));
                }
                current = inner;
            }
        }
    }
}

/// First concrete object, in registration order, matching a predicate promise.
fn first_match(parts: &StorageParts, prm: &Promise) -> Result<Rc<dyn Renderer>, CompileError> {
    let unmatched = || CompileError::UnmatchedPredicate {
        path: prm.created_at().to_owned(),
        description: prm.describe(),
    };
    let (matcher, _) = prm.matcher().ok_or_else(unmatched)?;
    concrete(&parts.entries)
        .find(|e| matcher(e.object.as_ref(), &e.key))
        .map(|e| Rc::clone(&e.object))
        .ok_or_else(unmatched)
}

/// Registered objects that are not promises themselves.
fn concrete(entries: &[Entry]) -> impl Iterator<Item = &Entry> {
    entries.iter().filter(|e| e.object.as_promise().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Capability, ListPromise, ObjectKind, Placeholder, PromiseOrigin};

    fn reference(raw: &str) -> Reference {
        Reference::parse(raw, "").unwrap()
    }

    fn register(storage: &mut Storage, raw: &str, object: Rc<dyn Renderer>) {
        storage.register(reference(raw).key().unwrap(), object).unwrap();
    }

    fn user_promise(target: &str, requires: Capability, at: &str) -> Rc<Promise> {
        Rc::new(Promise::by_reference(
            reference(target),
            PromiseOrigin::User,
            requires,
            at,
        ))
    }

    fn message(id: &str) -> Rc<dyn Renderer> {
        Rc::new(Placeholder::new(id, ObjectKind::Message))
    }

    #[test]
    fn forward_reference_resolves() {
        let mut storage = Storage::new();
        let prm = user_promise("#/components/messages/later", Capability::Message, "#/a");
        storage.add_promise(Rc::clone(&prm));
        register(&mut storage, "#/components/messages/later", message("later"));

        resolve(storage).unwrap();
        assert_eq!(prm.target().identity(), "later");
    }

    #[test]
    fn chains_are_followed_to_the_concrete_object() {
        let mut storage = Storage::new();
        let outer = user_promise("#/b", Capability::Message, "#/x");
        let middle = user_promise("#/c", Capability::Message, "#/b");
        storage.add_promise(Rc::clone(&outer));
        storage.add_promise(Rc::clone(&middle));
        register(&mut storage, "#/b", middle.clone());
        register(&mut storage, "#/c", message("c"));

        let model = resolve(storage).unwrap();
        assert_eq!(outer.target().identity(), "c");
        assert_eq!(middle.target().identity(), "c");
        assert!(model.lookup("#/c").is_some());
    }

    #[test]
    fn cycle_is_reported_with_its_chain() {
        let mut storage = Storage::new();
        let a = user_promise("#/b", Capability::Message, "#/a");
        let b = user_promise("#/a", Capability::Message, "#/b");
        storage.add_promise(Rc::clone(&a));
        storage.add_promise(Rc::clone(&b));
        register(&mut storage, "#/a", a);
        register(&mut storage, "#/b", b);

        let err = resolve(storage).unwrap_err();
        match err {
            CompileError::ReferenceCycle { path, chain } => {
                assert_eq!(path, "#/a");
                assert_eq!(chain, ["#/b", "#/a", "#/b"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn dangling_reference_names_reference_and_site() {
        let mut storage = Storage::new();
        storage.add_promise(user_promise(
            "#/components/messages/missing",
            Capability::Message,
            "#/channels/a/publish/message",
        ));
        let err = resolve(storage).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnresolvedReference {
                path: "#/channels/a/publish/message".into(),
                reference: "#/components/messages/missing".into(),
            }
        );
    }

    #[test]
    fn predicate_takes_first_match_in_registration_order() {
        let mut storage = Storage::new();
        register(&mut storage, "#/s/one", message("one"));
        register(&mut storage, "#/s/two", message("two"));
        let prm = Rc::new(Promise::matching(
            Box::new(|_: &dyn Renderer, key: &ObjectKey| key.scope == ["s"]),
            "anything under #/s",
            Capability::Message,
            "#/x",
        ));
        storage.add_promise(Rc::clone(&prm));
        resolve(storage).unwrap();
        assert_eq!(prm.target().identity(), "one");
    }

    #[test]
    fn unmatched_predicate_is_an_error() {
        let mut storage = Storage::new();
        storage.add_promise(Rc::new(Promise::matching(
            Box::new(|_: &dyn Renderer, _: &ObjectKey| false),
            "nothing",
            Capability::Any,
            "#/x",
        )));
        assert!(matches!(
            resolve(storage),
            Err(CompileError::UnmatchedPredicate { .. })
        ));
    }

    #[test]
    fn list_keeps_registration_order_and_skips_non_matching() {
        let mut storage = Storage::new();
        register(&mut storage, "#/m/1", message("1"));
        register(
            &mut storage,
            "#/x/1",
            Rc::new(Placeholder::new("x", ObjectKind::Schema)),
        );
        register(&mut storage, "#/m/2", message("2"));
        register(&mut storage, "#/m/3", message("3"));
        let list = Rc::new(ListPromise::new(
            Box::new(|o: &dyn Renderer, _: &ObjectKey| o.kind() == ObjectKind::Message),
            "messages",
            Capability::Message,
            "#/",
        ));
        storage.add_list_promise(Rc::clone(&list));
        resolve(storage).unwrap();
        let ids: Vec<String> = list.targets().iter().map(|t| t.identity()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    #[should_panic(expected = "requires message")]
    fn capability_mismatch_aborts_resolution() {
        let mut storage = Storage::new();
        storage.add_promise(user_promise("#/s/a", Capability::Message, "#/x"));
        register(
            &mut storage,
            "#/s/a",
            Rc::new(Placeholder::new("a", ObjectKind::Schema)),
        );
        let _ = resolve(storage);
    }
}
