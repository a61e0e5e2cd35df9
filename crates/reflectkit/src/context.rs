//! Reflection Context
//!
//! The context is the explicit singleton service that owns all reflection
//! state: the class table, the metadata store, the attribute registry, and
//! the strict-usage flag. A process-wide default lives behind
//! [`Reflection::global`]; tests construct isolated instances with
//! [`Reflection::new`] for deterministic state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::attribute::AttributeRegistry;
use crate::declaration::{ClassDecl, ClassId};
use crate::metadata::MetadataStore;
use crate::reflection::ReflectionClass;
use crate::{ReflectError, ReflectResult};

static GLOBAL: Lazy<Reflection> = Lazy::new(Reflection::new);

#[derive(Default)]
struct ClassTable {
    by_id: FxHashMap<ClassId, Arc<ClassDecl>>,
    by_name: FxHashMap<String, ClassId>,
    next_id: usize,
}

/// Owns the class table, metadata store, attribute registry, and strict flag.
pub struct Reflection {
    classes: RwLock<ClassTable>,
    metadata: MetadataStore,
    attributes: AttributeRegistry,
    strict: AtomicBool,
}

impl Default for Reflection {
    fn default() -> Self {
        Self::new()
    }
}

impl Reflection {
    /// Creates an empty context. Strict usage checking starts enabled.
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(ClassTable::default()),
            metadata: MetadataStore::new(),
            attributes: AttributeRegistry::new(),
            strict: AtomicBool::new(true),
        }
    }

    /// The process-wide default context.
    pub fn global() -> &'static Reflection {
        &GLOBAL
    }

    /// Registers a declaration built by
    /// [`ClassBuilder`](crate::declaration::ClassBuilder). The closure
    /// receives the assigned identity so the declaration can embed it.
    pub(crate) fn insert_class(
        &self,
        build: impl FnOnce(ClassId) -> ClassDecl,
    ) -> ReflectResult<ClassId> {
        let mut table = self.classes.write();

        let id = ClassId(table.next_id);
        let decl = build(id);

        if table.by_name.contains_key(decl.name()) {
            return Err(ReflectError::DuplicateClass(decl.name().to_string()));
        }

        tracing::debug!(class = decl.name(), id = id.index(), "class registered");

        table.next_id += 1;
        table.by_name.insert(decl.name().to_string(), id);
        table.by_id.insert(id, Arc::new(decl));

        Ok(id)
    }

    /// The raw declaration for a class.
    pub fn decl(&self, id: ClassId) -> ReflectResult<Arc<ClassDecl>> {
        self.classes
            .read()
            .by_id
            .get(&id)
            .cloned()
            .ok_or(ReflectError::UnknownClass(id))
    }

    /// Builds a reflection facade for a class.
    ///
    /// Facade caches are compute-once and never invalidated; build a fresh
    /// facade to observe later registrations.
    pub fn class(&self, id: ClassId) -> ReflectResult<ReflectionClass<'_>> {
        Ok(ReflectionClass::new(self, self.decl(id)?))
    }

    /// Builds a reflection facade for a class found by name.
    pub fn class_by_name(&self, name: &str) -> Option<ReflectionClass<'_>> {
        let id = *self.classes.read().by_name.get(name)?;
        self.class(id).ok()
    }

    /// The name of a registered class.
    pub fn class_name(&self, id: ClassId) -> Option<String> {
        self.classes
            .read()
            .by_id
            .get(&id)
            .map(|decl| decl.name().to_string())
    }

    /// Whether a class is registered.
    pub fn contains(&self, id: ClassId) -> bool {
        self.classes.read().by_id.contains_key(&id)
    }

    /// Number of registered classes.
    pub fn class_count(&self) -> usize {
        self.classes.read().by_id.len()
    }

    /// The context's metadata store.
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// The context's attribute registry.
    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attributes
    }

    /// Toggles strict usage checking. When enabled (the default), applying
    /// an attribute to a target kind its handler does not implement is an
    /// error; when disabled, the attachment silently no-ops.
    pub fn set_strict(&self, enabled: bool) {
        self.strict.store(enabled, Ordering::Relaxed);
    }

    /// Whether strict usage checking is enabled.
    pub fn is_strict(&self) -> bool {
        self.strict.load(Ordering::Relaxed)
    }

    /// Clears every class, all metadata, and all attribute applications,
    /// and restores strict checking. Intended for test isolation.
    pub fn reset(&self) {
        let mut table = self.classes.write();
        table.by_id.clear();
        table.by_name.clear();
        table.next_id = 0;
        drop(table);

        self.metadata.clear();
        self.attributes.clear();
        self.strict.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ClassBuilder;

    #[test]
    fn test_register_and_lookup() {
        let rx = Reflection::new();
        let id = ClassBuilder::new("Widget").register(&rx).unwrap();

        assert!(rx.contains(id));
        assert_eq!(rx.class_count(), 1);
        assert_eq!(rx.class_name(id), Some("Widget".to_string()));
        assert_eq!(rx.class(id).unwrap().name(), "Widget");
        assert!(rx.class_by_name("Widget").is_some());
        assert!(rx.class_by_name("Unknown").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let rx = Reflection::new();
        ClassBuilder::new("Widget").register(&rx).unwrap();

        let err = ClassBuilder::new("Widget").register(&rx).unwrap_err();
        assert!(matches!(err, ReflectError::DuplicateClass(name) if name == "Widget"));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let rx = Reflection::new();
        let err = ClassBuilder::new("Child")
            .extends(ClassId(99))
            .register(&rx)
            .unwrap_err();
        assert!(matches!(err, ReflectError::UnknownClass(ClassId(99))));
    }

    #[test]
    fn test_unknown_class_lookup() {
        let rx = Reflection::new();
        assert!(matches!(
            rx.class(ClassId(7)),
            Err(ReflectError::UnknownClass(ClassId(7)))
        ));
    }

    #[test]
    fn test_strict_flag() {
        let rx = Reflection::new();
        assert!(rx.is_strict());
        rx.set_strict(false);
        assert!(!rx.is_strict());
    }

    #[test]
    fn test_reset() {
        let rx = Reflection::new();
        let id = ClassBuilder::new("Widget").register(&rx).unwrap();
        rx.metadata().define(id, "key", serde_json::json!(1));
        rx.set_strict(false);

        rx.reset();

        assert_eq!(rx.class_count(), 0);
        assert_eq!(rx.metadata().target_count(), 0);
        assert!(rx.attributes().is_empty());
        assert!(rx.is_strict());

        // Identity assignment restarts.
        let id = ClassBuilder::new("Widget").register(&rx).unwrap();
        assert_eq!(id.index(), 0);
    }
}
