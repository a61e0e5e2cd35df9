//! Metadata Storage
//!
//! Explicit per-declaration metadata, owned by the reflection context and
//! keyed by [`ClassId`]. Metadata can be attached to:
//! - A class directly (class-level metadata)
//! - A method on a class
//! - A property on a class
//! - A parameter on a method, addressed by `(method, index)`
//!
//! Values are arbitrary caller-chosen [`serde_json::Value`]s under string
//! keys. Entries persist for the lifetime of the context; there is no
//! eviction, since targets are static class declarations.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::declaration::ClassId;

/// A key for metadata - any string.
pub type MetadataKey = String;

type SiteMap = FxHashMap<MetadataKey, Value>;

/// Metadata recorded for a single class declaration.
#[derive(Debug, Default)]
struct ClassMetadata {
    /// Class-level metadata (key -> value).
    direct: SiteMap,
    /// Method-level metadata (method -> key -> value).
    methods: FxHashMap<String, SiteMap>,
    /// Property-level metadata (property -> key -> value).
    properties: FxHashMap<String, SiteMap>,
    /// Parameter-level metadata ((method, index) -> key -> value).
    parameters: FxHashMap<(String, usize), SiteMap>,
}

/// Per-context metadata store.
#[derive(Debug, Default)]
pub struct MetadataStore {
    targets: RwLock<FxHashMap<ClassId, ClassMetadata>>,
}

impl MetadataStore {
    /// Create a new empty metadata store.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Class-level metadata operations
    // ========================================================================

    /// Define metadata on a class.
    pub fn define(&self, class: ClassId, key: impl Into<MetadataKey>, value: Value) {
        let mut targets = self.targets.write();
        targets.entry(class).or_default().direct.insert(key.into(), value);
    }

    /// Get metadata from a class.
    pub fn get(&self, class: ClassId, key: &str) -> Option<Value> {
        self.targets.read().get(&class)?.direct.get(key).cloned()
    }

    /// Check if a class has metadata under the given key.
    pub fn has(&self, class: ClassId, key: &str) -> bool {
        self.targets
            .read()
            .get(&class)
            .is_some_and(|entry| entry.direct.contains_key(key))
    }

    /// All metadata keys on a class.
    pub fn keys(&self, class: ClassId) -> Vec<MetadataKey> {
        self.targets
            .read()
            .get(&class)
            .map(|entry| entry.direct.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All class-level metadata entries.
    pub fn all(&self, class: ClassId) -> FxHashMap<MetadataKey, Value> {
        self.targets
            .read()
            .get(&class)
            .map(|entry| entry.direct.clone())
            .unwrap_or_default()
    }

    /// Delete metadata from a class. Returns true if the entry existed.
    pub fn delete(&self, class: ClassId, key: &str) -> bool {
        self.targets
            .write()
            .get_mut(&class)
            .is_some_and(|entry| entry.direct.remove(key).is_some())
    }

    // ========================================================================
    // Method-level metadata operations
    // ========================================================================

    /// Define metadata on a method.
    pub fn define_for_method(
        &self,
        class: ClassId,
        method: &str,
        key: impl Into<MetadataKey>,
        value: Value,
    ) {
        let mut targets = self.targets.write();
        targets
            .entry(class)
            .or_default()
            .methods
            .entry(method.to_string())
            .or_default()
            .insert(key.into(), value);
    }

    /// Get metadata from a method.
    pub fn get_for_method(&self, class: ClassId, method: &str, key: &str) -> Option<Value> {
        self.targets
            .read()
            .get(&class)?
            .methods
            .get(method)?
            .get(key)
            .cloned()
    }

    /// Check if a method has metadata under the given key.
    pub fn has_for_method(&self, class: ClassId, method: &str, key: &str) -> bool {
        self.targets.read().get(&class).is_some_and(|entry| {
            entry
                .methods
                .get(method)
                .is_some_and(|site| site.contains_key(key))
        })
    }

    /// All metadata entries on a method.
    pub fn all_for_method(&self, class: ClassId, method: &str) -> FxHashMap<MetadataKey, Value> {
        self.targets
            .read()
            .get(&class)
            .and_then(|entry| entry.methods.get(method))
            .cloned()
            .unwrap_or_default()
    }

    /// Delete metadata from a method. Returns true if the entry existed.
    pub fn delete_for_method(&self, class: ClassId, method: &str, key: &str) -> bool {
        self.targets.write().get_mut(&class).is_some_and(|entry| {
            entry
                .methods
                .get_mut(method)
                .is_some_and(|site| site.remove(key).is_some())
        })
    }

    // ========================================================================
    // Property-level metadata operations
    // ========================================================================

    /// Define metadata on a property.
    pub fn define_for_property(
        &self,
        class: ClassId,
        property: &str,
        key: impl Into<MetadataKey>,
        value: Value,
    ) {
        let mut targets = self.targets.write();
        targets
            .entry(class)
            .or_default()
            .properties
            .entry(property.to_string())
            .or_default()
            .insert(key.into(), value);
    }

    /// Get metadata from a property.
    pub fn get_for_property(&self, class: ClassId, property: &str, key: &str) -> Option<Value> {
        self.targets
            .read()
            .get(&class)?
            .properties
            .get(property)?
            .get(key)
            .cloned()
    }

    /// Check if a property has metadata under the given key.
    pub fn has_for_property(&self, class: ClassId, property: &str, key: &str) -> bool {
        self.targets.read().get(&class).is_some_and(|entry| {
            entry
                .properties
                .get(property)
                .is_some_and(|site| site.contains_key(key))
        })
    }

    /// All metadata entries on a property.
    pub fn all_for_property(&self, class: ClassId, property: &str) -> FxHashMap<MetadataKey, Value> {
        self.targets
            .read()
            .get(&class)
            .and_then(|entry| entry.properties.get(property))
            .cloned()
            .unwrap_or_default()
    }

    /// Delete metadata from a property. Returns true if the entry existed.
    pub fn delete_for_property(&self, class: ClassId, property: &str, key: &str) -> bool {
        self.targets.write().get_mut(&class).is_some_and(|entry| {
            entry
                .properties
                .get_mut(property)
                .is_some_and(|site| site.remove(key).is_some())
        })
    }

    // ========================================================================
    // Parameter-level metadata operations
    // ========================================================================

    /// Define metadata on a parameter.
    pub fn define_for_parameter(
        &self,
        class: ClassId,
        method: &str,
        index: usize,
        key: impl Into<MetadataKey>,
        value: Value,
    ) {
        let mut targets = self.targets.write();
        targets
            .entry(class)
            .or_default()
            .parameters
            .entry((method.to_string(), index))
            .or_default()
            .insert(key.into(), value);
    }

    /// Get metadata from a parameter.
    pub fn get_for_parameter(
        &self,
        class: ClassId,
        method: &str,
        index: usize,
        key: &str,
    ) -> Option<Value> {
        self.targets
            .read()
            .get(&class)?
            .parameters
            .get(&(method.to_string(), index))?
            .get(key)
            .cloned()
    }

    /// Check if a parameter has metadata under the given key.
    pub fn has_for_parameter(&self, class: ClassId, method: &str, index: usize, key: &str) -> bool {
        self.targets.read().get(&class).is_some_and(|entry| {
            entry
                .parameters
                .get(&(method.to_string(), index))
                .is_some_and(|site| site.contains_key(key))
        })
    }

    /// Check if a parameter has any metadata at all.
    pub fn has_any_for_parameter(&self, class: ClassId, method: &str, index: usize) -> bool {
        self.targets.read().get(&class).is_some_and(|entry| {
            entry
                .parameters
                .get(&(method.to_string(), index))
                .is_some_and(|site| !site.is_empty())
        })
    }

    /// All metadata entries on a parameter.
    pub fn all_for_parameter(
        &self,
        class: ClassId,
        method: &str,
        index: usize,
    ) -> FxHashMap<MetadataKey, Value> {
        self.targets
            .read()
            .get(&class)
            .and_then(|entry| entry.parameters.get(&(method.to_string(), index)))
            .cloned()
            .unwrap_or_default()
    }

    /// Delete metadata from a parameter. Returns true if the entry existed.
    pub fn delete_for_parameter(
        &self,
        class: ClassId,
        method: &str,
        index: usize,
        key: &str,
    ) -> bool {
        self.targets.write().get_mut(&class).is_some_and(|entry| {
            entry
                .parameters
                .get_mut(&(method.to_string(), index))
                .is_some_and(|site| site.remove(key).is_some())
        })
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Clear all metadata for a class. Returns true if any existed.
    pub fn clear_class(&self, class: ClassId) -> bool {
        self.targets.write().remove(&class).is_some()
    }

    /// Clear the whole store.
    pub fn clear(&self) {
        self.targets.write().clear();
    }

    /// Number of classes with any metadata recorded.
    pub fn target_count(&self) -> usize {
        self.targets.read().len()
    }
}
