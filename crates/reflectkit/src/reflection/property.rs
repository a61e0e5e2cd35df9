//! Property Facade

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::attribute::AttributeInstance;
use crate::context::Reflection;
use crate::declaration::{ClassDecl, ClassId, TypeHint};
use crate::metadata::MetadataKey;

use super::class::PropertySlot;
use super::PropertyFilter;

/// Read-only view over one property of a reflected class.
pub struct ReflectionProperty<'r> {
    rx: &'r Reflection,
    class: Arc<ClassDecl>,
    slot: PropertySlot,
}

impl fmt::Debug for ReflectionProperty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionProperty")
            .field("class", &self.class.name())
            .field("name", &self.slot.decl.name())
            .finish_non_exhaustive()
    }
}

impl<'r> ReflectionProperty<'r> {
    pub(crate) fn new(rx: &'r Reflection, class: Arc<ClassDecl>, slot: PropertySlot) -> Self {
        Self { rx, class, slot }
    }

    /// The property name.
    pub fn name(&self) -> &str {
        self.slot.decl.name()
    }

    /// The reflected class identity.
    pub fn class_id(&self) -> ClassId {
        self.class.id()
    }

    /// The class the property was declared on.
    pub fn declaring_class_id(&self) -> ClassId {
        self.slot.declaring.id()
    }

    /// The declared type hint, if any.
    pub fn type_hint(&self) -> Option<TypeHint> {
        self.slot.decl.type_hint()
    }

    /// Whether a type hint was declared.
    pub fn is_typed(&self) -> bool {
        self.slot.decl.type_hint().is_some()
    }

    /// Whether the property was declared on an ancestor class.
    pub fn is_inherited(&self) -> bool {
        self.slot.inherited
    }

    /// A `typeof`-style string for the declared type. Undeclared types
    /// report `undefined`.
    pub fn type_string(&self) -> &'static str {
        self.type_hint().unwrap_or_default().type_string()
    }

    pub(crate) fn matches(&self, filter: PropertyFilter) -> bool {
        (!filter.contains(PropertyFilter::TYPED) || self.is_typed())
            && (!filter.contains(PropertyFilter::INHERITED) || self.is_inherited())
            && (!filter.contains(PropertyFilter::OWN) || !self.is_inherited())
    }

    // ========================================================================
    // Attributes
    // ========================================================================
    //
    // Applications are keyed by the declaring class, so an inherited
    // property sees attributes attached at its ancestor.

    /// Every attribute applied to this property, in application order.
    pub fn get_attributes(&self) -> Vec<AttributeInstance> {
        self.rx
            .attributes()
            .get_from_property(self.declaring_class_id(), self.name())
    }

    /// Attributes of type `H` applied to this property, in application order.
    pub fn get_attributes_of<H: Send + Sync + 'static>(&self) -> Vec<Arc<H>> {
        self.rx
            .attributes()
            .get_from_property_of::<H>(self.declaring_class_id(), self.name())
    }

    /// The most recently applied attribute of type `H`, if any.
    pub fn get_attribute<H: Send + Sync + 'static>(&self) -> Option<Arc<H>> {
        self.get_attributes_of::<H>().pop()
    }

    /// Whether an attribute of type `H` is applied to this property.
    pub fn has_attribute<H: Send + Sync + 'static>(&self) -> bool {
        self.rx
            .attributes()
            .has_from_property::<H>(self.declaring_class_id(), self.name())
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Stores a metadata entry on this property.
    pub fn define_meta(&self, key: impl Into<MetadataKey>, value: Value) {
        self.rx
            .metadata()
            .define_for_property(self.declaring_class_id(), self.name(), key, value);
    }

    /// Reads a metadata entry from this property.
    pub fn get_meta(&self, key: &str) -> Option<Value> {
        self.rx
            .metadata()
            .get_for_property(self.declaring_class_id(), self.name(), key)
    }

    /// Whether a metadata entry exists on this property.
    pub fn has_meta(&self, key: &str) -> bool {
        self.rx
            .metadata()
            .has_for_property(self.declaring_class_id(), self.name(), key)
    }

    /// All metadata entries on this property.
    pub fn all_meta(&self) -> FxHashMap<MetadataKey, Value> {
        self.rx
            .metadata()
            .all_for_property(self.declaring_class_id(), self.name())
    }
}
