//! Class Facade

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::attribute::AttributeInstance;
use crate::context::Reflection;
use crate::declaration::{ClassDecl, ClassId, MethodDecl, PropertyDecl};
use crate::metadata::MetadataKey;

use super::{MethodFilter, PropertyFilter, ReflectionMethod, ReflectionProperty};

/// One entry in the merged method roster. A `None` declaration is the
/// implicit constructor, whose parameters are recovered from class source.
#[derive(Clone)]
pub(crate) struct MethodSlot {
    pub(crate) declaring: Arc<ClassDecl>,
    pub(crate) decl: Option<MethodDecl>,
    pub(crate) inherited: bool,
}

impl MethodSlot {
    fn name(&self) -> &str {
        self.decl
            .as_ref()
            .map(MethodDecl::name)
            .unwrap_or("constructor")
    }
}

/// One entry in the merged property roster.
#[derive(Clone)]
pub(crate) struct PropertySlot {
    pub(crate) declaring: Arc<ClassDecl>,
    pub(crate) decl: PropertyDecl,
    pub(crate) inherited: bool,
}

/// Read-only view over a registered class: merged method and property
/// rosters, hierarchy queries, attributes, and metadata.
///
/// Rosters are computed once per facade and cached; registrations made
/// after the facade was built are visible only through a fresh facade.
pub struct ReflectionClass<'r> {
    rx: &'r Reflection,
    decl: Arc<ClassDecl>,
    methods: OnceCell<Vec<MethodSlot>>,
    properties: OnceCell<Vec<PropertySlot>>,
}

impl fmt::Debug for ReflectionClass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionClass")
            .field("name", &self.decl.name())
            .finish_non_exhaustive()
    }
}

impl<'r> ReflectionClass<'r> {
    pub(crate) fn new(rx: &'r Reflection, decl: Arc<ClassDecl>) -> Self {
        Self {
            rx,
            decl,
            methods: OnceCell::new(),
            properties: OnceCell::new(),
        }
    }

    /// The class identity handle.
    pub fn id(&self) -> ClassId {
        self.decl.id()
    }

    /// The class name.
    pub fn name(&self) -> &str {
        self.decl.name()
    }

    /// The underlying declaration.
    pub fn decl(&self) -> &Arc<ClassDecl> {
        &self.decl
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// The inheritance chain, most-derived first (self at index 0).
    ///
    /// A parent is always registered before its children, so the walk
    /// cannot dangle.
    fn chain(&self) -> Vec<Arc<ClassDecl>> {
        let mut chain = vec![Arc::clone(&self.decl)];
        let mut cursor = self.decl.parent();
        while let Some(parent) = cursor {
            match self.rx.decl(parent) {
                Ok(decl) => {
                    cursor = decl.parent();
                    chain.push(decl);
                }
                Err(_) => break,
            }
        }
        chain
    }

    /// The parent class facade, if any.
    pub fn parent(&self) -> Option<ReflectionClass<'r>> {
        self.rx.class(self.decl.parent()?).ok()
    }

    /// Class identities from the root ancestor down to this class.
    pub fn hierarchy(&self) -> Vec<ClassId> {
        let mut ids: Vec<ClassId> = self.chain().iter().map(|decl| decl.id()).collect();
        ids.reverse();
        ids
    }

    /// Whether this facade reflects exactly the given class.
    pub fn is_type(&self, class: ClassId) -> bool {
        self.decl.id() == class
    }

    /// Whether the given class is a strict ancestor of this one.
    pub fn has_ancestor_type(&self, class: ClassId) -> bool {
        self.chain().iter().skip(1).any(|decl| decl.id() == class)
    }

    /// Whether this class is the given class or inherits from it.
    pub fn has_type(&self, class: ClassId) -> bool {
        self.is_type(class) || self.has_ancestor_type(class)
    }

    // ========================================================================
    // Methods
    // ========================================================================

    /// Merged roster: own methods first, then inherited methods not
    /// overridden by name, plus the implicit constructor when no class in
    /// the chain declares one.
    fn method_slots(&self) -> &[MethodSlot] {
        self.methods.get_or_init(|| {
            let mut slots: Vec<MethodSlot> = Vec::new();

            for (depth, declaring) in self.chain().iter().enumerate() {
                for method in declaring.methods() {
                    if slots.iter().any(|slot| slot.name() == method.name()) {
                        continue;
                    }
                    slots.push(MethodSlot {
                        declaring: Arc::clone(declaring),
                        decl: Some(method.clone()),
                        inherited: depth > 0,
                    });
                }
            }

            if !slots.iter().any(|slot| slot.name() == "constructor") {
                slots.push(MethodSlot {
                    declaring: Arc::clone(&self.decl),
                    decl: None,
                    inherited: false,
                });
            }

            slots
        })
    }

    fn method_from_slot(&self, slot: &MethodSlot) -> ReflectionMethod<'r> {
        ReflectionMethod::new(self.rx, Arc::clone(&self.decl), slot.clone())
    }

    /// Every method visible on this class, including inherited ones and
    /// the constructor.
    pub fn get_methods(&self) -> Vec<ReflectionMethod<'r>> {
        self.method_slots()
            .iter()
            .map(|slot| self.method_from_slot(slot))
            .collect()
    }

    /// Methods matching every flag set in the filter.
    pub fn get_methods_where(&self, filter: MethodFilter) -> Vec<ReflectionMethod<'r>> {
        self.get_methods()
            .into_iter()
            .filter(|method| method.matches(filter))
            .collect()
    }

    /// Looks up a visible method by name.
    pub fn get_method(&self, name: &str) -> Option<ReflectionMethod<'r>> {
        self.method_slots()
            .iter()
            .find(|slot| slot.name() == name)
            .map(|slot| self.method_from_slot(slot))
    }

    /// Whether a method with the given name is visible on this class.
    pub fn has_method(&self, name: &str) -> bool {
        self.method_slots().iter().any(|slot| slot.name() == name)
    }

    /// The class constructor. Always present; implicit when no class in the
    /// chain declares one.
    pub fn get_constructor_method(&self) -> ReflectionMethod<'r> {
        self.get_method("constructor")
            .unwrap_or_else(|| self.method_from_slot(&MethodSlot {
                declaring: Arc::clone(&self.decl),
                decl: None,
                inherited: false,
            }))
    }

    // ========================================================================
    // Properties
    // ========================================================================

    fn property_slots(&self) -> &[PropertySlot] {
        self.properties.get_or_init(|| {
            let mut slots: Vec<PropertySlot> = Vec::new();

            for (depth, declaring) in self.chain().iter().enumerate() {
                for property in declaring.properties() {
                    if slots.iter().any(|slot| slot.decl.name() == property.name()) {
                        continue;
                    }
                    slots.push(PropertySlot {
                        declaring: Arc::clone(declaring),
                        decl: property.clone(),
                        inherited: depth > 0,
                    });
                }
            }

            slots
        })
    }

    /// Every property visible on this class, including inherited ones.
    pub fn get_properties(&self) -> Vec<ReflectionProperty<'r>> {
        self.property_slots()
            .iter()
            .map(|slot| ReflectionProperty::new(self.rx, Arc::clone(&self.decl), slot.clone()))
            .collect()
    }

    /// Properties matching every flag set in the filter.
    pub fn get_properties_where(&self, filter: PropertyFilter) -> Vec<ReflectionProperty<'r>> {
        self.get_properties()
            .into_iter()
            .filter(|property| property.matches(filter))
            .collect()
    }

    /// Looks up a visible property by name.
    pub fn get_property(&self, name: &str) -> Option<ReflectionProperty<'r>> {
        self.property_slots()
            .iter()
            .find(|slot| slot.decl.name() == name)
            .map(|slot| ReflectionProperty::new(self.rx, Arc::clone(&self.decl), slot.clone()))
    }

    /// Whether a property with the given name is visible on this class.
    pub fn has_property(&self, name: &str) -> bool {
        self.property_slots()
            .iter()
            .any(|slot| slot.decl.name() == name)
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Every attribute applied to this class, in application order.
    pub fn get_attributes(&self) -> Vec<AttributeInstance> {
        self.rx.attributes().get_from_class(self.decl.id())
    }

    /// Attributes of type `H` applied to this class, in application order.
    pub fn get_attributes_of<H: Send + Sync + 'static>(&self) -> Vec<Arc<H>> {
        self.rx.attributes().get_from_class_of::<H>(self.decl.id())
    }

    /// The most recently applied attribute of type `H`, if any.
    pub fn get_attribute<H: Send + Sync + 'static>(&self) -> Option<Arc<H>> {
        self.get_attributes_of::<H>().pop()
    }

    /// Whether an attribute of type `H` is applied to this class.
    pub fn has_attribute<H: Send + Sync + 'static>(&self) -> bool {
        self.rx.attributes().has_from_class::<H>(self.decl.id())
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Stores a class-level metadata entry.
    pub fn define_meta(&self, key: impl Into<MetadataKey>, value: Value) {
        self.rx.metadata().define(self.decl.id(), key, value);
    }

    /// Reads a class-level metadata entry.
    pub fn get_meta(&self, key: &str) -> Option<Value> {
        self.rx.metadata().get(self.decl.id(), key)
    }

    /// Whether a class-level metadata entry exists.
    pub fn has_meta(&self, key: &str) -> bool {
        self.rx.metadata().has(self.decl.id(), key)
    }

    /// All class-level metadata entries.
    pub fn all_meta(&self) -> FxHashMap<MetadataKey, Value> {
        self.rx.metadata().all(self.decl.id())
    }
}
