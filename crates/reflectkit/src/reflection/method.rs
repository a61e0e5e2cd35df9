//! Method Facade

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::attribute::AttributeInstance;
use crate::context::Reflection;
use crate::declaration::{ClassDecl, ClassId, TypeHint};
use crate::metadata::MetadataKey;
use crate::parser::{self, ExtractedParameter};

use super::class::MethodSlot;
use super::{MethodFilter, ParameterFilter, ReflectionParameter};

/// Read-only view over one method of a reflected class.
///
/// Parameter extraction runs the declaration parser lazily and caches the
/// result for the lifetime of the facade.
pub struct ReflectionMethod<'r> {
    rx: &'r Reflection,
    class: Arc<ClassDecl>,
    slot: MethodSlot,
    parameters: OnceCell<Vec<ExtractedParameter>>,
}

impl fmt::Debug for ReflectionMethod<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionMethod")
            .field("class", &self.class.name())
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

impl<'r> ReflectionMethod<'r> {
    pub(crate) fn new(rx: &'r Reflection, class: Arc<ClassDecl>, slot: MethodSlot) -> Self {
        Self {
            rx,
            class,
            slot,
            parameters: OnceCell::new(),
        }
    }

    /// The method name. The implicit constructor reports `constructor`.
    pub fn name(&self) -> &str {
        self.slot
            .decl
            .as_ref()
            .map(|decl| decl.name())
            .unwrap_or("constructor")
    }

    /// The reflected class identity. For inherited methods this is the
    /// class the facade was built for, not the declaring ancestor.
    pub fn class_id(&self) -> ClassId {
        self.class.id()
    }

    /// The class the method was declared on.
    pub fn declaring_class_id(&self) -> ClassId {
        self.slot.declaring.id()
    }

    /// Whether this is the class constructor.
    pub fn is_constructor(&self) -> bool {
        self.name() == "constructor"
    }

    /// Whether the method is static.
    pub fn is_static(&self) -> bool {
        self.slot
            .decl
            .as_ref()
            .is_some_and(|decl| decl.is_static())
    }

    /// Whether the method was declared on an ancestor class.
    pub fn is_inherited(&self) -> bool {
        self.slot.inherited
    }

    /// Whether any type hints were declared for the method.
    pub fn is_typed(&self) -> bool {
        self.slot.decl.as_ref().is_some_and(|decl| decl.is_typed())
    }

    /// The declared return type hint, if any.
    pub fn return_type(&self) -> Option<TypeHint> {
        self.slot.decl.as_ref().and_then(|decl| decl.return_type())
    }

    /// The declared source text. `None` for the implicit constructor.
    pub fn source(&self) -> Option<&str> {
        self.slot.decl.as_ref().map(|decl| decl.source())
    }

    pub(crate) fn matches(&self, filter: MethodFilter) -> bool {
        (!filter.contains(MethodFilter::STATIC) || self.is_static())
            && (!filter.contains(MethodFilter::LOCAL) || !self.is_static())
            && (!filter.contains(MethodFilter::TYPED) || self.is_typed())
            && (!filter.contains(MethodFilter::INHERITED) || self.is_inherited())
            && (!filter.contains(MethodFilter::OWN) || !self.is_inherited())
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Extracted parameters, in declaration order.
    ///
    /// Ordinary methods parse their own source. Constructor parameters are
    /// recovered by walking the hierarchy most-derived first and scanning
    /// each class's source for the `constructor` word; the nearest class
    /// that resolves one wins, and a chain with no recoverable constructor
    /// yields an empty list.
    fn extracted(&self) -> &[ExtractedParameter] {
        self.parameters.get_or_init(|| {
            if self.is_constructor() {
                let mut cursor = Some(Arc::clone(&self.class));
                while let Some(decl) = cursor {
                    let ctor_source = decl
                        .method("constructor")
                        .map(|method| method.source())
                        .or_else(|| decl.source());

                    if let Some(source) = ctor_source {
                        if let Some(params) = parser::find_named(source, "constructor") {
                            return params;
                        }
                    }

                    cursor = decl.parent().and_then(|parent| self.rx.decl(parent).ok());
                }
                Vec::new()
            } else {
                self.source().map(parser::parse).unwrap_or_default()
            }
        })
    }

    fn parameter_at(&self, extracted: &ExtractedParameter) -> ReflectionParameter<'r> {
        let hint = self
            .slot
            .decl
            .as_ref()
            .and_then(|decl| decl.param_types().get(extracted.index).copied())
            .unwrap_or_default();

        ReflectionParameter::new(
            self.rx,
            Arc::clone(&self.slot.declaring),
            self.name().to_string(),
            extracted.clone(),
            hint,
        )
    }

    /// Every parameter of the method.
    pub fn get_parameters(&self) -> Vec<ReflectionParameter<'r>> {
        self.extracted()
            .iter()
            .map(|extracted| self.parameter_at(extracted))
            .collect()
    }

    /// Parameters matching every flag set in the filter.
    pub fn get_parameters_where(&self, filter: ParameterFilter) -> Vec<ReflectionParameter<'r>> {
        self.get_parameters()
            .into_iter()
            .filter(|parameter| parameter.matches(filter))
            .collect()
    }

    /// Looks up a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<ReflectionParameter<'r>> {
        self.extracted()
            .iter()
            .find(|extracted| extracted.name == name)
            .map(|extracted| self.parameter_at(extracted))
    }

    /// Looks up a parameter by zero-based index.
    pub fn get_parameter_at(&self, index: usize) -> Option<ReflectionParameter<'r>> {
        self.extracted()
            .get(index)
            .map(|extracted| self.parameter_at(extracted))
    }

    /// Whether a parameter with the given name exists.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.extracted().iter().any(|extracted| extracted.name == name)
    }

    // ========================================================================
    // Attributes
    // ========================================================================
    //
    // Applications are keyed by the declaring class, so an inherited method
    // sees attributes attached at its ancestor.

    /// Every attribute applied to this method, in application order.
    pub fn get_attributes(&self) -> Vec<AttributeInstance> {
        self.rx
            .attributes()
            .get_from_method(self.declaring_class_id(), self.name())
    }

    /// Attributes of type `H` applied to this method, in application order.
    pub fn get_attributes_of<H: Send + Sync + 'static>(&self) -> Vec<Arc<H>> {
        self.rx
            .attributes()
            .get_from_method_of::<H>(self.declaring_class_id(), self.name())
    }

    /// The most recently applied attribute of type `H`, if any.
    pub fn get_attribute<H: Send + Sync + 'static>(&self) -> Option<Arc<H>> {
        self.get_attributes_of::<H>().pop()
    }

    /// Whether an attribute of type `H` is applied to this method.
    pub fn has_attribute<H: Send + Sync + 'static>(&self) -> bool {
        self.rx
            .attributes()
            .has_from_method::<H>(self.declaring_class_id(), self.name())
    }

    // ========================================================================
    // Metadata
    // ========================================================================
    //
    // Constructor metadata aliases the class-level store, so annotating a
    // constructor and annotating its class read and write the same entries.
    // Like attributes, entries are keyed by the declaring class.

    /// Stores a metadata entry on this method.
    pub fn define_meta(&self, key: impl Into<MetadataKey>, value: Value) {
        if self.is_constructor() {
            self.rx.metadata().define(self.declaring_class_id(), key, value);
        } else {
            self.rx
                .metadata()
                .define_for_method(self.declaring_class_id(), self.name(), key, value);
        }
    }

    /// Reads a metadata entry from this method.
    pub fn get_meta(&self, key: &str) -> Option<Value> {
        if self.is_constructor() {
            self.rx.metadata().get(self.declaring_class_id(), key)
        } else {
            self.rx
                .metadata()
                .get_for_method(self.declaring_class_id(), self.name(), key)
        }
    }

    /// Whether a metadata entry exists on this method.
    pub fn has_meta(&self, key: &str) -> bool {
        if self.is_constructor() {
            self.rx.metadata().has(self.declaring_class_id(), key)
        } else {
            self.rx
                .metadata()
                .has_for_method(self.declaring_class_id(), self.name(), key)
        }
    }

    /// All metadata entries on this method.
    pub fn all_meta(&self) -> FxHashMap<MetadataKey, Value> {
        if self.is_constructor() {
            self.rx.metadata().all(self.declaring_class_id())
        } else {
            self.rx
                .metadata()
                .all_for_method(self.declaring_class_id(), self.name())
        }
    }
}
