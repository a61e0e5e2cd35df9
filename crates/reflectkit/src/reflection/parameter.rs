//! Parameter Facade

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::attribute::AttributeInstance;
use crate::context::Reflection;
use crate::declaration::{ClassDecl, ClassId, TypeHint};
use crate::metadata::MetadataKey;
use crate::parser::ExtractedParameter;

use super::ParameterFilter;

/// Read-only view over one parameter of a reflected method.
pub struct ReflectionParameter<'r> {
    rx: &'r Reflection,
    declaring: Arc<ClassDecl>,
    method: String,
    extracted: ExtractedParameter,
    hint: TypeHint,
}

impl fmt::Debug for ReflectionParameter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionParameter")
            .field("class", &self.declaring.name())
            .field("method", &self.method)
            .field("name", &self.extracted.name)
            .finish_non_exhaustive()
    }
}

impl<'r> ReflectionParameter<'r> {
    pub(crate) fn new(
        rx: &'r Reflection,
        declaring: Arc<ClassDecl>,
        method: String,
        extracted: ExtractedParameter,
        hint: TypeHint,
    ) -> Self {
        Self {
            rx,
            declaring,
            method,
            extracted,
            hint,
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.extracted.name
    }

    /// Zero-based position in the parameter list.
    pub fn index(&self) -> usize {
        self.extracted.index
    }

    /// The owning method name.
    pub fn method_name(&self) -> &str {
        &self.method
    }

    /// The class the owning method was declared on. Attribute and
    /// metadata access is keyed by this identity, so parameters of an
    /// inherited method see annotations attached at the ancestor.
    pub fn declaring_class_id(&self) -> ClassId {
        self.declaring.id()
    }

    /// Whether a default value follows the parameter name.
    pub fn has_default(&self) -> bool {
        self.extracted.has_default
    }

    /// The declared type hint. [`TypeHint::Unknown`] when untyped.
    pub fn type_hint(&self) -> TypeHint {
        self.hint
    }

    /// A `typeof`-style string for the declared type.
    pub fn type_string(&self) -> &'static str {
        self.hint.type_string()
    }

    /// Whether the declared type is a primitive.
    pub fn is_primitive_type(&self) -> bool {
        self.hint.is_primitive()
    }

    /// Whether the declared type names a specific type.
    pub fn is_known_type(&self) -> bool {
        self.hint.is_known()
    }

    /// Whether the declared type refers to a registered class.
    pub fn is_class_type(&self) -> bool {
        self.hint.is_class()
    }

    /// Whether the declared type refers to a class still registered in
    /// this context.
    pub fn is_reflectable_type(&self) -> bool {
        match self.hint {
            TypeHint::Class(id) => self.rx.contains(id),
            _ => false,
        }
    }

    pub(crate) fn matches(&self, filter: ParameterFilter) -> bool {
        (!filter.contains(ParameterFilter::META) || self.has_any_meta())
            && (!filter.contains(ParameterFilter::WITH_DEFAULT) || self.has_default())
            && (!filter.contains(ParameterFilter::WITHOUT_DEFAULT) || !self.has_default())
            && (!filter.contains(ParameterFilter::PRIMITIVE_TYPE) || self.is_primitive_type())
            && (!filter.contains(ParameterFilter::NON_PRIMITIVE_TYPE) || !self.is_primitive_type())
            && (!filter.contains(ParameterFilter::KNOWN_TYPE) || self.is_known_type())
            && (!filter.contains(ParameterFilter::UNKNOWN_TYPE) || !self.is_known_type())
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Every attribute applied to this parameter, in application order.
    pub fn get_attributes(&self) -> Vec<AttributeInstance> {
        self.rx
            .attributes()
            .get_from_parameter(self.declaring.id(), &self.method, self.extracted.index)
    }

    /// Attributes of type `H` applied to this parameter, in application
    /// order.
    pub fn get_attributes_of<H: Send + Sync + 'static>(&self) -> Vec<Arc<H>> {
        self.rx.attributes().get_from_parameter_of::<H>(
            self.declaring.id(),
            &self.method,
            self.extracted.index,
        )
    }

    /// The most recently applied attribute of type `H`, if any.
    pub fn get_attribute<H: Send + Sync + 'static>(&self) -> Option<Arc<H>> {
        self.get_attributes_of::<H>().pop()
    }

    /// Whether an attribute of type `H` is applied to this parameter.
    pub fn has_attribute<H: Send + Sync + 'static>(&self) -> bool {
        self.rx.attributes().has_from_parameter::<H>(
            self.declaring.id(),
            &self.method,
            self.extracted.index,
        )
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Stores a metadata entry on this parameter.
    pub fn define_meta(&self, key: impl Into<MetadataKey>, value: Value) {
        self.rx.metadata().define_for_parameter(
            self.declaring.id(),
            &self.method,
            self.extracted.index,
            key,
            value,
        );
    }

    /// Reads a metadata entry from this parameter.
    pub fn get_meta(&self, key: &str) -> Option<Value> {
        self.rx.metadata().get_for_parameter(
            self.declaring.id(),
            &self.method,
            self.extracted.index,
            key,
        )
    }

    /// Whether a metadata entry exists on this parameter.
    pub fn has_meta(&self, key: &str) -> bool {
        self.rx.metadata().has_for_parameter(
            self.declaring.id(),
            &self.method,
            self.extracted.index,
            key,
        )
    }

    /// Whether any metadata entry exists on this parameter.
    pub fn has_any_meta(&self) -> bool {
        self.rx
            .metadata()
            .has_any_for_parameter(self.declaring.id(), &self.method, self.extracted.index)
    }

    /// All metadata entries on this parameter.
    pub fn all_meta(&self) -> FxHashMap<MetadataKey, Value> {
        self.rx
            .metadata()
            .all_for_parameter(self.declaring.id(), &self.method, self.extracted.index)
    }
}
