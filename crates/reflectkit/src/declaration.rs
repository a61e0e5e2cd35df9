//! Class Declarations
//!
//! Reflection operates over explicit class declarations registered with a
//! [`Reflection`](crate::Reflection) context. A declaration records the
//! class's name, its parent, the textual source the parameter parser reads,
//! and the method/property roster with optional type hints.
//!
//! Type hints are a deliberately degraded classification: generic and union
//! types cannot be recovered and collapse to [`TypeHint::Object`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Reflection;
use crate::{ReflectError, ReflectResult};

/// Stable identity handle for a registered class.
///
/// Assigned at registration time and used as the key component of every
/// registry index for the lifetime of the owning context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    /// Raw index value.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Degraded runtime type classification for parameters, properties, and
/// return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TypeHint {
    /// No type information available.
    #[default]
    Unknown,
    /// The null type.
    Null,
    /// Booleans.
    Bool,
    /// Numbers (integer or floating point).
    Number,
    /// Arbitrary-precision integers.
    BigInt,
    /// Strings.
    Str,
    /// Symbols.
    Symbol,
    /// Function values.
    Function,
    /// A generic object; also the downgrade target for generics and unions.
    Object,
    /// An instance of a registered class.
    Class(ClassId),
}

impl TypeHint {
    /// A `typeof`-style string for this hint.
    pub fn type_string(self) -> &'static str {
        match self {
            TypeHint::Unknown => "undefined",
            TypeHint::Null => "object",
            TypeHint::Bool => "boolean",
            TypeHint::Number => "number",
            TypeHint::BigInt => "bigint",
            TypeHint::Str => "string",
            TypeHint::Symbol => "symbol",
            TypeHint::Function => "function",
            TypeHint::Object => "object",
            TypeHint::Class(_) => "object",
        }
    }

    /// Whether the hint names a primitive.
    pub fn is_primitive(self) -> bool {
        matches!(
            self.type_string(),
            "string" | "number" | "bigint" | "boolean" | "undefined" | "symbol"
        )
    }

    /// Whether the hint names a specific type, excluding catch-alls like
    /// `Object` and `Function`.
    pub fn is_known(self) -> bool {
        !matches!(
            self,
            TypeHint::Unknown | TypeHint::Null | TypeHint::Object | TypeHint::Function
        )
    }

    /// Whether the hint refers to a registered class.
    pub fn is_class(self) -> bool {
        matches!(self, TypeHint::Class(_))
    }
}

/// A method declared on a class.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    name: String,
    source: String,
    is_static: bool,
    param_types: Vec<TypeHint>,
    return_type: Option<TypeHint>,
}

impl MethodDecl {
    /// Declares a method with its textual source. The source must include the
    /// signature; the parameter parser reads it to enumerate parameters.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            is_static: false,
            param_types: Vec::new(),
            return_type: None,
        }
    }

    /// Marks the method as static.
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Attaches a type hint for the parameter at the next index.
    pub fn param_type(mut self, hint: TypeHint) -> Self {
        self.param_types.push(hint);
        self
    }

    /// Attaches a return type hint.
    pub fn returns(mut self, hint: TypeHint) -> Self {
        self.return_type = Some(hint);
        self
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the method is static.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Type hints for the parameters, in order. Empty when untyped.
    pub fn param_types(&self) -> &[TypeHint] {
        &self.param_types
    }

    /// The declared return type hint, if any.
    pub fn return_type(&self) -> Option<TypeHint> {
        self.return_type
    }

    /// Whether any type information was declared for this method.
    pub fn is_typed(&self) -> bool {
        self.return_type.is_some() || !self.param_types.is_empty()
    }
}

/// A property declared on a class.
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    name: String,
    type_hint: Option<TypeHint>,
}

impl PropertyDecl {
    /// Declares an untyped property.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
        }
    }

    /// Attaches a type hint.
    pub fn typed(mut self, hint: TypeHint) -> Self {
        self.type_hint = Some(hint);
        self
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type hint, if any.
    pub fn type_hint(&self) -> Option<TypeHint> {
        self.type_hint
    }
}

/// An immutable registered class declaration.
#[derive(Debug)]
pub struct ClassDecl {
    id: ClassId,
    name: String,
    parent: Option<ClassId>,
    source: Option<String>,
    methods: Vec<MethodDecl>,
    properties: Vec<PropertyDecl>,
}

impl ClassDecl {
    /// The class identity handle.
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// The class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent class, if any.
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    /// The full class declaration source, when provided. Constructor
    /// parameter recovery scans this text for the `constructor` word.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Declared methods in declaration order.
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// Looks up a declared method by name.
    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Declared properties in declaration order.
    pub fn properties(&self) -> &[PropertyDecl] {
        &self.properties
    }

    /// Looks up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Fluent builder that registers a class declaration with a context.
///
/// ```ignore
/// let id = ClassBuilder::new("UserController")
///     .extends(base_id)
///     .source("class UserController { constructor(service, limit = 25) {} }")
///     .method("index", "index(request) {}")
///     .property("service")
///     .register(&reflection)?;
/// ```
#[derive(Debug, Default)]
pub struct ClassBuilder {
    name: String,
    parent: Option<ClassId>,
    source: Option<String>,
    methods: Vec<MethodDecl>,
    properties: Vec<PropertyDecl>,
    meta: Vec<(String, Value)>,
}

impl ClassBuilder {
    /// Starts a declaration for a class with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the parent class. The parent must already be registered.
    pub fn extends(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Provides the full class declaration source text.
    pub fn source(mut self, text: impl Into<String>) -> Self {
        self.source = Some(text.into());
        self
    }

    /// Declares an instance method from its source text.
    pub fn method(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.method_decl(MethodDecl::new(name, source))
    }

    /// Declares a static method from its source text.
    pub fn static_method(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.method_decl(MethodDecl::new(name, source).static_method())
    }

    /// Declares a method from a full [`MethodDecl`].
    pub fn method_decl(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Declares an untyped property.
    pub fn property(self, name: impl Into<String>) -> Self {
        self.property_decl(PropertyDecl::new(name))
    }

    /// Declares a property from a full [`PropertyDecl`].
    pub fn property_decl(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    /// Attaches class-level metadata, stored at registration time.
    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.push((key.into(), value));
        self
    }

    /// Registers the declaration and returns its identity handle.
    ///
    /// Fails with [`ReflectError::DuplicateClass`] when the name is already
    /// taken in this context, or [`ReflectError::UnknownClass`] when the
    /// declared parent was never registered.
    pub fn register(self, reflection: &Reflection) -> ReflectResult<ClassId> {
        if let Some(parent) = self.parent {
            if !reflection.contains(parent) {
                return Err(ReflectError::UnknownClass(parent));
            }
        }

        let id = reflection.insert_class(|id| ClassDecl {
            id,
            name: self.name,
            parent: self.parent,
            source: self.source,
            methods: self.methods,
            properties: self.properties,
        })?;

        for (key, value) in self.meta {
            reflection.metadata().define(id, key, value);
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_hint_strings() {
        assert_eq!(TypeHint::Unknown.type_string(), "undefined");
        assert_eq!(TypeHint::Null.type_string(), "object");
        assert_eq!(TypeHint::Bool.type_string(), "boolean");
        assert_eq!(TypeHint::Number.type_string(), "number");
        assert_eq!(TypeHint::BigInt.type_string(), "bigint");
        assert_eq!(TypeHint::Str.type_string(), "string");
        assert_eq!(TypeHint::Symbol.type_string(), "symbol");
        assert_eq!(TypeHint::Function.type_string(), "function");
        assert_eq!(TypeHint::Object.type_string(), "object");
        assert_eq!(TypeHint::Class(ClassId(0)).type_string(), "object");
    }

    #[test]
    fn test_type_hint_classification() {
        assert!(TypeHint::Str.is_primitive());
        assert!(TypeHint::Unknown.is_primitive());
        assert!(!TypeHint::Object.is_primitive());

        assert!(TypeHint::Number.is_known());
        assert!(TypeHint::Class(ClassId(3)).is_known());
        assert!(!TypeHint::Object.is_known());
        assert!(!TypeHint::Function.is_known());
        assert!(!TypeHint::Unknown.is_known());

        assert!(TypeHint::Class(ClassId(3)).is_class());
        assert!(!TypeHint::Str.is_class());
    }

    #[test]
    fn test_method_decl() {
        let method = MethodDecl::new("run", "run(a, b = 1) {}")
            .param_type(TypeHint::Str)
            .param_type(TypeHint::Number)
            .returns(TypeHint::Bool);

        assert_eq!(method.name(), "run");
        assert!(!method.is_static());
        assert!(method.is_typed());
        assert_eq!(method.param_types().len(), 2);
        assert_eq!(method.return_type(), Some(TypeHint::Bool));

        let bare = MethodDecl::new("noop", "noop() {}");
        assert!(!bare.is_typed());
    }
}
