//! Attribute Registry
//!
//! Indexes every attribute application by its target identity and by its
//! handler type, so both "what attributes are on this target" and "where is
//! this attribute used" are answerable. State only grows for the lifetime of
//! the owning context; instances are held strongly and never evicted, since
//! targets are static class declarations.

use std::any::{Any, TypeId};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::attribute::AttributeHandler;
use crate::context::Reflection;
use crate::declaration::ClassId;

/// The kind of declaration an attribute was attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    /// Attached to a class.
    Class,
    /// Attached to a method.
    Method,
    /// Attached to a property.
    Property,
    /// Attached to a method parameter.
    Parameter,
}

impl AttachmentKind {
    /// A lowercase label for the kind, used in event payloads and messages.
    pub fn label(self) -> &'static str {
        match self {
            AttachmentKind::Class => "class",
            AttachmentKind::Method => "method",
            AttachmentKind::Property => "property",
            AttachmentKind::Parameter => "parameter",
        }
    }
}

/// Identity of one attachment site.
///
/// Identities are stable for the lifetime of the context: classes compare by
/// [`ClassId`], member names by value, parameter positions by index. The
/// constructor counts as a method named `constructor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeTarget {
    /// A class declaration.
    Class {
        /// The class.
        class: ClassId,
    },
    /// A method on a class.
    Method {
        /// The declaring class.
        class: ClassId,
        /// The method name.
        method: String,
    },
    /// A property on a class.
    Property {
        /// The declaring class.
        class: ClassId,
        /// The property name.
        property: String,
    },
    /// A parameter of a method on a class.
    Parameter {
        /// The declaring class.
        class: ClassId,
        /// The owning method name.
        method: String,
        /// Zero-based parameter index.
        index: usize,
    },
}

impl AttributeTarget {
    /// A parameter of the class constructor.
    pub fn constructor_parameter(class: ClassId, index: usize) -> Self {
        AttributeTarget::Parameter {
            class,
            method: "constructor".to_string(),
            index,
        }
    }

    /// The attachment kind of this target.
    pub fn kind(&self) -> AttachmentKind {
        match self {
            AttributeTarget::Class { .. } => AttachmentKind::Class,
            AttributeTarget::Method { .. } => AttachmentKind::Method,
            AttributeTarget::Property { .. } => AttachmentKind::Property,
            AttributeTarget::Parameter { .. } => AttachmentKind::Parameter,
        }
    }

    /// The owning class.
    pub fn class(&self) -> ClassId {
        match self {
            AttributeTarget::Class { class }
            | AttributeTarget::Method { class, .. }
            | AttributeTarget::Property { class, .. }
            | AttributeTarget::Parameter { class, .. } => *class,
        }
    }

    /// A human-readable description such as `method Widget::render` or
    /// `parameter Widget::render[0]`, used in error messages.
    pub fn describe(&self, reflection: &Reflection) -> String {
        let class_name = reflection
            .class_name(self.class())
            .unwrap_or_else(|| format!("#{}", self.class().index()));

        match self {
            AttributeTarget::Class { .. } => format!("class {class_name}"),
            AttributeTarget::Method { method, .. } => format!("method {class_name}::{method}"),
            AttributeTarget::Property { property, .. } => {
                format!("property {class_name}::{property}")
            }
            AttributeTarget::Parameter { method, index, .. } => {
                format!("parameter {class_name}::{method}[{index}]")
            }
        }
    }
}

/// One registered attribute application: a type-erased handler instance.
#[derive(Clone)]
pub struct AttributeInstance {
    handler: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl AttributeInstance {
    pub(crate) fn of<H: AttributeHandler>(handler: Arc<H>) -> Self {
        Self {
            handler,
            type_id: TypeId::of::<H>(),
            type_name: std::any::type_name::<H>(),
        }
    }

    /// Whether this instance was produced by the handler type `H`.
    pub fn is<H: Send + Sync + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<H>()
    }

    /// Downcasts to the concrete handler type.
    pub fn downcast<H: Send + Sync + 'static>(&self) -> Option<Arc<H>> {
        Arc::clone(&self.handler).downcast::<H>().ok()
    }

    /// The handler's full type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for AttributeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeInstance")
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[derive(Default)]
struct Indexes {
    /// Target identity -> instances, in attachment order.
    by_target: FxHashMap<AttributeTarget, Vec<AttributeInstance>>,
    /// Handler type -> (target, instance) pairs, in attachment order.
    by_type: FxHashMap<TypeId, Vec<(AttributeTarget, AttributeInstance)>>,
}

/// Per-context store of attribute applications.
#[derive(Default)]
pub struct AttributeRegistry {
    inner: RwLock<Indexes>,
}

impl AttributeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an application. Writes both indexes; does not deduplicate.
    pub fn register(&self, target: AttributeTarget, instance: AttributeInstance) {
        tracing::trace!(
            attribute = instance.type_name(),
            kind = target.kind().label(),
            "registering attribute instance"
        );

        let mut inner = self.inner.write();
        inner
            .by_target
            .entry(target.clone())
            .or_default()
            .push(instance.clone());
        inner
            .by_type
            .entry(instance.type_id)
            .or_default()
            .push((target, instance));
    }

    /// All instances at the exact target identity, in attachment order.
    pub fn get(&self, target: &AttributeTarget) -> Vec<AttributeInstance> {
        self.inner
            .read()
            .by_target
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    /// Instances of handler type `H` at the target, in attachment order.
    pub fn get_of<H: Send + Sync + 'static>(&self, target: &AttributeTarget) -> Vec<Arc<H>> {
        self.inner
            .read()
            .by_target
            .get(target)
            .map(|instances| instances.iter().filter_map(|i| i.downcast::<H>()).collect())
            .unwrap_or_default()
    }

    /// Existence check for handler type `H` at the target, without
    /// allocating a result list.
    pub fn has<H: Send + Sync + 'static>(&self, target: &AttributeTarget) -> bool {
        self.inner
            .read()
            .by_target
            .get(target)
            .is_some_and(|instances| instances.iter().any(|i| i.is::<H>()))
    }

    /// Global reverse lookup: every application of handler type `H` across
    /// all attachment kinds.
    pub fn instances_of<H: Send + Sync + 'static>(&self) -> Vec<(AttributeTarget, Arc<H>)> {
        self.inner
            .read()
            .by_type
            .get(&TypeId::of::<H>())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(target, instance)| {
                        instance.downcast::<H>().map(|h| (target.clone(), h))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Per-kind convenience queries
    // ========================================================================

    /// All attributes on a class.
    pub fn get_from_class(&self, class: ClassId) -> Vec<AttributeInstance> {
        self.get(&AttributeTarget::Class { class })
    }

    /// Attributes of type `H` on a class.
    pub fn get_from_class_of<H: Send + Sync + 'static>(&self, class: ClassId) -> Vec<Arc<H>> {
        self.get_of::<H>(&AttributeTarget::Class { class })
    }

    /// Whether a class carries an attribute of type `H`.
    pub fn has_from_class<H: Send + Sync + 'static>(&self, class: ClassId) -> bool {
        self.has::<H>(&AttributeTarget::Class { class })
    }

    /// All attributes on a method.
    pub fn get_from_method(&self, class: ClassId, method: &str) -> Vec<AttributeInstance> {
        self.get(&AttributeTarget::Method {
            class,
            method: method.to_string(),
        })
    }

    /// Attributes of type `H` on a method.
    pub fn get_from_method_of<H: Send + Sync + 'static>(&self, class: ClassId, method: &str) -> Vec<Arc<H>> {
        self.get_of::<H>(&AttributeTarget::Method {
            class,
            method: method.to_string(),
        })
    }

    /// Whether a method carries an attribute of type `H`.
    pub fn has_from_method<H: Send + Sync + 'static>(&self, class: ClassId, method: &str) -> bool {
        self.has::<H>(&AttributeTarget::Method {
            class,
            method: method.to_string(),
        })
    }

    /// All attributes on a property.
    pub fn get_from_property(&self, class: ClassId, property: &str) -> Vec<AttributeInstance> {
        self.get(&AttributeTarget::Property {
            class,
            property: property.to_string(),
        })
    }

    /// Attributes of type `H` on a property.
    pub fn get_from_property_of<H: Send + Sync + 'static>(&self, class: ClassId, property: &str) -> Vec<Arc<H>> {
        self.get_of::<H>(&AttributeTarget::Property {
            class,
            property: property.to_string(),
        })
    }

    /// Whether a property carries an attribute of type `H`.
    pub fn has_from_property<H: Send + Sync + 'static>(&self, class: ClassId, property: &str) -> bool {
        self.has::<H>(&AttributeTarget::Property {
            class,
            property: property.to_string(),
        })
    }

    /// All attributes on a parameter.
    pub fn get_from_parameter(
        &self,
        class: ClassId,
        method: &str,
        index: usize,
    ) -> Vec<AttributeInstance> {
        self.get(&AttributeTarget::Parameter {
            class,
            method: method.to_string(),
            index,
        })
    }

    /// Attributes of type `H` on a parameter.
    pub fn get_from_parameter_of<H: Send + Sync + 'static>(
        &self,
        class: ClassId,
        method: &str,
        index: usize,
    ) -> Vec<Arc<H>> {
        self.get_of::<H>(&AttributeTarget::Parameter {
            class,
            method: method.to_string(),
            index,
        })
    }

    /// Whether a parameter carries an attribute of type `H`.
    pub fn has_from_parameter<H: Send + Sync + 'static>(
        &self,
        class: ClassId,
        method: &str,
        index: usize,
    ) -> bool {
        self.has::<H>(&AttributeTarget::Parameter {
            class,
            method: method.to_string(),
            index,
        })
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Total number of registered applications.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .by_target
            .values()
            .map(|instances| instances.len())
            .sum()
    }

    /// Whether the registry holds no applications.
    pub fn is_empty(&self) -> bool {
        self.inner.read().by_target.is_empty()
    }

    /// Removes every application. Supports deterministic test isolation.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.by_target.clear();
        inner.by_type.clear();
    }
}
