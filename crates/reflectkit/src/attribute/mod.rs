//! Attribute Runtime
//!
//! An attribute is a reusable annotation defined once as an
//! [`AttributeHandler`] and applied to classes, methods, properties, or
//! parameters. Applying it resolves a reflection facade for the target,
//! invokes the matching lifecycle callback, validates applicability,
//! records the instance in the context's [`AttributeRegistry`], and emits
//! lifecycle events - all synchronously, before control returns to the
//! caller.
//!
//! Rust has no decorator syntax, so attachment kinds are stated explicitly
//! through the `apply_to_*` methods rather than inferred from call shape.
//!
//! ```ignore
//! struct Route { path: String }
//!
//! impl AttributeHandler for Route {
//!     fn on_method(&mut self, event: &MethodAttachment<'_>) -> Outcome {
//!         Outcome::Applied
//!     }
//! }
//!
//! static ROUTE: Lazy<Attribute<Route>> = Lazy::new(Attribute::new);
//!
//! ROUTE.apply_to_method(&reflection, controller, "index", Route { path: "/".into() })?;
//! ```

mod events;
pub mod registry;

pub use events::{Attached, AttributeEvents, SubscriptionId};
pub use registry::{AttachmentKind, AttributeInstance, AttributeRegistry, AttributeTarget};

use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Reflection;
use crate::declaration::ClassId;
use crate::reflection::{
    ReflectionClass, ReflectionMethod, ReflectionParameter, ReflectionProperty,
};
use crate::{ReflectError, ReflectResult};

/// What a lifecycle callback reports back to the runtime.
///
/// The default implementations all return [`Outcome::Unsupported`], so a
/// handler only supports the attachment kinds it explicitly implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler accepted the attachment.
    Applied,
    /// The handler does not implement this attachment kind.
    Unsupported,
}

/// Details for a class attachment.
#[derive(Debug)]
pub struct ClassAttachment<'a> {
    /// The target class.
    pub class: ClassId,
    /// Reflection facade for the target class.
    pub reflection: &'a ReflectionClass<'a>,
}

/// Details for a method attachment.
#[derive(Debug)]
pub struct MethodAttachment<'a> {
    /// The owning class.
    pub class: ClassId,
    /// The target method name.
    pub method_name: &'a str,
    /// The method's declared source text, when available.
    pub source: Option<&'a str>,
    /// Reflection facade for the target method.
    pub reflection: &'a ReflectionMethod<'a>,
}

/// Details for a property attachment.
#[derive(Debug)]
pub struct PropertyAttachment<'a> {
    /// The owning class.
    pub class: ClassId,
    /// The target property name.
    pub property_name: &'a str,
    /// Reflection facade for the target property.
    pub reflection: &'a ReflectionProperty<'a>,
}

/// Details for a parameter attachment.
#[derive(Debug)]
pub struct ParameterAttachment<'a> {
    /// The owning class.
    pub class: ClassId,
    /// The owning method name (`constructor` for constructor parameters).
    pub method_name: &'a str,
    /// Zero-based parameter index.
    pub index: usize,
    /// Reflection facade for the target parameter.
    pub reflection: &'a ReflectionParameter<'a>,
}

/// User-authored attribute behavior.
///
/// Implement the callbacks for the attachment kinds the attribute supports.
/// Constructor arguments are ordinary struct fields, preserved per instance;
/// constructing the handler directly (without applying it) is the escape
/// hatch for unit-testing handler logic in isolation.
pub trait AttributeHandler: Send + Sync + 'static {
    /// Invoked when the attribute is applied to a class.
    fn on_class(&mut self, _event: &ClassAttachment<'_>) -> Outcome {
        Outcome::Unsupported
    }

    /// Invoked when the attribute is applied to a method.
    fn on_method(&mut self, _event: &MethodAttachment<'_>) -> Outcome {
        Outcome::Unsupported
    }

    /// Invoked when the attribute is applied to a property.
    fn on_property(&mut self, _event: &PropertyAttachment<'_>) -> Outcome {
        Outcome::Unsupported
    }

    /// Invoked when the attribute is applied to a parameter.
    fn on_parameter(&mut self, _event: &ParameterAttachment<'_>) -> Outcome {
        Outcome::Unsupported
    }
}

/// Trims a type path down to its final segment for error messages.
fn short_type_name<H>() -> &'static str {
    let full = std::any::type_name::<H>();
    full.rsplit("::").next().unwrap_or(full)
}

/// The applied form of an attribute: the value user code holds, applies to
/// targets, and subscribes to for lifecycle events.
///
/// One `Attribute<H>` value per handler type is the usual arrangement,
/// typically stored in a `Lazy` static next to the handler.
pub struct Attribute<H: AttributeHandler> {
    events: AttributeEvents<H>,
    _handler: PhantomData<fn() -> H>,
}

impl<H: AttributeHandler> Default for Attribute<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: AttributeHandler> Attribute<H> {
    /// Creates the attribute value for handler type `H`.
    pub fn new() -> Self {
        Self {
            events: AttributeEvents::new(),
            _handler: PhantomData,
        }
    }

    /// The attribute's lifecycle event stream.
    pub fn events(&self) -> &AttributeEvents<H> {
        &self.events
    }

    /// Applies the attribute to a class.
    pub fn apply_to_class(
        &self,
        reflection: &Reflection,
        class: ClassId,
        handler: H,
    ) -> ReflectResult<Arc<H>> {
        self.apply(reflection, handler, AttributeTarget::Class { class })
    }

    /// Applies the attribute to a method.
    pub fn apply_to_method(
        &self,
        reflection: &Reflection,
        class: ClassId,
        method: &str,
        handler: H,
    ) -> ReflectResult<Arc<H>> {
        self.apply(
            reflection,
            handler,
            AttributeTarget::Method {
                class,
                method: method.to_string(),
            },
        )
    }

    /// Applies the attribute to a property.
    pub fn apply_to_property(
        &self,
        reflection: &Reflection,
        class: ClassId,
        property: &str,
        handler: H,
    ) -> ReflectResult<Arc<H>> {
        self.apply(
            reflection,
            handler,
            AttributeTarget::Property {
                class,
                property: property.to_string(),
            },
        )
    }

    /// Applies the attribute to a method parameter.
    pub fn apply_to_parameter(
        &self,
        reflection: &Reflection,
        class: ClassId,
        method: &str,
        index: usize,
        handler: H,
    ) -> ReflectResult<Arc<H>> {
        self.apply(
            reflection,
            handler,
            AttributeTarget::Parameter {
                class,
                method: method.to_string(),
                index,
            },
        )
    }

    /// Applies the attribute to a constructor parameter. Shorthand for a
    /// parameter attachment with no method name.
    pub fn apply_to_constructor_parameter(
        &self,
        reflection: &Reflection,
        class: ClassId,
        index: usize,
        handler: H,
    ) -> ReflectResult<Arc<H>> {
        self.apply(
            reflection,
            handler,
            AttributeTarget::constructor_parameter(class, index),
        )
    }

    /// Applies the attribute to an explicit attachment target.
    ///
    /// Either the full resolve-dispatch-register-emit sequence completes,
    /// or an error aborts before registration; a failed attachment never
    /// reaches the registry. Method, property, and parameter attachments
    /// are recorded against the member's declaring class, even when the
    /// target names a subclass that inherits the member.
    pub fn apply(
        &self,
        reflection: &Reflection,
        mut handler: H,
        target: AttributeTarget,
    ) -> ReflectResult<Arc<H>> {
        let build_failure = |target: &AttributeTarget| ReflectError::ReflectionBuildFailed {
            attribute: short_type_name::<H>().to_string(),
            target: target.describe(reflection),
        };

        let class = reflection
            .class(target.class())
            .map_err(|_| build_failure(&target))?;

        // Member attachments are recorded against the declaring class, so an
        // attribute applied through a subclass facade and one applied at the
        // declaring class land on the same identity, and inherited members
        // see both.
        let (outcome, registered) = match &target {
            AttributeTarget::Class { class: id } => {
                let outcome = handler.on_class(&ClassAttachment {
                    class: *id,
                    reflection: &class,
                });
                (outcome, target.clone())
            }
            AttributeTarget::Method { class: id, method } => {
                let resolved = class.get_method(method).ok_or_else(|| build_failure(&target))?;
                let outcome = handler.on_method(&MethodAttachment {
                    class: *id,
                    method_name: method,
                    source: resolved.source(),
                    reflection: &resolved,
                });
                let registered = AttributeTarget::Method {
                    class: resolved.declaring_class_id(),
                    method: method.clone(),
                };
                (outcome, registered)
            }
            AttributeTarget::Property {
                class: id,
                property,
            } => {
                let resolved = class
                    .get_property(property)
                    .ok_or_else(|| build_failure(&target))?;
                let outcome = handler.on_property(&PropertyAttachment {
                    class: *id,
                    property_name: property,
                    reflection: &resolved,
                });
                let registered = AttributeTarget::Property {
                    class: resolved.declaring_class_id(),
                    property: property.clone(),
                };
                (outcome, registered)
            }
            AttributeTarget::Parameter {
                class: id,
                method,
                index,
            } => {
                let resolved_method =
                    class.get_method(method).ok_or_else(|| build_failure(&target))?;
                let resolved = resolved_method
                    .get_parameter_at(*index)
                    .ok_or_else(|| build_failure(&target))?;
                let outcome = handler.on_parameter(&ParameterAttachment {
                    class: *id,
                    method_name: method,
                    index: *index,
                    reflection: &resolved,
                });
                let registered = AttributeTarget::Parameter {
                    class: resolved_method.declaring_class_id(),
                    method: method.clone(),
                    index: *index,
                };
                (outcome, registered)
            }
        };

        if outcome == Outcome::Unsupported {
            if reflection.is_strict() {
                return Err(ReflectError::UnsupportedAttachment {
                    attribute: short_type_name::<H>().to_string(),
                    target: target.describe(reflection),
                });
            }

            // Strict checking off: the attachment silently becomes a no-op.
            return Ok(Arc::new(handler));
        }

        let instance = Arc::new(handler);
        reflection
            .attributes()
            .register(registered.clone(), AttributeInstance::of(Arc::clone(&instance)));

        tracing::debug!(
            attribute = short_type_name::<H>(),
            kind = registered.kind().label(),
            "attribute attached"
        );

        self.events.emit(&Attached {
            kind: registered.kind(),
            target: registered,
            instance: Arc::clone(&instance),
        });

        Ok(instance)
    }
}
