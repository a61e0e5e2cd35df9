//! Runtime reflection and attribute engine.
//!
//! `reflectkit` gives plain class declarations a runtime reflection surface:
//! registered classes can be inspected for methods, properties, constructor
//! parameters, and inheritance; annotated with typed attributes that run
//! lifecycle callbacks at attachment time; and tagged with arbitrary
//! metadata at every granularity down to a single parameter.
//!
//! The crate splits into four layers:
//!
//! - [`declaration`]: explicit class declarations and the [`ClassBuilder`]
//!   that registers them with a [`Reflection`] context.
//! - [`parser`]: the declaration-text scanner that recovers parameter
//!   names and default markers from method source.
//! - [`attribute`]: the attribute runtime - handlers, lifecycle callbacks,
//!   the application registry, and attachment events.
//! - [`reflection`]: the read-only facades ([`ReflectionClass`] and
//!   friends) that merge inheritance chains and answer queries.
//!
//! ```ignore
//! let rx = Reflection::new();
//! let id = ClassBuilder::new("UserController")
//!     .source("class UserController { constructor(service, limit = 25) {} }")
//!     .method("index", "index(request) {}")
//!     .register(&rx)?;
//!
//! let class = rx.class(id)?;
//! let params = class.get_constructor_method().get_parameters();
//! assert_eq!(params[1].name(), "limit");
//! ```

pub mod attribute;
mod context;
pub mod declaration;
pub mod metadata;
pub mod parser;
pub mod reflection;

pub use attribute::{
    Attached, AttachmentKind, Attribute, AttributeEvents, AttributeHandler, AttributeInstance,
    AttributeRegistry, AttributeTarget, ClassAttachment, MethodAttachment, Outcome,
    ParameterAttachment, PropertyAttachment, SubscriptionId,
};
pub use context::Reflection;
pub use declaration::{ClassBuilder, ClassDecl, ClassId, MethodDecl, PropertyDecl, TypeHint};
pub use metadata::{MetadataKey, MetadataStore};
pub use parser::ExtractedParameter;
pub use reflection::{
    MethodFilter, ParameterFilter, PropertyFilter, ReflectionClass, ReflectionMethod,
    ReflectionParameter, ReflectionProperty,
};

use thiserror::Error;

/// Errors surfaced by registration and attribute application.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// The handler does not implement the attempted attachment kind and
    /// strict usage checking is enabled.
    #[error("attribute {attribute} cannot be applied to {target}")]
    UnsupportedAttachment {
        /// Short handler type name.
        attribute: String,
        /// Human-readable target description.
        target: String,
    },

    /// The attachment target could not be resolved to a reflection facade.
    #[error("failed to build reflection on {target} for attribute {attribute}")]
    ReflectionBuildFailed {
        /// Short handler type name.
        attribute: String,
        /// Human-readable target description.
        target: String,
    },

    /// The class identity is not registered in this context.
    #[error("unknown class id {}", .0.index())]
    UnknownClass(ClassId),

    /// A class with the same name is already registered in this context.
    #[error("class {0} is already registered")]
    DuplicateClass(String),
}

/// Convenience alias used throughout the crate.
pub type ReflectResult<T> = Result<T, ReflectError>;
