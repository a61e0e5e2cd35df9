//! Enumeration Filters
//!
//! Bit-flag filters for the facade enumeration methods. Filters are
//! conjunctive: every flag set in the filter must hold for a member to be
//! included, so `MethodFilter::STATIC | MethodFilter::OWN` selects static
//! methods declared directly on the class.

use bitflags::bitflags;

bitflags! {
    /// Selects methods during enumeration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFilter: u8 {
        /// Static methods.
        const STATIC = 1 << 0;
        /// Instance methods.
        const LOCAL = 1 << 1;
        /// Methods carrying any declared type hints.
        const TYPED = 1 << 2;
        /// Methods declared on an ancestor class.
        const INHERITED = 1 << 3;
        /// Methods declared directly on the class.
        const OWN = 1 << 4;
    }
}

bitflags! {
    /// Selects properties during enumeration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyFilter: u8 {
        /// Properties carrying a declared type hint.
        const TYPED = 1 << 0;
        /// Properties declared on an ancestor class.
        const INHERITED = 1 << 1;
        /// Properties declared directly on the class.
        const OWN = 1 << 2;
    }
}

bitflags! {
    /// Selects parameters during enumeration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParameterFilter: u8 {
        /// Parameters with at least one metadata entry.
        const META = 1 << 0;
        /// Parameters with a default value.
        const WITH_DEFAULT = 1 << 1;
        /// Parameters without a default value.
        const WITHOUT_DEFAULT = 1 << 2;
        /// Parameters whose type hint is a primitive.
        const PRIMITIVE_TYPE = 1 << 3;
        /// Parameters whose type hint is not a primitive.
        const NON_PRIMITIVE_TYPE = 1 << 4;
        /// Parameters whose type hint names a specific type.
        const KNOWN_TYPE = 1 << 5;
        /// Parameters with no specific type information.
        const UNKNOWN_TYPE = 1 << 6;
    }
}
