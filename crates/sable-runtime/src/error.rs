//! Runtime errors
//!
//! Every failure surfaced by the object model is a [`RuntimeError`]. None of
//! them are retried internally; the host interpreter decides how to recover.

use crate::value::Value;
use thiserror::Error;

/// Errors raised by name resolution, property access, construction and
/// the builtin collections.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// An unqualified or namespace-set lookup matched more than one trait
    #[error("Ambiguous reference to {name}")]
    AmbiguousReference {
        /// Local name that was looked up
        name: String,
    },

    /// No trait, dynamic property or collection element matched
    #[error("Access of undefined property {name}")]
    UndefinedProperty {
        /// Property that was accessed
        name: String,
    },

    /// Write to a read-only variable
    #[error("Illegal write to read-only property {name}")]
    WriteToReadOnly {
        /// Variable that was written
        name: String,
    },

    /// Read of an accessor that has no getter
    #[error("Illegal read of write-only property {name}")]
    WriteOnlyPropertyRead {
        /// Accessor that was read
        name: String,
    },

    /// Write to an accessor that has no setter
    #[error("Illegal write to read-only property {name}")]
    ReadOnlyPropertyWrite {
        /// Accessor that was written
        name: String,
    },

    /// Write to a method or namespace alias
    #[error("Cannot assign to a method or namespace {name}")]
    AssignToMethod {
        /// Trait that was written
        name: String,
    },

    /// Index outside a specialized numeric vector
    #[error("The index {index} is out of range {length}")]
    IndexOutOfRange {
        /// Requested index
        index: u64,
        /// Length of the sequence at the time of access
        length: usize,
    },

    /// Weak-keyed dictionary given a key that is not an instance
    #[error("Weak dictionary keys must be objects")]
    InvalidWeakKey,

    /// Member access on null or undefined
    #[error("Cannot access a property or method of a null object reference ({name})")]
    NullReference {
        /// Property that was accessed
        name: String,
    },

    /// Length-changing operation on a fixed vector
    #[error("The fixed property is set to true")]
    FixedSizeViolation,

    /// Call of a value that is not a function
    #[error("{name} is not a function")]
    NotCallable {
        /// Rendering of the value that was called
        name: String,
    },

    /// `construct` applied to something that is not a class
    #[error("{name} is not a constructor")]
    NotConstructible {
        /// Rendering of the value that was constructed
        name: String,
    },

    /// Length or size beyond what the runtime materializes
    #[error("Range error: {0}")]
    RangeError(String),

    /// Argument or receiver mismatch detected by a builtin procedure
    #[error("Type error: {0}")]
    TypeError(String),

    /// A language-level exception value thrown by a procedure
    #[error("Uncaught exception: {0:?}")]
    Thrown(Value),
}

impl RuntimeError {
    /// Shorthand for [`RuntimeError::UndefinedProperty`]
    pub fn undefined_property(name: impl Into<String>) -> Self {
        RuntimeError::UndefinedProperty { name: name.into() }
    }

    /// Shorthand for [`RuntimeError::NullReference`]
    pub fn null_reference(name: impl Into<String>) -> Self {
        RuntimeError::NullReference { name: name.into() }
    }

    /// Shorthand for [`RuntimeError::AmbiguousReference`]
    pub fn ambiguous(name: impl Into<String>) -> Self {
        RuntimeError::AmbiguousReference { name: name.into() }
    }
}

/// Result type used throughout the runtime
pub type RtResult<T> = Result<T, RuntimeError>;
