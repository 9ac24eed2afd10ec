//! Sable object model
//!
//! The runtime core that a dynamically typed, class-based language built on
//! namespace-qualified names runs on top of:
//! - **Namespaces**: identity-compared namespaces, qualified names and the
//!   package registry (`ns` module)
//! - **Names**: per-class name tables with unqualified, single-namespace and
//!   namespace-set lookup (`names` module)
//! - **Classes**: traits, slot layout, interfaces and the subtype relation
//!   (`traits`, `class` modules)
//! - **Objects**: instances, dynamic properties and specialized storage
//!   (`object`, `flex_vector`, `dictionary` modules)
//! - **Semantics**: coercion, construction, calls and the property protocol
//!   (`coerce`, `construct`, `function`, `property` modules)
//! - **Realm**: global definitions and the builtin classes (`realm`,
//!   `bootstrap` modules)
//!
//! # Example
//!
//! ```rust,ignore
//! use sable_runtime::{ClassOptions, Member, QName, Qualifier, Runtime, Value};
//!
//! let rt = Runtime::new();
//! let ns = rt.package_ns("");
//! let point = rt.realm().define_class(
//!     QName::new(ns.clone(), "Point"),
//!     ClassOptions::new(),
//!     vec![Member::var(QName::new(ns.clone(), "x"), None)],
//! );
//! let p = rt.construct(&point, &[])?;
//! rt.set_property(&p, &Qualifier::Unqualified, "x", Value::Int(1))?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Names
// ============================================================================

/// Namespaces, qualified names and packages
pub mod ns;

/// Namespace-keyed name tables
pub mod names;

// ============================================================================
// Classes and objects
// ============================================================================

/// Runtime values
pub mod value;

/// Trait model
pub mod traits;

/// Classes, interfaces and the subtype relation
pub mod class;

/// Instances and their storage
pub mod object;

/// Array and generic vector storage
pub mod elements;

/// Specialized numeric vector storage
pub mod flex_vector;

/// Identity-keyed dictionary storage
pub mod dictionary;

// ============================================================================
// Semantics
// ============================================================================

/// Type membership and conversions
pub mod coerce;

/// Instance construction
pub mod construct;

/// Function values and calls
pub mod function;

/// The property protocol
pub mod property;

// ============================================================================
// Runtime
// ============================================================================

/// Builtin classes
pub mod bootstrap;

/// Runtime errors
pub mod error;

/// Global definitions
pub mod realm;

/// Runtime context
pub mod runtime;

// ============================================================================
// Re-exports
// ============================================================================

pub use bootstrap::Builtins;
pub use class::{Class, ClassOptions, ClassRef, Interface, InterfaceOptions, InterfaceRef, Metadata, Type};
pub use error::{RtResult, RuntimeError};
pub use function::{Function, FunctionRef};
pub use names::{Names, Qualifier};
pub use ns::{Ns, PackageRegistry, QName};
pub use object::{Instance, ObjectRef, Storage, StorageKind};
pub use realm::{Definition, Realm};
pub use runtime::{Runtime, RuntimeOptions};
pub use traits::{native, Member, NativeFn};
pub use value::{PrimitiveKind, Value};
