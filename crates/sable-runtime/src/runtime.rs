//! Runtime context
//!
//! A [`Runtime`] owns everything the object model needs at run time: the
//! realm (packages and global definitions), the bootstrapped builtin
//! classes and the bound-method cache. Property access, construction,
//! coercion and calls are implemented as methods on it in their own
//! modules.

use crate::bootstrap::{self, Builtins};
use crate::class::ClassRef;
use crate::function::BoundMethodCache;
use crate::ns::{Ns, QName, SYSTEM_NS_URI};
use crate::object::{Instance, ObjectRef, Storage};
use crate::realm::Realm;
use crate::value::{PrimitiveKind, Value};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Give reflected system namespaces a fresh random URI on every
    /// reflection. When false they all report the fixed system URI.
    pub randomize_system_namespace_uris: bool,

    /// Bound-method cache size at which dead entries are swept on insert
    pub bound_method_cache_sweep_threshold: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            randomize_system_namespace_uris: true,
            bound_method_cache_sweep_threshold: 256,
        }
    }
}

impl RuntimeOptions {
    /// Options with deterministic namespace reflection
    pub fn deterministic() -> Self {
        Self {
            randomize_system_namespace_uris: false,
            ..Default::default()
        }
    }
}

/// An isolated object-model instance
pub struct Runtime {
    options: RuntimeOptions,
    realm: Realm,
    builtins: Builtins,
    bound_methods: BoundMethodCache,
}

impl Runtime {
    /// Create a runtime with default options and the builtins installed
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    /// Create a runtime with explicit options
    pub fn with_options(options: RuntimeOptions) -> Self {
        let realm = Realm::new();
        let builtins = bootstrap::install(&realm);
        let bound_methods = BoundMethodCache::new(options.bound_method_cache_sweep_threshold);
        tracing::debug!(definitions = realm.definition_count(), "runtime ready");
        Self {
            options,
            realm,
            builtins,
            bound_methods,
        }
    }

    /// Active options
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Packages and global definitions
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Builtin classes
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub(crate) fn bound_methods(&self) -> &BoundMethodCache {
        &self.bound_methods
    }

    /// `public` namespace of a package
    pub fn package_ns(&self, package: &str) -> Ns {
        self.realm.package_ns(package)
    }

    /// `internal` namespace of a package
    pub fn package_internal_ns(&self, package: &str) -> Ns {
        self.realm.package_internal_ns(package)
    }

    /// Class whose instance traits serve property access on `value`.
    /// Primitives map to their boxed class; `null` and `undefined` have none.
    pub fn class_of(&self, value: &Value) -> Option<ClassRef> {
        let b = &self.builtins;
        let class = match value {
            Value::Undefined | Value::Null => return None,
            Value::Object(obj) => return Some(obj.class()),
            Value::Class(_) | Value::Interface(_) => &b.class,
            Value::Function(_) => &b.function,
            primitive => match primitive.primitive_kind()? {
                PrimitiveKind::Number => &b.number,
                PrimitiveKind::Int => &b.int,
                PrimitiveKind::Uint => &b.uint,
                PrimitiveKind::Float => &b.float,
                PrimitiveKind::Boolean => &b.boolean,
                PrimitiveKind::String => &b.string,
            },
        };
        Some(class.clone())
    }

    /// Reify a namespace as a `Namespace` instance.
    ///
    /// System namespaces do not expose a stable URI: unless disabled in
    /// [`RuntimeOptions`], each reflection reports a fresh random one.
    pub fn reflect_namespace(&self, ns: &Ns) -> Value {
        let uri = match ns.uri() {
            Some(uri) => uri.to_string(),
            None if self.options.randomize_system_namespace_uris => {
                format!("{}/{:016x}", SYSTEM_NS_URI, rand::random::<u64>())
            }
            None => SYSTEM_NS_URI.to_string(),
        };
        let class = &self.builtins.namespace;
        let mut instance = Instance::allocate(class);
        let public = self.package_ns("");
        if let Some(index) = class.find_slot(&QName::new(public, "uri")) {
            instance.set_slot(index, Value::from(uri));
        }
        *instance.storage_mut() = Storage::Namespace(Some(ns.clone()));
        Value::Object(ObjectRef::new(instance))
    }

    /// Reify a class as a `Class` wrapper instance
    pub fn reflect_class(&self, class: &ClassRef) -> Value {
        let mut instance = Instance::allocate(&self.builtins.class);
        *instance.storage_mut() = Storage::Class(Some(class.clone()));
        Value::Object(ObjectRef::new(instance))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
