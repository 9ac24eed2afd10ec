//! Callable values and the bound-method cache

use crate::class::{ClassRef, Type};
use crate::error::{RtResult, RuntimeError};
use crate::runtime::Runtime;
use crate::traits::{MethodRef, NativeFn, TraitId};
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared function handle
pub type FunctionRef = Rc<Function>;

/// A callable value
pub enum Function {
    /// Free-standing native closure
    Native {
        /// Name used in diagnostics
        name: String,
        /// Body; receives the `this` passed by the caller
        body: NativeFn,
    },
    /// Method bound to a receiver; calls dispatch on the receiver's class
    Bound {
        /// Receiver
        receiver: Value,
        /// Method read off the receiver
        method: MethodRef,
    },
    /// Static method read off a class; runs without a receiver
    Static {
        /// Class the method was read from
        class: ClassRef,
        /// Method
        method: MethodRef,
    },
}

impl Function {
    /// Create a native function value
    pub fn native(name: impl Into<String>, body: NativeFn) -> FunctionRef {
        Rc::new(Function::Native {
            name: name.into(),
            body,
        })
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        match self {
            Function::Native { name, .. } => name,
            Function::Bound { method, .. } | Function::Static { method, .. } => &method.name().name,
        }
    }

    /// Invoke with an explicit receiver. Bound methods ignore `this`.
    pub fn invoke(&self, rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
        match self {
            Function::Native { body, .. } => body(rt, this, args),
            Function::Bound { receiver, method } => method.call_dispatch(rt, receiver, args),
            Function::Static { method, .. } => method.call_exact(rt, &Value::Undefined, args),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native { name, .. } => write!(f, "Native({})", name),
            Function::Bound { receiver, method } => {
                write!(f, "Bound({:?}.{})", receiver, method.name().name)
            }
            Function::Static { class, method } => {
                write!(f, "Static({}.{})", class.name(), method.name().name)
            }
        }
    }
}

/// Cache of bound callables keyed by `(receiver identity, method identity)`.
///
/// Entries are weak: the cache never keeps a bound function alive, and the
/// bound function is what keeps its receiver alive. While anything still
/// holds the callable, reading the method again yields the same identity.
#[derive(Debug, Default)]
pub struct BoundMethodCache {
    entries: RefCell<FxHashMap<(usize, TraitId), Weak<Function>>>,
    sweep_threshold: usize,
}

impl BoundMethodCache {
    /// Create a cache that sweeps dead entries once it holds
    /// `sweep_threshold` of them
    pub fn new(sweep_threshold: usize) -> Self {
        Self {
            entries: RefCell::default(),
            sweep_threshold: sweep_threshold.max(1),
        }
    }

    /// Return the cached callable for `(receiver, method)`, creating it with
    /// `make` on a miss
    pub fn get_or_bind(
        &self,
        receiver_id: usize,
        method: &MethodRef,
        make: impl FnOnce() -> Function,
    ) -> FunctionRef {
        let key = (receiver_id, method.id());
        if let Some(func) = self.entries.borrow().get(&key).and_then(Weak::upgrade) {
            return func;
        }
        let func = Rc::new(make());
        let mut entries = self.entries.borrow_mut();
        if entries.len() >= self.sweep_threshold {
            entries.retain(|_, f| f.strong_count() > 0);
        }
        entries.insert(key, Rc::downgrade(&func));
        tracing::trace!(method = %method.name(), receiver = receiver_id, "bound method cached");
        func
    }

    /// Number of entries, live or dead
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Runtime {
    /// Call `callee` with `this` and `args`.
    ///
    /// Functions run their body. Primitive classes convert their argument,
    /// other classes cast it (a failed cast is a type error).
    pub fn call(&self, callee: &Value, this: &Value, args: &[Value]) -> RtResult<Value> {
        match callee {
            Value::Function(func) => func.invoke(self, this, args),
            Value::Class(class) if class.primitive().is_some() => self.construct(class, args),
            Value::Class(class) => self.cast(args, &Type::Class(class.clone())),
            Value::Interface(iface) => self.cast(args, &Type::Interface(iface.clone())),
            other => Err(RuntimeError::NotCallable {
                name: self.tostring(other),
            }),
        }
    }

    fn cast(&self, args: &[Value], ty: &Type) -> RtResult<Value> {
        let arg = args.first().cloned().unwrap_or_default();
        if arg.is_nullish() || self.is_type(&arg, Some(ty)) {
            Ok(self.coerce(&arg, Some(ty)))
        } else {
            Err(RuntimeError::TypeError(format!(
                "Type Coercion failed: cannot convert {} to {}",
                self.tostring(&arg),
                ty.name()
            )))
        }
    }
}
