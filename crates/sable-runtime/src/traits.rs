//! Trait model
//!
//! A trait is a named member of a class or interface. The variant set is
//! closed: storage-backed variables, accessor pairs, methods and namespace
//! aliases.

use crate::class::Type;
use crate::error::RtResult;
use crate::ns::{Ns, QName};
use crate::runtime::Runtime;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for trait and method identities
static NEXT_TRAIT_ID: AtomicU64 = AtomicU64::new(1);

fn generate_trait_id() -> TraitId {
    TraitId(NEXT_TRAIT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Process-unique trait identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraitId(pub u64);

/// Native procedure: `(runtime, this, arguments) -> result`
pub type NativeFn = Rc<dyn Fn(&Runtime, &Value, &[Value]) -> RtResult<Value>>;

/// Wrap a closure as a [`NativeFn`]
pub fn native<F>(f: F) -> NativeFn
where
    F: Fn(&Runtime, &Value, &[Value]) -> RtResult<Value> + 'static,
{
    Rc::new(f)
}

/// Shared trait handle
pub type TraitRef = Rc<Trait>;

/// Shared method handle
pub type MethodRef = Rc<Method>;

/// What part of a member a method body implements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRole {
    /// Ordinary method
    Plain,
    /// Getter half of an accessor
    Getter,
    /// Setter half of an accessor
    Setter,
}

/// A method body together with the name it was declared under
pub struct Method {
    id: TraitId,
    name: QName,
    role: MethodRole,
    body: NativeFn,
}

impl Method {
    /// Create a method declared under `name`
    pub fn new(name: QName, role: MethodRole, body: NativeFn) -> MethodRef {
        Rc::new(Self {
            id: generate_trait_id(),
            name,
            role,
            body,
        })
    }

    /// Method identity
    pub fn id(&self) -> TraitId {
        self.id
    }

    /// Declared name
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Role within its member
    pub fn role(&self) -> MethodRole {
        self.role
    }

    /// Non-dispatching entry: runs exactly this body.
    pub fn call_exact(&self, rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
        (self.body)(rt, this, args)
    }

    /// Dispatching entry: runs the most-derived override of this method
    /// for the receiver's class, falling back to this body. Public methods
    /// are overridden from any package's public namespace.
    pub fn call_dispatch(&self, rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
        if let Some(class) = rt.class_of(this) {
            for owner in class.ancestors() {
                let names = owner.instance_names();
                let found = if self.name.ns.is_public() {
                    names.get_public_name(&self.name.name)?
                } else {
                    names.get_ns_name(&self.name.ns, &self.name.name)
                };
                let Some(found) = found else {
                    continue;
                };
                let target = match (found.kind(), self.role) {
                    (TraitKind::Method(m), MethodRole::Plain) => Some(m),
                    (TraitKind::VirtualVariable(acc), MethodRole::Getter) => acc.getter.as_ref(),
                    (TraitKind::VirtualVariable(acc), MethodRole::Setter) => acc.setter.as_ref(),
                    _ => None,
                };
                if let Some(target) = target {
                    return target.call_exact(rt, this, args);
                }
                break;
            }
        }
        self.call_exact(rt, this, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("id", &self.id)
            .field("name", &self.name.to_string())
            .field("role", &self.role)
            .finish()
    }
}

/// Storage-backed variable
#[derive(Debug, Clone, Default)]
pub struct Variable {
    /// Writes through the property protocol are rejected
    pub read_only: bool,
    /// Declared type; `None` is the universal type
    pub ty: Option<Type>,
    /// Initial slot value; `None` means the declared type's default
    pub initial: Option<Value>,
}

/// Getter/setter pair
#[derive(Debug, Clone, Default)]
pub struct Accessor {
    /// Getter, if readable
    pub getter: Option<MethodRef>,
    /// Setter, if writable
    pub setter: Option<MethodRef>,
    /// Declared type; `None` is the universal type
    pub ty: Option<Type>,
}

/// The trait variants
#[derive(Debug, Clone)]
pub enum TraitKind {
    /// Storage-backed variable
    Variable(Variable),
    /// Computed accessor
    VirtualVariable(Accessor),
    /// Method
    Method(MethodRef),
    /// Namespace alias
    NamespaceAlias(Ns),
}

/// A declared member
#[derive(Debug)]
pub struct Trait {
    id: TraitId,
    name: QName,
    is_static: bool,
    kind: TraitKind,
}

impl Trait {
    /// Trait identity
    pub fn id(&self) -> TraitId {
        self.id
    }

    /// Declared name
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Declared local name
    pub fn local_name(&self) -> &str {
        &self.name.name
    }

    /// Whether the trait belongs to the static side
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Variant
    pub fn kind(&self) -> &TraitKind {
        &self.kind
    }

    /// Whether the trait is a storage-backed variable
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, TraitKind::Variable(_))
    }
}

/// Member declaration handed to class and interface definitions
#[derive(Debug, Clone)]
pub struct Member {
    /// Qualified name
    pub name: QName,
    /// Static-side member
    pub is_static: bool,
    /// Variant
    pub kind: TraitKind,
}

impl Member {
    /// Mutable variable of the given type
    pub fn var(name: QName, ty: Option<Type>) -> Self {
        Self::new(
            name,
            TraitKind::Variable(Variable {
                read_only: false,
                ty,
                initial: None,
            }),
        )
    }

    /// Read-only variable of the given type
    pub fn read_only(name: QName, ty: Option<Type>) -> Self {
        Self::new(
            name,
            TraitKind::Variable(Variable {
                read_only: true,
                ty,
                initial: None,
            }),
        )
    }

    /// Read-only variable with an initial value
    pub fn constant(name: QName, ty: Option<Type>, value: Value) -> Self {
        Self::new(
            name,
            TraitKind::Variable(Variable {
                read_only: true,
                ty,
                initial: Some(value),
            }),
        )
    }

    /// Method
    pub fn method(name: QName, body: NativeFn) -> Self {
        let method = Method::new(name.clone(), MethodRole::Plain, body);
        Self::new(name, TraitKind::Method(method))
    }

    /// Accessor with an optional getter and setter
    pub fn accessor(
        name: QName,
        ty: Option<Type>,
        getter: Option<NativeFn>,
        setter: Option<NativeFn>,
    ) -> Self {
        let getter = getter.map(|body| Method::new(name.clone(), MethodRole::Getter, body));
        let setter = setter.map(|body| Method::new(name.clone(), MethodRole::Setter, body));
        Self::new(
            name,
            TraitKind::VirtualVariable(Accessor { getter, setter, ty }),
        )
    }

    /// Getter-only accessor
    pub fn getter(name: QName, ty: Option<Type>, getter: NativeFn) -> Self {
        Self::accessor(name, ty, Some(getter), None)
    }

    /// Namespace alias
    pub fn namespace(name: QName, ns: Ns) -> Self {
        Self::new(name, TraitKind::NamespaceAlias(ns))
    }

    /// Set the initial value of a variable member
    pub fn with_initial(mut self, value: Value) -> Self {
        if let TraitKind::Variable(var) = &mut self.kind {
            var.initial = Some(value);
        }
        self
    }

    /// Move the member to the static side
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    fn new(name: QName, kind: TraitKind) -> Self {
        Self {
            name,
            is_static: false,
            kind,
        }
    }

    /// Freeze the declaration into a trait
    pub(crate) fn into_trait(self) -> TraitRef {
        Rc::new(Trait {
            id: generate_trait_id(),
            name: self.name,
            is_static: self.is_static,
            kind: self.kind,
        })
    }
}
