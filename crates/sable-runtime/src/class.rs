//! Class and interface definitions
//!
//! A class owns two trait tables (static and instance), storage for its
//! static variables, and the ordered list of instance variables ("slots").
//! The slot list of a class is always its base class's slot list followed
//! by the class's own instance variables, so a slot index never moves when
//! the class is subclassed.

use crate::names::Names;
use crate::ns::{NsParent, QName, SystemNsKind};
use crate::object::{ObjectRef, StorageKind};
use crate::traits::{Member, NativeFn, TraitId, TraitKind, TraitRef};
use crate::value::{PrimitiveKind, Value};
use once_cell::unsync::OnceCell;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared class handle
pub type ClassRef = Rc<Class>;

/// Shared interface handle
pub type InterfaceRef = Rc<Interface>;

/// A declared type: class or interface. `Option<Type>::None` is the
/// universal type.
#[derive(Clone)]
pub enum Type {
    /// Class type
    Class(ClassRef),
    /// Interface type
    Interface(InterfaceRef),
}

impl Type {
    /// Canonical name of the type
    pub fn name(&self) -> &str {
        match self {
            Type::Class(c) => c.name(),
            Type::Interface(i) => i.name(),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Class(a), Type::Class(b)) => Rc::ptr_eq(a, b),
            (Type::Interface(a), Type::Interface(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Class(c) => write!(f, "Class({})", c.name()),
            Type::Interface(i) => write!(f, "Interface({})", i.name()),
        }
    }
}

/// Declaration metadata (`[Name(key="value", ...)]`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    /// Tag name
    pub name: String,
    /// Entries; keyless entries have `None` as key
    pub entries: Vec<(Option<String>, String)>,
}

impl Metadata {
    /// Create a metadata tag without entries
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Add a keyed entry
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((Some(key.into()), value.into()));
        self
    }
}

/// Options for [`Realm::define_class`](crate::realm::Realm::define_class)
#[derive(Default, Clone)]
pub struct ClassOptions {
    /// Base class; defaults to the root class
    pub base: Option<ClassRef>,
    /// Implemented interfaces, recorded verbatim
    pub interfaces: Vec<InterfaceRef>,
    /// The class cannot be extended
    pub is_final: bool,
    /// Instances carry a dynamic property bag
    pub is_dynamic: bool,
    /// Declaration metadata
    pub metadata: Vec<Metadata>,
    /// Constructor procedure; runs with the new instance as `this`
    pub constructor: Option<NativeFn>,
    /// Builtin storage; inherited from the base when unset
    pub storage: Option<StorageKind>,
    /// Boxed-primitive marker for the builtin primitive classes
    pub primitive: Option<PrimitiveKind>,
}

impl ClassOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base class
    pub fn base(mut self, base: &ClassRef) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, iface: &InterfaceRef) -> Self {
        self.interfaces.push(iface.clone());
        self
    }

    /// Mark the class final
    pub fn final_(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    /// Mark the class dynamic
    pub fn dynamic(mut self, is_dynamic: bool) -> Self {
        self.is_dynamic = is_dynamic;
        self
    }

    /// Add a metadata tag
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    /// Set the constructor procedure
    pub fn constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Set the builtin storage kind
    pub fn storage(mut self, storage: StorageKind) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Mark as the boxed class of a primitive kind
    pub fn primitive(mut self, kind: PrimitiveKind) -> Self {
        self.primitive = Some(kind);
        self
    }
}

/// Class definition
pub struct Class {
    qname: QName,
    name: String,
    is_final: bool,
    is_dynamic: bool,
    metadata: Vec<Metadata>,
    base: Option<ClassRef>,
    interfaces: Vec<InterfaceRef>,
    static_names: Names<TraitRef>,
    instance_names: Names<TraitRef>,
    static_slots: Vec<TraitRef>,
    static_index: FxHashMap<TraitId, usize>,
    static_values: RefCell<Vec<Value>>,
    slots: Vec<TraitRef>,
    slot_index: FxHashMap<TraitId, usize>,
    constructor: Option<NativeFn>,
    prototype: OnceCell<ObjectRef>,
    storage: StorageKind,
    primitive: Option<PrimitiveKind>,
}

impl Class {
    /// Build a class. `base` has already been defaulted to the root class
    /// by the caller; only the root itself has no base.
    pub(crate) fn build(qname: QName, options: ClassOptions, members: Vec<Member>) -> ClassRef {
        let name = canonical_name(&qname);
        let base = options.base;

        let mut static_names = Names::new();
        let mut instance_names = Names::new();
        let mut static_slots = Vec::new();
        let mut own_slots = Vec::new();
        for member in members {
            let ns = member.name.ns.clone();
            let local = member.name.name.clone();
            let trait_ = member.into_trait();
            if trait_.is_static() {
                if trait_.is_variable() {
                    static_slots.push(trait_.clone());
                }
                static_names.set(&ns, local, trait_);
            } else {
                if trait_.is_variable() {
                    own_slots.push(trait_.clone());
                }
                instance_names.set(&ns, local, trait_);
            }
        }

        let mut slots = base
            .as_ref()
            .map(|b| b.slots.clone())
            .unwrap_or_default();
        slots.extend(own_slots);

        let slot_index = index_of_traits(&slots);
        let static_index = index_of_traits(&static_slots);
        let static_values = static_slots.iter().map(|t| initial_value(t)).collect();

        let storage = options
            .storage
            .or_else(|| base.as_ref().map(|b| b.storage))
            .unwrap_or(StorageKind::Plain);

        let class = Rc::new(Class {
            qname,
            name,
            is_final: options.is_final,
            is_dynamic: options.is_dynamic,
            metadata: options.metadata,
            base,
            interfaces: options.interfaces,
            static_names,
            instance_names,
            static_slots,
            static_index,
            static_values: RefCell::new(static_values),
            slots,
            slot_index,
            constructor: options.constructor,
            prototype: OnceCell::new(),
            storage,
            primitive: options.primitive,
        });
        class.adopt_class_namespaces();
        class
    }

    /// Private and protected namespaces used by this class's members have
    /// no owner until the class exists.
    fn adopt_class_namespaces(self: &Rc<Self>) {
        let members = self.static_names.values().chain(self.instance_names.values());
        for trait_ in members {
            let ns = &trait_.name().ns;
            let class_scoped = matches!(
                ns.system_kind(),
                Some(SystemNsKind::Private | SystemNsKind::Protected | SystemNsKind::StaticProtected)
            );
            if class_scoped && ns.package().is_none() && ns.class().is_none() {
                ns.set_parent(NsParent::Class(Rc::downgrade(self)));
            }
        }
    }

    /// Declared qualified name
    pub fn qname(&self) -> &QName {
        &self.qname
    }

    /// Canonical name (`package.Local`, or `Local` in the top-level package)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local name
    pub fn local_name(&self) -> &str {
        &self.qname.name
    }

    /// Whether the class cannot be extended
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Whether instances carry a dynamic property bag
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    /// Declaration metadata
    pub fn metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    /// Base class; `None` only for the root class
    pub fn base(&self) -> Option<&ClassRef> {
        self.base.as_ref()
    }

    /// Directly implemented interfaces
    pub fn interfaces(&self) -> &[InterfaceRef] {
        &self.interfaces
    }

    /// Static trait table
    pub fn static_names(&self) -> &Names<TraitRef> {
        &self.static_names
    }

    /// Instance trait table (own members only)
    pub fn instance_names(&self) -> &Names<TraitRef> {
        &self.instance_names
    }

    /// Ordered instance variables, inherited ones first
    pub fn slots(&self) -> &[TraitRef] {
        &self.slots
    }

    /// Static variables in declaration order
    pub fn static_slots(&self) -> &[TraitRef] {
        &self.static_slots
    }

    /// Index of an instance variable in this class's slot list
    pub fn slot_index(&self, trait_: &TraitRef) -> Option<usize> {
        self.slot_index.get(&trait_.id()).copied()
    }

    /// Header words preceding the slots: class handle, plus the dynamic
    /// bag for dynamic classes
    pub fn header_size(&self) -> usize {
        if self.is_dynamic {
            2
        } else {
            1
        }
    }

    /// Physical offset of an instance variable (slot index plus header)
    pub fn slot_offset(&self, trait_: &TraitRef) -> Option<usize> {
        self.slot_index(trait_).map(|i| i + self.header_size())
    }

    /// Physical instance size: header plus slots
    pub fn instance_size(&self) -> usize {
        self.header_size() + self.slots.len()
    }

    /// Find a slot by exact qualified name anywhere in the slot list
    pub fn find_slot(&self, qname: &QName) -> Option<usize> {
        self.slots
            .iter()
            .position(|t| t.name().ns == qname.ns && t.name().name == qname.name)
    }

    /// Value of a static variable owned by this class
    pub fn static_value(&self, trait_: &TraitRef) -> Option<Value> {
        let index = *self.static_index.get(&trait_.id())?;
        self.static_values.borrow().get(index).cloned()
    }

    /// Store a static variable owned by this class. Returns false when the
    /// trait is not one of this class's static variables.
    pub fn set_static_value(&self, trait_: &TraitRef, value: Value) -> bool {
        match self.static_index.get(&trait_.id()) {
            Some(&index) => {
                self.static_values.borrow_mut()[index] = value;
                true
            }
            None => false,
        }
    }

    /// Constructor procedure, if declared
    pub fn constructor(&self) -> Option<&NativeFn> {
        self.constructor.as_ref()
    }

    /// Prototype template (shared dynamic-property fallback)
    pub fn prototype(&self) -> Option<&ObjectRef> {
        self.prototype.get()
    }

    pub(crate) fn set_prototype(&self, prototype: ObjectRef) {
        let _ = self.prototype.set(prototype);
    }

    /// Builtin storage kind of instances
    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    /// Boxed-primitive kind, for the builtin primitive classes
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        self.primitive
    }

    /// Iterate over this class and its ancestors, most-derived first
    pub fn ancestors(self: &Rc<Self>) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    /// `[self, ...ancestors]`
    pub fn recursive_desc_class_list(self: &Rc<Self>) -> Vec<ClassRef> {
        self.ancestors().collect()
    }

    /// Whether `other` is this class or one of its ancestors
    pub fn is_subclass_of(self: &Rc<Self>, other: &ClassRef) -> bool {
        self.ancestors().any(|c| Rc::ptr_eq(&c, other))
    }

    /// Whether this class or an ancestor implements `iface`, directly or
    /// through interface extension
    pub fn implements(self: &Rc<Self>, iface: &InterfaceRef) -> bool {
        self.ancestors().any(|class| {
            class.interfaces.iter().any(|declared| {
                declared
                    .recursive_desc_interface_list()
                    .iter()
                    .any(|i| Rc::ptr_eq(i, iface))
            })
        })
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name.clone()))
            .field("dynamic", &self.is_dynamic)
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// Iterator over a class chain
pub struct Ancestors {
    next: Option<ClassRef>,
}

impl Iterator for Ancestors {
    type Item = ClassRef;

    fn next(&mut self) -> Option<ClassRef> {
        let current = self.next.take()?;
        self.next = current.base.clone();
        Some(current)
    }
}

/// Options for [`Realm::define_interface`](crate::realm::Realm::define_interface)
#[derive(Debug, Clone, Default)]
pub struct InterfaceOptions {
    /// Extended interfaces
    pub bases: Vec<InterfaceRef>,
    /// Declaration metadata
    pub metadata: Vec<Metadata>,
}

impl InterfaceOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extended interface
    pub fn extends(mut self, base: &InterfaceRef) -> Self {
        self.bases.push(base.clone());
        self
    }

    /// Add a metadata tag
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.push(metadata);
        self
    }
}

/// Interface definition: methods and accessors only, never storage
pub struct Interface {
    qname: QName,
    name: String,
    metadata: Vec<Metadata>,
    bases: Vec<InterfaceRef>,
    names: Names<TraitRef>,
    self_ref: Weak<Interface>,
}

impl Interface {
    pub(crate) fn build(qname: QName, options: InterfaceOptions, members: Vec<Member>) -> InterfaceRef {
        let mut names = Names::new();
        for member in members {
            let allowed = !member.is_static
                && matches!(member.kind, TraitKind::Method(_) | TraitKind::VirtualVariable(_));
            debug_assert!(allowed, "interface member {} must be an instance method or accessor", member.name);
            if !allowed {
                continue;
            }
            let ns = member.name.ns.clone();
            let local = member.name.name.clone();
            names.set(&ns, local, member.into_trait());
        }
        Rc::new_cyclic(|self_ref| Interface {
            name: canonical_name(&qname),
            qname,
            metadata: options.metadata,
            bases: options.bases,
            names,
            self_ref: self_ref.clone(),
        })
    }

    /// Declared qualified name
    pub fn qname(&self) -> &QName {
        &self.qname
    }

    /// Canonical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration metadata
    pub fn metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    /// Directly extended interfaces
    pub fn bases(&self) -> &[InterfaceRef] {
        &self.bases
    }

    /// Instance trait table
    pub fn names(&self) -> &Names<TraitRef> {
        &self.names
    }

    /// `[self, ...all transitively extended interfaces]`, without repeats
    pub fn recursive_desc_interface_list(&self) -> Vec<InterfaceRef> {
        let mut out: Vec<InterfaceRef> = Vec::new();
        let mut pending: Vec<InterfaceRef> = self.self_ref.upgrade().into_iter().collect();
        // Depth-first, declaration order
        while let Some(iface) = pending.pop() {
            if out.iter().any(|seen| Rc::ptr_eq(seen, &iface)) {
                continue;
            }
            pending.extend(iface.bases.iter().rev().cloned());
            out.push(iface);
        }
        out
    }

    /// Whether this interface is `other` or extends it
    pub fn extends(&self, other: &InterfaceRef) -> bool {
        self.recursive_desc_interface_list()
            .iter()
            .any(|i| Rc::ptr_eq(i, other))
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("name", &self.name)
            .field("bases", &self.bases.iter().map(|b| b.name.clone()).collect::<Vec<_>>())
            .finish()
    }
}

fn canonical_name(qname: &QName) -> String {
    match qname.ns.package() {
        Some(package) if !package.name.is_empty() => format!("{}.{}", package.name, qname.name),
        _ => qname.name.to_string(),
    }
}

fn index_of_traits(traits: &[TraitRef]) -> FxHashMap<TraitId, usize> {
    traits.iter().enumerate().map(|(i, t)| (t.id(), i)).collect()
}

/// Initial value of a variable trait: its declared initial value, else the
/// default of its declared type.
pub(crate) fn initial_value(trait_: &TraitRef) -> Value {
    match trait_.kind() {
        TraitKind::Variable(var) => var
            .initial
            .clone()
            .unwrap_or_else(|| crate::coerce::default_value(var.ty.as_ref())),
        _ => Value::Undefined,
    }
}
