//! Instance representation
//!
//! An instance is `{class handle, optional dynamic bag, slot values}` plus
//! the backing store of the builtin collection or reflection kind its class
//! inherits from.

use crate::class::{initial_value, ClassRef};
use crate::dictionary::Dictionary;
use crate::elements::Elements;
use crate::flex_vector::FlexVector;
use crate::ns::Ns;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

/// Per-instance open-ended property bag
pub type DynamicBag = FxHashMap<Rc<str>, Value>;

/// Builtin backing store selected by a class (and inherited by subclasses)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Slots only
    Plain,
    /// Indexed array of values; silently grows
    Array,
    /// Generic vector of values; grows unless fixed
    Vector,
    /// Vector of `int`
    IntVector,
    /// Vector of `uint`
    UintVector,
    /// Vector of `float`
    FloatVector,
    /// Vector of `Number`
    NumberVector,
    /// Key/value store
    Dictionary,
    /// Reified class value
    Class,
    /// Reified namespace value
    Namespace,
}

/// Builtin backing store of an instance
#[derive(Debug)]
pub enum Storage {
    /// No builtin store
    None,
    /// Array elements
    Array(Elements),
    /// Generic vector elements
    Vector {
        /// Elements
        items: Elements,
        /// Length-changing operations are rejected
        fixed: bool,
    },
    /// `int` elements
    IntVector(FlexVector<i32>),
    /// `uint` elements
    UintVector(FlexVector<u32>),
    /// `float` elements
    FloatVector(FlexVector<f32>),
    /// `Number` elements
    NumberVector(FlexVector<f64>),
    /// Dictionary entries
    Dictionary(Dictionary),
    /// Wrapped class; `None` until the wrapper is initialized
    Class(Option<ClassRef>),
    /// Wrapped namespace; `None` until the wrapper is initialized
    Namespace(Option<Ns>),
}

impl Storage {
    /// Empty store of the given kind
    pub fn new(kind: StorageKind) -> Self {
        match kind {
            StorageKind::Plain => Storage::None,
            StorageKind::Array => Storage::Array(Elements::new()),
            StorageKind::Vector => Storage::Vector {
                items: Elements::new(),
                fixed: false,
            },
            StorageKind::IntVector => Storage::IntVector(FlexVector::new(0, false)),
            StorageKind::UintVector => Storage::UintVector(FlexVector::new(0, false)),
            StorageKind::FloatVector => Storage::FloatVector(FlexVector::new(0, false)),
            StorageKind::NumberVector => Storage::NumberVector(FlexVector::new(0, false)),
            StorageKind::Dictionary => Storage::Dictionary(Dictionary::new(false)),
            StorageKind::Class => Storage::Class(None),
            StorageKind::Namespace => Storage::Namespace(None),
        }
    }

    /// Number of indexable elements, for the sequence kinds
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Storage::Array(items) | Storage::Vector { items, .. } => Some(items.len()),
            Storage::IntVector(v) => Some(v.len()),
            Storage::UintVector(v) => Some(v.len()),
            Storage::FloatVector(v) => Some(v.len()),
            Storage::NumberVector(v) => Some(v.len()),
            _ => None,
        }
    }
}

/// A class instance
pub struct Instance {
    class: ClassRef,
    dynamic: Option<DynamicBag>,
    slots: Vec<Value>,
    storage: Storage,
}

impl Instance {
    /// Allocate an instance with every slot at its initial value. Dynamic
    /// classes get an empty bag.
    pub fn allocate(class: &ClassRef) -> Self {
        let dynamic = class.is_dynamic().then(DynamicBag::default);
        Self::with_bag(class, dynamic)
    }

    /// Allocate a prototype template: an instance that always has a bag
    pub(crate) fn template(class: &ClassRef) -> Self {
        Self::with_bag(class, Some(DynamicBag::default()))
    }

    fn with_bag(class: &ClassRef, dynamic: Option<DynamicBag>) -> Self {
        Self {
            class: class.clone(),
            dynamic,
            slots: class.slots().iter().map(initial_value).collect(),
            storage: Storage::new(class.storage()),
        }
    }

    /// Class of the instance
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Slot values in declaration order
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Read a slot by index
    pub fn slot(&self, index: usize) -> Option<&Value> {
        self.slots.get(index)
    }

    /// Write a slot by index. Returns false when out of range.
    pub fn set_slot(&mut self, index: usize, value: Value) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Dynamic bag, if the instance has one
    pub fn dynamic_bag(&self) -> Option<&DynamicBag> {
        self.dynamic.as_ref()
    }

    /// Mutable dynamic bag, if the instance has one
    pub fn dynamic_bag_mut(&mut self) -> Option<&mut DynamicBag> {
        self.dynamic.as_mut()
    }

    /// Builtin backing store
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Mutable builtin backing store
    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    /// Physical size: header words plus slots
    pub fn physical_size(&self) -> usize {
        let header = if self.dynamic.is_some() { 2 } else { 1 };
        header + self.slots.len()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("slots", &self.slots)
            .field("dynamic", &self.dynamic.as_ref().map(|bag| bag.len()))
            .finish()
    }
}

/// Shared, identity-compared handle to an instance
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Instance>>);

impl ObjectRef {
    /// Wrap an instance
    pub fn new(instance: Instance) -> Self {
        ObjectRef(Rc::new(RefCell::new(instance)))
    }

    /// Borrow the instance
    pub fn borrow(&self) -> Ref<'_, Instance> {
        self.0.borrow()
    }

    /// Mutably borrow the instance
    pub fn borrow_mut(&self) -> RefMut<'_, Instance> {
        self.0.borrow_mut()
    }

    /// Class of the instance
    pub fn class(&self) -> ClassRef {
        self.0.borrow().class.clone()
    }

    /// Identity of the instance while it is alive
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Rc::downgrade(&self.0))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(instance) => write!(f, "[object {}#{:x}]", instance.class.local_name(), self.id()),
            Err(_) => write!(f, "[object #{:x}]", self.id()),
        }
    }
}

/// Non-owning instance handle; does not keep the instance alive
#[derive(Clone)]
pub struct WeakObjectRef(Weak<RefCell<Instance>>);

impl WeakObjectRef {
    /// The instance, if still alive
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }

    /// Whether the instance has been dropped
    pub fn is_dead(&self) -> bool {
        self.0.strong_count() == 0
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(weak object, alive: {})", !self.is_dead())
    }
}
