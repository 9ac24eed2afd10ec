//! Property resolution
//!
//! Every entry point resolves `(base, qualifier, name)` to a [`Target`] the
//! same way and differs only in what it does with it:
//!
//! 1. Declared traits, walking the class chain most-derived first. A class
//!    level without a matching trait can still match a name stored on that
//!    class's prototype template.
//! 2. For references that can see public names: a name already held by the
//!    dynamic bag, then the builtin collection stores (array and vector
//!    elements, dictionary entries), then the rest of the dynamic bag, then
//!    the static side of a wrapped class.
//!
//! Class values resolve against their static traits. Primitives resolve
//! against the traits of their boxed class without allocating a box.

use crate::class::ClassRef;
use crate::coerce::{to_int32, to_uint32};
use crate::error::{RtResult, RuntimeError};
use crate::flex_vector::{FlexElement, FlexVector};
use crate::function::{Function, FunctionRef};
use crate::names::Qualifier;
use crate::object::{ObjectRef, Storage, StorageKind};
use crate::runtime::Runtime;
use crate::traits::{MethodRef, TraitKind, TraitRef};
use crate::value::Value;
use std::rc::Rc;

/// A property name: the value used for collection addressing and the
/// local name used for trait lookup
struct Key {
    value: Value,
    local: Rc<str>,
}

/// Where a reference resolved to
enum Target {
    /// Instance trait; also the traits of a primitive's boxed class
    Trait(TraitRef),
    /// Static trait and the class that owns its storage. `own` is set when
    /// the owner is the class being accessed.
    StaticTrait {
        owner: ClassRef,
        trait_: TraitRef,
        own: bool,
    },
    /// Name stored on a prototype template
    Prototype(ObjectRef),
    /// The `prototype` property of a class
    ClassPrototype(ClassRef),
    /// Dynamic bag of the instance
    Bag(ObjectRef),
    /// Array or vector element
    Element(ObjectRef, usize),
    /// Dictionary entry
    Entry(ObjectRef),
    /// Nothing matched
    Missing,
}

/// Largest sequence index; keeps every length representable as `uint`
pub const MAX_INDEX: u32 = u32::MAX - 1;

/// Index denoted by a property name: an integral number in
/// `0..=MAX_INDEX`, or a string spelling one in canonical form
pub fn array_index(name: &Value) -> Option<usize> {
    let index = match name {
        Value::Int(i) => u32::try_from(*i).ok()?,
        Value::Uint(u) => *u,
        Value::Number(_) | Value::Float(_) => {
            let n = name.as_f64()?;
            if !(0.0..=u32::MAX as f64).contains(&n) || n.fract() != 0.0 {
                return None;
            }
            n as u32
        }
        Value::String(s) => s.parse::<u32>().ok().filter(|n| n.to_string() == **s)?,
        _ => return None,
    };
    (index <= MAX_INDEX).then_some(index as usize)
}

impl Runtime {
    /// Read a property
    pub fn get_property(
        &self,
        base: &Value,
        qualifier: &Qualifier,
        name: impl Into<Value>,
    ) -> RtResult<Value> {
        let key = self.key(name.into());
        let target = self.locate(base, qualifier, &key)?;
        self.read_target(base, target, &key)
    }

    /// Write a property
    pub fn set_property(
        &self,
        base: &Value,
        qualifier: &Qualifier,
        name: impl Into<Value>,
        value: Value,
    ) -> RtResult<()> {
        let key = self.key(name.into());
        match self.locate(base, qualifier, &key)? {
            Target::Trait(trait_) => self.write_trait(base, &trait_, value),
            Target::StaticTrait { owner, trait_, .. } => self.write_static(&owner, &trait_, value),
            Target::Prototype(obj) | Target::Bag(obj) => {
                if let Some(bag) = obj.borrow_mut().dynamic_bag_mut() {
                    bag.insert(key.local, value);
                }
                Ok(())
            }
            Target::ClassPrototype(_) => Err(RuntimeError::WriteToReadOnly {
                name: key.local.to_string(),
            }),
            Target::Element(obj, index) => self.write_element(&obj, index, value),
            Target::Entry(obj) => entry_set(&obj, &key.value, value),
            Target::Missing => Err(self.missing(base, &key)),
        }
    }

    /// Whether the property exists. Getters are never invoked.
    pub fn in_object(
        &self,
        base: &Value,
        qualifier: &Qualifier,
        name: impl Into<Value>,
    ) -> RtResult<bool> {
        let key = self.key(name.into());
        Ok(match self.locate(base, qualifier, &key)? {
            Target::Trait(_)
            | Target::StaticTrait { .. }
            | Target::Prototype(_)
            | Target::ClassPrototype(_) => true,
            Target::Bag(obj) => bag_contains(&obj, &key.local),
            Target::Element(obj, index) => element_exists(&obj, index),
            Target::Entry(obj) => entry_exists(&obj, &key.value)?,
            Target::Missing => false,
        })
    }

    /// Alias of [`Runtime::in_object`]
    pub fn has_property(
        &self,
        base: &Value,
        qualifier: &Qualifier,
        name: impl Into<Value>,
    ) -> RtResult<bool> {
        self.in_object(base, qualifier, name)
    }

    /// Whether the property is held by the value itself: declared
    /// variables and accessors, dynamic properties and collection
    /// members. Methods and prototype properties are not own.
    pub fn has_own_property(
        &self,
        base: &Value,
        qualifier: &Qualifier,
        name: impl Into<Value>,
    ) -> RtResult<bool> {
        let key = self.key(name.into());
        Ok(match self.locate(base, qualifier, &key)? {
            Target::Trait(trait_) => !matches!(base, Value::Class(_)) && holds_storage(&trait_),
            Target::StaticTrait { trait_, own, .. } => own && holds_storage(&trait_),
            Target::ClassPrototype(_) => true,
            Target::Prototype(_) | Target::Missing => false,
            Target::Bag(obj) => bag_contains(&obj, &key.local),
            Target::Element(obj, index) => element_exists(&obj, index),
            Target::Entry(obj) => entry_exists(&obj, &key.value)?,
        })
    }

    /// Delete a property. Declared traits cannot be deleted (false);
    /// dynamic properties and dictionary entries are removed, and array
    /// elements reset to `undefined`. Vector elements cannot be deleted.
    pub fn delete_property(
        &self,
        base: &Value,
        qualifier: &Qualifier,
        name: impl Into<Value>,
    ) -> RtResult<bool> {
        let key = self.key(name.into());
        match self.locate(base, qualifier, &key)? {
            Target::Trait(_) | Target::StaticTrait { .. } | Target::ClassPrototype(_) => Ok(false),
            Target::Prototype(obj) => {
                // Only the template itself can drop its own properties
                if base.as_object() == Some(&obj) {
                    bag_remove(&obj, &key.local);
                }
                Ok(true)
            }
            Target::Bag(obj) => {
                bag_remove(&obj, &key.local);
                Ok(true)
            }
            Target::Element(obj, index) => Ok(clear_element(&obj, index)),
            Target::Entry(obj) => {
                if let Storage::Dictionary(dict) = obj.borrow_mut().storage_mut() {
                    dict.delete(&key.value)?;
                }
                Ok(true)
            }
            Target::Missing => Ok(true),
        }
    }

    /// Read a property and call it with `base` as the receiver
    pub fn call_property(
        &self,
        base: &Value,
        qualifier: &Qualifier,
        name: impl Into<Value>,
        args: &[Value],
    ) -> RtResult<Value> {
        let key = self.key(name.into());
        let target = self.locate(base, qualifier, &key)?;
        // Methods run without binding; instance methods still dispatch, since
        // a qualified name may have matched a base declaration
        match &target {
            Target::Trait(trait_) => {
                if let TraitKind::Method(method) = trait_.kind() {
                    return method.call_dispatch(self, base, args);
                }
            }
            Target::StaticTrait { trait_, .. } => {
                if let TraitKind::Method(method) = trait_.kind() {
                    return method.call_exact(self, &Value::Undefined, args);
                }
            }
            _ => {}
        }
        let callee = self.read_target(base, target, &key)?;
        self.call(&callee, base, args)
    }

    fn key(&self, value: Value) -> Key {
        let local = match &value {
            Value::String(s) => s.clone(),
            other => Rc::from(self.tostring(other)),
        };
        Key { value, local }
    }

    fn missing(&self, base: &Value, key: &Key) -> RuntimeError {
        tracing::trace!(name = &*key.local, base = ?base, "property not found");
        RuntimeError::undefined_property(&*key.local)
    }

    fn locate(&self, base: &Value, qualifier: &Qualifier, key: &Key) -> RtResult<Target> {
        let class = match base {
            Value::Undefined | Value::Null => return Err(RuntimeError::null_reference(&*key.local)),
            Value::Class(class) => return self.locate_static(class, qualifier, key),
            other => self
                .class_of(other)
                .ok_or_else(|| RuntimeError::null_reference(&*key.local))?,
        };
        if let Some(target) = self.resolve_trait(&class, qualifier, &key.local)? {
            return Ok(target);
        }
        if !qualifier.admits_public() {
            return Ok(Target::Missing);
        }
        let Value::Object(obj) = base else {
            return Ok(Target::Missing);
        };

        let wrapped = {
            let instance = obj.borrow();
            let bag = instance.dynamic_bag();
            if bag.is_some_and(|bag| bag.contains_key(&*key.local)) {
                return Ok(Target::Bag(obj.clone()));
            }
            if instance.storage().sequence_len().is_some() {
                if let Some(index) = array_index(&key.value) {
                    return Ok(Target::Element(obj.clone(), index));
                }
            }
            if let Storage::Dictionary(_) = instance.storage() {
                return Ok(Target::Entry(obj.clone()));
            }
            if bag.is_some() {
                return Ok(Target::Bag(obj.clone()));
            }
            match instance.storage() {
                Storage::Class(Some(wrapped)) => wrapped.clone(),
                _ => return Ok(Target::Missing),
            }
        };
        self.locate_static(&wrapped, qualifier, key)
    }

    fn resolve_trait(
        &self,
        class: &ClassRef,
        qualifier: &Qualifier,
        local: &str,
    ) -> RtResult<Option<Target>> {
        let public = qualifier.admits_public();
        for owner in class.ancestors() {
            if let Some(trait_) = owner.instance_names().get(qualifier, local)? {
                return Ok(Some(Target::Trait(trait_.clone())));
            }
            if !public {
                continue;
            }
            if let Some(proto) = owner.prototype() {
                let hit = proto
                    .borrow()
                    .dynamic_bag()
                    .is_some_and(|bag| bag.contains_key(local));
                if hit {
                    return Ok(Some(Target::Prototype(proto.clone())));
                }
            }
        }
        Ok(None)
    }

    fn locate_static(&self, class: &ClassRef, qualifier: &Qualifier, key: &Key) -> RtResult<Target> {
        if qualifier.admits_public() && &*key.local == "prototype" {
            return Ok(Target::ClassPrototype(class.clone()));
        }
        for owner in class.ancestors() {
            let found = owner.static_names().get(qualifier, &key.local)?.cloned();
            if let Some(trait_) = found {
                let own = Rc::ptr_eq(&owner, class);
                return Ok(Target::StaticTrait { owner, trait_, own });
            }
        }
        // Class values are also instances of the `Class` builtin
        Ok(self
            .resolve_trait(&self.builtins().class, qualifier, &key.local)?
            .unwrap_or(Target::Missing))
    }

    fn read_target(&self, base: &Value, target: Target, key: &Key) -> RtResult<Value> {
        match target {
            Target::Trait(trait_) => self.read_trait(base, &trait_),
            Target::StaticTrait { owner, trait_, .. } => self.read_static(&owner, &trait_),
            Target::Prototype(obj) | Target::Bag(obj) => Ok(bag_get(&obj, &key.local)),
            Target::ClassPrototype(class) => Ok(class
                .prototype()
                .cloned()
                .map(Value::Object)
                .unwrap_or(Value::Null)),
            Target::Element(obj, index) => read_element(&obj, index),
            Target::Entry(obj) => entry_get(&obj, &key.value),
            Target::Missing => Err(self.missing(base, key)),
        }
    }

    fn read_trait(&self, this: &Value, trait_: &TraitRef) -> RtResult<Value> {
        match trait_.kind() {
            TraitKind::Variable(_) => Ok(match this {
                Value::Object(obj) => {
                    let instance = obj.borrow();
                    instance
                        .class()
                        .slot_index(trait_)
                        .and_then(|index| instance.slot(index).cloned())
                        .unwrap_or_default()
                }
                _ => Value::Undefined,
            }),
            TraitKind::VirtualVariable(accessor) => match &accessor.getter {
                Some(getter) => getter.call_dispatch(self, this, &[]),
                None => Err(RuntimeError::WriteOnlyPropertyRead {
                    name: trait_.local_name().to_string(),
                }),
            },
            TraitKind::Method(method) => Ok(Value::Function(self.bind_method(this, method))),
            TraitKind::NamespaceAlias(ns) => Ok(self.reflect_namespace(ns)),
        }
    }

    fn write_trait(&self, this: &Value, trait_: &TraitRef, value: Value) -> RtResult<()> {
        match trait_.kind() {
            TraitKind::Variable(var) => {
                if var.read_only {
                    return Err(RuntimeError::WriteToReadOnly {
                        name: trait_.local_name().to_string(),
                    });
                }
                let value = self.coerce(&value, var.ty.as_ref());
                let Value::Object(obj) = this else {
                    return Err(RuntimeError::undefined_property(trait_.local_name()));
                };
                let mut instance = obj.borrow_mut();
                let slot = instance.class().slot_index(trait_);
                match slot {
                    Some(index) => {
                        instance.set_slot(index, value);
                        Ok(())
                    }
                    None => Err(RuntimeError::undefined_property(trait_.local_name())),
                }
            }
            TraitKind::VirtualVariable(accessor) => match &accessor.setter {
                Some(setter) => {
                    let value = self.coerce(&value, accessor.ty.as_ref());
                    setter.call_dispatch(self, this, &[value])?;
                    Ok(())
                }
                None => Err(RuntimeError::ReadOnlyPropertyWrite {
                    name: trait_.local_name().to_string(),
                }),
            },
            TraitKind::Method(_) | TraitKind::NamespaceAlias(_) => Err(RuntimeError::AssignToMethod {
                name: trait_.local_name().to_string(),
            }),
        }
    }

    fn read_static(&self, owner: &ClassRef, trait_: &TraitRef) -> RtResult<Value> {
        match trait_.kind() {
            TraitKind::Variable(_) => Ok(owner.static_value(trait_).unwrap_or_default()),
            TraitKind::VirtualVariable(accessor) => match &accessor.getter {
                Some(getter) => getter.call_exact(self, &Value::Undefined, &[]),
                None => Err(RuntimeError::WriteOnlyPropertyRead {
                    name: trait_.local_name().to_string(),
                }),
            },
            TraitKind::Method(method) => Ok(Value::Function(self.bind_static(owner, method))),
            TraitKind::NamespaceAlias(ns) => Ok(self.reflect_namespace(ns)),
        }
    }

    fn write_static(&self, owner: &ClassRef, trait_: &TraitRef, value: Value) -> RtResult<()> {
        match trait_.kind() {
            TraitKind::Variable(var) => {
                if var.read_only {
                    return Err(RuntimeError::WriteToReadOnly {
                        name: trait_.local_name().to_string(),
                    });
                }
                let value = self.coerce(&value, var.ty.as_ref());
                owner.set_static_value(trait_, value);
                Ok(())
            }
            TraitKind::VirtualVariable(accessor) => match &accessor.setter {
                Some(setter) => {
                    let value = self.coerce(&value, accessor.ty.as_ref());
                    setter.call_exact(self, &Value::Undefined, &[value])?;
                    Ok(())
                }
                None => Err(RuntimeError::ReadOnlyPropertyWrite {
                    name: trait_.local_name().to_string(),
                }),
            },
            TraitKind::Method(_) | TraitKind::NamespaceAlias(_) => Err(RuntimeError::AssignToMethod {
                name: trait_.local_name().to_string(),
            }),
        }
    }

    /// Bound callable for `method` on `this`. Instances and classes get a
    /// cached callable, so reading a method twice yields the same function.
    fn bind_method(&self, this: &Value, method: &MethodRef) -> FunctionRef {
        let make = || Function::Bound {
            receiver: this.clone(),
            method: method.clone(),
        };
        match this {
            Value::Object(obj) => self.bound_methods().get_or_bind(obj.id(), method, make),
            Value::Class(class) => self.bound_methods().get_or_bind(class_id(class), method, make),
            _ => Rc::new(make()),
        }
    }

    fn bind_static(&self, owner: &ClassRef, method: &MethodRef) -> FunctionRef {
        self.bound_methods().get_or_bind(class_id(owner), method, || Function::Static {
            class: owner.clone(),
            method: method.clone(),
        })
    }

    fn write_element(&self, obj: &ObjectRef, index: usize, value: Value) -> RtResult<()> {
        let numeric = matches!(
            obj.class().storage(),
            StorageKind::IntVector
                | StorageKind::UintVector
                | StorageKind::FloatVector
                | StorageKind::NumberVector
        );
        let n = if numeric { self.to_number(&value) } else { 0.0 };

        let mut instance = obj.borrow_mut();
        match instance.storage_mut() {
            Storage::Array(items) => {
                items.set(index, value);
                Ok(())
            }
            Storage::Vector { items, fixed } => {
                if *fixed && index >= items.len() {
                    return Err(RuntimeError::FixedSizeViolation);
                }
                items.set(index, value);
                Ok(())
            }
            Storage::IntVector(v) => v.set(index, to_int32(n)),
            Storage::UintVector(v) => v.set(index, to_uint32(n)),
            Storage::FloatVector(v) => v.set(index, n as f32),
            Storage::NumberVector(v) => v.set(index, n),
            _ => Ok(()),
        }
    }
}

fn class_id(class: &ClassRef) -> usize {
    Rc::as_ptr(class) as *const () as usize
}

fn holds_storage(trait_: &TraitRef) -> bool {
    matches!(
        trait_.kind(),
        TraitKind::Variable(_) | TraitKind::VirtualVariable(_)
    )
}

fn bag_contains(obj: &ObjectRef, local: &str) -> bool {
    obj.borrow()
        .dynamic_bag()
        .is_some_and(|bag| bag.contains_key(local))
}

fn bag_remove(obj: &ObjectRef, local: &str) {
    if let Some(bag) = obj.borrow_mut().dynamic_bag_mut() {
        bag.remove(local);
    }
}

fn bag_get(obj: &ObjectRef, local: &str) -> Value {
    obj.borrow()
        .dynamic_bag()
        .and_then(|bag| bag.get(local).cloned())
        .unwrap_or_default()
}

fn entry_get(obj: &ObjectRef, key: &Value) -> RtResult<Value> {
    match obj.borrow().storage() {
        Storage::Dictionary(dict) => Ok(dict.get(key)?.unwrap_or_default()),
        _ => Ok(Value::Undefined),
    }
}

fn entry_set(obj: &ObjectRef, key: &Value, value: Value) -> RtResult<()> {
    match obj.borrow_mut().storage_mut() {
        Storage::Dictionary(dict) => dict.set(key, value),
        _ => Ok(()),
    }
}

/// Array elements reset to `undefined`; vector elements cannot be deleted
fn clear_element(obj: &ObjectRef, index: usize) -> bool {
    match obj.borrow_mut().storage_mut() {
        Storage::Array(items) => {
            items.clear(index);
            true
        }
        _ => false,
    }
}

fn element_exists(obj: &ObjectRef, index: usize) -> bool {
    obj.borrow()
        .storage()
        .sequence_len()
        .is_some_and(|len| index < len)
}

fn entry_exists(obj: &ObjectRef, key: &Value) -> RtResult<bool> {
    match obj.borrow().storage() {
        Storage::Dictionary(dict) => dict.has(key),
        _ => Ok(false),
    }
}

fn read_element(obj: &ObjectRef, index: usize) -> RtResult<Value> {
    let instance = obj.borrow();
    match instance.storage() {
        Storage::Array(items) | Storage::Vector { items, .. } => Ok(items.get(index)),
        Storage::IntVector(v) => read_flex(v, index).map(Value::Int),
        Storage::UintVector(v) => read_flex(v, index).map(Value::Uint),
        Storage::FloatVector(v) => read_flex(v, index).map(Value::Float),
        Storage::NumberVector(v) => read_flex(v, index).map(Value::Number),
        _ => Ok(Value::Undefined),
    }
}

fn read_flex<T: FlexElement>(v: &FlexVector<T>, index: usize) -> RtResult<T> {
    if index < v.len() {
        Ok(v.get(index))
    } else {
        Err(RuntimeError::IndexOutOfRange {
            index: index as u64,
            length: v.len(),
        })
    }
}
