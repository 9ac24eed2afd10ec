//! Collection classes
//!
//! - `Array`: growable list of values (`length`, `push`, `pop`, `join`)
//! - `__AS3__.vec.Vector` and the numeric `Vector$int`, `Vector$uint`,
//!   `Vector$float`, `Vector$double`: `length`, `fixed`, `push`, `pop`,
//!   `join`; constructed as `(length, fixed)`
//! - `flash.utils.Dictionary`: identity-keyed map, constructed as
//!   `(weakKeys)`
//!
//! Element access by index goes through the property protocol; these
//! classes only add the named members.

use super::primitives::Primitives;
use super::{arg, define, public, public_in, this_object, VECTOR_PACKAGE};
use crate::class::{ClassOptions, ClassRef, Type};
use crate::coerce::{to_boolean, to_int32, to_uint32};
use crate::dictionary::Dictionary;
use crate::elements::Elements;
use crate::error::{RtResult, RuntimeError};
use crate::flex_vector::{FlexVector, MAX_LENGTH};
use crate::object::{Storage, StorageKind};
use crate::property::MAX_INDEX;
use crate::realm::Realm;
use crate::runtime::Runtime;
use crate::traits::{native, Member, NativeFn};
use crate::value::Value;

pub(super) struct Collections {
    pub array: ClassRef,
    pub vector: ClassRef,
    pub vector_int: ClassRef,
    pub vector_uint: ClassRef,
    pub vector_float: ClassRef,
    pub vector_double: ClassRef,
    pub dictionary: ClassRef,
}

pub(super) fn install(realm: &Realm, prims: &Primitives) -> Collections {
    let uint = Some(Type::Class(prims.uint.clone()));

    let array = define(
        realm,
        "Array",
        ClassOptions::new()
            .storage(StorageKind::Array)
            .constructor(native(construct_array)),
        vec![
            Member::accessor(
                public(realm, "length"),
                uint.clone(),
                Some(native(get_length)),
                Some(native(set_length)),
            ),
            Member::method(public(realm, "push"), native(push)),
            Member::method(public(realm, "pop"), native(pop)),
            Member::method(public(realm, "join"), native(join)),
            Member::method(
                public(realm, "toString"),
                native(|rt, this, _| join(rt, this, &[])),
            ),
        ],
    );

    let vector_class = |local: &str, kind: StorageKind| {
        realm.define_class(
            public_in(realm, VECTOR_PACKAGE, local),
            ClassOptions::new()
                .final_(true)
                .storage(kind)
                .constructor(native(construct_vector)),
            vector_members(realm, &uint),
        )
    };
    let vector = vector_class("Vector", StorageKind::Vector);
    let vector_int = vector_class("Vector$int", StorageKind::IntVector);
    let vector_uint = vector_class("Vector$uint", StorageKind::UintVector);
    let vector_float = vector_class("Vector$float", StorageKind::FloatVector);
    let vector_double = vector_class("Vector$double", StorageKind::NumberVector);

    let dictionary = realm.define_class(
        public_in(realm, "flash.utils", "Dictionary"),
        ClassOptions::new()
            .storage(StorageKind::Dictionary)
            .constructor(native(|_, this, args| {
                let weak_keys = to_boolean(&arg(args, 0));
                let obj = this_object(this)?;
                *obj.borrow_mut().storage_mut() = Storage::Dictionary(Dictionary::new(weak_keys));
                tracing::trace!(weak_keys, "dictionary created");
                Ok(Value::Undefined)
            })),
        Vec::new(),
    );

    Collections {
        array,
        vector,
        vector_int,
        vector_uint,
        vector_float,
        vector_double,
        dictionary,
    }
}

fn vector_members(realm: &Realm, uint: &Option<Type>) -> Vec<Member> {
    let fixed: (NativeFn, NativeFn) = (
        native(|_, this, _| {
            let obj = this_object(this)?;
            let fixed = match obj.borrow().storage() {
                Storage::Vector { fixed, .. } => *fixed,
                Storage::IntVector(v) => v.fixed(),
                Storage::UintVector(v) => v.fixed(),
                Storage::FloatVector(v) => v.fixed(),
                Storage::NumberVector(v) => v.fixed(),
                _ => false,
            };
            Ok(Value::Boolean(fixed))
        }),
        native(|_, this, args| {
            let value = to_boolean(&arg(args, 0));
            set_fixed(this, value)?;
            Ok(Value::Undefined)
        }),
    );
    vec![
        Member::accessor(
            public(realm, "length"),
            uint.clone(),
            Some(native(get_length)),
            Some(native(set_length)),
        ),
        Member::accessor(public(realm, "fixed"), None, Some(fixed.0), Some(fixed.1)),
        Member::method(public(realm, "push"), native(push)),
        Member::method(public(realm, "pop"), native(pop)),
        Member::method(public(realm, "join"), native(join)),
        Member::method(public(realm, "toString"), native(|rt, this, _| join(rt, this, &[]))),
    ]
}

// ============================================================================
// Constructors
// ============================================================================

/// `new Array()`, `new Array(length)` or `new Array(e0, e1, ...)`
fn construct_array(rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
    let items = match args {
        [single] if single.is_numeric() => {
            let n = rt.to_number(single);
            if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                return Err(RuntimeError::TypeError(format!(
                    "Array index is not a positive integer ({})",
                    rt.tostring(single)
                )));
            }
            Elements::with_len(n as usize)
        }
        elements => Elements::from_values(elements),
    };
    *this_object(this)?.borrow_mut().storage_mut() = Storage::Array(items);
    Ok(Value::Undefined)
}

/// `new Vector(length = 0, fixed = false)`
fn construct_vector(rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
    let length = match args.first() {
        Some(v) if !v.is_undefined() => to_uint32(rt.to_number(v)) as usize,
        _ => 0,
    };
    let fixed = to_boolean(&arg(args, 1));
    let obj = this_object(this)?;
    let kind = obj.class().storage();
    if kind != StorageKind::Vector && length > MAX_LENGTH {
        return Err(RuntimeError::RangeError(format!(
            "Vector length {} exceeds {}",
            length, MAX_LENGTH
        )));
    }
    let storage = match kind {
        StorageKind::Vector => Storage::Vector {
            items: Elements::with_len(length),
            fixed,
        },
        StorageKind::IntVector => Storage::IntVector(FlexVector::new(length, fixed)),
        StorageKind::UintVector => Storage::UintVector(FlexVector::new(length, fixed)),
        StorageKind::FloatVector => Storage::FloatVector(FlexVector::new(length, fixed)),
        StorageKind::NumberVector => Storage::NumberVector(FlexVector::new(length, fixed)),
        other => Storage::new(other),
    };
    *obj.borrow_mut().storage_mut() = storage;
    Ok(Value::Undefined)
}

// ============================================================================
// Shared sequence members
// ============================================================================

fn get_length(_: &Runtime, this: &Value, _: &[Value]) -> RtResult<Value> {
    let obj = this_object(this)?;
    let len = obj.borrow().storage().sequence_len().unwrap_or(0);
    Ok(Value::Uint(len as u32))
}

fn set_length(rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
    let len = to_uint32(rt.to_number(&arg(args, 0))) as usize;
    let obj = this_object(this)?;
    let mut instance = obj.borrow_mut();
    match instance.storage_mut() {
        Storage::Array(items) => items.set_len(len),
        Storage::Vector { items, fixed } => {
            if *fixed && len != items.len() {
                return Err(RuntimeError::FixedSizeViolation);
            }
            items.set_len(len);
        }
        Storage::IntVector(v) => v.set_len(len)?,
        Storage::UintVector(v) => v.set_len(len)?,
        Storage::FloatVector(v) => v.set_len(len)?,
        Storage::NumberVector(v) => v.set_len(len)?,
        _ => {}
    }
    Ok(Value::Undefined)
}

fn set_fixed(this: &Value, fixed: bool) -> RtResult<()> {
    let obj = this_object(this)?;
    let mut instance = obj.borrow_mut();
    match instance.storage_mut() {
        Storage::Vector { fixed: flag, .. } => *flag = fixed,
        Storage::IntVector(v) => v.set_fixed(fixed),
        Storage::UintVector(v) => v.set_fixed(fixed),
        Storage::FloatVector(v) => v.set_fixed(fixed),
        Storage::NumberVector(v) => v.set_fixed(fixed),
        _ => {}
    }
    Ok(())
}

/// Append every argument; returns the new length
fn push(rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
    let obj = this_object(this)?;
    // Convert before borrowing: conversions may call back into the object
    let numbers: Vec<f64> = match obj.class().storage() {
        StorageKind::IntVector
        | StorageKind::UintVector
        | StorageKind::FloatVector
        | StorageKind::NumberVector => args.iter().map(|a| rt.to_number(a)).collect(),
        _ => Vec::new(),
    };
    let mut instance = obj.borrow_mut();
    let len = match instance.storage_mut() {
        Storage::Array(items) => {
            check_room(items, args)?;
            items.push(args)
        }
        Storage::Vector { items, fixed } => {
            if *fixed && !args.is_empty() {
                return Err(RuntimeError::FixedSizeViolation);
            }
            check_room(items, args)?;
            items.push(args)
        }
        Storage::IntVector(v) => push_all(v, numbers.iter().map(|n| to_int32(*n)))?,
        Storage::UintVector(v) => push_all(v, numbers.iter().map(|n| to_uint32(*n)))?,
        Storage::FloatVector(v) => push_all(v, numbers.iter().map(|n| *n as f32))?,
        Storage::NumberVector(v) => push_all(v, numbers.iter().copied())?,
        _ => 0,
    };
    Ok(Value::Uint(len as u32))
}

/// Pushing must leave the last index within `MAX_INDEX`
fn check_room(items: &Elements, args: &[Value]) -> RtResult<()> {
    if items.len() + args.len() > MAX_INDEX as usize + 1 {
        return Err(RuntimeError::RangeError(format!(
            "Array length would exceed {}",
            u32::MAX
        )));
    }
    Ok(())
}

fn push_all<T: crate::flex_vector::FlexElement>(
    v: &mut FlexVector<T>,
    items: impl Iterator<Item = T>,
) -> RtResult<usize> {
    let mut len = v.len();
    for item in items {
        len = v.push(item)?;
    }
    Ok(len)
}

/// Remove and return the last element
fn pop(_: &Runtime, this: &Value, _: &[Value]) -> RtResult<Value> {
    let obj = this_object(this)?;
    let mut instance = obj.borrow_mut();
    match instance.storage_mut() {
        Storage::Array(items) => Ok(items.pop()),
        Storage::Vector { items, fixed } => {
            if *fixed {
                return Err(RuntimeError::FixedSizeViolation);
            }
            Ok(items.pop())
        }
        Storage::IntVector(v) => v.pop().map(Value::Int),
        Storage::UintVector(v) => v.pop().map(Value::Uint),
        Storage::FloatVector(v) => v.pop().map(Value::Float),
        Storage::NumberVector(v) => v.pop().map(Value::Number),
        _ => Ok(Value::Undefined),
    }
}

/// Join elements with `separator` (default `,`); null and undefined
/// elements render as empty strings
fn join(rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
    let separator = match args.first() {
        Some(v) if !v.is_undefined() => rt.tostring(v),
        _ => ",".to_string(),
    };
    let obj = this_object(this)?;
    // Snapshot first: element toString may touch the collection
    let (length, items): (usize, Vec<(usize, Value)>) = match obj.borrow().storage() {
        Storage::Array(items) | Storage::Vector { items, .. } => (items.len(), items.present()),
        Storage::IntVector(v) => (v.len(), v.iter().map(Value::Int).enumerate().collect()),
        Storage::UintVector(v) => (v.len(), v.iter().map(Value::Uint).enumerate().collect()),
        Storage::FloatVector(v) => (v.len(), v.iter().map(Value::Float).enumerate().collect()),
        Storage::NumberVector(v) => (v.len(), v.iter().map(Value::Number).enumerate().collect()),
        _ => (0, Vec::new()),
    };
    if length.saturating_sub(1).saturating_mul(separator.len()) > MAX_STRING_LENGTH {
        return Err(string_too_long());
    }

    let mut out = String::new();
    let mut next = 0;
    for (index, item) in items {
        push_separators(&mut out, &separator, next, index + 1);
        if !item.is_nullish() {
            out.push_str(&rt.tostring(&item));
        }
        if out.len() > MAX_STRING_LENGTH {
            return Err(string_too_long());
        }
        next = index + 1;
    }
    push_separators(&mut out, &separator, next, length);
    Ok(Value::from(out))
}

/// Longest string `join` builds
const MAX_STRING_LENGTH: usize = 1 << 30;

fn string_too_long() -> RuntimeError {
    RuntimeError::RangeError(format!("joined string exceeds {} bytes", MAX_STRING_LENGTH))
}

/// Separators preceding positions `from..to`; position 0 has none
fn push_separators(out: &mut String, separator: &str, from: usize, to: usize) {
    let count = to.saturating_sub(from.max(1));
    if count > 0 && !separator.is_empty() {
        out.push_str(&separator.repeat(count));
    }
}
