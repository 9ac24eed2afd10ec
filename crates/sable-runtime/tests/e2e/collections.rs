//! Arrays, vectors and dictionaries through the property protocol

use super::harness::*;
use sable_runtime::{native, ClassOptions, Function, RuntimeError, Storage, Value};

fn dictionary_len(dict: &Value) -> usize {
    let obj = dict.as_object().expect("dictionary instance");
    let instance = obj.borrow();
    match instance.storage() {
        Storage::Dictionary(d) => d.len(),
        other => panic!("not a dictionary: {:?}", other),
    }
}

// ============================================================================
// Out-of-range access
// ============================================================================

#[test]
fn test_generic_sequences_tolerate_out_of_range() {
    let rt = runtime();
    let b = rt.builtins();
    let arr = rt.construct(&b.array, &[]).unwrap();
    assert_eq!(get(&rt, &arr, 5).unwrap(), Value::Undefined);
    assert!(!rt.in_object(&arr, &Q, 5).unwrap());

    // Writes past the end extend the array
    set(&rt, &arr, 3, "d").unwrap();
    assert_eq!(get(&rt, &arr, "length").unwrap(), Value::Uint(4));
    assert_eq!(get(&rt, &arr, "3").unwrap(), Value::string("d"));
    assert_eq!(get(&rt, &arr, 0).unwrap(), Value::Undefined);

    let vec = rt.construct(&b.vector, &[]).unwrap();
    assert_eq!(get(&rt, &vec, 2).unwrap(), Value::Undefined);
    set(&rt, &vec, 1, true).unwrap();
    assert_eq!(get(&rt, &vec, "length").unwrap(), Value::Uint(2));
}

#[test]
fn test_far_writes_extend_without_filling() {
    let rt = runtime();
    let b = rt.builtins();
    let arr = rt.construct(&b.array, &[]).unwrap();
    set(&rt, &arr, Value::Uint(4_000_000_000), 1).unwrap();
    assert_eq!(get(&rt, &arr, "length").unwrap(), Value::Uint(4_000_000_001));
    assert_eq!(get(&rt, &arr, 4_000_000_000u32).unwrap(), Value::Int(1));
    assert_eq!(get(&rt, &arr, 7).unwrap(), Value::Undefined);
    assert_eq!(rt.call_property(&arr, &Q, "pop", &[]).unwrap(), Value::Int(1));
    assert_eq!(get(&rt, &arr, "length").unwrap(), Value::Uint(4_000_000_000));

    let declared = rt.construct(&b.array, &[Value::Number(4e9)]).unwrap();
    assert_eq!(get(&rt, &declared, "length").unwrap(), Value::Uint(4_000_000_000));
    set(&rt, &declared, "length", 2).unwrap();
    set(&rt, &declared, "length", u32::MAX).unwrap();
    assert_eq!(get(&rt, &declared, "length").unwrap(), Value::Uint(u32::MAX));

    let vec = rt.construct(&b.vector, &[Value::Number(4e9)]).unwrap();
    set(&rt, &vec, 3_999_999_999u32, "last").unwrap();
    assert_eq!(get(&rt, &vec, 3_999_999_999u32).unwrap(), Value::string("last"));
}

#[test]
fn test_length_limits_are_range_errors() {
    let rt = runtime();
    let b = rt.builtins();
    // The largest index is one below the largest length
    let arr = rt.construct(&b.array, &[]).unwrap();
    set(&rt, &arr, "length", u32::MAX).unwrap();
    assert!(matches!(
        rt.call_property(&arr, &Q, "push", &[Value::Int(1)]),
        Err(RuntimeError::RangeError(_))
    ));
    assert!(matches!(
        set(&rt, &arr, u32::MAX, 1),
        Err(RuntimeError::UndefinedProperty { .. })
    ));

    assert!(matches!(
        rt.construct(&b.vector_int, &[Value::Number(4e9)]),
        Err(RuntimeError::RangeError(_))
    ));
    let doubles = rt.construct(&b.vector_double, &[]).unwrap();
    assert!(matches!(
        set(&rt, &doubles, "length", 4_000_000_000u32),
        Err(RuntimeError::RangeError(_))
    ));

    let sparse = rt.construct(&b.array, &[Value::Number(1e6)]).unwrap();
    let noop = Value::Function(Function::native("noop", native(|_, _, _| Ok(Value::Undefined))));
    assert!(matches!(
        rt.call_property(&noop, &Q, "apply", &[Value::Null, sparse]),
        Err(RuntimeError::RangeError(_))
    ));
}

#[test]
fn test_join_renders_holes_as_empty() {
    let rt = runtime();
    let arr = rt.construct(&rt.builtins().array, &[]).unwrap();
    set(&rt, &arr, 1, "a").unwrap();
    set(&rt, &arr, 5000, "z").unwrap();
    let joined = rt.call_property(&arr, &Q, "join", &[Value::string("")]).unwrap();
    assert_eq!(joined, Value::string("az"));
    let joined = rt.tostring(&arr);
    assert_eq!(joined.len(), 5000 + 2);
    assert!(joined.starts_with(",a,,"));
    assert!(joined.ends_with(",z"));

    let huge = rt.construct(&rt.builtins().array, &[Value::Number(4e9)]).unwrap();
    assert!(matches!(
        rt.call_property(&huge, &Q, "join", &[]),
        Err(RuntimeError::RangeError(_))
    ));
}

#[test]
fn test_numeric_vectors_reject_out_of_range() {
    let rt = runtime();
    let b = rt.builtins();
    for class in [&b.vector_int, &b.vector_uint, &b.vector_float, &b.vector_double] {
        let v = rt.construct(class, &[Value::Int(2)]).unwrap();
        assert!(matches!(
            get(&rt, &v, 5),
            Err(RuntimeError::IndexOutOfRange { index: 5, length: 2 })
        ));
        // Setting exactly at the length appends
        set(&rt, &v, 2, 1).unwrap();
        assert_eq!(get(&rt, &v, "length").unwrap(), Value::Uint(3));
        assert!(matches!(
            set(&rt, &v, 9, 1),
            Err(RuntimeError::IndexOutOfRange { .. })
        ));
    }
}

#[test]
fn test_numeric_vector_elements_convert() {
    let rt = runtime();
    let b = rt.builtins();
    let ints = rt.construct(&b.vector_int, &[Value::Int(1)]).unwrap();
    set(&rt, &ints, 0, 4_294_967_295.0).unwrap();
    assert!(matches!(get(&rt, &ints, 0).unwrap(), Value::Int(-1)));

    let uints = rt.construct(&b.vector_uint, &[Value::Int(1)]).unwrap();
    set(&rt, &uints, 0, -1).unwrap();
    assert!(matches!(get(&rt, &uints, 0).unwrap(), Value::Uint(u32::MAX)));

    let floats = rt.construct(&b.vector_float, &[Value::Int(1)]).unwrap();
    set(&rt, &floats, 0, 0.1).unwrap();
    assert!(matches!(get(&rt, &floats, 0).unwrap(), Value::Float(f) if f == 0.1f32));

    let doubles = rt.construct(&b.vector_double, &[Value::Int(1)]).unwrap();
    set(&rt, &doubles, 0, "2.5").unwrap();
    assert_eq!(get(&rt, &doubles, 0).unwrap(), Value::Number(2.5));
}

// ============================================================================
// Fixed vectors
// ============================================================================

#[test]
fn test_fixed_vectors() {
    let rt = runtime();
    let b = rt.builtins();
    let v = rt
        .construct(&b.vector_int, &[Value::Int(0), Value::Boolean(true)])
        .unwrap();
    assert!(matches!(
        rt.call_property(&v, &Q, "push", &[Value::Int(1)]),
        Err(RuntimeError::FixedSizeViolation)
    ));
    assert!(matches!(set(&rt, &v, 0, 1), Err(RuntimeError::FixedSizeViolation)));
    assert!(matches!(
        rt.call_property(&v, &Q, "pop", &[]),
        Err(RuntimeError::FixedSizeViolation)
    ));

    set(&rt, &v, "fixed", false).unwrap();
    assert_eq!(rt.call_property(&v, &Q, "push", &[Value::Int(7)]).unwrap(), Value::Uint(1));
    assert_eq!(get(&rt, &v, 0).unwrap(), Value::Int(7));
}

// ============================================================================
// Dictionaries
// ============================================================================

#[test]
fn test_dictionary_identity_keys() {
    let rt = runtime();
    let point = point_class(&rt);
    let dict = rt.construct(&rt.builtins().dictionary, &[]).unwrap();
    let a = rt.construct(&point, &[]).unwrap();
    let b = rt.construct(&point, &[]).unwrap();

    set(&rt, &dict, a.clone(), "first").unwrap();
    set(&rt, &dict, b.clone(), "second").unwrap();
    set(&rt, &dict, 1, "int key").unwrap();
    assert_eq!(get(&rt, &dict, a.clone()).unwrap(), Value::string("first"));
    assert_eq!(get(&rt, &dict, b).unwrap(), Value::string("second"));
    // Numeric keys compare by value across kinds
    assert_eq!(get(&rt, &dict, 1.0).unwrap(), Value::string("int key"));
    // String keys are distinct from numeric ones
    assert_eq!(get(&rt, &dict, "1").unwrap(), Value::Undefined);

    assert!(rt.in_object(&dict, &Q, a.clone()).unwrap());
    assert!(rt.delete_property(&dict, &Q, a.clone()).unwrap());
    assert!(!rt.in_object(&dict, &Q, a).unwrap());
    assert_eq!(dictionary_len(&dict), 2);
}

#[test]
fn test_weak_dictionary_does_not_keep_keys_alive() {
    let rt = runtime();
    let point = point_class(&rt);
    let dict = rt
        .construct(&rt.builtins().dictionary, &[Value::Boolean(true)])
        .unwrap();

    let kept = rt.construct(&point, &[]).unwrap();
    set(&rt, &dict, kept.clone(), 1).unwrap();
    {
        let transient = rt.construct(&point, &[]).unwrap();
        set(&rt, &dict, transient.clone(), 2).unwrap();
        assert_eq!(get(&rt, &dict, transient).unwrap(), Value::Int(2));
    }
    assert_eq!(dictionary_len(&dict), 1);
    assert_eq!(get(&rt, &dict, kept).unwrap(), Value::Int(1));

    assert!(matches!(
        set(&rt, &dict, "name", 3),
        Err(RuntimeError::InvalidWeakKey)
    ));
}

#[test]
fn test_dynamic_collection_subclass() {
    let rt = runtime();
    let b = rt.builtins();
    let list = define(&rt, "TaggedList", ClassOptions::new().base(&b.array).dynamic(true), Vec::new());
    let l = rt.construct(&list, &[]).unwrap();

    set(&rt, &l, 0, "item").unwrap();
    set(&rt, &l, "tag", "red").unwrap();
    assert_eq!(get(&rt, &l, "length").unwrap(), Value::Uint(1));
    assert_eq!(get(&rt, &l, "tag").unwrap(), Value::string("red"));
    assert_eq!(rt.call_property(&l, &Q, "join", &[]).unwrap(), Value::string("item"));
}
