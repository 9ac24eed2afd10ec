//! Type tests, coercion and string conversion

use super::harness::*;
use sable_runtime::{native, ClassOptions, Member, RuntimeError, Type, Value};

// ============================================================================
// Coercion
// ============================================================================

#[test]
fn test_int_coercion_is_idempotent() {
    let rt = runtime();
    let int = Type::Class(rt.builtins().int.clone());
    for v in [
        Value::Number(3.7),
        Value::Number(-2.5e10),
        Value::Uint(u32::MAX),
        Value::Float(1.5),
    ] {
        let once = rt.coerce(&v, Some(&int));
        let twice = rt.coerce(&once, Some(&int));
        assert!(matches!(once, Value::Int(_)), "{:?} coerced to {:?}", v, once);
        assert_eq!(once, twice);
    }
    assert_eq!(rt.coerce(&Value::Uint(u32::MAX), Some(&int)), Value::Int(-1));
    assert_eq!(rt.coerce(&Value::Number(3.7), Some(&int)), Value::Int(3));
}

#[test]
fn test_float_round_trip_for_representable_values() {
    let rt = runtime();
    let b = rt.builtins();
    let float = Type::Class(b.float.clone());
    let number = Type::Class(b.number.clone());
    for n in [0.5, 16_777_216.0] {
        let narrowed = rt.coerce(&Value::Number(n), Some(&float));
        assert!(matches!(narrowed, Value::Float(_)));
        assert_eq!(rt.coerce(&narrowed, Some(&number)), Value::Number(n));
    }
}

#[test]
fn test_coercion_defaults() {
    let rt = runtime();
    let b = rt.builtins();
    let number = rt.coerce(&Value::string("12"), Some(&Type::Class(b.number.clone())));
    assert!(matches!(number, Value::Number(n) if n.is_nan()));
    assert_eq!(rt.coerce(&Value::Null, Some(&Type::Class(b.uint.clone()))), Value::Uint(0));
    assert_eq!(
        rt.coerce(&Value::Undefined, Some(&Type::Class(b.boolean.clone()))),
        Value::Boolean(false)
    );

    let point = point_class(&rt);
    let p = rt.construct(&point, &[]).unwrap();
    let array = Type::Class(b.array.clone());
    assert_eq!(rt.coerce(&p, Some(&array)), Value::Null);
    assert_eq!(rt.coerce(&p, Some(&Type::Class(point))), p);

    // The root class keeps `undefined`; the universal type keeps anything
    let object = Type::Class(b.object.clone());
    assert_eq!(rt.coerce(&Value::Undefined, Some(&object)), Value::Undefined);
    assert_eq!(rt.coerce(&Value::Int(4), None), Value::Int(4));
}

#[test]
fn test_calling_a_class_converts_or_casts() {
    let rt = runtime();
    let b = rt.builtins();
    let converted = rt
        .call(&Value::Class(b.int.clone()), &Value::Undefined, &[Value::Number(3.9)])
        .unwrap();
    assert_eq!(converted, Value::Int(3));

    let point = point_class(&rt);
    let p = rt.construct(&point, &[]).unwrap();
    assert_eq!(
        rt.call(&Value::Class(point.clone()), &Value::Undefined, &[p.clone()]).unwrap(),
        p
    );
    assert!(matches!(
        rt.call(&Value::Class(point), &Value::Undefined, &[Value::Int(1)]),
        Err(RuntimeError::TypeError(_))
    ));
    assert!(matches!(
        rt.call(&Value::Int(1), &Value::Undefined, &[]),
        Err(RuntimeError::NotCallable { .. })
    ));
}

// ============================================================================
// Type tests
// ============================================================================

#[test]
fn test_primitive_type_membership() {
    let rt = runtime();
    let b = rt.builtins();
    let int = Type::Class(b.int.clone());
    let number = Type::Class(b.number.clone());
    let object = Type::Class(b.object.clone());

    assert!(rt.is_type(&Value::Int(1), Some(&int)));
    assert!(!rt.is_type(&Value::Int(1), Some(&number)));
    assert!(rt.is_type(&Value::Int(1), Some(&object)));
    assert!(rt.is_type(&Value::string("s"), Some(&object)));
    assert!(!rt.is_type(&Value::Null, Some(&object)));
    assert!(rt.is_type(&Value::Null, None));
}

// ============================================================================
// String conversion
// ============================================================================

#[test]
fn test_number_rendering() {
    let rt = runtime();
    assert_eq!(rt.tostring(&Value::Number(1.0)), "1");
    assert_eq!(rt.tostring(&Value::Number(0.25)), "0.25");
    assert_eq!(rt.tostring(&Value::Number(1e21)), "1e+21");
    assert_eq!(rt.tostring(&Value::Number(f64::NAN)), "NaN");
    assert_eq!(rt.tostring(&Value::Uint(u32::MAX)), "4294967295");
    assert_eq!(rt.tostring(&Value::Float(0.1)), "0.1");
    assert_eq!(rt.to_number(&Value::string(" 0x10 ")), 16.0);
    assert_eq!(rt.to_number(&Value::Boolean(true)), 1.0);
}

#[test]
fn test_failing_tostring_falls_back_to_class_name() {
    let rt = runtime();
    let broken = define(
        &rt,
        "Broken",
        ClassOptions::new(),
        vec![Member::method(
            public(&rt, "toString"),
            native(|_, _, _| Err(RuntimeError::Thrown(Value::string("boom")))),
        )],
    );
    let obj = rt.construct(&broken, &[]).unwrap();
    assert_eq!(rt.tostring(&obj), "[object Broken]");

    let counted = define(
        &rt,
        "Counted",
        ClassOptions::new(),
        vec![returns(&rt, "toString", Value::Int(5))],
    );
    let c = rt.construct(&counted, &[]).unwrap();
    assert_eq!(rt.tostring(&c), "5");
    assert_eq!(rt.to_number(&c), 5.0);
}
