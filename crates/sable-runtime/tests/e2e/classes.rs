//! Class declarations, construction, slots, accessors and dispatch

use super::harness::*;
use sable_runtime::{
    native, ClassOptions, InterfaceOptions, Member, Ns, QName, Qualifier, RuntimeError, Type, Value,
};
use std::rc::Rc;

// ============================================================================
// Declarations and construction
// ============================================================================

#[test]
fn test_point_end_to_end() {
    let rt = runtime();
    let point = point_class(&rt);
    let p = rt.construct(&point, &[]).unwrap();

    let public = Qualifier::Ns(rt.package_ns(""));
    assert_eq!(rt.get_property(&p, &public, "x").unwrap(), Value::Int(1));
    assert_eq!(rt.get_property(&p, &public, "y").unwrap(), Value::Int(2));
    assert!(matches!(
        rt.get_property(&p, &public, "z"),
        Err(RuntimeError::UndefinedProperty { name }) if name == "z"
    ));
}

#[test]
fn test_constructor_populates_slots() {
    let rt = runtime();
    let point = define(
        &rt,
        "Point",
        ClassOptions::new().constructor(native(|rt, this, args| {
            let q = Qualifier::Unqualified;
            rt.set_property(this, &q, "x", args.first().cloned().unwrap_or_default())?;
            rt.set_property(this, &q, "y", args.get(1).cloned().unwrap_or_default())?;
            Ok(Value::Undefined)
        })),
        vec![var(&rt, "x"), var(&rt, "y")],
    );
    let p = rt.construct(&point, &[Value::Number(3.5), Value::Int(-4)]).unwrap();
    assert_eq!(get(&rt, &p, "x").unwrap(), Value::Number(3.5));
    assert_eq!(get(&rt, &p, "y").unwrap(), Value::Int(-4));
}

#[test]
fn test_root_class_and_canonical_names() {
    let rt = runtime();
    let root = rt.realm().root().unwrap().clone();
    let sprite = rt.realm().define_class(
        QName::new(rt.package_ns("flash.display"), "Sprite"),
        ClassOptions::new(),
        Vec::new(),
    );
    assert_eq!(sprite.name(), "flash.display.Sprite");
    assert!(Rc::ptr_eq(sprite.base().unwrap(), &root));
    assert_eq!(rt.tostring(&Value::Class(sprite)), "[class Sprite]");
}

// ============================================================================
// Slots
// ============================================================================

#[test]
fn test_slots_never_shift_under_subclassing() {
    let rt = runtime();
    let a = define(&rt, "A", ClassOptions::new(), vec![var(&rt, "a"), var(&rt, "b")]);
    let b = define(&rt, "B", ClassOptions::new().base(&a), vec![var(&rt, "c")]);
    let c = define(&rt, "C", ClassOptions::new().base(&b).dynamic(true), vec![var(&rt, "d")]);

    let names: Vec<&str> = c.slots().iter().map(|t| t.local_name()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    for trait_ in a.slots() {
        assert_eq!(a.slot_index(trait_), c.slot_index(trait_));
    }
    let c_trait = &b.slots()[2];
    assert_eq!(b.slot_offset(c_trait), Some(3));
    // Dynamic classes carry a two-word header
    assert_eq!(c.slot_offset(c_trait), Some(4));

    let obj = rt.construct(&c, &[]).unwrap();
    set(&rt, &obj, "a", 10).unwrap();
    set(&rt, &obj, "d", 40).unwrap();
    assert_eq!(get(&rt, &obj, "a").unwrap(), Value::Int(10));
    assert_eq!(get(&rt, &obj, "d").unwrap(), Value::Int(40));
    assert_eq!(get(&rt, &obj, "b").unwrap(), Value::Undefined);
}

#[test]
fn test_read_only_variable_keeps_value() {
    let rt = runtime();
    let config = define(
        &rt,
        "Config",
        ClassOptions::new(),
        vec![Member::read_only(public(&rt, "version"), None).with_initial(Value::Int(5))],
    );
    let obj = rt.construct(&config, &[]).unwrap();
    assert!(matches!(
        set(&rt, &obj, "version", 6),
        Err(RuntimeError::WriteToReadOnly { name }) if name == "version"
    ));
    assert_eq!(get(&rt, &obj, "version").unwrap(), Value::Int(5));
}

#[test]
fn test_typed_variable_coerces_writes() {
    let rt = runtime();
    let int = Type::Class(rt.builtins().int.clone());
    let counter = define(
        &rt,
        "Counter",
        ClassOptions::new(),
        vec![Member::var(public(&rt, "count"), Some(int))],
    );
    let obj = rt.construct(&counter, &[]).unwrap();
    assert_eq!(get(&rt, &obj, "count").unwrap(), Value::Int(0));
    set(&rt, &obj, "count", 7.9).unwrap();
    assert!(matches!(get(&rt, &obj, "count").unwrap(), Value::Int(7)));
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn test_accessor_halves() {
    let rt = runtime();
    let shape = define(
        &rt,
        "Shape",
        ClassOptions::new(),
        vec![
            var(&rt, "backing").with_initial(Value::Int(3)),
            Member::accessor(
                public(&rt, "side"),
                None,
                Some(native(|rt, this, _| rt.get_property(this, &Qualifier::Unqualified, "backing"))),
                Some(native(|rt, this, args| {
                    let value = args.first().cloned().unwrap_or_default();
                    rt.set_property(this, &Qualifier::Unqualified, "backing", value)?;
                    Ok(Value::Undefined)
                })),
            ),
            Member::getter(public(&rt, "area"), None, native(|_, _, _| Ok(Value::Int(9)))),
            Member::accessor(
                public(&rt, "sink"),
                None,
                None,
                Some(native(|_, _, _| Ok(Value::Undefined))),
            ),
        ],
    );
    let obj = rt.construct(&shape, &[]).unwrap();

    assert_eq!(get(&rt, &obj, "side").unwrap(), Value::Int(3));
    set(&rt, &obj, "side", 5).unwrap();
    assert_eq!(get(&rt, &obj, "backing").unwrap(), Value::Int(5));

    assert_eq!(get(&rt, &obj, "area").unwrap(), Value::Int(9));
    assert!(matches!(
        set(&rt, &obj, "area", 1),
        Err(RuntimeError::ReadOnlyPropertyWrite { .. })
    ));
    assert!(matches!(
        get(&rt, &obj, "sink"),
        Err(RuntimeError::WriteOnlyPropertyRead { .. })
    ));
    assert!(rt.has_own_property(&obj, &Q, "side").unwrap());
}

#[test]
fn test_in_object_does_not_run_getters() {
    let rt = runtime();
    let fragile = define(
        &rt,
        "Fragile",
        ClassOptions::new(),
        vec![Member::getter(
            public(&rt, "value"),
            None,
            native(|_, _, _| Err(RuntimeError::Thrown(Value::string("getter ran")))),
        )],
    );
    let obj = rt.construct(&fragile, &[]).unwrap();
    assert!(rt.in_object(&obj, &Q, "value").unwrap());
    assert!(matches!(get(&rt, &obj, "value"), Err(RuntimeError::Thrown(_))));
}

// ============================================================================
// Methods and dispatch
// ============================================================================

#[test]
fn test_override_dispatch() {
    let rt = runtime();
    let base = define(
        &rt,
        "Animal",
        ClassOptions::new(),
        vec![
            returns(&rt, "sound", Value::string("...")),
            Member::method(
                public(&rt, "speak"),
                native(|rt, this, _| {
                    let sound = rt.call_property(this, &Qualifier::Unqualified, "sound", &[])?;
                    Ok(Value::from(format!("says {}", rt.tostring(&sound))))
                }),
            ),
        ],
    );
    let dog = define(
        &rt,
        "Dog",
        ClassOptions::new().base(&base),
        vec![returns(&rt, "sound", Value::string("woof"))],
    );

    let d = rt.construct(&dog, &[]).unwrap();
    assert_eq!(rt.call_property(&d, &Q, "speak", &[]).unwrap(), Value::string("says woof"));
    let a = rt.construct(&base, &[]).unwrap();
    assert_eq!(rt.call_property(&a, &Q, "speak", &[]).unwrap(), Value::string("says ..."));

    // A method read as a value still dispatches on its receiver
    let bound = get(&rt, &d, "sound").unwrap();
    assert_eq!(rt.call(&bound, &Value::Null, &[]).unwrap(), Value::string("woof"));
}

#[test]
fn test_override_from_another_package() {
    let rt = runtime();
    let a = rt.package_ns("a");
    let b = rt.package_ns("b");
    let animal = rt.realm().define_class(
        QName::new(a.clone(), "Animal"),
        ClassOptions::new(),
        vec![Member::method(
            QName::new(a.clone(), "sound"),
            native(|_, _, _| Ok(Value::string("..."))),
        )],
    );
    let dog = rt.realm().define_class(
        QName::new(b.clone(), "Dog"),
        ClassOptions::new().base(&animal),
        vec![Member::method(
            QName::new(b, "sound"),
            native(|_, _, _| Ok(Value::string("woof"))),
        )],
    );
    let d = rt.construct(&dog, &[]).unwrap();
    let base_qualified = Qualifier::Ns(a);

    assert_eq!(rt.call_property(&d, &Q, "sound", &[]).unwrap(), Value::string("woof"));
    let bound = rt.get_property(&d, &base_qualified, "sound").unwrap();
    assert_eq!(rt.call(&bound, &Value::Null, &[]).unwrap(), Value::string("woof"));
    assert_eq!(
        rt.call_property(&d, &base_qualified, "sound", &[]).unwrap(),
        Value::string("woof")
    );
}

#[test]
fn test_bound_method_identity() {
    let rt = runtime();
    let point = define(&rt, "Point", ClassOptions::new(), vec![returns(&rt, "norm", Value::Int(0))]);
    let p = rt.construct(&point, &[]).unwrap();
    let q = rt.construct(&point, &[]).unwrap();

    let first = get(&rt, &p, "norm").unwrap();
    let second = get(&rt, &p, "norm").unwrap();
    assert!(matches!(first, Value::Function(_)));
    assert_eq!(first, second);
    assert_ne!(first, get(&rt, &q, "norm").unwrap());
}

#[test]
fn test_methods_are_not_assignable() {
    let rt = runtime();
    let point = define(&rt, "Point", ClassOptions::new(), vec![returns(&rt, "norm", Value::Int(0))]);
    let p = rt.construct(&point, &[]).unwrap();
    assert!(matches!(
        set(&rt, &p, "norm", 1),
        Err(RuntimeError::AssignToMethod { .. })
    ));
    assert!(!rt.has_own_property(&p, &Q, "norm").unwrap());
    assert!(rt.in_object(&p, &Q, "norm").unwrap());
}

#[test]
fn test_constructor_chaining_is_explicit() {
    let rt = runtime();
    let base = define(
        &rt,
        "Base",
        ClassOptions::new().constructor(native(|rt, this, _| {
            rt.set_property(this, &Qualifier::Unqualified, "ready", Value::Boolean(true))?;
            Ok(Value::Undefined)
        })),
        vec![var(&rt, "ready").with_initial(Value::Boolean(false))],
    );
    let child = define(
        &rt,
        "Child",
        ClassOptions::new().base(&base).constructor(native(|rt, this, args| {
            let class = this
                .as_object()
                .map(|o| o.class())
                .ok_or_else(|| RuntimeError::TypeError("receiver is not an instance".into()))?;
            rt.call_super_constructor(&class, this, args)?;
            Ok(Value::Undefined)
        })),
        Vec::new(),
    );
    let orphan = define(
        &rt,
        "Orphan",
        ClassOptions::new()
            .base(&base)
            .constructor(native(|_, _, _| Ok(Value::Undefined))),
        Vec::new(),
    );

    let c = rt.construct(&child, &[]).unwrap();
    assert_eq!(get(&rt, &c, "ready").unwrap(), Value::Boolean(true));
    let o = rt.construct(&orphan, &[]).unwrap();
    assert_eq!(get(&rt, &o, "ready").unwrap(), Value::Boolean(false));
}

// ============================================================================
// Static side
// ============================================================================

#[test]
fn test_static_members() {
    let rt = runtime();
    let registry = define(
        &rt,
        "Registry",
        ClassOptions::new(),
        vec![
            var(&rt, "count").with_initial(Value::Int(0)).into_static(),
            Member::constant(public(&rt, "LIMIT"), None, Value::Int(10)).into_static(),
            Member::method(
                public(&rt, "describe"),
                native(|_, this, _| Ok(Value::Boolean(this.is_undefined()))),
            )
            .into_static(),
        ],
    );
    let sub = define(&rt, "SubRegistry", ClassOptions::new().base(&registry), Vec::new());
    let class = Value::Class(registry.clone());
    let sub_class = Value::Class(sub);

    set(&rt, &class, "count", 3).unwrap();
    assert_eq!(get(&rt, &class, "count").unwrap(), Value::Int(3));
    // Subclasses read the owner's storage
    assert_eq!(get(&rt, &sub_class, "count").unwrap(), Value::Int(3));
    assert!(rt.has_own_property(&class, &Q, "count").unwrap());
    assert!(!rt.has_own_property(&sub_class, &Q, "count").unwrap());

    assert!(matches!(
        set(&rt, &class, "LIMIT", 11),
        Err(RuntimeError::WriteToReadOnly { .. })
    ));
    // Static methods run without a receiver
    assert_eq!(rt.call_property(&class, &Q, "describe", &[]).unwrap(), Value::Boolean(true));

    // Instances do not see static members
    let obj = rt.construct(&registry, &[]).unwrap();
    assert!(matches!(get(&rt, &obj, "count"), Err(RuntimeError::UndefinedProperty { .. })));
}

#[test]
fn test_prototype_property() {
    let rt = runtime();
    let point = point_class(&rt);
    let class = Value::Class(point.clone());
    let proto = get(&rt, &class, "prototype").unwrap();
    assert_eq!(proto, Value::Object(point.prototype().unwrap().clone()));
    assert!(rt.has_own_property(&class, &Q, "prototype").unwrap());
    assert!(matches!(
        set(&rt, &class, "prototype", Value::Null),
        Err(RuntimeError::WriteToReadOnly { .. })
    ));
}

// ============================================================================
// Interfaces and type tests
// ============================================================================

#[test]
fn test_interfaces_and_istype() {
    let rt = runtime();
    let shape = rt.realm().define_interface(
        public(&rt, "IShape"),
        InterfaceOptions::new(),
        vec![Member::method(public(&rt, "area"), native(|_, _, _| Ok(Value::Undefined)))],
    );
    let solid = rt.realm().define_interface(
        public(&rt, "ISolid"),
        InterfaceOptions::new().extends(&shape),
        Vec::new(),
    );
    let cube = define(&rt, "Cube", ClassOptions::new().implements(&solid), Vec::new());
    let small = define(&rt, "SmallCube", ClassOptions::new().base(&cube), Vec::new());
    let other = point_class(&rt);

    let s = rt.construct(&small, &[]).unwrap();
    let p = rt.construct(&other, &[]).unwrap();
    let shape_ty = Type::Interface(shape.clone());
    assert!(rt.is_type(&s, Some(&shape_ty)));
    assert!(rt.is_type(&s, Some(&Type::Class(cube))));
    assert!(!rt.is_type(&p, Some(&shape_ty)));
    assert!(rt.is_type(&p, None));

    // Interfaces as casts
    let iface = Value::Interface(shape);
    assert_eq!(rt.call(&iface, &Value::Undefined, &[s.clone()]).unwrap(), s);
    assert!(matches!(
        rt.call(&iface, &Value::Undefined, &[p]),
        Err(RuntimeError::TypeError(_))
    ));
    assert!(matches!(
        rt.construct_value(&iface, &[]),
        Err(RuntimeError::NotConstructible { .. })
    ));
}

#[test]
fn test_private_namespace_members() {
    let rt = runtime();
    let private = Ns::system(sable_runtime::ns::SystemNsKind::Private);
    let vault = define(
        &rt,
        "Vault",
        ClassOptions::new(),
        vec![Member::var(QName::new(private.clone(), "secret"), None).with_initial(Value::Int(42))],
    );
    let v = rt.construct(&vault, &[]).unwrap();

    assert!(matches!(get(&rt, &v, "secret"), Err(RuntimeError::UndefinedProperty { .. })));
    let exact = Qualifier::Ns(private.clone());
    assert_eq!(rt.get_property(&v, &exact, "secret").unwrap(), Value::Int(42));
    let open = Qualifier::NsSet(vec![rt.package_ns(""), private]);
    assert_eq!(rt.get_property(&v, &open, "secret").unwrap(), Value::Int(42));
    assert!(Rc::ptr_eq(&exact_owner(&exact), &vault));
}

fn exact_owner(qualifier: &Qualifier) -> sable_runtime::ClassRef {
    match qualifier {
        Qualifier::Ns(ns) => ns.class().unwrap(),
        other => panic!("not a single namespace: {:?}", other),
    }
}
