//! Namespaces, qualified lookup and the ambiguity rule

use super::harness::*;
use sable_runtime::ns::SystemNsKind;
use sable_runtime::{ClassOptions, Member, Ns, QName, Qualifier, Runtime, RuntimeError, Value};

// ============================================================================
// Namespace identity
// ============================================================================

#[test]
fn test_package_namespaces_are_interned() {
    let rt = runtime();
    let first = rt.package_ns("flash.display");
    let second = rt.package_ns("flash.display");
    assert_eq!(first, second);
    assert_eq!(first.id(), second.id());
    assert_ne!(rt.package_ns("flash.display"), rt.package_ns("flash.events"));
    assert_ne!(
        rt.package_ns("flash.display"),
        rt.package_internal_ns("flash.display")
    );
}

#[test]
fn test_user_namespaces_compare_by_identity() {
    let a = Ns::user("http://example.com/ns");
    let b = Ns::user("http://example.com/ns");
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}

// ============================================================================
// Ambiguity
// ============================================================================

#[test]
fn test_public_traits_in_two_packages_are_ambiguous() {
    let rt = runtime();
    let a = rt.package_ns("a");
    let b = rt.package_ns("b");
    let amb = define(
        &rt,
        "Amb",
        ClassOptions::new(),
        vec![
            Member::var(QName::new(a.clone(), "x"), None).with_initial(Value::Int(1)),
            Member::var(QName::new(b.clone(), "x"), None).with_initial(Value::Int(2)),
            var(&rt, "y"),
        ],
    );
    let obj = rt.construct(&amb, &[]).unwrap();

    assert!(matches!(
        get(&rt, &obj, "x"),
        Err(RuntimeError::AmbiguousReference { name }) if name == "x"
    ));
    assert!(matches!(
        rt.has_property(&obj, &Q, "x"),
        Err(RuntimeError::AmbiguousReference { .. })
    ));
    assert_eq!(rt.get_property(&obj, &Qualifier::Ns(a), "x").unwrap(), Value::Int(1));
    assert_eq!(
        rt.get_property(&obj, &Qualifier::Ns(b.clone()), "x").unwrap(),
        Value::Int(2)
    );
    // A single matching trait resolves unqualified
    assert!(get(&rt, &obj, "y").is_ok());

    // Namespace sets containing a public namespace see every public trait
    let set = Qualifier::NsSet(vec![b]);
    assert!(matches!(
        rt.get_property(&obj, &set, "x"),
        Err(RuntimeError::AmbiguousReference { .. })
    ));
}

#[test]
fn test_realm_lookup_across_sibling_packages() {
    let rt = runtime();
    rt.realm().define_class(
        QName::new(rt.package_ns("geom"), "Shape"),
        ClassOptions::new(),
        Vec::new(),
    );
    let found = rt.realm().lookup(&Q, "Shape").unwrap().unwrap();
    assert_eq!(found.as_class().unwrap().name(), "geom.Shape");

    rt.realm().define_class(
        QName::new(rt.package_ns("draw"), "Shape"),
        ClassOptions::new(),
        Vec::new(),
    );
    assert!(matches!(
        rt.realm().lookup(&Q, "Shape"),
        Err(RuntimeError::AmbiguousReference { .. })
    ));
    assert!(rt
        .realm()
        .has_name(&Qualifier::Ns(rt.package_ns("draw")), "Shape")
        .unwrap());
    assert!(rt.realm().class_named("draw", "Shape").is_some());
    assert!(rt.realm().class_named("draw", "Circle").is_none());
}

#[test]
fn test_namespace_set_lookup() {
    let rt = runtime();
    let internal = rt.package_internal_ns("");
    let secret = Ns::user("http://example.com/secret");
    let holder = define(
        &rt,
        "Holder",
        ClassOptions::new(),
        vec![
            Member::var(QName::new(internal.clone(), "hidden"), None).with_initial(Value::Int(7)),
            Member::var(QName::new(secret.clone(), "code"), None).with_initial(Value::Int(9)),
        ],
    );
    let h = rt.construct(&holder, &[]).unwrap();

    // Non-public members are invisible without their namespace
    assert!(!rt.in_object(&h, &Q, "hidden").unwrap());
    let open = Qualifier::NsSet(vec![rt.package_ns(""), internal, secret.clone()]);
    assert_eq!(rt.get_property(&h, &open, "hidden").unwrap(), Value::Int(7));
    assert_eq!(rt.get_property(&h, &open, "code").unwrap(), Value::Int(9));
    assert!(rt.in_object(&h, &Qualifier::Ns(secret), "code").unwrap());
}

// ============================================================================
// Namespace reflection
// ============================================================================

fn reflected_uri(rt: &Runtime, ns: &Ns) -> String {
    let reflected = rt.reflect_namespace(ns);
    rt.tostring(&get(rt, &reflected, "uri").unwrap())
}

#[test]
fn test_system_namespace_reflection() {
    let private = Ns::system(SystemNsKind::Private);

    let deterministic = runtime();
    assert_eq!(
        reflected_uri(&deterministic, &private),
        reflected_uri(&deterministic, &private)
    );

    let randomized = Runtime::new();
    assert_ne!(reflected_uri(&randomized, &private), reflected_uri(&randomized, &private));

    // User namespaces always report their own URI
    let user = Ns::user("http://example.com/ns");
    assert_eq!(reflected_uri(&randomized, &user), "http://example.com/ns");
}
