//! Core classes
//!
//! - `Object`: the dynamic root (`toString`, `hasOwnProperty`, `valueOf`)
//! - `Namespace`: reified namespaces (`prefix`, `uri`, `toString`)
//! - `QName`: reified qualified names (`uri`, `localName`, `toString`)
//! - `Class`: wrapper reifying class values (`toString`)
//! - `Function`: callables (`call`, `apply`)

use super::{arg, define, init_slot, public, this_object};
use crate::class::{ClassOptions, ClassRef};
use crate::error::{RtResult, RuntimeError};
use crate::names::Qualifier;
use crate::ns::Ns;
use crate::object::{Storage, StorageKind};
use crate::realm::Realm;
use crate::runtime::Runtime;
use crate::traits::{native, Member};
use crate::value::Value;

/// Longest argument list `Function.apply` spreads
const MAX_APPLY_ARGUMENTS: usize = 1 << 16;

pub(super) struct Core {
    pub object: ClassRef,
    pub namespace: ClassRef,
    pub qname: ClassRef,
    pub class: ClassRef,
    pub function: ClassRef,
}

pub(super) fn install(realm: &Realm) -> Core {
    let object = define(
        realm,
        "Object",
        ClassOptions::new().dynamic(true),
        vec![
            Member::method(
                public(realm, "toString"),
                native(|rt, this, _| {
                    let name = rt
                        .class_of(this)
                        .map(|c| c.local_name().to_string())
                        .unwrap_or_else(|| "Object".to_string());
                    Ok(Value::from(format!("[object {}]", name)))
                }),
            ),
            Member::method(
                public(realm, "hasOwnProperty"),
                native(|rt, this, args| {
                    let own = rt.has_own_property(this, &Qualifier::Unqualified, arg(args, 0))?;
                    Ok(Value::Boolean(own))
                }),
            ),
            Member::method(public(realm, "valueOf"), native(|_, this, _| Ok(this.clone()))),
        ],
    );

    let namespace = define(
        realm,
        "Namespace",
        ClassOptions::new()
            .final_(true)
            .storage(StorageKind::Namespace)
            .constructor(native(construct_namespace)),
        vec![
            Member::var(public(realm, "prefix"), None),
            Member::read_only(public(realm, "uri"), None),
            Member::method(
                public(realm, "toString"),
                native(|rt, this, _| rt.get_property(this, &Qualifier::Unqualified, "uri")),
            ),
        ],
    );

    let qname = define(
        realm,
        "QName",
        ClassOptions::new().final_(true).constructor(native(|rt, this, args| {
            let obj = this_object(this)?;
            let (uri, local) = match args {
                [] => (Value::Null, Value::string("")),
                [local] => (Value::Null, rt.tostring_value(local)),
                [uri, local, ..] => (qname_uri(rt, uri), rt.tostring_value(local)),
            };
            init_slot(rt, obj, "uri", uri);
            init_slot(rt, obj, "localName", local);
            Ok(Value::Undefined)
        })),
        vec![
            Member::read_only(public(realm, "uri"), None).with_initial(Value::Null),
            Member::read_only(public(realm, "localName"), None).with_initial(Value::string("")),
            Member::method(
                public(realm, "toString"),
                native(|rt, this, _| {
                    let uri = rt.get_property(this, &Qualifier::Unqualified, "uri")?;
                    let local = rt.get_property(this, &Qualifier::Unqualified, "localName")?;
                    let local = rt.tostring(&local);
                    Ok(Value::from(match uri {
                        Value::Null | Value::Undefined => local,
                        uri => format!("{}::{}", rt.tostring(&uri), local),
                    }))
                }),
            ),
        ],
    );

    let class = define(
        realm,
        "Class",
        ClassOptions::new().final_(true).storage(StorageKind::Class),
        vec![Member::method(
            public(realm, "toString"),
            native(|_, this, _| {
                let wrapped = match this {
                    Value::Class(class) => Some(class.clone()),
                    Value::Object(obj) => match obj.borrow().storage() {
                        Storage::Class(wrapped) => wrapped.clone(),
                        _ => None,
                    },
                    _ => None,
                };
                Ok(match wrapped {
                    Some(class) => Value::from(format!("[class {}]", class.local_name())),
                    None => Value::string("[object Class]"),
                })
            }),
        )],
    );

    let function = define(
        realm,
        "Function",
        ClassOptions::new().final_(true),
        vec![
            Member::method(
                public(realm, "call"),
                native(|rt, this, args| {
                    let receiver = arg(args, 0);
                    let rest = args.get(1..).unwrap_or_default();
                    rt.call(this, &receiver, rest)
                }),
            ),
            Member::method(
                public(realm, "apply"),
                native(|rt, this, args| {
                    let receiver = arg(args, 0);
                    let spread = match args.get(1) {
                        None | Some(Value::Null) | Some(Value::Undefined) => Vec::new(),
                        Some(Value::Object(list)) => match list.borrow().storage() {
                            Storage::Array(items) | Storage::Vector { items, .. } => {
                                if items.len() > MAX_APPLY_ARGUMENTS {
                                    return Err(RuntimeError::RangeError(format!(
                                        "apply takes at most {} arguments",
                                        MAX_APPLY_ARGUMENTS
                                    )));
                                }
                                items.to_vec()
                            }
                            _ => return Err(RuntimeError::TypeError("apply expects an Array".into())),
                        },
                        Some(_) => return Err(RuntimeError::TypeError("apply expects an Array".into())),
                    };
                    rt.call(this, &receiver, &spread)
                }),
            ),
        ],
    );

    Core {
        object,
        namespace,
        qname,
        class,
        function,
    }
}

/// `new Namespace()`, `new Namespace(uri)` or `new Namespace(prefix, uri)`
fn construct_namespace(rt: &Runtime, this: &Value, args: &[Value]) -> RtResult<Value> {
    let obj = this_object(this)?;
    let (prefix, uri) = match args {
        [] => (Value::Undefined, String::new()),
        [uri] => (Value::Undefined, rt.tostring(uri)),
        [prefix, uri, ..] => (prefix.clone(), rt.tostring(uri)),
    };
    init_slot(rt, obj, "prefix", prefix);
    init_slot(rt, obj, "uri", Value::from(uri.as_str()));
    *obj.borrow_mut().storage_mut() = Storage::Namespace(Some(Ns::user(uri)));
    Ok(Value::Undefined)
}

/// The `uri` of a QName: namespaces contribute their URI, `null` stays null
fn qname_uri(rt: &Runtime, uri: &Value) -> Value {
    match uri {
        Value::Null => Value::Null,
        Value::Object(obj) if obj.class().storage() == StorageKind::Namespace => rt
            .get_property(uri, &Qualifier::Unqualified, "uri")
            .unwrap_or(Value::Null),
        other => rt.tostring_value(other),
    }
}
