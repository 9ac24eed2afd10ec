//! Error hierarchy
//!
//! `Error` carries `message` and `name` and renders as `name: message`.
//! The subclasses only differ in the `name` their constructor assigns.

use super::{arg, define, public, this_object};
use crate::class::{ClassOptions, ClassRef};
use crate::names::Qualifier;
use crate::realm::Realm;
use crate::traits::{native, Member, NativeFn};
use crate::value::Value;

pub(super) struct Errors {
    pub error: ClassRef,
    pub argument_error: ClassRef,
    pub definition_error: ClassRef,
    pub eval_error: ClassRef,
    pub range_error: ClassRef,
    pub reference_error: ClassRef,
    pub security_error: ClassRef,
    pub syntax_error: ClassRef,
    pub type_error: ClassRef,
    pub uri_error: ClassRef,
    pub verify_error: ClassRef,
}

pub(super) fn install(realm: &Realm) -> Errors {
    let init: NativeFn = native(|rt, this, args| {
        this_object(this)?;
        let message = arg(args, 0);
        if !message.is_undefined() {
            rt.set_property(this, &Qualifier::Unqualified, "message", rt.tostring_value(&message))?;
        }
        Ok(Value::Undefined)
    });

    let error = define(
        realm,
        "Error",
        ClassOptions::new().dynamic(true).constructor(init.clone()),
        vec![
            Member::var(public(realm, "message"), None).with_initial(Value::string("")),
            Member::var(public(realm, "name"), None).with_initial(Value::string("Error")),
            Member::method(
                public(realm, "toString"),
                native(|rt, this, _| {
                    let q = Qualifier::Unqualified;
                    let name = rt.tostring(&rt.get_property(this, &q, "name")?);
                    let message = rt.tostring(&rt.get_property(this, &q, "message")?);
                    Ok(Value::from(if message.is_empty() {
                        name
                    } else {
                        format!("{}: {}", name, message)
                    }))
                }),
            ),
        ],
    );

    let subclass = |local: &'static str| {
        let init = init.clone();
        define(
            realm,
            local,
            ClassOptions::new()
                .base(&error)
                .dynamic(true)
                .constructor(native(move |rt, this, args| {
                    init(rt, this, args)?;
                    rt.set_property(this, &Qualifier::Unqualified, "name", Value::string(local))?;
                    Ok(Value::Undefined)
                })),
            Vec::new(),
        )
    };

    Errors {
        argument_error: subclass("ArgumentError"),
        definition_error: subclass("DefinitionError"),
        eval_error: subclass("EvalError"),
        range_error: subclass("RangeError"),
        reference_error: subclass("ReferenceError"),
        security_error: subclass("SecurityError"),
        syntax_error: subclass("SyntaxError"),
        type_error: subclass("TypeError"),
        uri_error: subclass("URIError"),
        verify_error: subclass("VerifyError"),
        error,
    }
}
