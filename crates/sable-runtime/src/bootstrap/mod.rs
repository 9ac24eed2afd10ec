//! Builtin classes
//!
//! Installed into every [`Realm`] a [`Runtime`](crate::runtime::Runtime)
//! creates, in dependency order: `Object` first (it becomes the root), then
//! the reflection classes, the primitive boxes, the collections and the
//! error hierarchy.

mod collections;
mod errors;
mod object;
mod primitives;

use crate::class::{ClassOptions, ClassRef};
use crate::error::{RtResult, RuntimeError};
use crate::ns::QName;
use crate::object::ObjectRef;
use crate::realm::Realm;
use crate::runtime::Runtime;
use crate::traits::Member;
use crate::value::Value;

/// Package holding the vector classes
pub const VECTOR_PACKAGE: &str = "__AS3__.vec";

/// Handles to every builtin class
#[derive(Debug, Clone)]
pub struct Builtins {
    /// `Object`, the root class
    pub object: ClassRef,
    /// `Namespace`
    pub namespace: ClassRef,
    /// `QName`
    pub qname: ClassRef,
    /// `Class`, the wrapper reifying class values
    pub class: ClassRef,
    /// `Function`
    pub function: ClassRef,
    /// `Number`
    pub number: ClassRef,
    /// `int`
    pub int: ClassRef,
    /// `uint`
    pub uint: ClassRef,
    /// `float`
    pub float: ClassRef,
    /// `Boolean`
    pub boolean: ClassRef,
    /// `String`
    pub string: ClassRef,
    /// `Array`
    pub array: ClassRef,
    /// `__AS3__.vec.Vector` (generic elements)
    pub vector: ClassRef,
    /// `__AS3__.vec.Vector$int`
    pub vector_int: ClassRef,
    /// `__AS3__.vec.Vector$uint`
    pub vector_uint: ClassRef,
    /// `__AS3__.vec.Vector$float`
    pub vector_float: ClassRef,
    /// `__AS3__.vec.Vector$double`
    pub vector_double: ClassRef,
    /// `flash.utils.Dictionary`
    pub dictionary: ClassRef,
    /// `Error`
    pub error: ClassRef,
    /// `ArgumentError`
    pub argument_error: ClassRef,
    /// `DefinitionError`
    pub definition_error: ClassRef,
    /// `EvalError`
    pub eval_error: ClassRef,
    /// `RangeError`
    pub range_error: ClassRef,
    /// `ReferenceError`
    pub reference_error: ClassRef,
    /// `SecurityError`
    pub security_error: ClassRef,
    /// `SyntaxError`
    pub syntax_error: ClassRef,
    /// `TypeError`
    pub type_error: ClassRef,
    /// `URIError`
    pub uri_error: ClassRef,
    /// `VerifyError`
    pub verify_error: ClassRef,
}

/// Define every builtin class in `realm`
pub fn install(realm: &Realm) -> Builtins {
    let core = object::install(realm);
    let prims = primitives::install(realm);
    let colls = collections::install(realm, &prims);
    let errs = errors::install(realm);
    Builtins {
        object: core.object,
        namespace: core.namespace,
        qname: core.qname,
        class: core.class,
        function: core.function,
        number: prims.number,
        int: prims.int,
        uint: prims.uint,
        float: prims.float,
        boolean: prims.boolean,
        string: prims.string,
        array: colls.array,
        vector: colls.vector,
        vector_int: colls.vector_int,
        vector_uint: colls.vector_uint,
        vector_float: colls.vector_float,
        vector_double: colls.vector_double,
        dictionary: colls.dictionary,
        error: errs.error,
        argument_error: errs.argument_error,
        definition_error: errs.definition_error,
        eval_error: errs.eval_error,
        range_error: errs.range_error,
        reference_error: errs.reference_error,
        security_error: errs.security_error,
        syntax_error: errs.syntax_error,
        type_error: errs.type_error,
        uri_error: errs.uri_error,
        verify_error: errs.verify_error,
    }
}

// ============================================================================
// Helpers shared by the builtin definitions
// ============================================================================

/// Name in the public namespace of `package`
fn public_in(realm: &Realm, package: &str, local: &str) -> QName {
    QName::new(realm.package_ns(package), local)
}

/// Name in the top-level public namespace
fn public(realm: &Realm, local: &str) -> QName {
    public_in(realm, "", local)
}

fn define(realm: &Realm, local: &str, options: ClassOptions, members: Vec<Member>) -> ClassRef {
    realm.define_class(public(realm, local), options, members)
}

/// Argument `index`, or `undefined` when absent
fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// The receiver as an instance
fn this_object(this: &Value) -> RtResult<&ObjectRef> {
    this.as_object()
        .ok_or_else(|| RuntimeError::TypeError(format!("receiver {:?} is not an object", this)))
}

/// Store a slot by name, bypassing read-only checks. Used by constructors
/// to initialize read-only fields.
fn init_slot(rt: &Runtime, obj: &ObjectRef, local: &str, value: Value) {
    let class = obj.class();
    if let Some(index) = class.find_slot(&QName::new(rt.package_ns(""), local)) {
        obj.borrow_mut().set_slot(index, value);
    }
}
