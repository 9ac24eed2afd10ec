//! Instance construction

use crate::class::ClassRef;
use crate::coerce::{to_boolean, to_int32, to_uint32};
use crate::error::{RtResult, RuntimeError};
use crate::object::{Instance, ObjectRef};
use crate::runtime::Runtime;
use crate::value::{PrimitiveKind, Value};

impl Runtime {
    /// Construct an instance of `class`.
    ///
    /// Boxed-primitive classes never allocate: they return the converted
    /// primitive. Otherwise a fresh instance is allocated and the class's
    /// own constructor runs on it. Base constructors only run when the
    /// constructor calls [`Runtime::call_super_constructor`].
    pub fn construct(&self, class: &ClassRef, args: &[Value]) -> RtResult<Value> {
        if let Some(kind) = class.primitive() {
            return Ok(self.construct_primitive(kind, args));
        }
        let this = Value::Object(ObjectRef::new(Instance::allocate(class)));
        if let Some(constructor) = class.constructor() {
            constructor(self, &this, args)?;
        }
        Ok(this)
    }

    /// Construct from a value: classes construct, anything else fails
    pub fn construct_value(&self, callee: &Value, args: &[Value]) -> RtResult<Value> {
        match callee {
            Value::Class(class) => self.construct(class, args),
            other => Err(RuntimeError::NotConstructible {
                name: self.tostring(other),
            }),
        }
    }

    /// Run the nearest ancestor constructor of `class` on `this`
    pub fn call_super_constructor(&self, class: &ClassRef, this: &Value, args: &[Value]) -> RtResult<()> {
        let Some(base) = class.base() else {
            return Ok(());
        };
        let inherited = base.ancestors().find_map(|c| c.constructor().cloned());
        if let Some(constructor) = inherited {
            constructor(self, this, args)?;
        }
        Ok(())
    }

    fn construct_primitive(&self, kind: PrimitiveKind, args: &[Value]) -> Value {
        let Some(arg) = args.first() else {
            return match kind {
                PrimitiveKind::Number => Value::Number(0.0),
                PrimitiveKind::Int => Value::Int(0),
                PrimitiveKind::Uint => Value::Uint(0),
                PrimitiveKind::Float => Value::Float(0.0),
                PrimitiveKind::Boolean => Value::Boolean(false),
                PrimitiveKind::String => Value::string(""),
            };
        };
        match kind {
            PrimitiveKind::Number => Value::Number(self.to_number(arg)),
            PrimitiveKind::Int => Value::Int(to_int32(self.to_number(arg))),
            PrimitiveKind::Uint => Value::Uint(to_uint32(self.to_number(arg))),
            PrimitiveKind::Float => Value::Float(self.to_number(arg) as f32),
            PrimitiveKind::Boolean => Value::Boolean(to_boolean(arg)),
            PrimitiveKind::String => self.tostring_value(arg),
        }
    }
}
