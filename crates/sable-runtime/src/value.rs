//! Runtime values
//!
//! Primitives are stored inline; class instances, classes, interfaces and
//! functions are reference-counted handles compared by identity.

use crate::class::{ClassRef, InterfaceRef};
use crate::function::FunctionRef;
use crate::object::ObjectRef;
use std::fmt;
use std::rc::Rc;

/// Boxed-primitive kinds. Each has a builtin class whose instance traits
/// serve property access on the raw primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// IEEE-754 double (`Number`)
    Number,
    /// Signed 32-bit integer (`int`)
    Int,
    /// Unsigned 32-bit integer (`uint`)
    Uint,
    /// IEEE-754 single (`float`)
    Float,
    /// `Boolean`
    Boolean,
    /// `String`
    String,
}

impl PrimitiveKind {
    /// Whether the kind is one of the four numeric kinds
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Number | PrimitiveKind::Int | PrimitiveKind::Uint | PrimitiveKind::Float
        )
    }
}

/// A runtime value
#[derive(Clone, Default)]
pub enum Value {
    /// The absent value
    #[default]
    Undefined,
    /// The null reference
    Null,
    /// Boolean primitive
    Boolean(bool),
    /// Double-precision number
    Number(f64),
    /// Signed 32-bit integer
    Int(i32),
    /// Unsigned 32-bit integer
    Uint(u32),
    /// Single-precision number
    Float(f32),
    /// Immutable string
    String(Rc<str>),
    /// Class instance
    Object(ObjectRef),
    /// Class value (static side)
    Class(ClassRef),
    /// Interface value
    Interface(InterfaceRef),
    /// Callable
    Function(FunctionRef),
}

impl Value {
    /// Create a string value
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    /// Whether the value is `null` or `undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Whether the value is `undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Whether the value is one of the numeric kinds
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Number(_) | Value::Int(_) | Value::Uint(_) | Value::Float(_)
        )
    }

    /// Numeric value widened to `f64`, or `None` for non-numeric kinds
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            Value::Float(f) => Some(*f as f64),
            _ => None,
        }
    }

    /// String contents, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Instance handle, if this is a class instance
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Class handle, if this is a class value
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Primitive kind of the value, if it is a primitive
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Number(_) => Some(PrimitiveKind::Number),
            Value::Int(_) => Some(PrimitiveKind::Int),
            Value::Uint(_) => Some(PrimitiveKind::Uint),
            Value::Float(_) => Some(PrimitiveKind::Float),
            Value::Boolean(_) => Some(PrimitiveKind::Boolean),
            Value::String(_) => Some(PrimitiveKind::String),
            _ => None,
        }
    }
}

/// Strict equality: numbers by numeric value across kinds, strings by
/// content, everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Interface(a), Value::Interface(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{:?}", n),
            Value::Int(i) => write!(f, "{}i", i),
            Value::Uint(u) => write!(f, "{}u", u),
            Value::Float(x) => write!(f, "{:?}f", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Object(obj) => write!(f, "{:?}", obj),
            Value::Class(class) => write!(f, "[class {}]", class.name()),
            Value::Interface(iface) => write!(f, "[interface {}]", iface.name()),
            Value::Function(func) => write!(f, "[function {}]", func.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Uint(u)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<ClassRef> for Value {
    fn from(class: ClassRef) -> Self {
        Value::Class(class)
    }
}

impl From<FunctionRef> for Value {
    fn from(func: FunctionRef) -> Self {
        Value::Function(func)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}
