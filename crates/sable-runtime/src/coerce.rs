//! Type tests, coercion and primitive conversions
//!
//! Numeric kinds are mutually exclusive for [`Runtime::is_type`]: an `int`
//! value is not a `Number`. [`Runtime::coerce`] still accepts any numeric
//! source for a numeric target and converts it, so coercion never depends
//! on which numeric kind a value happens to carry.

use crate::class::Type;
use crate::names::Qualifier;
use crate::runtime::Runtime;
use crate::value::{PrimitiveKind, Value};
use std::fmt::{Display, LowerExp};
use std::rc::Rc;

/// Default value of a declared type: `undefined` for the universal type,
/// `NaN` for floating kinds, `0` for integer kinds, `false` for Boolean,
/// `null` for everything else.
pub fn default_value(ty: Option<&Type>) -> Value {
    let Some(ty) = ty else {
        return Value::Undefined;
    };
    match ty {
        Type::Class(class) => match class.primitive() {
            Some(PrimitiveKind::Number) => Value::Number(f64::NAN),
            Some(PrimitiveKind::Float) => Value::Float(f32::NAN),
            Some(PrimitiveKind::Int) => Value::Int(0),
            Some(PrimitiveKind::Uint) => Value::Uint(0),
            Some(PrimitiveKind::Boolean) => Value::Boolean(false),
            Some(PrimitiveKind::String) | None => Value::Null,
        },
        Type::Interface(_) => Value::Null,
    }
}

/// ECMAScript `ToInt32`: truncate, wrap modulo 2^32, reinterpret as signed
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ECMAScript `ToUint32`: truncate, wrap modulo 2^32
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
    wrapped as u32
}

/// Truthiness
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::Int(i) => *i != 0,
        Value::Uint(u) => *u != 0,
        Value::Float(f) => *f != 0.0 && !f.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::Object(_) | Value::Class(_) | Value::Interface(_) | Value::Function(_) => true,
    }
}

/// Parse a numeric string the way `Number(s)` does: surrounding
/// whitespace is ignored, the empty string is 0, `0x` prefixes are hex and
/// anything unparseable is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    // Rust also accepts "inf" and "nan"; those are not numbers here
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Render a double: integral values without a fraction, exponent form
/// outside `[1e-6, 1e21)`
pub fn number_to_string(n: f64) -> String {
    format_number(n, n)
}

/// Render a single-precision value using its shortest single-precision
/// representation
pub fn float_to_string(n: f32) -> String {
    format_number(n, n as f64)
}

fn format_number<T: Display + LowerExp>(n: T, wide: f64) -> String {
    if wide.is_nan() {
        return "NaN".to_string();
    }
    if wide == 0.0 {
        return "0".to_string();
    }
    if wide.is_infinite() {
        return if wide > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = wide.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }
    let exp = format!("{:e}", n);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
        _ => exp,
    }
}

fn convert_numeric(kind: PrimitiveKind, value: &Value) -> Value {
    let wide = value.as_f64().unwrap_or(f64::NAN);
    match kind {
        PrimitiveKind::Number => Value::Number(wide),
        PrimitiveKind::Float => match value {
            Value::Float(f) => Value::Float(*f),
            _ => Value::Float(wide as f32),
        },
        PrimitiveKind::Int => match value {
            Value::Int(i) => Value::Int(*i),
            Value::Uint(u) => Value::Int(*u as i32),
            _ => Value::Int(to_int32(wide)),
        },
        PrimitiveKind::Uint => match value {
            Value::Uint(u) => Value::Uint(*u),
            Value::Int(i) => Value::Uint(*i as u32),
            _ => Value::Uint(to_uint32(wide)),
        },
        PrimitiveKind::Boolean | PrimitiveKind::String => value.clone(),
    }
}

impl Runtime {
    /// Whether `value` is a member of `ty`. `None` is the universal type;
    /// `null` and `undefined` belong to no other type.
    pub fn is_type(&self, value: &Value, ty: Option<&Type>) -> bool {
        let Some(ty) = ty else {
            return true;
        };
        let Some(class) = self.class_of(value) else {
            return false;
        };
        match ty {
            Type::Class(target) => class.is_subclass_of(target),
            Type::Interface(target) => class.implements(target),
        }
    }

    /// Coerce `value` to `ty`. Values already of the type pass through
    /// (numeric kinds are converted to the target's representation);
    /// anything else becomes the type's default.
    pub fn coerce(&self, value: &Value, ty: Option<&Type>) -> Value {
        let Some(target) = ty else {
            return value.clone();
        };
        if let Type::Class(class) = target {
            match class.primitive() {
                Some(kind) if kind.is_numeric() => {
                    return if value.is_numeric() {
                        convert_numeric(kind, value)
                    } else {
                        default_value(ty)
                    };
                }
                Some(PrimitiveKind::Boolean) => {
                    return match value {
                        Value::Boolean(_) => value.clone(),
                        _ => Value::Boolean(false),
                    };
                }
                Some(PrimitiveKind::String) => {
                    return match value {
                        Value::String(_) => value.clone(),
                        _ => Value::Null,
                    };
                }
                _ => {}
            }
            if value.is_undefined() && class.base().is_none() {
                return Value::Undefined;
            }
        }
        if self.is_type(value, ty) {
            value.clone()
        } else {
            default_value(ty)
        }
    }

    /// Numeric conversion. Instances convert through their string form.
    pub fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::String(s) => string_to_number(s),
            v if v.is_numeric() => v.as_f64().unwrap_or(f64::NAN),
            other => string_to_number(&self.tostring(other)),
        }
    }

    /// String conversion. Never fails: a failing `toString` on an instance
    /// is logged and replaced with `[object ClassName]`.
    pub fn tostring(&self, value: &Value) -> String {
        match value {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::Int(i) => i.to_string(),
            Value::Uint(u) => u.to_string(),
            Value::Float(f) => float_to_string(*f),
            Value::String(s) => s.to_string(),
            Value::Class(class) => format!("[class {}]", class.local_name()),
            Value::Interface(iface) => format!("[interface {}]", iface.qname().name),
            Value::Function(_) => "function Function() {}".to_string(),
            Value::Object(obj) => {
                let class = obj.class();
                let result = self.call_property(value, &Qualifier::Unqualified, "toString", &[]);
                match result {
                    Ok(Value::String(s)) => s.to_string(),
                    Ok(Value::Object(_)) | Ok(Value::Undefined) | Ok(Value::Null) => {
                        format!("[object {}]", class.local_name())
                    }
                    Ok(other) => self.tostring(&other),
                    Err(error) => {
                        tracing::warn!(%error, class = class.name(), "toString failed");
                        format!("[object {}]", class.local_name())
                    }
                }
            }
        }
    }

    /// [`Runtime::tostring`] as a shared string value
    pub fn tostring_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(Rc::clone(s)),
            other => Value::from(self.tostring(other)),
        }
    }
}
