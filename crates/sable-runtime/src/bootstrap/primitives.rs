//! Boxed primitive classes
//!
//! Construction of these classes never allocates; see
//! [`Runtime::construct`](crate::runtime::Runtime::construct). Their
//! instance traits serve property access on raw primitives:
//! - `Number`, `int`, `uint`, `float`: `toString(radix)`, `toFixed(digits)`,
//!   `toPrecision(precision)`, `valueOf`; static `MAX_VALUE`/`MIN_VALUE`
//! - `Boolean`: `toString`, `valueOf`
//! - `String`: `length`, `charAt`, `charCodeAt`, `indexOf`, `toUpperCase`,
//!   `toLowerCase`, `toString`, `valueOf`

use super::{arg, define, public};
use crate::class::{ClassOptions, ClassRef};
use crate::coerce::number_to_string;
use crate::realm::Realm;
use crate::runtime::Runtime;
use crate::traits::{native, Member};
use crate::value::{PrimitiveKind, Value};

pub(super) struct Primitives {
    pub number: ClassRef,
    pub int: ClassRef,
    pub uint: ClassRef,
    pub float: ClassRef,
    pub boolean: ClassRef,
    pub string: ClassRef,
}

pub(super) fn install(realm: &Realm) -> Primitives {
    let number = define(
        realm,
        "Number",
        primitive_options(PrimitiveKind::Number),
        numeric_members(
            realm,
            vec![
                (f64::MAX.into(), "MAX_VALUE"),
                (f64::from_bits(1).into(), "MIN_VALUE"),
                (f64::NAN.into(), "NaN"),
                (f64::INFINITY.into(), "POSITIVE_INFINITY"),
                (f64::NEG_INFINITY.into(), "NEGATIVE_INFINITY"),
            ],
        ),
    );
    let int = define(
        realm,
        "int",
        primitive_options(PrimitiveKind::Int),
        numeric_members(
            realm,
            vec![(i32::MAX.into(), "MAX_VALUE"), (i32::MIN.into(), "MIN_VALUE")],
        ),
    );
    let uint = define(
        realm,
        "uint",
        primitive_options(PrimitiveKind::Uint),
        numeric_members(
            realm,
            vec![(u32::MAX.into(), "MAX_VALUE"), (u32::MIN.into(), "MIN_VALUE")],
        ),
    );
    let float = define(
        realm,
        "float",
        primitive_options(PrimitiveKind::Float),
        numeric_members(
            realm,
            vec![(f32::MAX.into(), "MAX_VALUE"), (f32::from_bits(1).into(), "MIN_VALUE")],
        ),
    );

    let boolean = define(
        realm,
        "Boolean",
        primitive_options(PrimitiveKind::Boolean),
        vec![
            Member::method(
                public(realm, "toString"),
                native(|rt, this, _| Ok(rt.tostring_value(this))),
            ),
            Member::method(public(realm, "valueOf"), native(|_, this, _| Ok(this.clone()))),
        ],
    );

    let string = define(
        realm,
        "String",
        primitive_options(PrimitiveKind::String),
        vec![
            Member::getter(
                public(realm, "length"),
                None,
                native(|rt, this, _| {
                    let units = rt.tostring(this).encode_utf16().count();
                    Ok(Value::Int(units as i32))
                }),
            ),
            Member::method(
                public(realm, "charAt"),
                native(|rt, this, args| {
                    let units = utf16(rt, this);
                    let ch = char_index(rt, &units, args)
                        .map(|i| String::from_utf16_lossy(&units[i..=i]))
                        .unwrap_or_default();
                    Ok(Value::from(ch))
                }),
            ),
            Member::method(
                public(realm, "charCodeAt"),
                native(|rt, this, args| {
                    let units = utf16(rt, this);
                    Ok(match char_index(rt, &units, args) {
                        Some(i) => Value::Number(f64::from(units[i])),
                        None => Value::Number(f64::NAN),
                    })
                }),
            ),
            Member::method(
                public(realm, "indexOf"),
                native(|rt, this, args| {
                    let haystack = utf16(rt, this);
                    let needle: Vec<u16> = rt.tostring(&arg(args, 0)).encode_utf16().collect();
                    let from = match args.get(1) {
                        Some(v) => rt.to_number(v).max(0.0) as usize,
                        None => 0,
                    };
                    Ok(Value::Int(index_of(&haystack, &needle, from)))
                }),
            ),
            Member::method(
                public(realm, "toUpperCase"),
                native(|rt, this, _| Ok(Value::from(rt.tostring(this).to_uppercase()))),
            ),
            Member::method(
                public(realm, "toLowerCase"),
                native(|rt, this, _| Ok(Value::from(rt.tostring(this).to_lowercase()))),
            ),
            Member::method(
                public(realm, "toString"),
                native(|rt, this, _| Ok(rt.tostring_value(this))),
            ),
            Member::method(
                public(realm, "valueOf"),
                native(|rt, this, _| Ok(rt.tostring_value(this))),
            ),
        ],
    );

    Primitives {
        number,
        int,
        uint,
        float,
        boolean,
        string,
    }
}

fn primitive_options(kind: PrimitiveKind) -> ClassOptions {
    ClassOptions::new().final_(true).primitive(kind)
}

fn numeric_members(realm: &Realm, constants: Vec<(Value, &str)>) -> Vec<Member> {
    let mut members: Vec<Member> = constants
        .into_iter()
        .map(|(value, name)| Member::constant(public(realm, name), None, value).into_static())
        .collect();
    members.push(Member::method(
        public(realm, "toString"),
        native(|rt, this, args| {
            let radix = match args.first() {
                Some(v) if !v.is_undefined() => rt.to_number(v) as i32,
                _ => 10,
            };
            let text = if radix == 10 {
                rt.tostring(this)
            } else {
                to_radix_string(rt.to_number(this), radix)
            };
            Ok(Value::from(text))
        }),
    ));
    members.push(Member::method(
        public(realm, "toFixed"),
        native(|rt, this, args| {
            let digits = rt.to_number(&arg(args, 0));
            let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 20.0) as usize };
            Ok(Value::from(to_fixed(rt.to_number(this), digits)))
        }),
    ));
    members.push(Member::method(
        public(realm, "toPrecision"),
        native(|rt, this, args| {
            let value = rt.to_number(this);
            let text = match args.first() {
                Some(v) if !v.is_undefined() => {
                    to_precision(value, rt.to_number(v).clamp(1.0, 21.0) as usize)
                }
                _ => number_to_string(value),
            };
            Ok(Value::from(text))
        }),
    ));
    members.push(Member::method(
        public(realm, "valueOf"),
        native(|_, this, _| Ok(this.clone())),
    ));
    members
}

// ============================================================================
// Number formatting
// ============================================================================

fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() || value.abs() >= 1e21 {
        return number_to_string(value);
    }
    format!("{:.prec$}", value, prec = digits)
}

fn to_precision(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return number_to_string(value);
    }
    if value == 0.0 {
        return format!("{:.prec$}", 0.0, prec = precision - 1);
    }

    let magnitude = value.abs().log10().floor() as i32;
    if precision as i32 <= magnitude {
        // Fewer digits than the integer part: exponent form
        let formatted = format!("{:.prec$e}", value, prec = precision - 1);
        match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        }
    } else {
        let decimal_places = (precision as i32 - magnitude - 1).max(0) as usize;
        format!("{:.prec$}", value, prec = decimal_places)
    }
}

/// Integer part of `value` in `radix` (2 to 36); other radices and
/// non-finite values use the decimal form
fn to_radix_string(value: f64, radix: i32) -> String {
    if !(2..=36).contains(&radix) || !value.is_finite() {
        return number_to_string(value);
    }
    let int_val = value.trunc() as i64;
    if int_val == 0 {
        return "0".to_string();
    }

    let negative = int_val < 0;
    let mut n = int_val.unsigned_abs();
    let mut digits = Vec::new();
    let r = radix as u64;
    while n > 0 {
        let d = (n % r) as u8;
        digits.push(if d < 10 { b'0' + d } else { b'a' + d - 10 });
        n /= r;
    }
    digits.reverse();
    let s = String::from_utf8(digits).unwrap_or_default();
    if negative {
        format!("-{}", s)
    } else {
        s
    }
}

// ============================================================================
// String helpers (indices count UTF-16 code units)
// ============================================================================

fn utf16(rt: &Runtime, this: &Value) -> Vec<u16> {
    rt.tostring(this).encode_utf16().collect()
}

fn char_index(rt: &Runtime, units: &[u16], args: &[Value]) -> Option<usize> {
    let index = match args.first() {
        Some(v) => rt.to_number(v),
        None => 0.0,
    };
    let index = if index.is_nan() { 0.0 } else { index.trunc() };
    (index >= 0.0 && (index as usize) < units.len()).then_some(index as usize)
}

fn index_of(haystack: &[u16], needle: &[u16], from: usize) -> i32 {
    let from = from.min(haystack.len());
    if needle.is_empty() {
        return from as i32;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| (pos + from) as i32)
        .unwrap_or(-1)
}
