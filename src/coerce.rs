//! Raw-string coercion for query and path parameters.
//!
//! GET endpoints receive their arguments as strings; each declared
//! parameter is converted to a typed value against its descriptor. Union
//! members are tried in declaration order and the first success wins, which
//! makes declaration order semantically load-bearing for overlapping
//! alternatives (`int | str` turns `"42"` into a number, `str | int` keeps
//! the string).

use serde_json::{Number, Value};

use crate::schema::TypeDescriptor;

/// Why a raw parameter failed to coerce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceError {
    /// The parameter was absent and the descriptor does not accept absence.
    Missing,
    /// The parameter was present but not convertible to the declared type.
    Mismatch,
}

/// Coerce a raw query/path value (or its absence) into a typed value.
///
/// Absence is accepted only by descriptors with a null member (see
/// [`TypeDescriptor::accepts_absent`]) and yields `Value::Null`.
///
/// Booleans accept exactly the literals `true` and `false`. The system this
/// replaces treated any non-empty string as true; that was a defect, not a
/// contract, and is fixed here.
pub fn coerce(raw: Option<&str>, descriptor: &TypeDescriptor) -> Result<Value, CoerceError> {
    match raw {
        None => {
            if descriptor.accepts_absent() {
                Ok(Value::Null)
            } else {
                Err(CoerceError::Missing)
            }
        }
        Some(s) => coerce_str(s, descriptor),
    }
}

fn coerce_str(s: &str, descriptor: &TypeDescriptor) -> Result<Value, CoerceError> {
    match descriptor {
        TypeDescriptor::Bool => match s {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(CoerceError::Mismatch),
        },
        TypeDescriptor::Int => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| CoerceError::Mismatch),
        TypeDescriptor::Float => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or(CoerceError::Mismatch),
        TypeDescriptor::Str => Ok(Value::String(s.to_string())),
        TypeDescriptor::Null => {
            if s.is_empty() {
                Ok(Value::Null)
            } else {
                Err(CoerceError::Mismatch)
            }
        }
        // Optional is union-with-null: try the inner type first, then the
        // null alternative (empty string only).
        TypeDescriptor::Optional(inner) => coerce_str(s, inner)
            .or_else(|_| coerce_str(s, &TypeDescriptor::Null)),
        TypeDescriptor::Union(members) => {
            for member in members {
                if let Ok(value) = coerce_str(s, member) {
                    return Ok(value);
                }
            }
            Err(CoerceError::Mismatch)
        }
        // Body-only shapes; registration rejects these on the query path,
        // so this arm is unreachable through a bound endpoint.
        TypeDescriptor::List(_) | TypeDescriptor::Map(_) | TypeDescriptor::Record(_) => {
            Err(CoerceError::Mismatch)
        }
    }
}
