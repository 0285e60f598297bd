//! Structural validation of decoded JSON values against a
//! [`TypeDescriptor`].
//!
//! This is the body (POST) path: values arrive already JSON-decoded and are
//! either type-correct or not. No coercion happens here; the query/path
//! counterpart lives in [`crate::coerce`].

use serde_json::Value;

use crate::schema::TypeDescriptor;

/// Returns true iff `value` conforms to `descriptor`.
///
/// Kind matching is strict: a fractional number where an int is required
/// fails. A JSON number with an exact integer representation counts as an
/// int, and any number counts as a float, resolving the usual JSON
/// `1` / `1.0` ambiguity in the permissive direction for floats only.
pub fn validate(value: &Value, descriptor: &TypeDescriptor) -> bool {
    match descriptor {
        TypeDescriptor::Bool => value.is_boolean(),
        TypeDescriptor::Int => value.as_i64().is_some() || value.as_u64().is_some(),
        TypeDescriptor::Float => value.is_number(),
        TypeDescriptor::Str => value.is_string(),
        TypeDescriptor::Null => value.is_null(),
        TypeDescriptor::Optional(inner) => value.is_null() || validate(value, inner),
        TypeDescriptor::Union(members) => members.iter().any(|m| validate(value, m)),
        TypeDescriptor::List(element) => match value.as_array() {
            Some(items) => items.iter().all(|item| validate(item, element)),
            None => false,
        },
        TypeDescriptor::Map(value_ty) => match value.as_object() {
            Some(entries) => entries.values().all(|v| validate(v, value_ty)),
            None => false,
        },
        TypeDescriptor::Record(record) => match value.as_object() {
            Some(entries) => record.fields().iter().all(|(name, field_ty)| {
                entries.get(name).is_some_and(|v| validate(v, field_ty))
            }),
            None => false,
        },
    }
}
