//! Composite record construction and serialization.
//!
//! A [`RecordType`] declares a named bundle of typed fields; construction
//! checks an incoming mapping field by field in declaration order and stops
//! at the first missing or mistyped field. Nested record fields are
//! constructed recursively, so serialization back to a mapping is total and
//! recursive as well.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::schema::{RecordType, TypeDescriptor};
use crate::validator::validate;

/// Why a record failed to construct; names the first offending field only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Missing { record: String, field: String },
    Mistyped { record: String, field: String },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Missing { record, field } => {
                write!(f, "{record} is missing field {field}")
            }
            FieldError::Mistyped { record, field } => {
                write!(f, "{record} field {field} has an incorrect type")
            }
        }
    }
}

impl std::error::Error for FieldError {}

/// A constructed, type-correct instance of a [`RecordType`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    ty: Arc<RecordType>,
    fields: Vec<(String, FieldValue)>,
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Plain(Value),
    Nested(RecordValue),
}

/// Construct a record instance from a raw mapping.
///
/// Fields are checked in declaration order, fail-fast: the error names the
/// first missing or mistyped field, never an aggregate. Extra keys in the
/// mapping are ignored.
pub fn construct(
    ty: &Arc<RecordType>,
    data: &Map<String, Value>,
) -> Result<RecordValue, FieldError> {
    let mut fields = Vec::with_capacity(ty.fields().len());
    for (name, descriptor) in ty.fields() {
        let value = data.get(name).ok_or_else(|| FieldError::Missing {
            record: ty.name.clone(),
            field: name.clone(),
        })?;
        if !validate(value, descriptor) {
            return Err(FieldError::Mistyped {
                record: ty.name.clone(),
                field: name.clone(),
            });
        }
        let field = match (descriptor, value) {
            (TypeDescriptor::Record(nested), Value::Object(entries)) => {
                FieldValue::Nested(construct(nested, entries)?)
            }
            _ => FieldValue::Plain(value.clone()),
        };
        fields.push((name.clone(), field));
    }
    Ok(RecordValue {
        ty: Arc::clone(ty),
        fields,
    })
}

impl RecordValue {
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Field lookup by name; nested records come back as mappings.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| match v {
            FieldValue::Plain(value) => value.clone(),
            FieldValue::Nested(record) => record.to_value(),
        })
    }

    /// Serialize back to a plain mapping, recursively, in declaration
    /// order. Total: every constructed record serializes.
    pub fn to_value(&self) -> Value {
        let mut out = Map::with_capacity(self.fields.len());
        for (name, field) in &self.fields {
            let value = match field {
                FieldValue::Plain(value) => value.clone(),
                FieldValue::Nested(record) => record.to_value(),
            };
            out.insert(name.clone(), value);
        }
        Value::Object(out)
    }
}
