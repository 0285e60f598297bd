//! Type descriptors: the closed sum type every declared parameter is
//! checked against.
//!
//! Descriptors are plain immutable values built once at registration time.
//! Records are declared from already-built descriptors, so a record can
//! never (transitively) contain itself; validation and coercion recurse
//! structurally without cycle detection.

use std::fmt;
use std::sync::Arc;

/// Declared shape of a single endpoint parameter.
///
/// Union member order is semantically load-bearing on the coercion path:
/// [`crate::coerce::coerce`] tries members left to right and the first
/// success wins.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Bool,
    Int,
    Float,
    Str,
    Null,
    /// Sugar for `Union(inner, Null)`; an absent input is accepted and
    /// yields the null value.
    Optional(Box<TypeDescriptor>),
    /// Ordered alternatives; a value must match at least one member.
    Union(Vec<TypeDescriptor>),
    /// Sequence whose every element matches the element descriptor.
    List(Box<TypeDescriptor>),
    /// String-keyed mapping whose every value matches the value descriptor.
    Map(Box<TypeDescriptor>),
    /// Named composite with a fixed set of typed fields.
    Record(Arc<RecordType>),
}

impl TypeDescriptor {
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Union(members)
    }

    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(element))
    }

    pub fn map(value: TypeDescriptor) -> Self {
        TypeDescriptor::Map(Box::new(value))
    }

    pub fn record(record: Arc<RecordType>) -> Self {
        TypeDescriptor::Record(record)
    }

    /// Whether an absent input is acceptable for this descriptor.
    ///
    /// True for `Optional` and for any union carrying a null member,
    /// directly or through nesting. Plain `Null` does not accept absence:
    /// it only matches an explicitly empty value.
    pub fn accepts_absent(&self) -> bool {
        match self {
            TypeDescriptor::Optional(_) => true,
            TypeDescriptor::Union(members) => members
                .iter()
                .any(|m| matches!(m, TypeDescriptor::Null) || m.accepts_absent()),
            _ => false,
        }
    }

    /// Whether this descriptor can be a coercion target for a raw
    /// query/path string. Lists, maps and records are body-only; declaring
    /// one on a query-sourced endpoint is a registration-time error.
    pub fn is_coercible(&self) -> bool {
        match self {
            TypeDescriptor::Bool
            | TypeDescriptor::Int
            | TypeDescriptor::Float
            | TypeDescriptor::Str
            | TypeDescriptor::Null => true,
            TypeDescriptor::Optional(inner) => inner.is_coercible(),
            TypeDescriptor::Union(members) => members.iter().all(TypeDescriptor::is_coercible),
            TypeDescriptor::List(_) | TypeDescriptor::Map(_) | TypeDescriptor::Record(_) => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    /// Human-readable type name, used verbatim in parameter error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Bool => write!(f, "bool"),
            TypeDescriptor::Int => write!(f, "int"),
            TypeDescriptor::Float => write!(f, "float"),
            TypeDescriptor::Str => write!(f, "str"),
            TypeDescriptor::Null => write!(f, "null"),
            TypeDescriptor::Optional(inner) => write!(f, "{inner} | null"),
            TypeDescriptor::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            TypeDescriptor::List(element) => write!(f, "list[{element}]"),
            TypeDescriptor::Map(value) => write!(f, "map[{value}]"),
            TypeDescriptor::Record(record) => write!(f, "{}", record.name),
        }
    }
}

/// A named bundle of typed fields.
///
/// Field order is the declaration order; it governs construction error
/// reporting (first offending field wins) and serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    fields: Vec<(String, TypeDescriptor)>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        RecordType {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field; builder style, consumed at declaration time.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.push((name.into(), descriptor));
        self
    }

    pub fn fields(&self) -> &[(String, TypeDescriptor)] {
        &self.fields
    }

    /// Finish the declaration; records are always shared immutably.
    #[must_use]
    pub fn build(self) -> Arc<RecordType> {
        Arc::new(self)
    }
}
