//! Error taxonomy for the binding layer.
//!
//! Two kinds cross module boundaries: [`Error`], the business-level failure
//! a handler returns and the binder renders into the false envelope, and
//! [`SchemaError`], a registration-time contract violation that must stop
//! the server from starting. Coercion failures stay internal to
//! [`crate::coerce`]; anything else (storage faults, panics) is deliberately
//! not caught by the binder and propagates to the transport boundary.

use std::fmt;

use serde_json::{Map, Value};

/// A business-level failure with a user-facing message.
///
/// Returned by handlers instead of thrown; the binder renders it verbatim
/// as `{"success": false, "error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    message: String,
}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Error {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

/// What a business handler produces: a payload mapping merged into the
/// success envelope, or a business error.
pub type HandlerResult = Result<Map<String, Value>, Error>;

/// A malformed endpoint declaration, detected while the route table is
/// being built. Never reachable per-request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// `request` and `session` are reserved slots, not declarable params.
    ReservedParameter { path: String, name: String },
    /// The same parameter name declared twice.
    DuplicateParameter { path: String, name: String },
    /// A query-sourced endpoint declared a body-only descriptor.
    NotCoercible {
        path: String,
        name: String,
        descriptor: String,
    },
    /// Two endpoints registered for the same method and path pattern.
    DuplicateRoute { method: String, path: String },
    /// A path pattern that does not compile to a route matcher.
    BadPathPattern { path: String, detail: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::ReservedParameter { path, name } => {
                write!(f, "{path}: parameter name {name:?} is reserved")
            }
            SchemaError::DuplicateParameter { path, name } => {
                write!(f, "{path}: parameter {name:?} declared twice")
            }
            SchemaError::NotCoercible {
                path,
                name,
                descriptor,
            } => write!(
                f,
                "{path}: query parameter {name:?} has non-coercible type {descriptor}"
            ),
            SchemaError::DuplicateRoute { method, path } => {
                write!(f, "duplicate route {method} {path}")
            }
            SchemaError::BadPathPattern { path, detail } => {
                write!(f, "bad path pattern {path:?}: {detail}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
