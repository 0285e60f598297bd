//! The endpoint binder: turns a declared parameter schema plus a business
//! handler into a transport-facing endpoint.
//!
//! Per request the bound endpoint runs a linear pipeline with no
//! backtracking: auth gate, permission gate, parameter gathering
//! (validation for body-sourced calls, coercion for query-sourced calls,
//! fail-fast on the first offending parameter), handler invocation, and
//! envelope rendering. Every recovered failure is a normal response carrying
//! the false envelope; only the registration-time checks in
//! [`EndpointSchema::new`] are fatal, and they fire before the server
//! starts.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::coerce::{coerce, CoerceError};
use crate::error::{Error, HandlerResult, SchemaError};
use crate::schema::TypeDescriptor;
use crate::session::{Session, SessionResolver};
use crate::validator::validate;

/// Cookie carrying the opaque session credential.
pub const TOKEN_COOKIE: &str = "token";

/// Envelope message for a missing or unknown session on a gated endpoint.
pub const LOGIN_REQUIRED: &str = "This API endpoint requires you to be logged in.";

/// Envelope message for a session lacking a required permission.
pub const UNAUTHORIZED: &str = "Unauthorized to access this endpoint.";

/// Parameter names bound by the framework itself; declaring them is a
/// registration-time error.
const RESERVED_NAMES: [&str; 2] = ["request", "session"];

/// Where a bound endpoint gathers its declared parameters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// One JSON value parsed from the request body (POST).
    Body,
    /// Path captures merged with query-string parameters (GET).
    Query,
}

/// Authentication requirement declared alongside an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// No session needed.
    Public,
    /// A valid session is required.
    LoggedIn,
    /// A valid session whose permission value is one of these.
    Permitted(Vec<i64>),
}

/// The immutable shape of one endpoint, derived once at registration time
/// and owned by its route table entry.
#[derive(Debug, Clone)]
pub struct EndpointSchema {
    params: Vec<(String, TypeDescriptor)>,
    source: ParamSource,
    requires_auth: bool,
    permissions: Vec<i64>,
}

impl EndpointSchema {
    /// Build and contract-check an endpoint schema. Violations are fatal
    /// startup errors, never per-request ones.
    pub fn new(
        path: &str,
        source: ParamSource,
        gate: &Gate,
        params: Vec<(String, TypeDescriptor)>,
    ) -> Result<Self, SchemaError> {
        let (requires_auth, permissions) = match gate {
            Gate::Public => (false, Vec::new()),
            Gate::LoggedIn => (true, Vec::new()),
            Gate::Permitted(perms) => {
                if perms.is_empty() {
                    // an empty permitted set would gate out everyone;
                    // treat it as the plain logged-in gate
                    (true, Vec::new())
                } else {
                    (true, perms.clone())
                }
            }
        };
        for (i, (name, descriptor)) in params.iter().enumerate() {
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(SchemaError::ReservedParameter {
                    path: path.to_string(),
                    name: name.clone(),
                });
            }
            if params[..i].iter().any(|(n, _)| n == name) {
                return Err(SchemaError::DuplicateParameter {
                    path: path.to_string(),
                    name: name.clone(),
                });
            }
            if source == ParamSource::Query && !descriptor.is_coercible() {
                return Err(SchemaError::NotCoercible {
                    path: path.to_string(),
                    name: name.clone(),
                    descriptor: descriptor.to_string(),
                });
            }
        }
        Ok(EndpointSchema {
            params,
            source,
            requires_auth,
            permissions,
        })
    }

    pub fn params(&self) -> &[(String, TypeDescriptor)] {
        &self.params
    }

    pub fn source(&self) -> ParamSource {
        self.source
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn permissions(&self) -> &[i64] {
        &self.permissions
    }
}

/// Transport-side view of one request, as the binder consumes it.
///
/// `raw_params` holds the query-string parameters merged with path
/// captures; path captures win over same-named query values, an explicit
/// contract of this layer.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub raw_params: HashMap<String, String>,
    pub body: Option<Value>,
}

impl RequestContext {
    /// Minimal context for driving a bound endpoint directly (tests,
    /// non-HTTP transports).
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        RequestContext {
            method,
            path: path.into(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            raw_params: HashMap::new(),
            body: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.cookies.get(TOKEN_COOKIE).map(String::as_str)
    }
}

/// Gathered, type-correct arguments handed to a business handler.
///
/// Every declared parameter is present (absent optionals as `null`), so
/// handlers typically deserialize the whole set into a parameter struct
/// with [`Args::parse`].
#[derive(Debug, Clone)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn get(&self, name: &str) -> &Value {
        self.0.get(name).unwrap_or(&Value::Null)
    }

    /// Deserialize the argument mapping into a typed parameter struct.
    ///
    /// The binder has already validated every field against its declared
    /// descriptor, so a failure here means the endpoint's parameter struct
    /// disagrees with its declared schema.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| Error::new(format!("Malformed parameters: {e}.")))
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// A business handler: request context, resolved session (when the
/// endpoint is gated), and the typed argument set.
pub type HandlerFn =
    Box<dyn Fn(&RequestContext, Option<&Session>, Args) -> HandlerResult + Send + Sync>;

/// One declared endpoint bound to its schema, session resolver, and
/// handler. Immutable, invoked concurrently, once per request.
pub struct BoundEndpoint {
    schema: EndpointSchema,
    sessions: Arc<dyn SessionResolver>,
    handler: HandlerFn,
}

impl BoundEndpoint {
    pub fn new(
        schema: EndpointSchema,
        sessions: Arc<dyn SessionResolver>,
        handler: HandlerFn,
    ) -> Self {
        BoundEndpoint {
            schema,
            sessions,
            handler,
        }
    }

    pub fn schema(&self) -> &EndpointSchema {
        &self.schema
    }

    /// Run the per-request pipeline and render the response envelope.
    ///
    /// Business errors and gate/parameter failures come back as the false
    /// envelope. Anything else a handler does wrong (a panic) is not caught
    /// here and unwinds to the transport boundary.
    pub fn call(&self, ctx: &RequestContext) -> Value {
        let session = if self.schema.requires_auth {
            let resolved = ctx.token().and_then(|t| self.sessions.resolve(t));
            match resolved {
                Some(s) => Some(s),
                None => {
                    debug!(path = %ctx.path, "rejected: no valid session");
                    return failure_envelope(LOGIN_REQUIRED);
                }
            }
        } else {
            None
        };
        if let Some(s) = &session {
            if !self.schema.permissions.is_empty()
                && !self.schema.permissions.contains(&s.permission)
            {
                debug!(path = %ctx.path, username = %s.username, "rejected: insufficient permission");
                return failure_envelope(UNAUTHORIZED);
            }
        }
        let args = match self.gather(ctx) {
            Ok(args) => args,
            Err(message) => {
                debug!(path = %ctx.path, %message, "rejected: parameter error");
                return failure_envelope(&message);
            }
        };
        match (self.handler)(ctx, session.as_ref(), args) {
            Ok(payload) => success_envelope(payload),
            Err(err) => {
                warn!(path = %ctx.path, error = %err.message(), "handler returned error");
                failure_envelope(err.message())
            }
        }
    }

    /// Gather and check every declared parameter from the source this
    /// endpoint was registered with. Fail-fast: the first offending
    /// parameter aborts with a message naming it and its expected type.
    fn gather(&self, ctx: &RequestContext) -> Result<Args, String> {
        let mut args = Map::with_capacity(self.schema.params.len());
        match self.schema.source {
            ParamSource::Body => {
                // An absent or non-object body carries no parameters; the
                // first required one is then reported missing.
                let empty = Map::new();
                let data = ctx
                    .body
                    .as_ref()
                    .and_then(Value::as_object)
                    .unwrap_or(&empty);
                for (name, descriptor) in &self.schema.params {
                    let value = match data.get(name) {
                        Some(v) => {
                            if !validate(v, descriptor) {
                                return Err(format!(
                                    "Parameter {name} must be of type {descriptor}."
                                ));
                            }
                            v.clone()
                        }
                        None => {
                            if !descriptor.accepts_absent() {
                                return Err(format!(
                                    "Missing parameter {name} of type {descriptor}."
                                ));
                            }
                            Value::Null
                        }
                    };
                    args.insert(name.clone(), value);
                }
            }
            ParamSource::Query => {
                for (name, descriptor) in &self.schema.params {
                    let raw = ctx.raw_params.get(name).map(String::as_str);
                    let value = coerce(raw, descriptor).map_err(|e| match e {
                        CoerceError::Missing => {
                            format!("Missing query parameter {name} of type {descriptor}.")
                        }
                        CoerceError::Mismatch => {
                            format!("Query parameter {name} must be of type {descriptor}.")
                        }
                    })?;
                    args.insert(name.clone(), value);
                }
            }
        }
        Ok(Args(args))
    }
}

/// `{"success": true, ...payload}`: payload fields merged at the top
/// level. Handlers must not return a `success` field of their own.
pub fn success_envelope(payload: Map<String, Value>) -> Value {
    let mut out = Map::with_capacity(payload.len() + 1);
    out.insert("success".to_string(), Value::Bool(true));
    out.extend(payload);
    Value::Object(out)
}

/// `{"success": false, "error": "<message>"}`: never any other top-level
/// key in the false case.
pub fn failure_envelope(message: &str) -> Value {
    let mut out = Map::with_capacity(2);
    out.insert("success".to_string(), Value::Bool(false));
    out.insert("error".to_string(), Value::String(message.to_string()));
    Value::Object(out)
}
