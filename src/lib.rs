//! # minibind
//!
//! **minibind** is a small typed endpoint binding layer for JSON backends,
//! built on the `may` coroutine runtime and `may_minihttp`.
//!
//! An endpoint is declared once, at startup, with an explicit parameter
//! schema: names paired with [`schema::TypeDescriptor`] values (primitives,
//! optionals, ordered unions, homogeneous lists, string-keyed maps, named
//! records), an authentication flag, and an optional permission set. The
//! [`binder`] turns that declaration into a transport-facing endpoint that:
//!
//! 1. resolves the caller's session from the `token` cookie and enforces the
//!    permission gate,
//! 2. gathers arguments from the right wire shape (JSON body for POST,
//!    path/query strings for GET), validating or coercing each one against
//!    its descriptor, fail-fast,
//! 3. invokes the business handler with typed arguments,
//! 4. renders the outcome into the uniform envelope:
//!    `{"success": true, ...payload}` or `{"success": false, "error": "..."}`.
//!
//! ## Architecture
//!
//! - **[`schema`]** - type descriptors and named record types
//! - **[`validator`]** - structural validation of decoded JSON values
//! - **[`coerce`]** - raw-string coercion for query/path parameters
//! - **[`record`]** - composite record construction and serialization
//! - **[`binder`]** - endpoint schemas, gates, argument gathering, envelope
//! - **[`session`]** - session records and the injected session store
//! - **[`router`]** - method + path route table with `{name}` captures
//! - **[`server`]** - HTTP service built on `may_minihttp`
//! - **[`store`]** - in-memory storage collaborator for the bundled API
//! - **[`api`]** - the notification-board endpoints built on the binder
//!
//! Malformed endpoint declarations (reserved or duplicate parameter
//! names, non-coercible query parameters) are rejected while the
//! route table is being built, so a misdeclared handler stops the server
//! from starting instead of failing per-request.
//!
//! ## Quick start
//!
//! ```no_run
//! use minibind::api::App;
//! use minibind::server::{AppService, HttpServer};
//!
//! let mut app = App::new();
//! minibind::api::register_all(&mut app).expect("endpoint declarations are well-formed");
//! let service = AppService::new(app.into_router());
//! let handle = HttpServer(service).start("0.0.0.0:8080").unwrap();
//! handle.join().unwrap();
//! ```
//!
//! ## Runtime considerations
//!
//! minibind runs on the `may` coroutine runtime, not tokio. Each connection
//! is served by a coroutine; the binder itself holds no mutable shared state
//! beyond the immutable route table, so bound endpoints are safe to invoke
//! concurrently. Stack size is configurable via `MINIBIND_STACK_SIZE`.

pub mod api;
pub mod binder;
pub mod coerce;
pub mod error;
pub mod record;
pub mod router;
pub mod runtime_config;
pub mod schema;
pub mod server;
pub mod session;
pub mod store;
pub mod validator;

pub use binder::{BoundEndpoint, EndpointSchema, Gate, RequestContext};
pub use error::{Error, HandlerResult, SchemaError};
pub use schema::{RecordType, TypeDescriptor};
pub use session::{Session, SessionResolver, SessionStore};
