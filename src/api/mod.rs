//! The notification-board API: endpoint registration surface and the
//! business handlers built on the binder.
//!
//! [`App`] owns the collaborators (session store, storage) and exposes the
//! GET/POST builders every endpoint module registers itself through. All
//! declarations happen before the server starts; a
//! [`SchemaError`](crate::error::SchemaError) here stops startup.

mod post;
mod reaction;
mod user;

use std::sync::Arc;

use http::Method;
use serde_json::{Map, Value};

use crate::binder::{
    Args, BoundEndpoint, EndpointSchema, Gate, ParamSource, RequestContext,
};
use crate::error::{HandlerResult, SchemaError};
use crate::router::Router;
use crate::schema::TypeDescriptor;
use crate::session::{Session, SessionResolver, SessionStore};
use crate::store::MemoryStore;

/// Application state: route table under construction plus the injected
/// collaborators shared by every handler.
pub struct App {
    router: Router,
    pub sessions: Arc<SessionStore>,
    pub store: Arc<MemoryStore>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        App {
            router: Router::new(),
            sessions: Arc::new(SessionStore::new()),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Declare a GET endpoint: parameters come from path captures and the
    /// query string, coerced against their descriptors.
    pub fn get<F>(
        &mut self,
        path: &str,
        gate: Gate,
        params: Vec<(&str, TypeDescriptor)>,
        handler: F,
    ) -> Result<(), SchemaError>
    where
        F: Fn(&RequestContext, Option<&Session>, Args) -> HandlerResult + Send + Sync + 'static,
    {
        self.bind(Method::GET, path, ParamSource::Query, gate, params, handler)
    }

    /// Declare a POST endpoint: parameters come from the JSON body,
    /// validated against their descriptors.
    pub fn post<F>(
        &mut self,
        path: &str,
        gate: Gate,
        params: Vec<(&str, TypeDescriptor)>,
        handler: F,
    ) -> Result<(), SchemaError>
    where
        F: Fn(&RequestContext, Option<&Session>, Args) -> HandlerResult + Send + Sync + 'static,
    {
        self.bind(Method::POST, path, ParamSource::Body, gate, params, handler)
    }

    fn bind<F>(
        &mut self,
        method: Method,
        path: &str,
        source: ParamSource,
        gate: Gate,
        params: Vec<(&str, TypeDescriptor)>,
        handler: F,
    ) -> Result<(), SchemaError>
    where
        F: Fn(&RequestContext, Option<&Session>, Args) -> HandlerResult + Send + Sync + 'static,
    {
        let params = params
            .into_iter()
            .map(|(name, descriptor)| (name.to_string(), descriptor))
            .collect();
        let schema = EndpointSchema::new(path, source, &gate, params)?;
        let endpoint = BoundEndpoint::new(
            schema,
            Arc::clone(&self.sessions) as Arc<dyn SessionResolver>,
            Box::new(handler),
        );
        self.router.add(method, path, endpoint)
    }

    /// Finish registration; the route table is immutable from here on.
    pub fn into_router(self) -> Arc<Router> {
        Arc::new(self.router)
    }
}

/// Register every endpoint of the notification board.
pub fn register_all(app: &mut App) -> Result<(), SchemaError> {
    user::register(app)?;
    post::register(app)?;
    reaction::register(app)
}

/// Build a handler payload from a `json!` object literal.
pub(crate) fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
