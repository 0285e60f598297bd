//! Route table: method + path pattern → bound endpoint.
//!
//! Patterns are literal segments with `{name}` captures, compiled once at
//! registration into anchored regexes. The table is built at startup and
//! immutable afterwards; matching borrows from it, so the router is shared
//! across request coroutines behind an `Arc`.

use std::sync::Arc;

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use tracing::info;

use crate::binder::BoundEndpoint;
use crate::error::SchemaError;

/// Most routes carry at most a couple of path captures; keep them on the
/// stack.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Extracted path captures: name from the static route table, value from
/// the request path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

struct Route {
    method: Method,
    pattern: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    endpoint: BoundEndpoint,
}

/// Successful match: the bound endpoint plus its path captures.
pub struct RouteMatch<'r> {
    pub endpoint: &'r BoundEndpoint,
    pub pattern: &'r str,
    pub path_params: ParamVec,
}

/// The startup-built route table.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one endpoint. Duplicate method+pattern pairs and malformed
    /// patterns are startup errors.
    pub fn add(
        &mut self,
        method: Method,
        pattern: &str,
        endpoint: BoundEndpoint,
    ) -> Result<(), SchemaError> {
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.pattern == pattern)
        {
            return Err(SchemaError::DuplicateRoute {
                method: method.to_string(),
                path: pattern.to_string(),
            });
        }
        let (regex, param_names) = compile_pattern(pattern)?;
        info!(method = %method, path = %pattern, params = endpoint.schema().params().len(), "route registered");
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            regex,
            param_names,
            endpoint,
        });
        Ok(())
    }

    /// Match a request; first registered route wins.
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(caps) = route.regex.captures(path) {
                let mut path_params = ParamVec::new();
                for (i, name) in route.param_names.iter().enumerate() {
                    if let Some(m) = caps.get(i + 1) {
                        path_params.push((Arc::clone(name), m.as_str().to_string()));
                    }
                }
                return Some(RouteMatch {
                    endpoint: &route.endpoint,
                    pattern: &route.pattern,
                    path_params,
                });
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Compile `/api/user/{username}` into `^/api/user/([^/]+)$` plus the
/// ordered capture names.
fn compile_pattern(pattern: &str) -> Result<(Regex, Vec<Arc<str>>), SchemaError> {
    if !pattern.starts_with('/') {
        return Err(SchemaError::BadPathPattern {
            path: pattern.to_string(),
            detail: "pattern must start with '/'".to_string(),
        });
    }
    let mut source = String::from("^");
    let mut param_names = Vec::new();
    for segment in pattern.split('/').skip(1) {
        source.push('/');
        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if name.is_empty() {
                return Err(SchemaError::BadPathPattern {
                    path: pattern.to_string(),
                    detail: "empty capture name".to_string(),
                });
            }
            param_names.push(Arc::from(name));
            source.push_str("([^/]+)");
        } else {
            source.push_str(&regex::escape(segment));
        }
    }
    source.push('$');
    let regex = Regex::new(&source).map_err(|e| SchemaError::BadPathPattern {
        path: pattern.to_string(),
        detail: e.to_string(),
    })?;
    Ok((regex, param_names))
}
