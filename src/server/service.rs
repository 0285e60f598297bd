//! The HTTP service: parse the request, match a route, hand the request to
//! the bound endpoint, write the envelope.
//!
//! Everything a bound endpoint recovers from (gates, parameter errors,
//! business errors) is written as a 200 with the false envelope, the wire
//! contract of this layer. Only an unmatched route is a non-200. A handler
//! panic is not caught here: it unwinds into the connection coroutine and
//! surfaces as a transport-level fault.

use std::io;
use std::sync::Arc;

use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use tracing::info;

use super::request::{parse_request, ParsedRequest};
use super::response::{write_json, write_json_error};
use crate::binder::RequestContext;
use crate::router::Router;

/// Shares the immutable route table across connection coroutines.
#[derive(Clone)]
pub struct AppService {
    router: Arc<Router>,
}

impl AppService {
    pub fn new(router: Arc<Router>) -> Self {
        AppService { router }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let ParsedRequest {
            method,
            path,
            headers,
            cookies,
            query_params,
            body,
        } = parse_request(req);

        let method: Method = match method.parse() {
            Ok(m) => m,
            Err(_) => {
                write_json_error(res, 400, json!({ "error": "Bad Request" }));
                return Ok(());
            }
        };

        let Some(route_match) = self.router.route(&method, &path) else {
            write_json_error(
                res,
                404,
                json!({ "error": "Not Found", "method": method.as_str(), "path": path }),
            );
            return Ok(());
        };

        // Merge path captures over query parameters; path wins on a name
        // collision, an explicit contract of this layer.
        let mut raw_params = query_params;
        for (name, value) in route_match.path_params.iter() {
            raw_params.insert(name.to_string(), value.clone());
        }

        info!(method = %method, path = %path, route = %route_match.pattern, "request dispatched");

        let ctx = RequestContext {
            method,
            path,
            headers,
            cookies,
            raw_params,
            body,
        };
        let envelope = route_match.endpoint.call(&ctx);
        write_json(res, 200, &envelope);
        Ok(())
    }
}
