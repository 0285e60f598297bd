//! HTTP transport built on `may_minihttp`.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request, ParsedRequest};
pub use response::{write_json, write_json_error};
pub use service::AppService;
