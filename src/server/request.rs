//! Parsing of raw `may_minihttp` requests into the pieces the binder
//! consumes: method, path, lowercased headers, cookies, query parameters,
//! and an optional JSON body.

use std::collections::HashMap;
use std::io::Read;

use may_minihttp::Request;
use tracing::debug;

/// Parsed HTTP request data used by [`crate::server::AppService`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// HTTP headers (lowercase keys).
    pub headers: HashMap<String, String>,
    /// Cookies from the Cookie header.
    pub cookies: HashMap<String, String>,
    /// URL-decoded query string parameters.
    pub query_params: HashMap<String, String>,
    /// Request body parsed as JSON, when present and parseable.
    pub body: Option<serde_json::Value>,
}

/// Split the Cookie header into name/value pairs.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// URL-decode the query string of a request path. Duplicate names keep the
/// last occurrence.
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    match path.find('?') {
        Some(pos) => url::form_urlencoded::parse(path[pos + 1..].as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        None => HashMap::new(),
    }
}

/// Extract everything the service needs from a raw HTTP request.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();
    let cookies = parse_cookies(&headers);
    let query_params = parse_query_params(&raw_path);

    let body = {
        let mut body_str = String::new();
        match req.body().read_to_string(&mut body_str) {
            Ok(n) if n > 0 => serde_json::from_str(&body_str).ok(),
            _ => None,
        }
    };

    debug!(
        method = %method,
        path = %path,
        query_count = query_params.len(),
        has_body = body.is_some(),
        "request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query_params,
        body,
    }
}
