//! JSON response writing over `may_minihttp`.

use may_minihttp::Response;
use serde_json::Value;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Write a JSON body with the given status.
pub fn write_json(res: &mut Response, status: u16, body: &Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

/// Write a non-envelope transport error (unmatched route and the like).
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    write_json(res, status, &body);
}
