use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Once;
use std::time::Duration;

use minibind::api::App;
use minibind::server::{AppService, HttpServer, ServerHandle};
use serde_json::Value;

static MAY_INIT: Once = Once::new();

pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x8000);
    });
}

/// Grab a free port by binding and immediately releasing it.
pub fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A running test server; keep it alive for the duration of the test.
pub struct Server {
    pub handle: ServerHandle,
    pub addr: SocketAddr,
}

/// Start a fully registered [`App`] on an ephemeral port and wait until
/// it accepts connections.
pub fn start_server(app: App) -> (ServerHandle, SocketAddr) {
    setup_may_runtime();
    let addr = free_addr();
    let service = AppService::new(app.into_router());
    let handle = HttpServer(service).start(addr).unwrap();
    handle.wait_ready().unwrap();
    (handle, addr)
}

/// Send one raw HTTP request and return the full response text.
pub fn send_request(addr: &SocketAddr, req: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(req.as_bytes()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();

    let mut buf = Vec::new();
    let mut header_end = None;
    for _ in 0..20 {
        let mut tmp = [0u8; 4096];
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&tmp[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    header_end = Some(pos + 4);
                    break;
                }
            }
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(e) => panic!("read error: {e:?}"),
        }
    }

    let header_end = header_end.unwrap_or(buf.len());
    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = headers
        .lines()
        .find_map(|l| l.split_once(':'))
        .filter(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok());

    if let Some(clen) = content_length {
        while buf.len().saturating_sub(header_end) < clen {
            let mut tmp = [0u8; 4096];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

/// Parse a raw HTTP response into status code and JSON body.
pub fn parse_response(raw: &str) -> (u16, Value) {
    let status = raw
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body = raw.split("\r\n\r\n").nth(1).unwrap_or("");
    let json = serde_json::from_str(body.trim_end_matches('\0')).unwrap_or(Value::Null);
    (status, json)
}

/// `GET {path}` with an optional session cookie.
pub fn get(addr: &SocketAddr, path: &str, token: Option<&str>) -> (u16, Value) {
    let cookie = token
        .map(|t| format!("Cookie: token={t}\r\n"))
        .unwrap_or_default();
    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n{cookie}Connection: close\r\n\r\n");
    parse_response(&send_request(addr, &req))
}

/// `POST {path}` with a JSON body and an optional session cookie.
pub fn post(addr: &SocketAddr, path: &str, token: Option<&str>, body: &Value) -> (u16, Value) {
    let payload = body.to_string();
    let cookie = token
        .map(|t| format!("Cookie: token={t}\r\n"))
        .unwrap_or_default();
    let req = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\n{cookie}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    parse_response(&send_request(addr, &req))
}
