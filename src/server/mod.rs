use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::data::catalog::Catalog;

pub mod api;
pub mod routes;

use api::ServerContext;

/// Load every progression table, then serve until the process is stopped.
/// A table that fails to load aborts startup.
pub fn run_server(config: &AppConfig) -> io::Result<()> {
    let catalog = Catalog::load(&config.data_dir)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    let context = ServerContext::new(catalog, config);

    let listener = TcpListener::bind(&config.bind_addr)?;
    info!(
        tables = context.catalog.len(),
        "frostforge server listening on http://{}", config.bind_addr
    );

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&context, &mut stream) {
                    warn!("request error: {err}");
                }
            }
            Err(err) => warn!("connection failed: {err}"),
        }
    }

    Ok(())
}

/// Requests larger than this are refused with 413.
const MAX_REQUEST_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRequest {
    method: String,
    path: String,
    body: String,
}

#[derive(Debug)]
enum ReadError {
    TooLarge,
    Io(io::Error),
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Length of the head and of the blank-line separator after it.
fn head_end(buffer: &[u8]) -> Option<(usize, usize)> {
    find(buffer, b"\r\n\r\n")
        .map(|at| (at, 4))
        .or_else(|| find(buffer, b"\n\n").map(|at| (at, 2)))
}

fn content_length(head: &str) -> Option<usize> {
    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Read the head, then keep reading until `Content-Length` body bytes have
/// arrived. Without the header the body is whatever came with the head.
fn read_request<R: Read>(reader: &mut R) -> Result<Option<RawRequest>, ReadError> {
    let mut buffer: Vec<u8> = Vec::with_capacity(4_096);
    let mut chunk = [0_u8; 4_096];

    let (head_len, separator_len) = loop {
        if let Some(found) = head_end(&buffer) {
            break found;
        }
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(ReadError::TooLarge);
        }
        let bytes_read = reader.read(&mut chunk)?;
        if bytes_read == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            break (buffer.len(), 0);
        }
        buffer.extend_from_slice(&chunk[..bytes_read]);
    };

    let head = String::from_utf8_lossy(&buffer[..head_len]).into_owned();
    let body_start = head_len + separator_len;
    let body_end = match content_length(&head) {
        Some(length) if length > MAX_REQUEST_BYTES => return Err(ReadError::TooLarge),
        Some(length) => {
            while buffer.len() < body_start + length {
                let bytes_read = reader.read(&mut chunk)?;
                if bytes_read == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..bytes_read]);
            }
            buffer.len().min(body_start + length)
        }
        None => buffer.len(),
    };

    let mut request_parts = head.lines().next().unwrap_or_default().split_whitespace();
    Ok(Some(RawRequest {
        method: request_parts.next().unwrap_or("GET").to_string(),
        path: request_parts.next().unwrap_or("/").to_string(),
        body: String::from_utf8_lossy(&buffer[body_start.min(body_end)..body_end]).into_owned(),
    }))
}

fn handle_connection(context: &ServerContext, stream: &mut TcpStream) -> io::Result<()> {
    let response = match read_request(stream) {
        Ok(Some(request)) => {
            let response =
                routes::route_request(context, &request.method, &request.path, &request.body);
            debug!(
                method = request.method.as_str(),
                path = request.path.as_str(),
                status = response.status_code,
                "handled request"
            );
            response
        }
        Ok(None) => return Ok(()),
        Err(ReadError::TooLarge) => {
            routes::error_response(413, "Payload Too Large", "Request body is too large")
        }
        Err(ReadError::Io(err)) => return Err(err),
    };
    stream.write_all(response.to_http_string().as_bytes())?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `step` bytes per read, like a request split across
    /// TCP segments.
    struct Trickle {
        data: Vec<u8>,
        offset: usize,
        step: usize,
    }

    impl Trickle {
        fn new(raw: &str, step: usize) -> Self {
            Self {
                data: raw.as_bytes().to_vec(),
                offset: 0,
                step,
            }
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = self.data.len().min(self.offset + self.step).min(self.offset + buf.len());
            let bytes = &self.data[self.offset..end];
            buf[..bytes.len()].copy_from_slice(bytes);
            self.offset = end;
            Ok(bytes.len())
        }
    }

    fn post(body: &str) -> String {
        format!(
            "POST /api/cost HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
    }

    #[test]
    fn body_split_across_reads_is_reassembled() {
        let body = r#"{ "table": "chief_charms", "ranges": [ { "from": 0, "to": 3 } ] }"#;
        let request = read_request(&mut Trickle::new(&post(body), 7))
            .unwrap()
            .expect("request should be read");
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/api/cost");
        assert_eq!(request.body, body);
    }

    #[test]
    fn body_larger_than_one_read_is_complete() {
        let body = format!(r#"{{ "pad": "{}" }}"#, "x".repeat(40_000));
        let request = read_request(&mut Trickle::new(&post(&body), 16_384))
            .unwrap()
            .unwrap();
        assert_eq!(request.body.len(), body.len());
    }

    #[test]
    fn get_without_length_has_empty_body() {
        let request = read_request(&mut Trickle::new("GET /api/health HTTP/1.1\r\n\r\n", 64))
            .unwrap()
            .unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.body, "");
    }

    #[test]
    fn closed_connection_reads_nothing() {
        assert!(read_request(&mut Trickle::new("", 8)).unwrap().is_none());
    }

    #[test]
    fn oversized_length_is_refused() {
        let raw = format!(
            "PUT /api/inventory HTTP/1.1\r\nContent-Length: {}\r\n\r\n{{}}",
            MAX_REQUEST_BYTES + 1
        );
        assert!(matches!(
            read_request(&mut Trickle::new(&raw, 64)),
            Err(ReadError::TooLarge)
        ));
    }
}
