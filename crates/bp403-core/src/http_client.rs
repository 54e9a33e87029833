//! Raw HTTP client: byte-exact request construction over a hand-rolled
//! TCP/TLS stream. One attempt per call: no retries, no connection reuse
//! across calls. `ureq` can't be used here, since it canonicalizes
//! request-targets and this client needs to send them byte-for-byte.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use crate::dialer::{self, DialOptions};
use crate::error::{utils, BypassError};
use crate::payload::BypassPayload;

const DEFAULT_RESPONSE_BODY_PREVIEW_SIZE: usize = 1024;
const MAX_RESPONSE_BODY_SIZE: usize = 12 * 1024;
const TITLE_MAX_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct ResponseSummary {
    pub request_url: String,
    pub status: u16,
    pub response_time_ms: u64,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub server: Option<String>,
    pub redirect_location: Option<String>,
    pub title: String,
    pub preview: Vec<u8>,
    pub preview_hash: u64,
    pub curl_command: String,
    pub debug_token: String,
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub force_close: bool,
    pub disable_streaming: bool,
    pub debug_mode: bool,
    pub response_body_preview_size: usize,
    pub custom_headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            force_close: false,
            disable_streaming: false,
            debug_mode: false,
            response_body_preview_size: DEFAULT_RESPONSE_BODY_PREVIEW_SIZE,
            custom_headers: Vec::new(),
        }
    }
}

/// Performs one byte-exact request attempt for `payload`. No retries, no
/// throttling — this is the innermost layer; `retry.rs` and `throttle.rs`
/// wrap it.
pub fn send(payload: &BypassPayload, opts: &RequestOptions, dial_opts: &DialOptions) -> Result<ResponseSummary, BypassError> {
    let (host, port) = split_authority(&payload.host, payload.default_port());
    let started = Instant::now();

    let mut conn = dialer::dial(&payload.scheme, &host, port, dial_opts)?;
    conn.set_read_timeout(Some(opts.timeout))
        .map_err(|e| utils::transport_retryable(format!("set_read_timeout failed: {}", e)))?;
    conn.set_write_timeout(Some(opts.timeout))
        .map_err(|e| utils::transport_retryable(format!("set_write_timeout failed: {}", e)))?;

    let request = build_request(payload, &host, port, opts);
    conn.write_all(request.as_bytes())
        .map_err(|e| utils::transport_retryable(format!("request write failed: {}", e)))?;

    let preview_cap = opts.response_body_preview_size.min(MAX_RESPONSE_BODY_SIZE);
    let (status, headers, body_preview) = read_response(&mut conn, preview_cap, opts.disable_streaming)?;

    let response_time_ms = started.elapsed().as_millis() as u64;
    let content_type = header_value(&headers, "content-type");
    let content_length = header_value(&headers, "content-length").and_then(|v| v.parse::<u64>().ok());
    let server = header_value(&headers, "server");
    let redirect_location = if (300..400).contains(&status) { header_value(&headers, "location") } else { None };
    let title = extract_title(&body_preview);
    let preview_hash = hash_preview(&body_preview);

    Ok(ResponseSummary {
        request_url: format!("{}://{}{}", payload.scheme, payload.host, payload.raw_uri),
        status,
        response_time_ms,
        content_type,
        content_length,
        server,
        redirect_location,
        title,
        preview: body_preview,
        preview_hash,
        curl_command: build_curl_command(payload),
        debug_token: payload.payload_token.clone(),
    })
}

fn split_authority(authority: &str, default_port: u16) -> (String, u16) {
    if let Some(rest) = authority.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let host = &rest[..end];
            let after = &rest[end + 1..];
            let port = after.strip_prefix(':').and_then(|p| p.parse().ok()).unwrap_or(default_port);
            return (host.to_string(), port);
        }
    }
    match authority.rsplit_once(':') {
        Some((h, p)) if p.chars().all(|c| c.is_ascii_digit()) && !p.is_empty() => {
            (h.to_string(), p.parse().unwrap_or(default_port))
        }
        _ => (authority.to_string(), default_port),
    }
}

/// Request line is `METHOD SP rawURI SP HTTP/1.1 CRLF`.
/// Header-name casing and order are preserved; no name normalization.
fn build_request(payload: &BypassPayload, host: &str, port: u16, opts: &RequestOptions) -> String {
    let mut out = String::new();
    out.push_str(&payload.method);
    out.push(' ');
    out.push_str(&payload.raw_uri);
    out.push_str(" HTTP/1.1\r\n");

    let host_header = payload.headers.get("Host").map(|h| h.to_string()).unwrap_or_else(|| {
        if port == payload.default_port() {
            host.to_string()
        } else {
            format!("{}:{}", host, port)
        }
    });
    out.push_str("Host: ");
    out.push_str(&host_header);
    out.push_str("\r\n");

    for header in payload.headers.iter() {
        if header.name.eq_ignore_ascii_case("host") {
            continue;
        }
        out.push_str(&header.name);
        out.push_str(": ");
        out.push_str(&header.value);
        out.push_str("\r\n");
    }

    for (name, value) in &opts.custom_headers {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }

    // Forced close on retries or when the payload injects a Host header,
    // to defeat connection-affinity caches on the remote side.
    if opts.force_close || payload.headers.get("Host").is_some() {
        out.push_str("Connection: close\r\n");
    }

    if opts.debug_mode {
        out.push_str("X-GB403-Token: ");
        out.push_str(&payload.payload_token);
        out.push_str("\r\n");
    }

    out.push_str("\r\n");
    out
}

/// Reads status line + headers in full, then at most `preview_cap` bytes
/// of body. `disable_streaming` is honored by simply never reading past
/// `preview_cap` regardless — the flag only affects whether the
/// remaining body is drained before the connection is reused, which this
/// client does not attempt (every connection here is single-shot).
fn read_response(conn: &mut dyn ReadWrite, preview_cap: usize, _disable_streaming: bool) -> Result<(u16, Vec<(String, String)>, Vec<u8>), BypassError> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 512];
    let header_end = loop {
        if let Some(pos) = find_header_end(&raw) {
            break pos;
        }
        let n = conn
            .read(&mut buf)
            .map_err(|e| utils::transport_retryable(format!("eof before headers: {}", e)))?;
        if n == 0 {
            return Err(utils::transport_retryable("connection closed before headers completed"));
        }
        raw.extend_from_slice(&buf[..n]);
        if raw.len() > 64 * 1024 {
            return Err(utils::transport_retryable("response header parse error: headers too large"));
        }
    };

    let header_bytes = &raw[..header_end];
    let header_text = String::from_utf8_lossy(header_bytes);
    let mut lines = header_text.split("\r\n");
    let status_line = lines
        .next()
        .ok_or_else(|| utils::transport_retryable("response header parse error: missing status line"))?;
    let status = parse_status_line(status_line)?;

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let body_start = header_end + 4;
    let mut preview = raw[body_start.min(raw.len())..].to_vec();
    while preview.len() < preview_cap {
        let want = (preview_cap - preview.len()).min(buf.len());
        let n = match conn.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        preview.extend_from_slice(&buf[..n]);
    }
    preview.truncate(preview_cap);

    Ok((status, headers, preview))
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_status_line(line: &str) -> Result<u16, BypassError> {
    let mut parts = line.splitn(3, ' ');
    let _version = parts.next();
    let code = parts
        .next()
        .ok_or_else(|| utils::transport_non_retryable("response header parse error: missing status code"))?;
    code.parse::<u16>()
        .map_err(|_| utils::transport_retryable(format!("response header parse error: bad status code {}", code)))
}

fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.clone())
}

/// First case-insensitive `<title>...</title>` in the preview, up to
/// `TITLE_MAX_LEN` bytes.
fn extract_title(preview: &[u8]) -> String {
    let text = String::from_utf8_lossy(preview);
    let lower = text.to_ascii_lowercase();
    let Some(open) = lower.find("<title>") else { return String::new() };
    let start = open + "<title>".len();
    let end = lower[start..].find("</title>").map(|p| start + p).unwrap_or(text.len());
    let mut title: String = text[start..end].to_string();
    title.truncate(TITLE_MAX_LEN);
    title
}

fn hash_preview(preview: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    preview.hash(&mut hasher);
    hasher.finish()
}

fn build_curl_command(payload: &BypassPayload) -> String {
    let mut cmd = format!("curl -i -k -X {} '{}://{}{}'", payload.method, payload.scheme, payload.host, payload.raw_uri);
    for header in payload.headers.iter() {
        cmd.push_str(&format!(" -H '{}: {}'", header.name, header.value));
    }
    cmd
}

trait ReadWrite: Read {}
impl<T: Read> ReadWrite for T {}
