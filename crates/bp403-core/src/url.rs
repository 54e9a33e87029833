//! Raw URL parser. Splits a URL into scheme/authority/rawPath/rawQuery
//! without normalizing any of it: no percent-decoding,
//! no dot-segment collapsing, no duplicate-slash removal. Bypass
//! techniques rely on exactly those sequences surviving intact.

use crate::error::{utils::malformed_url, BypassError};

/// A URL parsed without canonicalization. `raw_path` and `raw_query` are
/// byte-for-byte slices of the input; nothing is decoded or rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUrl {
    pub scheme: String,
    /// Full authority, e.g. `example.com:8443` or `[::1]:8443`.
    pub host: String,
    /// Hostname only, brackets stripped for IPv6 literals.
    pub hostname: String,
    /// Port, if explicit in the authority.
    pub port: Option<u16>,
    /// Exactly the bytes after the authority, up to `?` or end-of-string.
    /// Empty path is represented as `/`.
    pub raw_path: String,
    /// Bytes after `?`, excluding the `?` itself. Empty string if absent.
    pub raw_query: String,
}

impl RawUrl {
    /// The request-target: `raw_path` plus `?raw_query` if present.
    pub fn raw_uri(&self) -> String {
        if self.raw_query.is_empty() {
            self.raw_path.clone()
        } else {
            format!("{}?{}", self.raw_path, self.raw_query)
        }
    }

    pub fn default_port(&self) -> u16 {
        if self.scheme.eq_ignore_ascii_case("https") {
            443
        } else {
            80
        }
    }
}

/// Parse `input` without normalizing. Fails with `MalformedUrl` if the
/// scheme or authority is missing.
pub fn parse(input: &str) -> Result<RawUrl, BypassError> {
    let (scheme, rest) = input
        .split_once("://")
        .ok_or_else(|| malformed_url(input, "missing scheme separator \"://\""))?;

    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') {
        return Err(malformed_url(input, "invalid or empty scheme"));
    }
    let scheme_lower = scheme.to_ascii_lowercase();
    if scheme_lower != "http" && scheme_lower != "https" {
        return Err(malformed_url(input, "scheme must be http or https"));
    }

    // Authority runs up to the first '/', '?', '#', or end-of-string.
    let authority_end = rest
        .find(['/', '?', '#'])
        .unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    if authority.is_empty() {
        return Err(malformed_url(input, "missing authority (host)"));
    }
    let after_authority = &rest[authority_end..];

    let (hostname, port) = split_authority(authority)
        .ok_or_else(|| malformed_url(input, "invalid authority"))?;

    // Split the remainder into rawPath (through '#'-exclusive, '?'-exclusive)
    // and rawQuery. A fragment, if present, is dropped (never sent on the wire).
    let without_fragment = match after_authority.find('#') {
        Some(idx) => &after_authority[..idx],
        None => after_authority,
    };

    let (raw_path, raw_query) = match without_fragment.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (without_fragment.to_string(), String::new()),
    };

    let raw_path = if raw_path.is_empty() { "/".to_string() } else { raw_path };

    Ok(RawUrl {
        scheme: scheme_lower,
        host: authority.to_string(),
        hostname,
        port,
        raw_path,
        raw_query,
    })
}

/// Split an authority into (hostname, port). Handles bracketed IPv6
/// literals (`[::1]:8443`).
fn split_authority(authority: &str) -> Option<(String, Option<u16>)> {
    if let Some(rest) = authority.strip_prefix('[') {
        let (v6, after) = rest.split_once(']')?;
        if let Some(port_str) = after.strip_prefix(':') {
            let port = port_str.parse::<u16>().ok()?;
            return Some((v6.to_string(), Some(port)));
        }
        return Some((v6.to_string(), None));
    }
    match authority.rsplit_once(':') {
        Some((host, port_str)) if port_str.chars().all(|c| c.is_ascii_digit()) && !port_str.is_empty() => {
            let port = port_str.parse::<u16>().ok()?;
            Some((host.to_string(), Some(port)))
        }
        _ => Some((authority.to_string(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_url() {
        let u = parse("http://example.com/admin/config").unwrap();
        assert_eq!(u.scheme, "http");
        assert_eq!(u.host, "example.com");
        assert_eq!(u.raw_path, "/admin/config");
        assert_eq!(u.raw_query, "");
    }

    #[test]
    fn preserves_query_verbatim() {
        let u = parse("https://h/admin?x=1&y=%20").unwrap();
        assert_eq!(u.raw_path, "/admin");
        assert_eq!(u.raw_query, "x=1&y=%20");
        assert_eq!(u.raw_uri(), "/admin?x=1&y=%20");
    }

    #[test]
    fn empty_path_becomes_slash() {
        let u = parse("http://h").unwrap();
        assert_eq!(u.raw_path, "/");
    }

    #[test]
    fn does_not_collapse_dot_segments_or_double_slashes() {
        let u = parse("http://h/a/../b//c%2e%2e").unwrap();
        assert_eq!(u.raw_path, "/a/../b//c%2e%2e");
    }

    #[test]
    fn preserves_port_and_ipv6_literal() {
        let u = parse("https://[::1]:8443/x").unwrap();
        assert_eq!(u.hostname, "::1");
        assert_eq!(u.port, Some(8443));
        assert_eq!(u.host, "[::1]:8443");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(parse("example.com/x").is_err());
    }

    #[test]
    fn rejects_missing_authority() {
        assert!(parse("http:///x").is_err());
    }

    #[test]
    fn drops_fragment_but_keeps_query() {
        let u = parse("http://h/a?x=1#frag").unwrap();
        assert_eq!(u.raw_uri(), "/a?x=1");
    }
}
