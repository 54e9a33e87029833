//! Shared helpers for payload generators: path-position utilities,
//! percent-encoding, and the query-preservation rule every path-mutating
//! generator must honor.

use crate::payload::{BypassPayload, HeaderList};
use crate::url::RawUrl;
use std::collections::HashSet;

/// Build a `BypassPayload` for `url`, with `raw_uri` as the request-target
/// and a token assigned. Headers default to the url's base headers plus
/// whatever the generator adds.
pub fn payload(url: &RawUrl, method: &str, raw_uri: impl Into<String>, headers: HeaderList, module: &str) -> BypassPayload {
    let mut p = BypassPayload::new(
        url.scheme.clone(),
        url.host.clone(),
        method,
        raw_uri.into(),
        headers,
        module,
        format!("{}://{}{}", url.scheme, url.host, url.raw_uri()),
    );
    crate::token::assign_token(&mut p);
    p
}

/// Append the original URL's query string verbatim to `path`, producing
/// the final request-target. Every path-mutating generator uses this so
/// query preservation is centralized rather than repeated per-module.
pub fn with_query(url: &RawUrl, path: &str) -> String {
    if url.raw_query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, url.raw_query)
    }
}

/// Byte indices of every `/` in `path`.
pub fn slash_positions(path: &str) -> Vec<usize> {
    path.bytes()
        .enumerate()
        .filter_map(|(i, b)| if b == b'/' { Some(i) } else { None })
        .collect()
}

/// Percent-encode each byte of `s` as `%XX` (uppercase hex), e.g. for
/// building the encoded form of a unicode character's UTF-8 bytes.
pub fn percent_encode_bytes(s: &str) -> String {
    s.bytes().map(|b| format!("%{:02X}", b)).collect()
}

/// Ancestor paths of `path` by repeatedly dropping the last `/`-segment,
/// down to (but not including) the root `/`. E.g. `/a/b/c` ->
/// `["/a/b", "/a"]`.
pub fn ancestor_paths(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = path.trim_end_matches('/').to_string();
    while let Some(idx) = current.rfind('/') {
        if idx == 0 {
            break;
        }
        current.truncate(idx);
        out.push(current.clone());
    }
    out
}

/// Dedup a batch of payloads on the full tuple used by default
/// (`raw_uri`, `method`, `headers`), preserving first-seen order.
pub fn dedup_on_tuple(payloads: Vec<BypassPayload>) -> Vec<BypassPayload> {
    let mut seen = HashSet::new();
    payloads
        .into_iter()
        .filter(|p| seen.insert(p.dedup_key()))
        .collect()
}

/// Dedup on `raw_uri` alone, preserving first-seen order.
pub fn dedup_on_raw_uri(payloads: Vec<BypassPayload>) -> Vec<BypassPayload> {
    let mut seen = HashSet::new();
    payloads
        .into_iter()
        .filter(|p| seen.insert(p.raw_uri.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestor_paths_descend_to_but_exclude_root() {
        assert_eq!(ancestor_paths("/a/b/c"), vec!["/a/b".to_string(), "/a".to_string()]);
        assert_eq!(ancestor_paths("/a"), Vec::<String>::new());
    }

    #[test]
    fn percent_encode_covers_multibyte_chars() {
        let enc = percent_encode_bytes(".");
        assert_eq!(enc, "%2E");
    }

    #[test]
    fn slash_positions_finds_all_slashes() {
        assert_eq!(slash_positions("/a/b/c"), vec![0, 2, 4]);
    }
}
