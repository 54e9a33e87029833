//! `http_methods`: one payload per method in the methods wordlist,
//! rawURI unchanged, unique on method.

use crate::error::BypassError;
use crate::generators::GeneratorContext;
use crate::payload::HeaderList;
use crate::url::RawUrl;

use super::common::payload;

const WORDLIST_NAME: &str = "http_methods";

pub fn generate(url: &RawUrl, ctx: &GeneratorContext) -> Result<Vec<crate::payload::BypassPayload>, BypassError> {
    let entries = match ctx.wordlists.load(WORDLIST_NAME, None) {
        Ok(lines) => lines,
        Err(_) => return Ok(Vec::new()),
    };

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for method in &entries {
        let method = method.to_ascii_uppercase();
        if !seen.insert(method.clone()) {
            continue;
        }
        out.push(payload(url, &method, url.raw_uri(), HeaderList::new(), "http_methods"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recon::ReconCache;
    use crate::wordlist::InMemoryWordlist;

    #[test]
    fn one_payload_per_method_rawuri_unchanged() {
        let url = crate::url::parse("http://h/admin?x=1").unwrap();
        let wl = InMemoryWordlist::new().with(WORDLIST_NAME, vec!["GET", "TRACE", "PROPFIND"]);
        let recon = ReconCache::new();
        let ctx = GeneratorContext { wordlists: &wl, recon: &recon, spoof_headers: &[], spoof_ips: &[] };
        let payloads = generate(&url, &ctx).unwrap();
        assert_eq!(payloads.len(), 3);
        assert!(payloads.iter().all(|p| p.raw_uri == "/admin?x=1"));
        assert!(payloads.iter().any(|p| p.method == "TRACE"));
    }

    #[test]
    fn dedups_on_method() {
        let url = crate::url::parse("http://h/a").unwrap();
        let wl = InMemoryWordlist::new().with(WORDLIST_NAME, vec!["get", "GET"]);
        let recon = ReconCache::new();
        let ctx = GeneratorContext { wordlists: &wl, recon: &recon, spoof_headers: &[], spoof_ips: &[] };
        let payloads = generate(&url, &ctx).unwrap();
        assert_eq!(payloads.len(), 1);
    }
}
