//! `end_paths`: appends an endpath wordlist entry as a path suffix.

use crate::error::BypassError;
use crate::generators::GeneratorContext;
use crate::payload::HeaderList;
use crate::url::RawUrl;

use super::common::{dedup_on_raw_uri, payload, with_query};

const WORDLIST_NAME: &str = "endpaths";

pub fn generate(url: &RawUrl, ctx: &GeneratorContext) -> Result<Vec<crate::payload::BypassPayload>, BypassError> {
    let entries = match ctx.wordlists.load(WORDLIST_NAME, None) {
        Ok(lines) => lines,
        Err(_) => return Ok(Vec::new()),
    };

    let base = &url.raw_path;
    let mut out = Vec::new();
    for x in &entries {
        out.push(emit(url, &format!("{}/{}", base, x)));
        out.push(emit(url, &format!("{}/{}/", base, x)));

        let first_is_non_letter = x.chars().next().map(|c| !c.is_ascii_alphabetic()).unwrap_or(false);
        if base != "/" && first_is_non_letter {
            out.push(emit(url, &format!("{}{}", base, x)));
            out.push(emit(url, &format!("{}{}/", base, x)));
        }
    }

    Ok(dedup_on_raw_uri(out))
}

fn emit(url: &RawUrl, variant_path: &str) -> crate::payload::BypassPayload {
    payload(url, "GET", with_query(url, variant_path), HeaderList::new(), "end_paths")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recon::ReconCache;
    use crate::wordlist::InMemoryWordlist;

    fn make_ctx(wl: &InMemoryWordlist, recon: &ReconCache) -> GeneratorContext<'_> {
        GeneratorContext { wordlists: wl, recon, spoof_headers: &[], spoof_ips: &[] }
    }

    #[test]
    fn end_paths_with_query_e2e() {
        let url = crate::url::parse("http://h/admin?x=1").unwrap();
        let wl = InMemoryWordlist::new().with(WORDLIST_NAME, vec!["/", ".json"]);
        let recon = ReconCache::new();
        let payloads = generate(&url, &make_ctx(&wl, &recon)).unwrap();
        let uris: Vec<&str> = payloads.iter().map(|p| p.raw_uri.as_str()).collect();

        assert!(uris.contains(&"/admin/.json?x=1"));
        assert!(uris.contains(&"/admin//?x=1"));
        assert!(uris.contains(&"/admin.json?x=1"));
        assert!(uris.iter().all(|u| u.ends_with("?x=1")));
    }

    #[test]
    fn skips_direct_append_for_letter_first_entries() {
        let url = crate::url::parse("http://h/admin").unwrap();
        let wl = InMemoryWordlist::new().with(WORDLIST_NAME, vec!["json"]);
        let recon = ReconCache::new();
        let payloads = generate(&url, &make_ctx(&wl, &recon)).unwrap();
        let uris: Vec<&str> = payloads.iter().map(|p| p.raw_uri.as_str()).collect();
        assert!(!uris.contains(&"/adminjson"));
        assert!(uris.contains(&"/admin/json"));
    }

    #[test]
    fn root_path_never_gets_direct_append() {
        let url = crate::url::parse("http://h").unwrap();
        let wl = InMemoryWordlist::new().with(WORDLIST_NAME, vec![".json"]);
        let recon = ReconCache::new();
        let payloads = generate(&url, &make_ctx(&wl, &recon)).unwrap();
        assert!(payloads.iter().all(|p| p.raw_uri.starts_with("//")));
    }
}
