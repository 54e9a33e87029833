//! `unicode_path_normalization`: substitutes unicode look-alikes for `.`
//! and `/` in the path. Wordlist entries have the shape
//! `unichar(FORM)=ascii`; mappings whose ascii target is neither `.`
//! nor `/` are skipped.
//!
//! Open-question decision (recorded in DESIGN.md): per mapping and per
//! occurrence of its ascii target in the path, this emits a direct
//! single-position substitution and a percent-encoded single-position
//! substitution; per mapping it additionally emits one "all occurrences"
//! variant replacing every instance of the ascii target at once.

use crate::error::BypassError;
use crate::generators::GeneratorContext;
use crate::payload::HeaderList;
use crate::url::RawUrl;

use super::common::{dedup_on_raw_uri, payload, percent_encode_bytes, with_query};

const WORDLIST_NAME: &str = "unicode_equivalents";

struct Mapping {
    unichar: String,
    ascii: char,
}

fn parse_entry(line: &str) -> Option<Mapping> {
    let (unichar, ascii) = line.split_once('=')?;
    let unichar = match unichar.find('(') {
        Some(idx) => &unichar[..idx],
        None => unichar,
    };
    let mut ascii_chars = ascii.chars();
    let ascii_char = ascii_chars.next()?;
    if ascii_chars.next().is_some() {
        return None; // ascii side must be a single character
    }
    Some(Mapping { unichar: unichar.to_string(), ascii: ascii_char })
}

pub fn generate(url: &RawUrl, ctx: &GeneratorContext) -> Result<Vec<crate::payload::BypassPayload>, BypassError> {
    let entries = match ctx.wordlists.load(WORDLIST_NAME, None) {
        Ok(lines) => lines,
        Err(_) => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for line in &entries {
        let Some(mapping) = parse_entry(line) else { continue };
        if mapping.ascii != '.' && mapping.ascii != '/' {
            continue; // skip mappings whose ascii target isn't . or /
        }

        let chars: Vec<char> = url.raw_path.chars().collect();
        let positions: Vec<usize> = chars.iter().enumerate().filter(|(_, &c)| c == mapping.ascii).map(|(i, _)| i).collect();
        if positions.is_empty() {
            continue;
        }

        for &pos in &positions {
            let direct = splice(&chars, pos, &mapping.unichar);
            out.push(emit(url, &direct));

            let encoded = splice(&chars, pos, &percent_encode_bytes(&mapping.unichar));
            out.push(emit(url, &encoded));
        }

        let all: String = chars.iter().map(|&c| if c == mapping.ascii { mapping.unichar.clone() } else { c.to_string() }).collect();
        out.push(emit(url, &all));
    }

    Ok(dedup_on_raw_uri(out))
}

fn splice(chars: &[char], pos: usize, replacement: &str) -> String {
    let prefix: String = chars[..pos].iter().collect();
    let suffix: String = chars[pos + 1..].iter().collect();
    format!("{}{}{}", prefix, replacement, suffix)
}

fn emit(url: &RawUrl, variant_path: &str) -> crate::payload::BypassPayload {
    payload(url, "GET", with_query(url, variant_path), HeaderList::new(), "unicode_path_normalization")
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
    fn substitutes_dot_equivalent_and_its_encoded_form() {
        let url = crate::url::parse("http://h/admin/..").unwrap();
        let wl = InMemoryWordlist::new().with(WORDLIST_NAME, vec!["\u{FF0E}(fullwidth full stop)=."]);
        let recon = ReconCache::new();
        let payloads = generate(&url, &make_ctx(&wl, &recon)).unwrap();
        assert!(!payloads.is_empty());
        assert!(payloads.iter().any(|p| p.raw_uri.contains('\u{FF0E}')));
        assert!(payloads.iter().any(|p| p.raw_uri.contains("%EF%BC%8E")));
    }

    #[test]
    fn skips_mappings_whose_ascii_target_is_not_dot_or_slash() {
        let url = crate::url::parse("http://h/admin").unwrap();
        let wl = InMemoryWordlist::new().with(WORDLIST_NAME, vec!["\u{FF21}(fullwidth a)=a"]);
        let recon = ReconCache::new();
        let payloads = generate(&url, &make_ctx(&wl, &recon)).unwrap();
        assert!(payloads.is_empty());
    }

    #[test]
    fn skips_mapping_with_no_occurrences_in_path() {
        let url = crate::url::parse("http://h/admin").unwrap();
        let wl = InMemoryWordlist::new().with(WORDLIST_NAME, vec!["\u{2215}(division slash)=/"]);
        let recon = ReconCache::new();
        let payloads = generate(&url, &make_ctx(&wl, &recon)).unwrap();
        assert!(payloads.is_empty());
    }
}
