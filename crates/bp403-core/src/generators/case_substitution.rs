//! `case_substitution`: for each letter position in the path, flip that
//! letter's case and emit a payload. Non-letter positions are skipped.

use crate::payload::{BypassPayload, HeaderList};
use crate::url::RawUrl;

use super::common::{dedup_on_raw_uri, payload, with_query};

pub fn generate(url: &RawUrl) -> Vec<BypassPayload> {
    let chars: Vec<char> = url.raw_path.chars().collect();
    let mut out = Vec::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphabetic() {
            continue;
        }
        let flipped = if c.is_uppercase() {
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c.to_uppercase().next().unwrap_or(c)
        };
        let mut variant: Vec<char> = chars.clone();
        variant[i] = flipped;
        let variant_path: String = variant.into_iter().collect();
        out.push(payload(url, "GET", with_query(url, &variant_path), HeaderList::new(), "case_substitution"));
    }

    dedup_on_raw_uri(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_each_letter_independently() {
        let url = crate::url::parse("http://h/Admin").unwrap();
        let payloads = generate(&url);
        let uris: Vec<&str> = payloads.iter().map(|p| p.raw_uri.as_str()).collect();
        assert!(uris.contains(&"/admin"));
        assert!(uris.contains(&"/ADmin"));
    }

    #[test]
    fn skips_non_letter_positions() {
        let url = crate::url::parse("http://h/a.b").unwrap();
        let payloads = generate(&url);
        // 2 letters -> 2 variants, the '.' and '/' never flipped.
        assert_eq!(payloads.len(), 2);
    }
}
