//! `char_encode`: per-letter percent-encoding at one, two, and three
//! layers of nesting, assigned to submodules `char_encode`,
//! `char_encode_double`, `char_encode_triple`. Non-letter positions are
//! skipped.

use crate::payload::{BypassPayload, HeaderList};
use crate::url::RawUrl;

use super::common::{dedup_on_raw_uri, payload, with_query};

pub fn generate(url: &RawUrl) -> Vec<BypassPayload> {
    let bytes: Vec<u8> = url.raw_path.bytes().collect();
    let mut single = Vec::new();
    let mut double = Vec::new();
    let mut triple = Vec::new();

    for (i, &b) in bytes.iter().enumerate() {
        if !(b as char).is_ascii_alphabetic() {
            continue;
        }
        let prefix = String::from_utf8_lossy(&bytes[..i]).into_owned();
        let suffix = String::from_utf8_lossy(&bytes[i + 1..]).into_owned();

        single.push(variant(url, &prefix, &format!("%{:02X}", b), &suffix, "char_encode"));
        double.push(variant(url, &prefix, &format!("%25{:02X}", b), &suffix, "char_encode_double"));
        triple.push(variant(url, &prefix, &format!("%2525{:02X}", b), &suffix, "char_encode_triple"));
    }

    let mut out = dedup_on_raw_uri(single);
    out.extend(dedup_on_raw_uri(double));
    out.extend(dedup_on_raw_uri(triple));
    out
}

fn variant(url: &RawUrl, prefix: &str, encoded: &str, suffix: &str, module: &str) -> BypassPayload {
    let variant_path = format!("{}{}{}", prefix, encoded, suffix);
    payload(url, "GET", with_query(url, &variant_path), HeaderList::new(), module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_encode_triples_match_spec_example() {
        let url = crate::url::parse("http://h/ab").unwrap();
        let payloads = generate(&url);

        let single: Vec<&str> = payloads.iter().filter(|p| p.bypass_module == "char_encode").map(|p| p.raw_uri.as_str()).collect();
        let double: Vec<&str> = payloads.iter().filter(|p| p.bypass_module == "char_encode_double").map(|p| p.raw_uri.as_str()).collect();
        let triple: Vec<&str> = payloads.iter().filter(|p| p.bypass_module == "char_encode_triple").map(|p| p.raw_uri.as_str()).collect();

        assert!(single.contains(&"/%61b"));
        assert!(single.contains(&"/a%62"));
        assert!(double.contains(&"/%2561b"));
        assert!(double.contains(&"/a%2562"));
        assert!(triple.contains(&"/%252561b"));
        assert!(triple.contains(&"/a%252562"));
    }

    #[test]
    fn skips_non_letter_bytes() {
        let url = crate::url::parse("http://h/1.2").unwrap();
        let payloads = generate(&url);
        assert!(payloads.is_empty());
    }
}
