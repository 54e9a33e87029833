//! `path_prefix`: prepends a prefix wordlist entry before the first
//! path segment.

use crate::error::BypassError;
use crate::generators::GeneratorContext;
use crate::payload::HeaderList;
use crate::url::RawUrl;

use super::common::{dedup_on_raw_uri, payload, with_query};

const WORDLIST_NAME: &str = "prefixes";

pub fn generate(url: &RawUrl, ctx: &GeneratorContext) -> Result<Vec<crate::payload::BypassPayload>, BypassError> {
    let entries = match ctx.wordlists.load(WORDLIST_NAME, None) {
        Ok(lines) => lines,
        Err(_) => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for prefix in &entries {
        let variant = format!("/{}{}", prefix.trim_start_matches('/'), &url.raw_path);
        out.push(payload(url, "GET", with_query(url, &variant), HeaderList::new(), "path_prefix"));
    }

    Ok(dedup_on_raw_uri(out))
}
