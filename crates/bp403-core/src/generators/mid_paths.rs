//! `mid_paths`: substitutes a midpath wordlist entry at every `/`
//! position in the path.
//!
//! For slash position `k`,
//! - the *post-slash* variant splices `X` in immediately after the
//!   slash: `path[..=k] + X + path[k+1..]`;
//! - the *pre-slash* variant (only for `k >= 2`, to avoid producing
//!   `X//...` at position 0) splices `X` in immediately before the
//!   slash: `path[..k] + X + path[k..]`;
//! - each of those is additionally emitted with a leading extra `/`
//!   prepended to the whole request-target.

use crate::error::BypassError;
use crate::generators::GeneratorContext;
use crate::payload::HeaderList;
use crate::url::RawUrl;

use super::common::{dedup_on_raw_uri, payload, slash_positions, with_query};

const WORDLIST_NAME: &str = "midpaths";

pub fn generate(url: &RawUrl, ctx: &GeneratorContext) -> Result<Vec<crate::payload::BypassPayload>, BypassError> {
    let entries = match ctx.wordlists.load(WORDLIST_NAME, None) {
        Ok(lines) => lines,
        Err(_) => return Ok(Vec::new()), // WordlistUnavailable: zero payloads, non-fatal
    };

    let mut out = Vec::new();
    for x in &entries {
        for &k in &slash_positions(&url.raw_path) {
            let post = format!("{}{}{}", &url.raw_path[..=k], x, &url.raw_path[k + 1..]);
            emit_both(&mut out, url, &post);

            if k >= 2 {
                let pre = format!("{}{}{}", &url.raw_path[..k], x, &url.raw_path[k..]);
                emit_both(&mut out, url, &pre);
            }
        }
    }

    Ok(dedup_on_raw_uri(out))
}

fn emit_both(out: &mut Vec<crate::payload::BypassPayload>, url: &RawUrl, variant_path: &str) {
    out.push(payload(url, "GET", with_query(url, variant_path), HeaderList::new(), "mid_paths"));
    let with_extra_slash = format!("/{}", variant_path);
    out.push(payload(url, "GET", with_query(url, &with_extra_slash), HeaderList::new(), "mid_paths"));
}
