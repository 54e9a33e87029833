//! `dumb_check`: the baseline module. A singleton request against the
//! original, unmutated URL.

use crate::payload::HeaderList;
use crate::url::RawUrl;

use super::common::payload;

pub fn generate(url: &RawUrl) -> Vec<crate::payload::BypassPayload> {
    vec![payload(url, "GET", url.raw_uri(), HeaderList::new(), "dumb_check")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_exactly_one_payload_matching_the_original_uri() {
        let url = crate::url::parse("http://h/admin?x=1").unwrap();
        let payloads = generate(&url);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].raw_uri, "/admin?x=1");
        assert_eq!(payloads[0].method, "GET");
    }
}
