//! `BypassPayload` data model: an immutable, fully-specified
//! request variant produced by a generator.

use serde::{Deserialize, Serialize};

/// An ordered `(name, value)` header pair. Casing and insertion order are
/// preserved; duplicate names are permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Ordered header list. A thin wrapper over `Vec<Header>` so call sites
/// read `HeaderList` rather than a bare vector, while still behaving like
/// one (duplicate names permitted, insertion order preserved).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderList(pub Vec<Header>);

impl HeaderList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Header::new(name, value));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// First value for `name`, case-insensitive, or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<(String, String)>> for HeaderList {
    fn from(v: Vec<(String, String)>) -> Self {
        HeaderList(v.into_iter().map(|(n, val)| Header::new(n, val)).collect())
    }
}

/// One fully-specified, immutable request variant. `raw_uri` is used
/// verbatim on the request line: no percent-decoding, no dot-segment
/// collapsing, no duplicate-slash removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassPayload {
    pub scheme: String,
    pub host: String,
    pub method: String,
    pub raw_uri: String,
    pub headers: HeaderList,
    pub bypass_module: String,
    /// Populated by the generator before returning; empty until then.
    pub payload_token: String,
    /// The original target URL, for logging only — never parsed back.
    pub original_url: String,
}

impl BypassPayload {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        method: impl Into<String>,
        raw_uri: impl Into<String>,
        headers: HeaderList,
        bypass_module: impl Into<String>,
        original_url: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            method: method.into(),
            raw_uri: raw_uri.into(),
            headers,
            bypass_module: bypass_module.into(),
            payload_token: String::new(),
            original_url: original_url.into(),
        }
    }

    /// Effective `Host:` header value: the injected `Host` header if
    /// present, otherwise the authority.
    pub fn effective_host(&self) -> String {
        self.headers.get("Host").map(str::to_string).unwrap_or_else(|| self.host.clone())
    }

    /// Default port for this payload's scheme, used when `host` carries
    /// no explicit port.
    pub fn default_port(&self) -> u16 {
        if self.scheme.eq_ignore_ascii_case("https") {
            443
        } else {
            80
        }
    }

    /// The tuple generators dedup on by default: `{raw_uri, method, headers}`.
    pub fn dedup_key(&self) -> (String, String, Vec<(String, String)>) {
        (
            self.raw_uri.clone(),
            self.method.clone(),
            self.headers.iter().map(|h| (h.name.clone(), h.value.clone())).collect(),
        )
    }
}
