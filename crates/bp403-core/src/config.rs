//! `ScannerConfig`: the scanner's option surface, assembled by the CLI
//! collaborator and passed into `scanner::run`. Plain struct with
//! `Default`; the CLI overrides only the fields the user set, on top of
//! these defaults.

use std::time::Duration;

/// Status-code match rule: exact code, `Nxx` class, or `all`/`*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMatch {
    Exact(u16),
    Class(u16), // e.g. 4 for "4xx"
    All,
}

impl StatusMatch {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            StatusMatch::Exact(code) => *code == status,
            StatusMatch::Class(class) => status / 100 == *class,
            StatusMatch::All => true,
        }
    }

    /// Parse one entry of a `match-status-code` list: "200", "4xx", "all", "*".
    pub fn parse(s: &str) -> Option<StatusMatch> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s == "*" {
            return Some(StatusMatch::All);
        }
        if let Some(prefix) = s.strip_suffix("xx").or_else(|| s.strip_suffix("XX")) {
            return prefix.parse::<u16>().ok().map(StatusMatch::Class);
        }
        s.parse::<u16>().ok().map(StatusMatch::Exact)
    }
}

/// Match/filter configuration.
#[derive(Debug, Clone, Default)]
pub struct MatchFilters {
    pub status_codes: Vec<StatusMatch>,
    /// Substring, case-insensitive.
    pub content_types: Vec<String>,
    pub min_content_length: Option<u64>,
    pub max_content_length: Option<u64>,
}

impl MatchFilters {
    pub fn status_allows(&self, status: u16) -> bool {
        self.status_codes.is_empty() || self.status_codes.iter().any(|m| m.matches(status))
    }

    pub fn content_type_allows(&self, content_type: &str) -> bool {
        if self.content_types.is_empty() {
            return true;
        }
        let ct = content_type.to_ascii_lowercase();
        self.content_types.iter().any(|want| ct.contains(&want.to_ascii_lowercase()))
    }

    pub fn content_length_allows(&self, len: u64) -> bool {
        if let Some(min) = self.min_content_length {
            if len < min {
                return false;
            }
        }
        if let Some(max) = self.max_content_length {
            if len > max {
                return false;
            }
        }
        true
    }
}

/// Proxy configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

/// Full option surface for one scan run.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub modules: Vec<String>,
    pub concurrent_requests: usize,
    pub timeout: Duration,
    pub request_delay: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_consecutive_fails: u32,
    pub auto_throttle: bool,
    pub filters: MatchFilters,
    pub proxy: Option<ProxyConfig>,
    pub spoof_headers: Vec<String>,
    pub spoof_ips: Vec<String>,
    pub custom_headers: Vec<(String, String)>,
    pub response_body_preview_size: usize,
    pub max_response_body_size: usize,
    pub disable_response_body_streaming: bool,
    /// Always false in the core: redirects are never followed; kept as a field so the CLI can surface a clear error
    /// if a user passes `--follow-redirects`.
    pub follow_redirects: bool,
    pub debug_logging: bool,
}

pub const DEFAULT_CONCURRENCY: usize = 15;
pub const DEFAULT_RESPONSE_BODY_PREVIEW_SIZE: usize = 1024;
pub const MAX_RESPONSE_BODY_SIZE: usize = 12 * 1024;

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            modules: vec!["dumb_check".to_string()],
            concurrent_requests: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(10),
            request_delay: Duration::from_millis(0),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
            max_consecutive_fails: 50,
            auto_throttle: false,
            filters: MatchFilters::default(),
            proxy: None,
            spoof_headers: Vec::new(),
            spoof_ips: Vec::new(),
            custom_headers: Vec::new(),
            response_body_preview_size: DEFAULT_RESPONSE_BODY_PREVIEW_SIZE,
            max_response_body_size: MAX_RESPONSE_BODY_SIZE,
            disable_response_body_streaming: false,
            follow_redirects: false,
            debug_logging: false,
        }
    }
}

impl ScannerConfig {
    /// `dumb_check` is always prepended unless explicitly excluded.
    /// `enabled_modules("all")` expands to the full set.
    pub fn enabled_modules(&self, all_module_ids: &[&str]) -> Vec<String> {
        let mut mods: Vec<String> = if self.modules.iter().any(|m| m == "all") {
            all_module_ids.iter().map(|s| s.to_string()).collect()
        } else {
            self.modules.clone()
        };
        if !mods.iter().any(|m| m == "dumb_check") {
            mods.insert(0, "dumb_check".to_string());
        }
        mods
    }

    /// Preview size is clamped to `max_response_body_size`.
    pub fn effective_preview_size(&self) -> usize {
        self.response_body_preview_size.min(self.max_response_body_size)
    }
}
