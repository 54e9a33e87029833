//! Error taxonomy for bp403. One flat enum, `Display` + `std::error::Error`,
//! plus a handful of constructor helpers for building each variant.

use std::fmt;

/// Errors surfaced by the core engine.
#[derive(Debug, Clone)]
pub enum BypassError {
    /// Invalid input from the driver (bad URL, bad module name, min > max).
    /// Fatal at startup.
    Config { operation: String, detail: String },
    /// External wordlist missing or unreadable. Non-fatal: the generator
    /// that needed it emits zero payloads and continues.
    WordlistUnavailable { name: String, source: String },
    /// The raw URL parser rejected a target URL.
    MalformedUrl { url: String, reason: String },
    /// A transport error the retry policy classified as retryable.
    /// Absorbed internally; surfaces only if retries are exhausted.
    TransportRetryable { operation: String, source: String },
    /// A transport error the retry policy classified as non-retryable.
    TransportNonRetryable { operation: String, source: String },
    /// `maxRetries + 1` attempts were made and all failed.
    ExhaustedRetries { host: String, attempts: u32, last: String },
    /// The consecutive-failure counter for one client instance tripped
    /// `maxConsecutiveFailedReqs`. Terminal for the batch.
    ExceededConsecutiveFailures { host: String, count: u32 },
    /// A debug token was malformed or truncated beyond recoverability.
    DecodeToken { reason: String },
}

impl fmt::Display for BypassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BypassError::Config { operation, detail } => {
                write!(f, "config error in {}: {}", operation, detail)
            }
            BypassError::WordlistUnavailable { name, source } => {
                write!(f, "wordlist \"{}\" unavailable: {}", name, source)
            }
            BypassError::MalformedUrl { url, reason } => {
                write!(f, "malformed url \"{}\": {}", url, reason)
            }
            BypassError::TransportRetryable { operation, source } => {
                write!(f, "retryable transport error in {}: {}", operation, source)
            }
            BypassError::TransportNonRetryable { operation, source } => {
                write!(f, "non-retryable transport error in {}: {}", operation, source)
            }
            BypassError::ExhaustedRetries { host, attempts, last } => {
                write!(
                    f,
                    "exhausted retries against {} after {} attempt(s): {}",
                    host, attempts, last
                )
            }
            BypassError::ExceededConsecutiveFailures { host, count } => {
                write!(
                    f,
                    "exceeded consecutive failure limit against {} ({} in a row)",
                    host, count
                )
            }
            BypassError::DecodeToken { reason } => {
                write!(f, "could not decode debug token: {}", reason)
            }
        }
    }
}

impl std::error::Error for BypassError {}

/// Constructor helpers, one per `BypassError` variant.
pub mod utils {
    use super::BypassError;

    pub fn config_error(operation: &str, detail: impl Into<String>) -> BypassError {
        BypassError::Config { operation: operation.to_string(), detail: detail.into() }
    }

    pub fn wordlist_unavailable(name: &str, source: impl Into<String>) -> BypassError {
        BypassError::WordlistUnavailable { name: name.to_string(), source: source.into() }
    }

    pub fn malformed_url(url: &str, reason: impl Into<String>) -> BypassError {
        BypassError::MalformedUrl { url: url.to_string(), reason: reason.into() }
    }

    /// `message` carries both what was being attempted and why it failed;
    /// callers compose this themselves (e.g. `format!("dial timeout: {}", e)`)
    /// rather than threading separate operation/source strings through every
    /// transport call site.
    pub fn transport_retryable(message: impl Into<String>) -> BypassError {
        let message = message.into();
        BypassError::TransportRetryable { operation: "transport".to_string(), source: message }
    }

    pub fn transport_non_retryable(message: impl Into<String>) -> BypassError {
        let message = message.into();
        BypassError::TransportNonRetryable { operation: "transport".to_string(), source: message }
    }

    pub fn decode_token(reason: impl Into<String>) -> BypassError {
        BypassError::DecodeToken { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let e = utils::malformed_url("ht!tp://x", "missing scheme separator");
        let s = format!("{}", e);
        assert!(s.contains("ht!tp://x"));
        assert!(s.contains("missing scheme separator"));
    }

    #[test]
    fn exhausted_retries_reports_attempts() {
        let e = BypassError::ExhaustedRetries {
            host: "example.com".into(),
            attempts: 4,
            last: "connection reset".into(),
        };
        assert!(format!("{}", e).contains('4'));
    }
}
