//! Retry classification and bounded-attempt bookkeeping: an
//! attempt-count/backoff loop generalized from bare HTTP status codes to
//! a transport-error taxonomy.

use std::sync::atomic::{AtomicU32, Ordering};

/// The transport-error classes the retry policy distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    DialTimeout,
    ConnectionResetOrAborted,
    EofBeforeHeaders,
    TlsHandshakeTransient,
    ResponseHeaderParseError,
    ProtocolViolation,
    DnsNxDomain,
}

/// What the next attempt (if any) should change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    None,
    ForceConnectionClose,
    DisableStreamingForThisRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub retryable: bool,
    pub action: RetryAction,
}

/// Classify one transport error into a retry decision.
pub fn classify(kind: TransportErrorKind) -> RetryDecision {
    use TransportErrorKind::*;
    match kind {
        DialTimeout | ConnectionResetOrAborted | EofBeforeHeaders | TlsHandshakeTransient => {
            RetryDecision { retryable: true, action: RetryAction::ForceConnectionClose }
        }
        ResponseHeaderParseError => RetryDecision { retryable: true, action: RetryAction::DisableStreamingForThisRequest },
        ProtocolViolation | DnsNxDomain => RetryDecision { retryable: false, action: RetryAction::None },
    }
}

/// Bounded-attempt policy: at most `max_retries + 1` attempts, sleeping
/// `retry_delay` between them (no exponential growth by default).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: std::time::Duration,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Effective per-attempt timeout at attempt index `k` (0-based):
    /// `timeout + k * retry_delay`.
    pub fn effective_timeout(&self, base_timeout: std::time::Duration, attempt_index: u32) -> std::time::Duration {
        base_timeout + self.retry_delay * attempt_index
    }
}

/// Per-HTTP-client-instance consecutive-failure counter. Increment on `ExhaustedRetries`, reset on any
/// successful attempt.
#[derive(Debug, Default)]
pub struct ConsecutiveFailures {
    count: AtomicU32,
}

impl ConsecutiveFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new count after incrementing.
    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    pub fn current(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn has_exceeded(&self, max_consecutive_failed_reqs: u32) -> bool {
        self.current() >= max_consecutive_failed_reqs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn retryable_transport_errors_force_connection_close() {
        let d = classify(TransportErrorKind::ConnectionResetOrAborted);
        assert!(d.retryable);
        assert_eq!(d.action, RetryAction::ForceConnectionClose);
    }

    #[test]
    fn header_parse_error_disables_streaming_next_attempt() {
        let d = classify(TransportErrorKind::ResponseHeaderParseError);
        assert!(d.retryable);
        assert_eq!(d.action, RetryAction::DisableStreamingForThisRequest);
    }

    #[test]
    fn protocol_violations_and_nxdomain_are_non_retryable() {
        assert!(!classify(TransportErrorKind::ProtocolViolation).retryable);
        assert!(!classify(TransportErrorKind::DnsNxDomain).retryable);
    }

    #[test]
    fn max_attempts_is_retries_plus_one() {
        let policy = RetryPolicy { max_retries: 2, retry_delay: Duration::from_millis(100) };
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn effective_timeout_grows_linearly_with_attempt() {
        let policy = RetryPolicy { max_retries: 3, retry_delay: Duration::from_millis(100) };
        let base = Duration::from_secs(1);
        assert_eq!(policy.effective_timeout(base, 0), Duration::from_millis(1000));
        assert_eq!(policy.effective_timeout(base, 2), Duration::from_millis(1200));
    }

    #[test]
    fn consecutive_failures_resets_on_success() {
        let c = ConsecutiveFailures::new();
        c.increment();
        c.increment();
        assert_eq!(c.current(), 2);
        c.reset();
        assert_eq!(c.current(), 0);
    }

    #[test]
    fn trips_at_configured_threshold() {
        let c = ConsecutiveFailures::new();
        for _ in 0..3 {
            c.increment();
        }
        assert!(c.has_exceeded(3));
        assert!(!c.has_exceeded(4));
    }
}
