//! Request worker pool: a fixed-size pool of workers
//! draining a shared input queue of payloads and emitting `ResponseSummary`
//! records over a bounded output channel for backpressure. No
//! per-worker local queues or work-stealing; a shared crossbeam channel
//! is enough concurrency control for this workload.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::config::ScannerConfig;
use crate::dialer::DialOptions;
use crate::error::BypassError;
use crate::error_cache::{ErrorCache, ErrorContext};
use crate::http_client::{self, RequestOptions, ResponseSummary};
use crate::payload::BypassPayload;
use crate::retry::{ConsecutiveFailures, RetryPolicy};
use crate::throttle::ThrottlerState;

/// Request counters and byte totals across every batch a pool runs.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_failed: AtomicU64,
    bytes_downloaded: AtomicU64,
    bytes_uploaded: AtomicU64,
}

impl ClientMetrics {
    fn record(&self, success: bool, bytes_down: u64, bytes_up: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_downloaded.fetch_add(bytes_down, Ordering::Relaxed);
        self.bytes_uploaded.fetch_add(bytes_up, Ordering::Relaxed);
    }

    /// `(total, success, failed, bytes_downloaded, bytes_uploaded)`.
    pub fn snapshot(&self) -> (u64, u64, u64, u64, u64) {
        (
            self.requests_total.load(Ordering::Relaxed),
            self.requests_success.load(Ordering::Relaxed),
            self.requests_failed.load(Ordering::Relaxed),
            self.bytes_downloaded.load(Ordering::Relaxed),
            self.bytes_uploaded.load(Ordering::Relaxed),
        )
    }

    pub fn print(&self) {
        let (total, success, failed, down, up) = self.snapshot();
        crate::logging::log(&format!(
            "requests: {} total, {} ok, {} failed; {} bytes down, {} bytes up",
            total, success, failed, down, up
        ));
    }
}

/// Per-host mutable state shared across workers processing the same batch.
struct HostState {
    throttler: ThrottlerState,
    failures: ConsecutiveFailures,
}

impl HostState {
    fn new() -> Self {
        Self { throttler: ThrottlerState::default(), failures: ConsecutiveFailures::new() }
    }
}

/// Outcome of one payload after retries: either a response, or the
/// terminal error that ended the batch for its host.
pub enum Outcome {
    Summary(ResponseSummary),
    Failed { payload_token: String, host: String, error: BypassError },
}

pub struct WorkerPool {
    size: usize,
    request_delay: Duration,
    max_consecutive_fails: u32,
    auto_throttle: bool,
    retry_policy: RetryPolicy,
    request_options: RequestOptions,
    dial_opts: DialOptions,
    error_cache: Arc<ErrorCache>,
    pub metrics: ClientMetrics,
}

impl WorkerPool {
    pub fn new(config: &ScannerConfig, error_cache: Arc<ErrorCache>) -> Self {
        Self {
            size: config.concurrent_requests.max(1),
            request_delay: config.request_delay,
            max_consecutive_fails: config.max_consecutive_fails,
            auto_throttle: config.auto_throttle,
            retry_policy: RetryPolicy { max_retries: config.max_retries, retry_delay: config.retry_delay },
            request_options: RequestOptions {
                timeout: config.timeout,
                connect_timeout: Duration::from_secs(5),
                force_close: false,
                disable_streaming: config.disable_response_body_streaming,
                debug_mode: config.debug_logging,
                response_body_preview_size: config.effective_preview_size(),
                custom_headers: config.custom_headers.clone(),
            },
            dial_opts: DialOptions { connect_timeout: Duration::from_secs(5), proxy: config.proxy.clone() },
            error_cache,
            metrics: ClientMetrics::default(),
        }
    }

    /// Drain `payloads` through `self.size` workers and return every
    /// outcome. Emission order is not guaranteed.
    pub fn run_batch(&self, payloads: Vec<BypassPayload>) -> Vec<Outcome> {
        if payloads.is_empty() {
            return Vec::new();
        }

        let (in_tx, in_rx) = crossbeam::channel::bounded::<BypassPayload>(payloads.len());
        for p in payloads {
            let _ = in_tx.send(p);
        }
        drop(in_tx);

        let (out_tx, out_rx) = crossbeam::channel::bounded::<Outcome>(self.size * 4);
        let cancelled = Arc::new(AtomicBool::new(false));
        let host_states: Arc<DashMap<String, Arc<HostState>>> = Arc::new(DashMap::new());

        std::thread::scope(|scope| {
            // Must run concurrently with the workers below: they block on
            // `out_tx.send` once the channel fills, so nothing here may
            // wait until after the scope returns to start draining.
            let collector = scope.spawn(move || out_rx.iter().collect::<Vec<Outcome>>());

            for _ in 0..self.size {
                let in_rx = in_rx.clone();
                let out_tx = out_tx.clone();
                let cancelled = Arc::clone(&cancelled);
                let host_states = Arc::clone(&host_states);
                scope.spawn(move || {
                    while let Ok(payload) = in_rx.recv() {
                        if cancelled.load(Ordering::Relaxed) {
                            continue;
                        }
                        let outcome = self.process_one(&payload, &host_states, &cancelled);
                        if out_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(out_tx);

            collector.join().expect("collector thread panicked")
        })
    }

    fn host_state(&self, host_states: &DashMap<String, Arc<HostState>>, host: &str) -> Arc<HostState> {
        host_states.entry(host.to_string()).or_insert_with(|| Arc::new(HostState::new())).clone()
    }

    fn process_one(&self, payload: &BypassPayload, host_states: &DashMap<String, Arc<HostState>>, cancelled: &AtomicBool) -> Outcome {
        let host = payload.host.clone();
        let state = self.host_state(host_states, &host);

        if self.auto_throttle {
            state.throttler.wait_if_enabled();
        }
        if self.request_delay > Duration::ZERO {
            std::thread::sleep(self.request_delay);
        }

        let mut opts = self.request_options.clone();
        let mut last_err = String::new();
        let mut attempts = 0u32;

        for attempt in 0..self.retry_policy.max_attempts() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            attempts = attempt + 1;
            opts.force_close = attempt > 0;
            opts.timeout = self.retry_policy.effective_timeout(self.request_options.timeout, attempt);

            let uploaded = payload.raw_uri.len() as u64 + payload.method.len() as u64;
            match http_client::send(payload, &opts, &self.dial_opts) {
                Ok(summary) => {
                    self.metrics.record(true, summary.preview.len() as u64, uploaded);
                    if self.auto_throttle {
                        state.throttler.observe_status(summary.status);
                    }
                    state.failures.reset();
                    return Outcome::Summary(summary);
                }
                Err(e) => {
                    self.metrics.record(false, 0, uploaded);
                    let message = e.to_string();
                    self.error_cache.handle(
                        &message,
                        ErrorContext {
                            host: host.clone(),
                            source: "worker_pool".to_string(),
                            module: payload.bypass_module.clone(),
                            debug_token: payload.payload_token.clone(),
                        },
                    );
                    last_err = message.clone();
                    if !matches!(e, BypassError::TransportRetryable { .. }) {
                        break;
                    }
                    if message.contains("header parse error") {
                        opts.disable_streaming = true;
                    }
                    if attempt + 1 < self.retry_policy.max_attempts() {
                        std::thread::sleep(self.retry_policy.retry_delay);
                    }
                }
            }
        }

        let count = state.failures.increment();
        if count >= self.max_consecutive_fails {
            cancelled.store(true, Ordering::Relaxed);
            return Outcome::Failed {
                payload_token: payload.payload_token.clone(),
                host: host.clone(),
                error: BypassError::ExceededConsecutiveFailures { host, count },
            };
        }

        Outcome::Failed {
            payload_token: payload.payload_token.clone(),
            host: host.clone(),
            error: BypassError::ExhaustedRetries { host, attempts, last: last_err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::HeaderList;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn config_with(size: usize) -> ScannerConfig {
        ScannerConfig { concurrent_requests: size, max_retries: 0, timeout: Duration::from_millis(500), ..Default::default() }
    }

    #[test]
    fn run_batch_returns_one_outcome_per_payload() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            for _ in 0..3 {
                if let Ok((mut stream, _)) = listener.accept() {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf);
                    let body = b"ok";
                    let resp = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", body.len());
                    let _ = stream.write_all(resp.as_bytes());
                    let _ = stream.write_all(body);
                }
            }
        });

        let pool = WorkerPool::new(&config_with(2), Arc::new(ErrorCache::default()));
        let payloads: Vec<BypassPayload> = (0..3)
            .map(|i| {
                let mut p = BypassPayload::new("http", format!("127.0.0.1:{}", port), "GET", "/", HeaderList::new(), "dumb_check", "http://x/");
                p.payload_token = format!("tok{}", i);
                p
            })
            .collect();

        let outcomes = pool.run_batch(payloads);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| matches!(o, Outcome::Summary(s) if s.status == 200)));
        server.join().unwrap();
    }

    #[test]
    fn metrics_count_successes_and_failures() {
        let pool = WorkerPool::new(&config_with(1), Arc::new(ErrorCache::default()));
        let mut p = BypassPayload::new("http", "127.0.0.1:1", "GET", "/", HeaderList::new(), "dumb_check", "http://x/");
        p.payload_token = "tok".into();
        let _ = pool.run_batch(vec![p]);
        let (total, success, failed, _, _) = pool.metrics.snapshot();
        assert_eq!(total, 1);
        assert_eq!(success, 0);
        assert_eq!(failed, 1);
    }

    #[test]
    fn empty_batch_returns_no_outcomes() {
        let pool = WorkerPool::new(&config_with(2), Arc::new(ErrorCache::default()));
        assert!(pool.run_batch(Vec::new()).is_empty());
    }

    #[test]
    fn connection_failure_produces_exhausted_retries_outcome() {
        let pool = WorkerPool::new(&config_with(1), Arc::new(ErrorCache::default()));
        let mut p = BypassPayload::new("http", "127.0.0.1:1", "GET", "/", HeaderList::new(), "dumb_check", "http://x/");
        p.payload_token = "tok".into();
        let outcomes = pool.run_batch(vec![p]);
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], Outcome::Failed { .. }));
    }
}
