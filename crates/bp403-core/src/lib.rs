//! Core request-generation and dispatch engine for a 403/401
//! access-control bypass scanner: payload generators, the debug-token
//! codec, the raw HTTP client and its dialer, the error-accounting
//! cache, the adaptive throttler and retry policy, the worker pool, and
//! the scanner loop that drives them. One flat module per concern,
//! re-exported from the top.

pub mod config;
pub mod dialer;
pub mod error;
pub mod error_cache;
pub mod generators;
pub mod http_client;
pub mod logging;
pub mod payload;
pub mod recon;
pub mod retry;
pub mod scanner;
pub mod throttle;
pub mod token;
pub mod url;
pub mod wordlist;
pub mod worker_pool;

pub use config::ScannerConfig;
pub use error::BypassError;
pub use payload::BypassPayload;
pub use scanner::{Finding, FindingsSink};
