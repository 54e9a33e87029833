//! Scanner loop: the single-threaded driver that selects
//! enabled modules, establishes a baseline, and turns worker-pool output
//! into findings. A plain driver function composing the generator,
//! worker pool, and sink, with no object hierarchy.

use std::sync::Arc;

use crate::config::ScannerConfig;
use crate::error::BypassError;
use crate::error_cache::ErrorCache;
use crate::generators::{self, GeneratorContext, ALL_MODULES};
use crate::http_client::ResponseSummary;
use crate::recon::ReconCache;
use crate::url::{self, RawUrl};
use crate::wordlist::WordlistSource;
use crate::worker_pool::{Outcome, WorkerPool};

/// A baseline snapshot taken from the `dumb_check` response for one URL.
#[derive(Debug, Clone)]
struct Baseline {
    status: u16,
    content_length_bucket: u64,
    preview_hash: u64,
}

impl Baseline {
    fn from_summary(summary: &ResponseSummary) -> Self {
        Self { status: summary.status, content_length_bucket: length_bucket(summary), preview_hash: summary.preview_hash }
    }

    /// A summary is a finding if at least one of (status, bucket, hash) differs.
    fn differs(&self, summary: &ResponseSummary) -> bool {
        self.status != summary.status
            || self.content_length_bucket != length_bucket(summary)
            || self.preview_hash != summary.preview_hash
    }
}

/// Content length is bucketed on a log2 scale so near-identical body
/// sizes (e.g. off-by-one whitespace) don't register as a difference.
fn length_bucket(summary: &ResponseSummary) -> u64 {
    match summary.content_length.or_else(|| Some(summary.preview.len() as u64)) {
        Some(0) | None => 0,
        Some(len) => 64 - (len.leading_zeros() as u64),
    }
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub target_url: String,
    pub module: String,
    pub summary: ResponseSummaryView,
}

/// Owned subset of `ResponseSummary` cheap enough to hand to a sink
/// without forcing the sink to depend on `http_client`'s full type.
#[derive(Debug, Clone)]
pub struct ResponseSummaryView {
    pub request_url: String,
    pub status: u16,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub title: String,
    pub debug_token: String,
    pub curl_command: String,
}

impl From<&ResponseSummary> for ResponseSummaryView {
    fn from(s: &ResponseSummary) -> Self {
        Self {
            request_url: s.request_url.clone(),
            status: s.status,
            content_length: s.content_length,
            content_type: s.content_type.clone(),
            title: s.title.clone(),
            debug_token: s.debug_token.clone(),
            curl_command: s.curl_command.clone(),
        }
    }
}

/// The persistence collaborator is external; the core only needs
/// somewhere to hand findings to.
pub trait FindingsSink {
    fn emit(&self, finding: Finding);
}

/// Run a full scan over `targets` and report findings to `sink`.
pub fn run(
    targets: &[String],
    config: &ScannerConfig,
    wordlists: &dyn WordlistSource,
    recon: &ReconCache,
    sink: &dyn FindingsSink,
) -> Result<(), BypassError> {
    let error_cache = Arc::new(ErrorCache::default());
    let pool = WorkerPool::new(config, Arc::clone(&error_cache));
    let modules = config.enabled_modules(ALL_MODULES);

    let mut first_failure = None;
    for target in targets {
        if let Err(e) = scan_one(target, config, &modules, wordlists, recon, &pool, sink) {
            crate::logging::log_error(&format!("scan of {} aborted: {}", target, e));
            first_failure.get_or_insert(e);
        }
    }

    if config.debug_logging {
        pool.metrics.print();
        error_cache.print_stats();
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn scan_one(
    target: &str,
    config: &ScannerConfig,
    modules: &[String],
    wordlists: &dyn WordlistSource,
    recon: &ReconCache,
    pool: &WorkerPool,
    sink: &dyn FindingsSink,
) -> Result<(), BypassError> {
    let parsed = url::parse(target)?;

    let baseline_payloads = generators::generate("dumb_check", &parsed, &GeneratorContext {
        wordlists,
        recon,
        spoof_headers: &config.spoof_headers,
        spoof_ips: &config.spoof_ips,
    })?;
    let baseline_outcomes = pool.run_batch(baseline_payloads);
    let baseline_failure = baseline_outcomes.iter().find_map(|o| match o {
        Outcome::Failed { error, .. } => Some(error.clone()),
        Outcome::Summary(_) => None,
    });
    let baseline_summary = baseline_outcomes.into_iter().find_map(|o| match o {
        Outcome::Summary(s) => Some(s),
        Outcome::Failed { .. } => None,
    });
    let Some(baseline_summary) = baseline_summary else {
        return Err(baseline_failure.unwrap_or_else(|| crate::error::utils::transport_non_retryable("baseline check produced no outcome")));
    };
    let baseline = Baseline::from_summary(&baseline_summary);

    for module in modules {
        if module == "dumb_check" {
            continue;
        }

        let ctx = GeneratorContext { wordlists, recon, spoof_headers: &config.spoof_headers, spoof_ips: &config.spoof_ips };
        let payloads = match generators::generate(module, &parsed, &ctx) {
            Ok(p) => p,
            Err(e) => {
                crate::logging::log_error(&format!("{} generation failed for {}: {}", module, target, e));
                continue;
            }
        };
        if payloads.is_empty() {
            continue;
        }

        let mut batch_cancelled = false;
        for outcome in pool.run_batch(payloads) {
            match outcome {
                Outcome::Failed { error: BypassError::ExceededConsecutiveFailures { .. }, .. } => {
                    batch_cancelled = true;
                }
                Outcome::Failed { .. } => {}
                Outcome::Summary(summary) => {
                    if !passes_filters(&config.filters, &summary) {
                        continue;
                    }
                    if baseline.differs(&summary) {
                        sink.emit(Finding {
                            target_url: target.to_string(),
                            module: module.clone(),
                            summary: ResponseSummaryView::from(&summary),
                        });
                    }
                }
            }
        }

        if batch_cancelled {
            crate::logging::log(&format!("{} circuit-broken, skipping remaining modules", parsed.host));
            break;
        }
    }

    Ok(())
}

fn passes_filters(filters: &crate::config::MatchFilters, summary: &ResponseSummary) -> bool {
    if !filters.status_allows(summary.status) {
        return false;
    }
    if let Some(ct) = &summary.content_type {
        if !filters.content_type_allows(ct) {
            return false;
        }
    } else if !filters.content_types.is_empty() {
        return false;
    }
    if let Some(len) = summary.content_length {
        if !filters.content_length_allows(len) {
            return false;
        }
    }
    true
}
