//! Error-accounting cache. Per-host, bounded aggregation of recent
//! error signatures with counters; also read by the circuit-breaker.
//! `DashMap`-backed for lock-free concurrent access, with a bounded
//! `VecDeque` ring buffer per host for the token FIFO.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use dashmap::DashMap;

/// Entries whose canonicalized message matches one of these substrings
/// are advisory noise, not scan-relevant failures.
const WHITELIST: &[&str] = &["body size exceeds the given limit", "invalid header"];

const DEFAULT_TOKEN_FIFO_CAP: usize = 16;
/// Approximate per-record byte cost used against the size budget, since
/// the cache doesn't track exact heap usage per entry.
const APPROX_BYTES_PER_RECORD: usize = 512;
const DEFAULT_SIZE_BUDGET_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub host: String,
    pub source: String,
    pub module: String,
    pub debug_token: String,
}

#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub count: u64,
    pub first_seen: SystemTime,
    pub last_seen: SystemTime,
    pub per_source: HashMap<String, u64>,
    pub per_module: HashMap<String, u64>,
    pub recent_tokens: VecDeque<String>,
}

impl ErrorRecord {
    fn new(ctx: &ErrorContext, token_fifo_cap: usize) -> Self {
        let now = SystemTime::now();
        let mut per_source = HashMap::new();
        per_source.insert(ctx.source.clone(), 1);
        let mut per_module = HashMap::new();
        per_module.insert(ctx.module.clone(), 1);
        let mut recent_tokens = VecDeque::with_capacity(token_fifo_cap);
        if !ctx.debug_token.is_empty() {
            recent_tokens.push_back(ctx.debug_token.clone());
        }
        Self { count: 1, first_seen: now, last_seen: now, per_source, per_module, recent_tokens }
    }

    fn record(&mut self, ctx: &ErrorContext, token_fifo_cap: usize) {
        self.count += 1;
        self.last_seen = SystemTime::now();
        *self.per_source.entry(ctx.source.clone()).or_insert(0) += 1;
        *self.per_module.entry(ctx.module.clone()).or_insert(0) += 1;
        if !ctx.debug_token.is_empty() {
            if self.recent_tokens.len() >= token_fifo_cap {
                self.recent_tokens.pop_front();
            }
            self.recent_tokens.push_back(ctx.debug_token.clone());
        }
    }
}

/// `(host, normalized-error-signature)` -> `ErrorRecord`.
pub struct ErrorCache {
    records: DashMap<(String, String), ErrorRecord>,
    token_fifo_cap: usize,
    size_budget_bytes: usize,
    approx_bytes: AtomicUsize,
}

impl Default for ErrorCache {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_BUDGET_BYTES, DEFAULT_TOKEN_FIFO_CAP)
    }
}

impl ErrorCache {
    pub fn new(size_budget_bytes: usize, token_fifo_cap: usize) -> Self {
        Self {
            records: DashMap::new(),
            token_fifo_cap: token_fifo_cap.clamp(5, 16),
            size_budget_bytes,
            approx_bytes: AtomicUsize::new(0),
        }
    }

    /// Canonicalize platform-specific wording so "connection reset by
    /// peer" and friends collapse to one signature regardless of OS.
    pub fn canonicalize(message: &str) -> String {
        let lower = message.to_ascii_lowercase();
        if lower.contains("reset") && (lower.contains("peer") || lower.contains("connection")) {
            return "connection reset by peer".to_string();
        }
        if lower.contains("broken pipe") {
            return "broken pipe".to_string();
        }
        if lower.contains("timed out") || lower.contains("timeout") {
            return "operation timed out".to_string();
        }
        if lower.contains("refused") {
            return "connection refused".to_string();
        }
        lower
    }

    fn is_whitelisted(message: &str) -> bool {
        let lower = message.to_ascii_lowercase();
        WHITELIST.iter().any(|w| lower.contains(w))
    }

    /// Handle one error occurrence. Returns `None` for whitelisted
    /// messages (no-op); otherwise records the occurrence
    /// and returns `None` as well — the cache is advisory telemetry, it
    /// never itself produces a wrapped error (the retry/circuit-break
    /// layer does that).
    pub fn handle(&self, raw_message: &str, ctx: ErrorContext) {
        if Self::is_whitelisted(raw_message) {
            return;
        }
        let signature = Self::canonicalize(raw_message);
        let key = (ctx.host.clone(), signature);

        let is_new = !self.records.contains_key(&key);
        self.records
            .entry(key)
            .and_modify(|r| r.record(&ctx, self.token_fifo_cap))
            .or_insert_with(|| ErrorRecord::new(&ctx, self.token_fifo_cap));

        if is_new {
            self.approx_bytes.fetch_add(APPROX_BYTES_PER_RECORD, Ordering::Relaxed);
            self.evict_if_over_budget();
        }
    }

    fn evict_if_over_budget(&self) {
        while self.approx_bytes.load(Ordering::Relaxed) > self.size_budget_bytes {
            let oldest = self
                .records
                .iter()
                .min_by_key(|entry| entry.value().last_seen)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.records.remove(&key);
                    self.approx_bytes.fetch_sub(APPROX_BYTES_PER_RECORD, Ordering::Relaxed);
                }
                None => break,
            }
        }
    }

    /// Drop every record for `host` (e.g. on a fresh circuit-breaker
    /// reset for that host).
    pub fn reset_host(&self, host: &str) {
        self.records.retain(|(h, _), _| h != host);
    }

    pub fn count_for(&self, host: &str, signature: &str) -> u64 {
        self.records.get(&(host.to_string(), signature.to_string())).map(|r| r.count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Human-readable report grouped by host -> error -> sources/modules/tokens.
    pub fn print_stats(&self) {
        let mut by_host: HashMap<String, Vec<((String, String), ErrorRecord)>> = HashMap::new();
        for entry in self.records.iter() {
            let (host, sig) = entry.key().clone();
            by_host.entry(host.clone()).or_default().push(((host, sig), entry.value().clone()));
        }

        for (host, mut entries) in by_host {
            println!("host: {}", host);
            entries.sort_by(|a, b| b.1.count.cmp(&a.1.count));
            for ((_, signature), record) in entries {
                println!("  error: {} (x{})", signature, record.count);
                println!("    sources: {:?}", record.per_source);
                println!("    modules: {:?}", record.per_module);
                println!("    recent tokens: {:?}", record.recent_tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(host: &str, source: &str, module: &str, token: &str) -> ErrorContext {
        ErrorContext { host: host.into(), source: source.into(), module: module.into(), debug_token: token.into() }
    }

    #[test]
    fn whitelisted_messages_are_a_no_op() {
        let cache = ErrorCache::default();
        cache.handle("body size exceeds the given limit", ctx("h", "client", "mid_paths", "tok1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn canonicalizes_platform_specific_reset_wording() {
        let cache = ErrorCache::default();
        cache.handle("read: connection reset by peer", ctx("h", "client", "mid_paths", "tok1"));
        cache.handle("An existing connection was forcibly closed (reset)", ctx("h", "client", "end_paths", "tok2"));
        assert_eq!(cache.count_for("h", "connection reset by peer"), 2);
    }

    #[test]
    fn bounded_fifo_of_recent_tokens() {
        let cache = ErrorCache::new(DEFAULT_SIZE_BUDGET_BYTES, 5);
        for i in 0..10 {
            cache.handle("connection reset", ctx("h", "client", "mid_paths", &format!("tok{}", i)));
        }
        let key = ("h".to_string(), "connection reset by peer".to_string());
        let record = cache.records.get(&key).unwrap();
        assert_eq!(record.recent_tokens.len(), 5);
        assert_eq!(record.recent_tokens.back().unwrap(), "tok9");
    }

    #[test]
    fn per_module_and_per_source_counters_increment() {
        let cache = ErrorCache::default();
        cache.handle("connection reset", ctx("h", "client", "mid_paths", "t1"));
        cache.handle("connection reset", ctx("h", "client", "mid_paths", "t2"));
        cache.handle("connection reset", ctx("h", "client", "end_paths", "t3"));
        let key = ("h".to_string(), "connection reset by peer".to_string());
        let record = cache.records.get(&key).unwrap();
        assert_eq!(record.per_module.get("mid_paths"), Some(&2));
        assert_eq!(record.per_module.get("end_paths"), Some(&1));
    }

    #[test]
    fn reset_host_clears_only_that_hosts_records() {
        let cache = ErrorCache::default();
        cache.handle("connection reset", ctx("a", "client", "m", "t1"));
        cache.handle("connection reset", ctx("b", "client", "m", "t2"));
        cache.reset_host("a");
        assert_eq!(cache.count_for("a", "connection reset by peer"), 0);
        assert_eq!(cache.count_for("b", "connection reset by peer"), 1);
    }
}
