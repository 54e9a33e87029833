//! Thin CLI layer: parse args, assemble a `ScannerConfig`, load wordlists
//! and the substitute-hosts file from disk, and drive `bp403_core::scanner`.
//! All scan logic lives in `bp403-core`; this binary only does I/O the
//! core treats as an external collaborator.

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bp403_core::config::{MatchFilters, ProxyConfig, ScannerConfig, StatusMatch};
use bp403_core::recon::{ReconCache, ReconService};
use bp403_core::scanner::{Finding, FindingsSink};
use bp403_core::wordlist::WordlistSource;
use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;

// ---- UI helpers (no-op styling when stdout isn't a TTY) ----

fn use_color() -> bool {
    std::io::stdout().is_terminal() && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn success(msg: &str) {
    if use_color() {
        println!("{}", msg.green());
    } else {
        println!("{}", msg);
    }
}

fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

fn info(msg: &str) {
    if use_color() {
        println!("{}", msg.cyan());
    } else {
        println!("{}", msg);
    }
}

fn dim(msg: &str) {
    if use_color() {
        println!("{}", msg.dimmed());
    } else {
        println!("{}", msg);
    }
}

/// Loads named wordlists from `<dir>/<name>.txt`, one entry per line.
/// Filesystem I/O is out of the core's scope; this is the CLI's loader.
struct FileWordlistSource {
    dir: PathBuf,
}

impl WordlistSource for FileWordlistSource {
    fn load(&self, name: &str, max_lines: usize) -> Result<Vec<String>, bp403_core::BypassError> {
        let path = self.dir.join(format!("{}.txt", name));
        let contents = fs::read_to_string(&path)
            .map_err(|e| bp403_core::error::utils::wordlist_unavailable(name, format!("{}: {}", path.display(), e)))?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(max_lines)
            .map(str::to_string)
            .collect())
    }
}

/// Parses a substitute-hosts file: one `host scheme ip port` entry per
/// line, blank lines and `#`-comments ignored. Exact format is a CLI
/// concern the core has no opinion on.
fn load_recon_cache(path: &Path) -> ReconCache {
    let mut recon = ReconCache::new();
    let Ok(contents) = fs::read_to_string(path) else {
        error(&format!("could not read substitute-hosts file {}", path.display()));
        return recon;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [host, scheme, ip, port] = fields[..] else {
            error(&format!("ignoring malformed substitute-hosts line: {}", line));
            continue;
        };
        let (Ok(ip), Ok(port)) = (ip.parse(), port.parse()) else {
            error(&format!("ignoring substitute-hosts line with bad ip/port: {}", line));
            continue;
        };
        recon.insert(host, ReconService { scheme: scheme.to_string(), ip, port });
    }
    recon
}

struct ConsoleSink {
    debug: bool,
}

impl FindingsSink for ConsoleSink {
    fn emit(&self, finding: Finding) {
        let line = format!(
            "[{}] {} {} -> {} (len={})",
            finding.module,
            finding.summary.status,
            finding.target_url,
            finding.summary.request_url,
            finding.summary.content_length.map(|l| l.to_string()).unwrap_or_else(|| "?".into())
        );
        success(&line);
        if !finding.summary.title.is_empty() {
            dim(&format!("    title: {}", finding.summary.title));
        }
        if self.debug {
            dim(&format!("    token: {}", finding.summary.debug_token));
            dim(&format!("    repro: {}", finding.summary.curl_command));
        }
    }
}

fn parse_status_list(raw: &str) -> Vec<StatusMatch> {
    raw.split(',').filter_map(StatusMatch::parse).collect()
}

fn parse_proxy(raw: &str) -> Option<ProxyConfig> {
    let stripped = raw.trim_start_matches("http://").trim_start_matches("https://");
    let (host, port) = stripped.rsplit_once(':')?;
    Some(ProxyConfig { host: host.to_string(), port: port.parse().ok()? })
}

fn parse_custom_header(raw: &str) -> Option<(String, String)> {
    let (name, value) = raw.split_once(':')?;
    Some((name.trim().to_string(), value.trim().to_string()))
}

fn build_cli() -> Command {
    Command::new("bp403")
        .about("403/401 access-control bypass scanner")
        .arg(Arg::new("url").help("Target URL").required(true))
        .arg(Arg::new("url-file").long("url-file").help("File of target URLs, one per line"))
        .arg(Arg::new("wordlists-dir").long("wordlists-dir").default_value("wordlists"))
        .arg(Arg::new("substitute-hosts").long("substitute-hosts").help("File of resolved host candidates for headers_host"))
        .arg(Arg::new("modules").long("modules").default_value("all"))
        .arg(Arg::new("concurrent-requests").long("concurrent-requests").value_parser(clap::value_parser!(usize)))
        .arg(Arg::new("timeout").long("timeout").value_parser(clap::value_parser!(u64)).help("Per-attempt timeout, ms"))
        .arg(Arg::new("delay").long("delay").value_parser(clap::value_parser!(u64)).help("Request delay, ms"))
        .arg(Arg::new("max-retries").long("max-retries").value_parser(clap::value_parser!(u32)))
        .arg(Arg::new("retry-delay").long("retry-delay").value_parser(clap::value_parser!(u64)))
        .arg(Arg::new("max-consecutive-fails").long("max-consecutive-fails").value_parser(clap::value_parser!(u32)))
        .arg(Arg::new("auto-throttle").long("auto-throttle").action(ArgAction::SetTrue))
        .arg(Arg::new("match-status-code").long("match-status-code"))
        .arg(Arg::new("match-content-type").long("match-content-type"))
        .arg(Arg::new("min-content-length").long("min-content-length").value_parser(clap::value_parser!(u64)))
        .arg(Arg::new("max-content-length").long("max-content-length").value_parser(clap::value_parser!(u64)))
        .arg(Arg::new("proxy").long("proxy"))
        .arg(Arg::new("spoof-header").long("spoof-header").action(ArgAction::Append))
        .arg(Arg::new("spoof-ip").long("spoof-ip").action(ArgAction::Append))
        .arg(Arg::new("custom-http-headers").long("custom-http-headers").action(ArgAction::Append))
        .arg(Arg::new("response-body-preview-size").long("response-body-preview-size").value_parser(clap::value_parser!(usize)))
        .arg(Arg::new("disable-response-body-streaming").long("disable-response-body-streaming").action(ArgAction::SetTrue))
        .arg(Arg::new("debug").long("debug").action(ArgAction::SetTrue))
}

fn main() {
    let matches = build_cli().get_matches();

    let mut targets = Vec::new();
    targets.push(matches.get_one::<String>("url").unwrap().clone());
    if let Some(path) = matches.get_one::<String>("url-file") {
        match fs::read_to_string(path) {
            Ok(contents) => targets.extend(contents.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string)),
            Err(e) => {
                error(&format!("could not read url file {}: {}", path, e));
                std::process::exit(1);
            }
        }
    }

    let wordlists = FileWordlistSource { dir: PathBuf::from(matches.get_one::<String>("wordlists-dir").unwrap()) };
    let recon = match matches.get_one::<String>("substitute-hosts") {
        Some(path) => load_recon_cache(Path::new(path)),
        None => ReconCache::new(),
    };

    let modules: Vec<String> = matches
        .get_one::<String>("modules")
        .unwrap()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let mut filters = MatchFilters::default();
    if let Some(raw) = matches.get_one::<String>("match-status-code") {
        filters.status_codes = parse_status_list(raw);
    }
    if let Some(raw) = matches.get_one::<String>("match-content-type") {
        filters.content_types = raw.split(',').map(str::trim).map(str::to_string).collect();
    }
    filters.min_content_length = matches.get_one::<u64>("min-content-length").copied();
    filters.max_content_length = matches.get_one::<u64>("max-content-length").copied();

    let spoof_headers: Vec<String> = matches.get_many::<String>("spoof-header").map(|v| v.cloned().collect()).unwrap_or_default();
    let spoof_ips: Vec<String> = matches.get_many::<String>("spoof-ip").map(|v| v.cloned().collect()).unwrap_or_default();
    let custom_headers: Vec<(String, String)> = matches
        .get_many::<String>("custom-http-headers")
        .map(|v| v.filter_map(|raw| parse_custom_header(raw)).collect())
        .unwrap_or_default();

    let defaults = ScannerConfig::default();
    let config = ScannerConfig {
        modules,
        concurrent_requests: matches.get_one::<usize>("concurrent-requests").copied().unwrap_or(defaults.concurrent_requests),
        timeout: matches.get_one::<u64>("timeout").map(Duration::from_millis).unwrap_or(defaults.timeout),
        request_delay: matches.get_one::<u64>("delay").map(Duration::from_millis).unwrap_or(defaults.request_delay),
        max_retries: matches.get_one::<u32>("max-retries").copied().unwrap_or(defaults.max_retries),
        retry_delay: matches.get_one::<u64>("retry-delay").map(Duration::from_millis).unwrap_or(defaults.retry_delay),
        max_consecutive_fails: matches.get_one::<u32>("max-consecutive-fails").copied().unwrap_or(defaults.max_consecutive_fails),
        auto_throttle: matches.get_flag("auto-throttle"),
        filters,
        proxy: matches.get_one::<String>("proxy").and_then(|raw| parse_proxy(raw)),
        spoof_headers,
        spoof_ips,
        custom_headers,
        response_body_preview_size: matches
            .get_one::<usize>("response-body-preview-size")
            .copied()
            .unwrap_or(defaults.response_body_preview_size),
        max_response_body_size: defaults.max_response_body_size,
        disable_response_body_streaming: matches.get_flag("disable-response-body-streaming"),
        follow_redirects: false,
        debug_logging: matches.get_flag("debug"),
    };

    info(&format!("scanning {} target(s) with modules: {}", targets.len(), config.modules.join(",")));

    let sink = ConsoleSink { debug: config.debug_logging };
    let progress = if std::io::stdout().is_terminal() {
        let bar = ProgressBar::new(targets.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap(),
        );
        Some(bar)
    } else {
        None
    };

    let mut had_error = false;
    for target in &targets {
        if let Some(bar) = &progress {
            bar.set_message(target.clone());
        }
        if let Err(e) = bp403_core::scanner::run(std::slice::from_ref(target), &config, &wordlists, &recon, &sink) {
            error(&format!("scan of {} failed: {}", target, e));
            had_error = true;
        }
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    if had_error {
        std::process::exit(1);
    }
}

