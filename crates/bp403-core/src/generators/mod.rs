//! Payload generators: a closed set of tagged variants,
//! dispatched by module id, each producing `BypassPayload`s for one
//! target URL. Modeled as a dispatch table rather than open polymorphism:
//! the module set is fixed, so a plain `match` on module id beats a
//! trait-object registry.

mod case_substitution;
mod char_encode;
pub mod common;
mod dumb_check;
mod end_paths;
mod gateway_bypasses;
mod headers_host;
mod headers_ip;
mod headers_port;
mod headers_scheme;
mod headers_url;
mod http_methods;
mod mid_paths;
mod path_prefix;
mod unicode_path_normalization;

use crate::error::BypassError;
use crate::payload::BypassPayload;
use crate::recon::ReconCache;
use crate::url::RawUrl;
use crate::wordlist::WordlistSource;

/// Every module id the core knows how to generate, in a stable order
/// used when a caller asks for `"all"`.
pub const ALL_MODULES: &[&str] = &[
    "dumb_check",
    "mid_paths",
    "end_paths",
    "path_prefix",
    "case_substitution",
    "char_encode",
    "unicode_path_normalization",
    "http_methods",
    "nginx_bypasses",
    "haproxy_bypasses",
    "headers_ip",
    "headers_scheme",
    "headers_port",
    "headers_url",
    "headers_host",
    "http_host",
];

/// Per-run inputs a generator may consult beyond the target URL:
/// user-supplied spoof lists and the external recon cache.
pub struct GeneratorContext<'a> {
    pub wordlists: &'a dyn WordlistSource,
    pub recon: &'a ReconCache,
    pub spoof_headers: &'a [String],
    pub spoof_ips: &'a [String],
}

/// Generate payloads for `module_name` against `url`. Unknown module
/// names are a config error (the CLI collaborator validates module
/// names before reaching this point, but the core stays defensive).
pub fn generate(module_name: &str, url: &RawUrl, ctx: &GeneratorContext) -> Result<Vec<BypassPayload>, BypassError> {
    match module_name {
        "dumb_check" => Ok(dumb_check::generate(url)),
        "mid_paths" => mid_paths::generate(url, ctx),
        "end_paths" => end_paths::generate(url, ctx),
        "path_prefix" => path_prefix::generate(url, ctx),
        "case_substitution" => Ok(case_substitution::generate(url)),
        "char_encode" => Ok(char_encode::generate(url)),
        "unicode_path_normalization" => unicode_path_normalization::generate(url, ctx),
        "http_methods" => http_methods::generate(url, ctx),
        "nginx_bypasses" => Ok(gateway_bypasses::generate_nginx(url)),
        "haproxy_bypasses" => Ok(gateway_bypasses::generate_haproxy(url)),
        "headers_ip" => Ok(headers_ip::generate(url, ctx)),
        "headers_scheme" => Ok(headers_scheme::generate(url)),
        "headers_port" => Ok(headers_port::generate(url)),
        "headers_url" => Ok(headers_url::generate(url)),
        "headers_host" | "http_host" => Ok(headers_host::generate(url, ctx)),
        other => Err(crate::error::utils::config_error("generators::generate", format!("unknown module \"{}\"", other))),
    }
}
