//! `headers_host` / `http_host`: swaps the TCP destination and the
//! `Host:` header between the original authority and the recon cache's
//! resolved IPs for that host. Two variations per `(scheme, ip, port)`:
//! connect to the IP with the original `Host:` header, or connect to
//! the original host with the IP as `Host:`.

use crate::generators::GeneratorContext;
use crate::payload::{BypassPayload, HeaderList};
use crate::recon::ReconService;
use crate::url::RawUrl;

use super::common::payload;
use std::net::IpAddr;

pub fn generate(url: &RawUrl, ctx: &GeneratorContext) -> Vec<BypassPayload> {
    let services = ctx.recon.services_for(&url.hostname);
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for svc in services {
        emit_connect_to_ip(&mut out, &mut seen, url, svc);
        emit_connect_to_host(&mut out, &mut seen, url, svc);
    }

    out
}

fn authority_for(ip: IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(_) => format!("{}:{}", ip, port),
        IpAddr::V6(_) => format!("[{}]:{}", ip, port),
    }
}

fn host_header_value(ip: IpAddr, port: u16, scheme: &str) -> String {
    let default_port = if scheme.eq_ignore_ascii_case("https") { 443 } else { 80 };
    let bracketed = match ip {
        IpAddr::V4(_) => ip.to_string(),
        IpAddr::V6(_) => format!("[{}]", ip),
    };
    if port == default_port {
        bracketed
    } else {
        format!("{}:{}", bracketed, port)
    }
}

fn emit_connect_to_ip(out: &mut Vec<BypassPayload>, seen: &mut std::collections::HashSet<(String, String)>, url: &RawUrl, svc: &ReconService) {
    let new_authority = authority_for(svc.ip, svc.port);
    let key = (new_authority.clone(), url.host.clone());
    if !seen.insert(key) {
        return;
    }
    let headers = HeaderList::new().with("Host", url.host.clone());
    let mut p = payload(url, "GET", url.raw_uri(), headers, "headers_host");
    p.host = new_authority;
    p.scheme = svc.scheme.clone();
    out.push(p);
}

fn emit_connect_to_host(out: &mut Vec<BypassPayload>, seen: &mut std::collections::HashSet<(String, String)>, url: &RawUrl, svc: &ReconService) {
    let host_value = host_header_value(svc.ip, svc.port, &url.scheme);
    let key = (url.host.clone(), host_value.clone());
    if !seen.insert(key) {
        return;
    }
    let headers = HeaderList::new().with("Host", host_value);
    out.push(payload(url, "GET", url.raw_uri(), headers, "headers_host"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recon::ReconCache;
    use crate::wordlist::InMemoryWordlist;

    fn make_recon() -> ReconCache {
        let mut recon = ReconCache::new();
        recon.insert("h", ReconService { scheme: "https".into(), ip: "10.0.0.1".parse().unwrap(), port: 443 });
        recon.insert("h", ReconService { scheme: "https".into(), ip: "::1".parse().unwrap(), port: 8443 });
        recon
    }

    #[test]
    fn connects_to_ip_with_original_host_header() {
        let url = crate::url::parse("https://h/admin").unwrap();
        let recon = make_recon();
        let wl = InMemoryWordlist::new();
        let ctx = GeneratorContext { wordlists: &wl, recon: &recon, spoof_headers: &[], spoof_ips: &[] };
        let payloads = generate(&url, &ctx);
        assert!(payloads.iter().any(|p| p.host == "10.0.0.1:443" && p.headers.get("Host") == Some("h")));
    }

    #[test]
    fn connects_to_host_with_ip_as_host_header_brackets_v6_and_adds_nondefault_port() {
        let url = crate::url::parse("https://h/admin").unwrap();
        let recon = make_recon();
        let wl = InMemoryWordlist::new();
        let ctx = GeneratorContext { wordlists: &wl, recon: &recon, spoof_headers: &[], spoof_ips: &[] };
        let payloads = generate(&url, &ctx);
        assert!(payloads.iter().any(|p| p.host == "h" && p.headers.get("Host") == Some("[::1]:8443")));
        assert!(payloads.iter().any(|p| p.host == "h" && p.headers.get("Host") == Some("10.0.0.1")));
    }

    #[test]
    fn no_recon_services_means_no_payloads() {
        let url = crate::url::parse("https://h/admin").unwrap();
        let recon = ReconCache::new();
        let wl = InMemoryWordlist::new();
        let ctx = GeneratorContext { wordlists: &wl, recon: &recon, spoof_headers: &[], spoof_ips: &[] };
        assert!(generate(&url, &ctx).is_empty());
    }
}
