//! Recon cache interface. DNS/TLS probing of candidate hosts is out of
//! scope for the core; this module defines only the shape the
//! `headers_host`/`http_host` generator consumes, populated by an
//! external collaborator.

use std::collections::HashMap;
use std::net::IpAddr;

/// One resolved service behind a host: an IP reachable on a given port
/// over a given scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconService {
    pub scheme: String,
    pub ip: IpAddr,
    pub port: u16,
}

/// `host -> [ReconService]` map, populated by the external recon
/// collaborator. The core only reads it.
#[derive(Debug, Clone, Default)]
pub struct ReconCache {
    services: HashMap<String, Vec<ReconService>>,
}

impl ReconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: impl Into<String>, service: ReconService) {
        self.services.entry(host.into()).or_default().push(service);
    }

    pub fn services_for(&self, host: &str) -> &[ReconService] {
        self.services.get(host).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_empty_slice_for_unknown_host() {
        let cache = ReconCache::new();
        assert!(cache.services_for("nope.example.com").is_empty());
    }

    #[test]
    fn stores_multiple_services_per_host() {
        let mut cache = ReconCache::new();
        cache.insert("h", ReconService { scheme: "https".into(), ip: "10.0.0.1".parse().unwrap(), port: 443 });
        cache.insert("h", ReconService { scheme: "http".into(), ip: "10.0.0.2".parse().unwrap(), port: 80 });
        assert_eq!(cache.services_for("h").len(), 2);
    }
}
