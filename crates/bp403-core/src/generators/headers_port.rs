//! `headers_port`: cross-product of port-spoofing header names and
//! internal port values.

use crate::payload::{BypassPayload, HeaderList};
use crate::url::RawUrl;

use super::common::payload;

const PORT_HEADERS: &[&str] = &["X-Forwarded-Port", "X-Original-Port", "X-Forwarded-Host-Port"];
const INTERNAL_PORTS: &[&str] = &["80", "443", "8080", "8443", "3000", "8000"];

pub fn generate(url: &RawUrl) -> Vec<BypassPayload> {
    let mut out = Vec::new();
    for name in PORT_HEADERS {
        for port in INTERNAL_PORTS {
            let headers = HeaderList::new().with(*name, *port);
            out.push(payload(url, "GET", url.raw_uri(), headers, "headers_port"));
        }
    }
    out
}
