//! Debug-token codec: serializes a request descriptor to
//! a URL-safe compressed string and back, so any finding is
//! independently reproducible.
//!
//! Wire format:
//!
//! ```text
//! byte 0          : version
//! byte 1          : 0xFF (nonce field-type)
//! byte 2          : nonce length N (4 or 8)
//! bytes 3..3+N-1  : nonce
//! repeat { field-type(1), length(1), bytes[length] }
//! ```
//!
//! The TLV buffer is compressed with `flate2` (zlib) rather than Snappy,
//! with the version byte bumped to 2 to mark the change (any
//! byte-identical-roundtrip compressor is fine here as long as the
//! version byte moves with it). `VERSION` is the only version this
//! decoder accepts; anything else, including a legacy `FullURL`-based
//! field layout, is rejected as a version mismatch rather than
//! heuristically decoded.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rand::RngCore;
use std::io::{Read, Write};

use crate::error::{utils::decode_token, BypassError};
use crate::payload::{BypassPayload, HeaderList};

pub const VERSION: u8 = 2;

const NONCE_FIELD_TYPE: u8 = 0xFF;
const FIELD_SCHEME: u8 = 1;
const FIELD_HOST: u8 = 2;
const FIELD_RAW_URI: u8 = 3;
const FIELD_METHOD: u8 = 4;
const FIELD_HEADERS: u8 = 5;

/// The logical content of a debug token: everything a payload's identity
/// depends on, excluding the nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub scheme: String,
    pub host: String,
    pub raw_uri: String,
    pub method: String,
    pub headers: HeaderList,
}

impl From<&BypassPayload> for Descriptor {
    fn from(p: &BypassPayload) -> Self {
        Descriptor {
            scheme: p.scheme.clone(),
            host: p.host.clone(),
            raw_uri: p.raw_uri.clone(),
            method: p.method.clone(),
            headers: p.headers.clone(),
        }
    }
}

/// Encode a descriptor to a URL-safe, unpadded base64 token. Two encodes
/// of the same descriptor differ only in the random nonce.
pub fn encode(desc: &Descriptor) -> String {
    let mut buf = Vec::new();
    buf.push(VERSION);

    let mut nonce = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut nonce);
    buf.push(NONCE_FIELD_TYPE);
    buf.push(nonce.len() as u8);
    buf.extend_from_slice(&nonce);

    push_field(&mut buf, FIELD_SCHEME, desc.scheme.as_bytes());
    push_field(&mut buf, FIELD_HOST, desc.host.as_bytes());
    push_field(&mut buf, FIELD_RAW_URI, desc.raw_uri.as_bytes());
    push_field(&mut buf, FIELD_METHOD, desc.method.as_bytes());

    let mut headers_block = Vec::new();
    let header_count = desc.headers.len().min(255);
    headers_block.push(header_count as u8);
    for h in desc.headers.iter().take(header_count) {
        let name = &h.name.as_bytes()[..h.name.len().min(255)];
        let value = &h.value.as_bytes()[..h.value.len().min(255)];
        headers_block.push(name.len() as u8);
        headers_block.extend_from_slice(name);
        headers_block.push(value.len() as u8);
        headers_block.extend_from_slice(value);
    }
    push_field(&mut buf, FIELD_HEADERS, &headers_block);

    let compressed = compress(&buf);
    URL_SAFE_NO_PAD.encode(compressed)
}

/// Push a `(field-type, length, bytes)` TLV entry. Individual field
/// lengths are capped at 255 bytes.
fn push_field(buf: &mut Vec<u8>, field_type: u8, data: &[u8]) {
    let data = &data[..data.len().min(255)];
    buf.push(field_type);
    buf.push(data.len() as u8);
    buf.extend_from_slice(data);
}

fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data).expect("in-memory write cannot fail");
    encoder.finish().expect("in-memory finish cannot fail")
}

fn decompress(data: &[u8]) -> Result<Vec<u8>, BypassError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| decode_token(format!("decompression failed: {}", e)))?;
    Ok(out)
}

/// Decode a token back into a `Descriptor`. Tolerates truncation: stops
/// at the first incomplete field and returns whatever was parsed,
/// without panicking. Rejects tokens whose version byte isn't `VERSION`.
pub fn decode(token: &str) -> Result<Descriptor, BypassError> {
    let compressed = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| decode_token(format!("invalid base64: {}", e)))?;
    let buf = decompress(&compressed)?;

    if buf.is_empty() {
        return Err(decode_token("empty token"));
    }
    let version = buf[0];
    if version != VERSION {
        return Err(decode_token(format!(
            "unsupported token version {} (this decoder only accepts version {}; legacy FullURL-based tokens are not heuristically decoded)",
            version, VERSION
        )));
    }

    let mut scheme = String::new();
    let mut host = String::new();
    let mut raw_uri = String::new();
    let mut method = String::new();
    let mut headers = HeaderList::new();

    let mut i = 1usize;
    while i < buf.len() {
        let field_type = buf[i];
        i += 1;
        if i >= buf.len() {
            break; // truncated before length byte
        }
        let len = buf[i] as usize;
        i += 1;
        if i + len > buf.len() {
            break; // truncated before full payload
        }
        let data = &buf[i..i + len];
        i += len;

        match field_type {
            NONCE_FIELD_TYPE => {}
            FIELD_SCHEME => scheme = String::from_utf8_lossy(data).into_owned(),
            FIELD_HOST => host = String::from_utf8_lossy(data).into_owned(),
            FIELD_RAW_URI => raw_uri = String::from_utf8_lossy(data).into_owned(),
            FIELD_METHOD => method = String::from_utf8_lossy(data).into_owned(),
            FIELD_HEADERS => headers = decode_headers_block(data),
            _ => {} // unknown field-type, skipped via the length prefix
        }
    }

    Ok(Descriptor { scheme, host, raw_uri, method, headers })
}

fn decode_headers_block(data: &[u8]) -> HeaderList {
    let mut out = HeaderList::new();
    if data.is_empty() {
        return out;
    }
    let count = data[0] as usize;
    let mut i = 1usize;
    for _ in 0..count {
        if i >= data.len() {
            break;
        }
        let name_len = data[i] as usize;
        i += 1;
        if i + name_len > data.len() {
            break;
        }
        let name = String::from_utf8_lossy(&data[i..i + name_len]).into_owned();
        i += name_len;

        if i >= data.len() {
            break;
        }
        let value_len = data[i] as usize;
        i += 1;
        if i + value_len > data.len() {
            break;
        }
        let value = String::from_utf8_lossy(&data[i..i + value_len]).into_owned();
        i += value_len;

        out.push(name, value);
    }
    out
}

/// Encode a payload's token in place.
pub fn assign_token(payload: &mut BypassPayload) {
    let desc = Descriptor::from(&*payload);
    payload.payload_token = encode(&desc);
}
