//! Connection dialer: direct TCP or through an HTTP proxy, over a
//! hand-rolled `TcpStream`/`rustls` connection rather than a pooled
//! HTTP-library agent, since a raw, byte-exact request line cannot
//! survive a canonicalizing HTTP library.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConnection, StreamOwned};

use crate::config::ProxyConfig;
use crate::error::{utils, BypassError};

/// A connected transport, plain or TLS, addressable as `Read + Write`.
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Connection::Plain(s) => s.read(buf),
            Connection::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Connection::Plain(s) => s.write(buf),
            Connection::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Connection::Plain(s) => s.flush(),
            Connection::Tls(s) => s.flush(),
        }
    }
}

impl Connection {
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        match self {
            Connection::Plain(s) => s.set_read_timeout(timeout),
            Connection::Tls(s) => s.sock.set_read_timeout(timeout),
        }
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        match self {
            Connection::Plain(s) => s.set_write_timeout(timeout),
            Connection::Tls(s) => s.sock.set_write_timeout(timeout),
        }
    }
}

/// A `ServerCertVerifier` that performs no verification whatsoever
/// (`InsecureSkipVerify`): this is a scanning tool probing arbitrary
/// hosts, not a client that trusts the remote end.
#[derive(Debug)]
struct NoVerification;

impl rustls::client::danger::ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        // Accept every scheme rustls knows; verification is a no-op anyway.
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

/// Builds a `rustls::ClientConfig` with certificate verification disabled.
///
/// rustls dropped TLS 1.0/1.1 support entirely, so the widest range this
/// stack can serve is TLS 1.2-1.3 (see DESIGN.md).
fn tls_config() -> Arc<rustls::ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS12, &rustls::version::TLS13])
        .expect("static TLS version list is valid")
        .with_root_certificates(rustls::RootCertStore::empty())
        .with_no_client_auth();
    config
        .dangerous()
        .set_certificate_verifier(Arc::new(NoVerification));
    Arc::new(config)
}

pub struct DialOptions {
    pub connect_timeout: Duration,
    pub proxy: Option<ProxyConfig>,
}

/// Dial `host:port`, optionally through an HTTP proxy, and optionally
/// wrap in TLS for `https`.
pub fn dial(scheme: &str, host: &str, port: u16, opts: &DialOptions) -> Result<Connection, BypassError> {
    let tcp = match &opts.proxy {
        Some(proxy) => dial_via_proxy(scheme, host, port, proxy, opts.connect_timeout)?,
        None => dial_direct(host, port, opts.connect_timeout)?,
    };

    if scheme.eq_ignore_ascii_case("https") {
        wrap_tls(tcp, host)
    } else {
        Ok(Connection::Plain(tcp))
    }
}

fn dial_direct(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, BypassError> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| utils::transport_non_retryable(format!("dns resolution failed for {}: {}", host, e)))?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(utils::transport_retryable(format!(
        "dial timeout connecting to {}:{}: {}",
        host,
        port,
        last_err.map(|e| e.to_string()).unwrap_or_else(|| "no addresses".into())
    )))
}

/// CONNECT tunnel for HTTPS, absolute-form GET passthrough for HTTP.
fn dial_via_proxy(scheme: &str, host: &str, port: u16, proxy: &ProxyConfig, timeout: Duration) -> Result<TcpStream, BypassError> {
    let mut stream = dial_direct(&proxy.host, proxy.port, timeout)?;

    if scheme.eq_ignore_ascii_case("https") {
        let connect_req = format!(
            "CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\n\r\n",
            host = host,
            port = port
        );
        stream
            .write_all(connect_req.as_bytes())
            .map_err(|e| utils::transport_retryable(format!("proxy CONNECT write failed: {}", e)))?;

        let mut reader = BufReader::new(&stream);
        let mut status_line = String::new();
        reader
            .read_line(&mut status_line)
            .map_err(|e| utils::transport_retryable(format!("proxy CONNECT read failed: {}", e)))?;
        if !status_line.contains("200") {
            return Err(utils::transport_non_retryable(format!(
                "proxy CONNECT rejected: {}",
                status_line.trim()
            )));
        }
        loop {
            let mut line = String::new();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| utils::transport_retryable(format!("proxy CONNECT read failed: {}", e)))?;
            if n == 0 || line == "\r\n" || line == "\n" {
                break;
            }
        }
    }
    // For plain HTTP, the request line is sent in absolute-form by the
    // caller (http_client.rs); no tunnel setup needed here.

    Ok(stream)
}

fn wrap_tls(tcp: TcpStream, host: &str) -> Result<Connection, BypassError> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| utils::transport_non_retryable(format!("invalid server name {}: {}", host, e)))?;
    let conn = ClientConnection::new(tls_config(), server_name)
        .map_err(|e| utils::transport_retryable(format!("tls handshake setup failed: {}", e)))?;
    Ok(Connection::Tls(Box::new(StreamOwned::new(conn, tcp))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn dial_direct_connects_to_loopback_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept_thread = std::thread::spawn(move || {
            let _ = listener.accept();
        });
        let result = dial_direct("127.0.0.1", port, Duration::from_secs(1));
        assert!(result.is_ok());
        accept_thread.join().unwrap();
    }

    #[test]
    fn dial_direct_unreachable_port_is_retryable_error() {
        // Port 1 is reserved; connection should fail fast with a retryable error.
        let result = dial_direct("127.0.0.1", 1, Duration::from_millis(200));
        assert!(result.is_err());
    }

    #[test]
    fn proxy_connect_rejects_non_200_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(b"HTTP/1.1 403 Forbidden\r\n\r\n");
        });
        let proxy = ProxyConfig { host: "127.0.0.1".into(), port };
        let result = dial_via_proxy("https", "example.invalid", 443, &proxy, Duration::from_secs(1));
        assert!(result.is_err());
        server.join().unwrap();
    }
}
