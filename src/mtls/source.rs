//! Where the presented client certificate comes from.
//!
//! The TLS terminator (rustls acceptor, axum middleware, ...) inserts a
//! [`PeerCertificate`] into request extensions. When TLS ends at a reverse
//! proxy instead, the proxy forwards the certificate in a trusted header and
//! [`CertificateSource`] decodes it from there.
//!
//! Accepted header encodings:
//!
//! - PEM with or without line breaks
//! - URL-encoded PEM (nginx `$ssl_client_escaped_cert`)
//! - bare base64 DER

use axum::http::{Extensions, HeaderMap, Request, request::Parts};
use tracing::debug;

use crate::mtls::certificate::Certificate;

// ─────────────────────────────────────────────────────────────────────────────
// Inbound request contract
// ─────────────────────────────────────────────────────────────────────────────

/// Peer certificate from the TLS handshake, stored in request extensions.
#[derive(Debug, Clone)]
pub struct PeerCertificate(pub Certificate);

/// What the authenticator needs to see of an inbound token request.
pub trait ClientRequest: Send + Sync {
    /// Certificate verified during the TLS handshake, if any.
    fn peer_certificate(&self) -> Option<&Certificate>;

    /// Header value by case-insensitive name. Non-UTF-8 values are `None`.
    fn header(&self, name: &str) -> Option<&str>;
}

fn peer_certificate_from(extensions: &Extensions) -> Option<&Certificate> {
    extensions.get::<PeerCertificate>().map(|p| &p.0)
}

fn header_from<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl<B: Send + Sync> ClientRequest for Request<B> {
    fn peer_certificate(&self) -> Option<&Certificate> {
        peer_certificate_from(self.extensions())
    }

    fn header(&self, name: &str) -> Option<&str> {
        header_from(self.headers(), name)
    }
}

impl ClientRequest for Parts {
    fn peer_certificate(&self) -> Option<&Certificate> {
        peer_certificate_from(&self.extensions)
    }

    fn header(&self, name: &str) -> Option<&str> {
        header_from(&self.headers, name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CertificateSource
// ─────────────────────────────────────────────────────────────────────────────

/// Picks the presented certificate: transport first, trusted header second.
#[derive(Debug, Clone, Default)]
pub struct CertificateSource {
    header: Option<String>,
}

impl CertificateSource {
    /// Build a source. `header` is the trusted proxy header, if any; a blank
    /// name disables the fallback.
    #[must_use]
    pub fn new(header: Option<String>) -> Self {
        Self {
            header: header.filter(|h| !h.trim().is_empty()),
        }
    }

    /// Configured fallback header name.
    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// The presented certificate, or `None` when there is none or it cannot
    /// be decoded.
    #[must_use]
    pub fn extract(&self, request: &dyn ClientRequest) -> Option<Certificate> {
        if let Some(cert) = request.peer_certificate() {
            return Some(cert.clone());
        }

        let header = self.header.as_deref()?;
        let raw = request.header(header)?;
        if raw.trim().is_empty() {
            return None;
        }

        match decode_header_value(raw) {
            Some(cert) => Some(cert),
            None => {
                debug!(header, "Discarding undecodable client certificate header");
                None
            }
        }
    }
}

fn decode_header_value(raw: &str) -> Option<Certificate> {
    let text = if raw.contains('%') {
        match urlencoding::decode(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(e) => {
                debug!(error = %e, "Certificate header is not valid percent-encoding");
                return None;
            }
        }
    } else {
        raw.to_string()
    };

    match Certificate::from_pem_or_base64(&text) {
        Ok(cert) => Some(cert),
        Err(e) => {
            debug!(error = %e, "Certificate header did not parse");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
