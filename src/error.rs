//! Error types for mTLS client authentication

use std::io;

use thiserror::Error;

/// Result type alias for mTLS client authentication
pub type Result<T> = std::result::Result<T, Error>;

/// mTLS client authentication errors
///
/// None of these escape the authenticator boundary: [`crate::authenticator`]
/// converts every variant into a failed authentication decision and logs the
/// detail for operators.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed PEM / base64 / DER certificate data
    #[error("Certificate decoding error: {0}")]
    CertificateDecoding(String),

    /// Client registry unavailable or client unknown
    #[error("Client lookup error: {0}")]
    ClientLookup(String),

    /// JWKS claimed configured but the endpoint cannot be resolved
    #[error("JWKS configuration error: {0}")]
    JwksConfiguration(String),

    /// Network failure or non-2xx response while fetching a JWKS
    #[error("JWKS fetch error: {0}")]
    JwksFetch(String),

    /// JWKS body is not a valid JWK Set
    #[error("JWKS parse error: {0}")]
    JwksParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Short, stable label for structured logs (`reason = ...`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CertificateDecoding(_) => "certificate_decoding",
            Self::ClientLookup(_) => "client_lookup",
            Self::JwksConfiguration(_) => "jwks_configuration",
            Self::JwksFetch(_) => "jwks_fetch",
            Self::JwksParse(_) => "jwks_parse",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_jwks_failures() {
        assert_eq!(Error::JwksFetch("timeout".into()).kind(), "jwks_fetch");
        assert_eq!(Error::JwksParse("eof".into()).kind(), "jwks_parse");

        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::from(io_err).kind(), "io");
    }

    #[test]
    fn display_carries_detail() {
        let err = Error::ClientLookup("no such client: abc".into());
        assert_eq!(err.to_string(), "Client lookup error: no such client: abc");
    }
}
