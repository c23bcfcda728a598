//! OAuth2 mutual TLS client authentication
//!
//! Authenticates OAuth clients at the token endpoint by the X.509 certificate
//! they presented during the TLS handshake (RFC 8705 `tls_client_auth`).
//!
//! # Features
//!
//! - **Certificate extraction**: TLS peer certificate, or a trusted proxy header
//! - **Direct matching**: byte equality with the registered certificate
//! - **JWKS matching**: `x5t`, `x5t#S256` or `x5c` in the client's published key set
//! - **Dispatcher**: ordered authenticators with an `invalid_client` answer

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authenticator;
pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod jwks;
pub mod mtls;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use authenticator::MutualTlsClientAuthenticator;
pub use dispatch::{
    AuthenticatorRegistry, ClientAuthenticator, InvalidClientError, register_mutual_tls,
};
pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// # Errors
///
/// Returns `Error::Config` if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}
