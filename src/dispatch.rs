//! Client authenticator contract and the token-endpoint dispatcher.
//!
//! Authenticators are kept in registration order. For each token request the
//! dispatcher asks each one whether it can handle the request and hands the
//! request to the first that says yes. A failed decision is answered with an
//! OAuth `invalid_client` error that carries no internal detail.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Result;
use crate::authenticator::MutualTlsClientAuthenticator;
use crate::config::Config;
use crate::context::{BodyParameters, ClientAuthnContext};
use crate::jwks::{HttpJwksFetcher, JwksResolver};
use crate::mtls::{CertificateSource, ClientRequest};
use crate::registry::ClientRegistry;

// ─────────────────────────────────────────────────────────────────────────────
// Authenticator contract
// ─────────────────────────────────────────────────────────────────────────────

/// A `token_endpoint_auth_method` an authenticator implements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAuthenticationMethod {
    /// Registered method name (e.g. `tls_client_auth`)
    pub name: String,
}

impl ClientAuthenticationMethod {
    /// Descriptor for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One way of authenticating an OAuth client at the token endpoint.
///
/// Implementations must be `Send + Sync`: a single instance serves
/// concurrent requests.
#[async_trait::async_trait]
pub trait ClientAuthenticator: Send + Sync + 'static {
    /// Stable authenticator name.
    fn name(&self) -> &str;

    /// Methods advertised in discovery metadata.
    fn supported_client_authentication_methods(&self) -> Vec<ClientAuthenticationMethod>;

    /// Cheap probe: does this request carry this authenticator's credentials?
    fn can_authenticate(
        &self,
        request: &dyn ClientRequest,
        body: &BodyParameters,
        context: &ClientAuthnContext,
    ) -> bool;

    /// Client identifier this authenticator reads from the request, if any.
    fn get_client_id(
        &self,
        request: &dyn ClientRequest,
        body: &BodyParameters,
        context: &ClientAuthnContext,
    ) -> Option<String>;

    /// Decide. Never fails: every error is a `false`.
    async fn authenticate_client(
        &self,
        request: &dyn ClientRequest,
        body: &BodyParameters,
        context: &mut ClientAuthnContext,
    ) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// invalid_client
// ─────────────────────────────────────────────────────────────────────────────

/// OAuth 2.0 `invalid_client` error (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}: {error_description}")]
pub struct InvalidClientError {
    /// Always `invalid_client`
    pub error: String,
    /// Generic description
    pub error_description: String,
}

impl Default for InvalidClientError {
    fn default() -> Self {
        Self {
            error: "invalid_client".to_string(),
            error_description: "Client authentication failed.".to_string(),
        }
    }
}

impl IntoResponse for InvalidClientError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered set of client authenticators.
#[derive(Default)]
pub struct AuthenticatorRegistry {
    authenticators: Vec<Arc<dyn ClientAuthenticator>>,
}

impl std::fmt::Debug for AuthenticatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.authenticators.iter().map(|a| a.name()))
            .finish()
    }
}

impl AuthenticatorRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an authenticator. Earlier registrations are probed first.
    pub fn register(&mut self, authenticator: Arc<dyn ClientAuthenticator>) {
        info!(authenticator = authenticator.name(), "Registered client authenticator");
        self.authenticators.push(authenticator);
    }

    /// Registered authenticators in probe order.
    #[must_use]
    pub fn authenticators(&self) -> &[Arc<dyn ClientAuthenticator>] {
        &self.authenticators
    }

    /// Number of registered authenticators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    /// Whether no authenticator is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }

    /// `token_endpoint_auth_methods_supported` for discovery metadata,
    /// deduplicated, in registration order.
    #[must_use]
    pub fn token_endpoint_auth_methods_supported(&self) -> Vec<String> {
        let mut methods: Vec<String> = Vec::new();
        for method in self
            .authenticators
            .iter()
            .flat_map(|a| a.supported_client_authentication_methods())
        {
            if !methods.contains(&method.name) {
                methods.push(method.name);
            }
        }
        methods
    }

    /// Authenticate the client behind a token request.
    ///
    /// Selects the first authenticator whose probe succeeds, fills in
    /// `context.client_id` from it when unset, and records the outcome on the
    /// context. Returns the authenticated client id.
    ///
    /// # Errors
    ///
    /// `InvalidClientError` when no authenticator claims the request, no
    /// client id can be resolved, or the chosen authenticator rejects it.
    pub async fn authenticate(
        &self,
        request: &dyn ClientRequest,
        body: &BodyParameters,
        context: &mut ClientAuthnContext,
    ) -> std::result::Result<String, InvalidClientError> {
        let Some(authenticator) = self
            .authenticators
            .iter()
            .find(|a| a.can_authenticate(request, body, context))
        else {
            debug!("No client authenticator can handle the request");
            context.failure_reason = Some("no authenticator can handle the request".into());
            return Err(InvalidClientError::default());
        };

        if context.client_id.is_none() {
            context.client_id = authenticator.get_client_id(request, body, context);
        }
        let Some(client_id) = context.client_id.clone() else {
            context.record_failure(authenticator.name(), "client_id could not be resolved");
            return Err(InvalidClientError::default());
        };

        if authenticator.authenticate_client(request, body, context).await {
            context.authenticated = true;
            context.authenticator_name = Some(authenticator.name().to_string());
            Ok(client_id)
        } else {
            if context.failure_reason.is_none() {
                context.record_failure(authenticator.name(), "authentication rejected");
            }
            warn!(
                client_id = %client_id,
                authenticator = authenticator.name(),
                "Client authentication failed"
            );
            Err(InvalidClientError::default())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Startup
// ─────────────────────────────────────────────────────────────────────────────

/// Build the mutual TLS authenticator from configuration and append it to
/// `registry`.
///
/// # Errors
///
/// Returns an error if the JWKS HTTP client cannot be built.
pub fn register_mutual_tls(
    registry: &mut AuthenticatorRegistry,
    config: &Config,
    clients: Arc<dyn ClientRegistry>,
) -> Result<()> {
    let fetcher = HttpJwksFetcher::new(&config.jwks)?;
    let authenticator = MutualTlsClientAuthenticator::new(
        config.mtls.clone(),
        CertificateSource::new(config.mtls.header.clone()),
        clients,
        JwksResolver::new(Arc::new(fetcher)),
    );
    registry.register(Arc::new(authenticator));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
