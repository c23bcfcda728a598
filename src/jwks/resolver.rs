//! Locating and fetching a client's published key set.
//!
//! The endpoint comes from the application registration: a `jwks_uri` set
//! directly on the service provider, or the `jwksURI` metadata property.
//! There is no discovery.

use std::sync::Arc;

use url::Url;

use crate::jwks::fetcher::JwksFetcher;
use crate::jwks::model::KeyEntry;
use crate::registry::{RegisteredClientApp, ServiceProvider};
use crate::{Error, Result};

/// Service provider property holding the key set URI.
pub const JWKS_URI_PROPERTY: &str = "jwksURI";

/// Resolves a client's key set endpoint and fetches it.
#[derive(Clone)]
pub struct JwksResolver {
    fetcher: Arc<dyn JwksFetcher>,
}

impl std::fmt::Debug for JwksResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksResolver").finish_non_exhaustive()
    }
}

impl JwksResolver {
    /// Create a resolver around a fetcher.
    #[must_use]
    pub fn new(fetcher: Arc<dyn JwksFetcher>) -> Self {
        Self { fetcher }
    }

    /// Does the application declare a non-blank key set URI?
    #[must_use]
    pub fn is_configured(&self, app: &RegisteredClientApp) -> bool {
        configured_uri(&app.service_provider).is_some()
    }

    /// Parse the configured key set URI.
    ///
    /// # Errors
    ///
    /// `Error::JwksConfiguration` if no URI is configured or it does not
    /// parse as an absolute URL.
    pub fn resolve_endpoint(
        &self,
        service_provider: &ServiceProvider,
        client_id: &str,
    ) -> Result<Url> {
        let raw = configured_uri(service_provider).ok_or_else(|| {
            Error::JwksConfiguration(format!("no JWKS URI registered for client {client_id}"))
        })?;
        Url::parse(raw).map_err(|e| {
            Error::JwksConfiguration(format!(
                "invalid JWKS URI '{raw}' for client {client_id}: {e}"
            ))
        })
    }

    /// Fetch the key set at `url`.
    ///
    /// # Errors
    ///
    /// Propagates `Error::JwksFetch` / `Error::JwksParse` from the fetcher.
    pub async fn fetch(&self, url: &Url) -> Result<Vec<KeyEntry>> {
        self.fetcher.fetch(url).await
    }
}

fn configured_uri(sp: &ServiceProvider) -> Option<&str> {
    sp.jwks_uri.as_deref().and_then(non_blank).or_else(|| {
        sp.properties
            .get(JWKS_URI_PROPERTY)
            .and_then(|uri| non_blank(uri))
    })
}

fn non_blank(uri: &str) -> Option<&str> {
    Some(uri.trim()).filter(|uri| !uri.is_empty())
}
