//! Client registry: where registered applications and their certificates live.
//!
//! The [`ClientRegistry`] trait abstracts over the storage backend (database,
//! identity server admin API, ...). [`InMemoryClientRegistry`] is backed by a
//! `DashMap` and is populated from configuration at startup.

use std::collections::HashMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ClientConfig, Config};
use crate::mtls::Certificate;
use crate::{Error, Result};

/// Service provider metadata attached to a client application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProvider {
    /// Display name
    pub name: String,
    /// Key set URI registered directly on the service provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    /// Free-form metadata properties (e.g. `jwksURI`)
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// A registered OAuth client application, read-only to the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredClientApp {
    /// OAuth `client_id`
    pub client_id: String,
    /// Owning tenant
    pub tenant_domain: String,
    /// Registered certificate subject DN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_dn: Option<String>,
    /// Service provider metadata
    pub service_provider: ServiceProvider,
}

/// Trait abstracting client registration lookups.
///
/// Implementations must be `Send + Sync` because the registry is shared by
/// concurrent authentication attempts.
#[async_trait::async_trait]
pub trait ClientRegistry: Send + Sync + 'static {
    /// Look up the application registered under `client_id` in `tenant_domain`.
    ///
    /// # Errors
    ///
    /// `Error::ClientLookup` if the client is unknown or the backend fails.
    async fn app_information_by_client_id(
        &self,
        client_id: &str,
        tenant_domain: &str,
    ) -> Result<RegisteredClientApp>;

    /// Tenant that owns `client_id`.
    ///
    /// # Errors
    ///
    /// `Error::ClientLookup` if the client is unknown or the backend fails.
    async fn tenant_domain_of_app(&self, client_id: &str) -> Result<String>;

    /// Registered certificate of the application, if one was uploaded.
    ///
    /// # Errors
    ///
    /// `Error::ClientLookup` if the backend fails. A client without a
    /// certificate is `Ok(None)`.
    async fn x509_cert_of_app(
        &self,
        client_id: &str,
        tenant_domain: &str,
    ) -> Result<Option<Certificate>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory implementation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Registration {
    app: RegisteredClientApp,
    certificate: Option<Certificate>,
}

/// In-memory client registry keyed by `client_id`.
#[derive(Debug, Default)]
pub struct InMemoryClientRegistry {
    clients: DashMap<String, Registration>,
}

impl InMemoryClientRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the `clients` section, loading each registered
    /// certificate from its PEM file.
    ///
    /// # Errors
    ///
    /// Returns an error if a certificate file cannot be read or parsed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Self::new();
        for client in &config.clients {
            let certificate = client
                .certificate_path
                .as_deref()
                .map(Certificate::from_pem_file)
                .transpose()
                .map_err(|e| {
                    Error::Config(format!(
                        "client '{}': cannot load certificate: {e}",
                        client.client_id
                    ))
                })?;
            registry.register(app_from_config(client), certificate);
        }
        debug!(clients = registry.len(), "Loaded client registry");
        Ok(registry)
    }

    /// Add or replace a client.
    pub fn register(&self, app: RegisteredClientApp, certificate: Option<Certificate>) {
        self.clients
            .insert(app.client_id.clone(), Registration { app, certificate });
    }

    /// Remove a client. Returns `true` if it existed.
    pub fn remove(&self, client_id: &str) -> bool {
        self.clients.remove(client_id).is_some()
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn lookup(&self, client_id: &str, tenant_domain: &str) -> Result<Registration> {
        let entry = self
            .clients
            .get(client_id)
            .ok_or_else(|| Error::ClientLookup(format!("unknown client: {client_id}")))?;
        if entry.app.tenant_domain != tenant_domain {
            return Err(Error::ClientLookup(format!(
                "client {client_id} is not registered in tenant {tenant_domain}"
            )));
        }
        Ok(entry.clone())
    }
}

fn app_from_config(client: &ClientConfig) -> RegisteredClientApp {
    RegisteredClientApp {
        client_id: client.client_id.clone(),
        tenant_domain: client.tenant_domain.clone(),
        subject_dn: client.subject_dn.clone(),
        service_provider: ServiceProvider {
            name: client
                .name
                .clone()
                .unwrap_or_else(|| client.client_id.clone()),
            jwks_uri: client.jwks_uri.clone(),
            properties: client.properties.clone(),
        },
    }
}

#[async_trait::async_trait]
impl ClientRegistry for InMemoryClientRegistry {
    async fn app_information_by_client_id(
        &self,
        client_id: &str,
        tenant_domain: &str,
    ) -> Result<RegisteredClientApp> {
        self.lookup(client_id, tenant_domain).map(|r| r.app)
    }

    async fn tenant_domain_of_app(&self, client_id: &str) -> Result<String> {
        self.clients
            .get(client_id)
            .map(|r| r.app.tenant_domain.clone())
            .ok_or_else(|| Error::ClientLookup(format!("unknown client: {client_id}")))
    }

    async fn x509_cert_of_app(
        &self,
        client_id: &str,
        tenant_domain: &str,
    ) -> Result<Option<Certificate>> {
        self.lookup(client_id, tenant_domain).map(|r| r.certificate)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
