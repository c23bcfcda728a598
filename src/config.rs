//! Configuration management

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    time::Duration,
};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tenant assigned to clients that do not name one.
pub const DEFAULT_TENANT_DOMAIN: &str = "carbon.super";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Certificate extraction and decision policy
    pub mtls: MtlsSettings,
    /// Remote key set retrieval
    pub jwks: JwksConfig,
    /// Statically registered clients (in-memory registry)
    pub clients: Vec<ClientConfig>,
}

/// How the authenticator finds and judges the presented certificate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MtlsSettings {
    /// Trusted header a TLS-terminating proxy forwards the client certificate in
    pub header: Option<String>,
    /// Only claim requests that also carry `client_id` in the body
    pub require_body_client_id: bool,
    /// How a registered subject DN takes part in the decision
    pub subject_dn_policy: SubjectDnPolicy,
}

/// Role of the registered subject DN in the authentication decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectDnPolicy {
    /// The registered DN is never consulted.
    Ignore,
    /// A registered DN must also match when a registered certificate decides.
    /// A DN alone never authenticates.
    #[default]
    Conjunctive,
    /// As `Conjunctive`, and a client with only a DN registered authenticates
    /// on DN match.
    LegacyFallback,
}

/// JWKS fetch limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwksConfig {
    /// Whole-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Refuse plain-HTTP key set URIs
    pub https_only: bool,
    /// Maximum accepted response body (bytes)
    pub max_body_bytes: usize,
}

impl Default for JwksConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            https_only: true,
            max_body_bytes: 512 * 1024,
        }
    }
}

/// One registered OAuth client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// OAuth `client_id`
    pub client_id: String,
    /// Owning tenant
    #[serde(default = "default_tenant_domain")]
    pub tenant_domain: String,
    /// Service provider display name (defaults to the client id)
    #[serde(default)]
    pub name: Option<String>,
    /// PEM file holding the registered certificate
    #[serde(default)]
    pub certificate_path: Option<PathBuf>,
    /// Registered subject DN
    #[serde(default)]
    pub subject_dn: Option<String>,
    /// Key set URI registered directly on the application
    #[serde(default)]
    pub jwks_uri: Option<String>,
    /// Service provider metadata properties (e.g. `jwksURI`)
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

fn default_tenant_domain() -> String {
    DEFAULT_TENANT_DOMAIN.to_string()
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // MTLS_CLIENT_AUTH_MTLS__HEADER=x-client-cert etc.
        figment = figment.merge(Env::prefixed("MTLS_CLIENT_AUTH_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work at runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if let Some(header) = &self.mtls.header {
            if header.trim().is_empty() {
                return Err(Error::Config("mtls.header must not be empty".into()));
            }
        }

        if self.jwks.timeout.is_zero() {
            return Err(Error::Config("jwks.timeout must be greater than zero".into()));
        }
        if self.jwks.max_body_bytes == 0 {
            return Err(Error::Config(
                "jwks.max_body_bytes must be greater than zero".into(),
            ));
        }

        let mut seen = HashSet::new();
        for client in &self.clients {
            if client.client_id.trim().is_empty() {
                return Err(Error::Config("clients[].client_id must not be empty".into()));
            }
            if !seen.insert(client.client_id.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate client_id: {}",
                    client.client_id
                )));
            }
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_are_safe() {
        let config = Config::default();
        assert!(config.mtls.header.is_none());
        assert!(!config.mtls.require_body_client_id);
        assert_eq!(config.mtls.subject_dn_policy, SubjectDnPolicy::Conjunctive);
        assert_eq!(config.jwks.timeout, Duration::from_secs(10));
        assert!(config.jwks.https_only);
        assert_eq!(config.jwks.max_body_bytes, 524_288);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_full_yaml() {
        // GIVEN: a config file exercising every section
        let file = write_yaml(
            r#"
mtls:
  header: x-client-cert
  require_body_client_id: true
  subject_dn_policy: legacy_fallback
jwks:
  timeout: 3s
  https_only: false
  max_body_bytes: 1024
clients:
  - client_id: abc
    certificate_path: /etc/certs/abc.pem
    subject_dn: "CN=abc, O=Example"
  - client_id: def
    tenant_domain: example.com
    properties:
      jwksURI: https://client.example/jwks.json
"#,
        );

        // WHEN: loading
        let config = Config::load(Some(file.path())).unwrap();

        // THEN: every field lands
        assert_eq!(config.mtls.header.as_deref(), Some("x-client-cert"));
        assert!(config.mtls.require_body_client_id);
        assert_eq!(config.mtls.subject_dn_policy, SubjectDnPolicy::LegacyFallback);
        assert_eq!(config.jwks.timeout, Duration::from_secs(3));
        assert!(!config.jwks.https_only);
        assert_eq!(config.jwks.max_body_bytes, 1024);

        assert_eq!(config.clients.len(), 2);
        assert_eq!(config.clients[0].tenant_domain, DEFAULT_TENANT_DOMAIN);
        assert_eq!(
            config.clients[0].certificate_path.as_deref(),
            Some(Path::new("/etc/certs/abc.pem"))
        );
        assert_eq!(config.clients[1].tenant_domain, "example.com");
        assert_eq!(
            config.clients[1].properties.get("jwksURI").map(String::as_str),
            Some("https://client.example/jwks.json")
        );
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Config::load(Some(Path::new("/nonexistent/mtls.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let file = write_yaml("mtls:\n  subject_dn_policy: sometimes\n");
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn validate_rejects_empty_header() {
        let mut config = Config::default();
        config.mtls.header = Some("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.jwks.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_client_ids() {
        let file = write_yaml("clients:\n  - client_id: dup\n  - client_id: dup\n");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Duplicate client_id: dup"));
    }
}
