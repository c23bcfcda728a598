//! Mutual TLS client authenticator (RFC 8705 `tls_client_auth`).
//!
//! # Decision flow
//!
//! 1. `client_id` must already be resolved on the context.
//! 2. A certificate must be presented ([`CertificateSource`]).
//! 3. Tenant and application are looked up in the [`ClientRegistry`].
//! 4. A registered certificate is compared byte-for-byte with the presented
//!    one, subject to the [`SubjectDnPolicy`].
//! 5. Otherwise a registered JWKS endpoint is fetched and searched for a key
//!    advertising the presented certificate.
//! 6. Otherwise the client is rejected (or, under
//!    [`SubjectDnPolicy::LegacyFallback`], judged on its registered DN).
//!
//! Every failure, including collaborator errors, becomes `false`. The reason
//! is logged and recorded on the context; nothing is retried.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::Result;
use crate::config::{MtlsSettings, SubjectDnPolicy};
use crate::context::{BodyParameters, CLIENT_ID_PARAM, ClientAuthnContext};
use crate::dispatch::{ClientAuthenticationMethod, ClientAuthenticator};
use crate::jwks::JwksResolver;
use crate::mtls::{
    Certificate, CertificateSource, ClientRequest, certificates_equal, match_against_key_set,
    subject_dn_matches,
};
use crate::registry::{ClientRegistry, RegisteredClientApp};

/// Name reported by [`MutualTlsClientAuthenticator`].
pub const AUTHENTICATOR_NAME: &str = "MutualTLSClientAuthenticator";
/// RFC 8705 client authentication method.
pub const TLS_CLIENT_AUTH: &str = "tls_client_auth";
/// Context parameter naming the authenticator type another handler claimed.
pub const AUTHENTICATOR_TYPE_PARAM: &str = "authenticatorType";
/// `authenticatorType` value set by the private-key-JWT handler.
pub const AUTHENTICATOR_TYPE_PK_JWT: &str = "PK_JWT";
/// Body parameter carrying a client assertion type.
pub const CLIENT_ASSERTION_TYPE_PARAM: &str = "client_assertion_type";
/// RFC 7523 JWT bearer client assertion type.
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Outcome of one attempt short of a collaborator error.
enum Verdict {
    Accepted(&'static str),
    Rejected(&'static str),
}

/// Authenticates OAuth clients by their TLS client certificate.
pub struct MutualTlsClientAuthenticator {
    settings: MtlsSettings,
    source: CertificateSource,
    registry: Arc<dyn ClientRegistry>,
    jwks: JwksResolver,
}

impl std::fmt::Debug for MutualTlsClientAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutualTlsClientAuthenticator")
            .field("settings", &self.settings)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl MutualTlsClientAuthenticator {
    /// Wire the authenticator to its collaborators.
    #[must_use]
    pub fn new(
        settings: MtlsSettings,
        source: CertificateSource,
        registry: Arc<dyn ClientRegistry>,
        jwks: JwksResolver,
    ) -> Self {
        Self {
            settings,
            source,
            registry,
            jwks,
        }
    }

    /// Direct certificate comparison: DER byte equality only. `app` is
    /// carried for callers that key decisions on the registration.
    #[must_use]
    pub fn authenticate(
        &self,
        presented: &Certificate,
        reference: &Certificate,
        _app: &RegisteredClientApp,
    ) -> bool {
        certificates_equal(presented, reference)
    }

    fn competing_method_indicated(
        body: &BodyParameters,
        context: &ClientAuthnContext,
    ) -> bool {
        context.parameter(AUTHENTICATOR_TYPE_PARAM) == Some(AUTHENTICATOR_TYPE_PK_JWT)
            || body.first(CLIENT_ASSERTION_TYPE_PARAM) == Some(JWT_BEARER_ASSERTION_TYPE)
    }

    fn registered_dn(app: &RegisteredClientApp) -> Option<&str> {
        app.subject_dn
            .as_deref()
            .map(str::trim)
            .filter(|dn| !dn.is_empty())
    }

    async fn evaluate(&self, request: &dyn ClientRequest, client_id: &str) -> Result<Verdict> {
        let Some(presented) = self.source.extract(request) else {
            return Ok(Verdict::Rejected("no client certificate presented"));
        };

        let tenant = self.registry.tenant_domain_of_app(client_id).await?;
        let app = self
            .registry
            .app_information_by_client_id(client_id, &tenant)
            .await?;

        if let Some(registered) = self.registry.x509_cert_of_app(client_id, &tenant).await? {
            if !self.authenticate(&presented, &registered, &app) {
                return Ok(Verdict::Rejected(
                    "presented certificate does not match the registered certificate",
                ));
            }
            if self.settings.subject_dn_policy != SubjectDnPolicy::Ignore {
                if let Some(dn) = Self::registered_dn(&app) {
                    if !subject_dn_matches(&presented, dn) {
                        return Ok(Verdict::Rejected(
                            "presented certificate subject does not match the registered subject DN",
                        ));
                    }
                }
            }
            return Ok(Verdict::Accepted("registered_certificate"));
        }

        if self.jwks.is_configured(&app) {
            let url = self.jwks.resolve_endpoint(&app.service_provider, client_id)?;
            let keys = self.jwks.fetch(&url).await?;
            return Ok(if match_against_key_set(&presented, &keys) {
                Verdict::Accepted("jwks")
            } else {
                Verdict::Rejected("no key in the published key set matches the certificate")
            });
        }

        if self.settings.subject_dn_policy == SubjectDnPolicy::LegacyFallback {
            if let Some(dn) = Self::registered_dn(&app) {
                return Ok(if subject_dn_matches(&presented, dn) {
                    Verdict::Accepted("subject_dn")
                } else {
                    Verdict::Rejected("presented certificate subject does not match the registered subject DN")
                });
            }
        }

        Ok(Verdict::Rejected(
            "client has neither a registered certificate nor a JWKS endpoint",
        ))
    }
}

#[async_trait::async_trait]
impl ClientAuthenticator for MutualTlsClientAuthenticator {
    fn name(&self) -> &str {
        AUTHENTICATOR_NAME
    }

    fn supported_client_authentication_methods(&self) -> Vec<ClientAuthenticationMethod> {
        vec![ClientAuthenticationMethod::new(TLS_CLIENT_AUTH)]
    }

    fn can_authenticate(
        &self,
        request: &dyn ClientRequest,
        body: &BodyParameters,
        context: &ClientAuthnContext,
    ) -> bool {
        if Self::competing_method_indicated(body, context) {
            debug!("Another client authentication method was indicated");
            return false;
        }
        if self.settings.require_body_client_id && body.first(CLIENT_ID_PARAM).is_none() {
            return false;
        }
        self.source.extract(request).is_some()
    }

    fn get_client_id(
        &self,
        _request: &dyn ClientRequest,
        body: &BodyParameters,
        _context: &ClientAuthnContext,
    ) -> Option<String> {
        body.first(CLIENT_ID_PARAM).map(str::to_string)
    }

    async fn authenticate_client(
        &self,
        request: &dyn ClientRequest,
        _body: &BodyParameters,
        context: &mut ClientAuthnContext,
    ) -> bool {
        let Some(client_id) = context.client_id.clone() else {
            debug!("No client_id resolved; cannot authenticate");
            context.record_failure(AUTHENTICATOR_NAME, "client_id not resolved");
            return false;
        };

        match self.evaluate(request, &client_id).await {
            Ok(Verdict::Accepted(via)) => {
                debug!(client_id = %client_id, via, "Client authenticated with certificate");
                context.record_success(AUTHENTICATOR_NAME);
                true
            }
            Ok(Verdict::Rejected(reason)) => {
                debug!(client_id = %client_id, reason, "Client certificate authentication failed");
                context.record_failure(AUTHENTICATOR_NAME, reason);
                false
            }
            Err(e) => {
                warn!(
                    client_id = %client_id,
                    reason = e.kind(),
                    error = %e,
                    "Client certificate authentication failed"
                );
                context.record_failure(AUTHENTICATOR_NAME, e.to_string());
                false
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
