//! Per-request inputs and outcome of client authentication.

use std::collections::HashMap;

use url::form_urlencoded;

/// Body parameter carrying the client identifier.
pub const CLIENT_ID_PARAM: &str = "client_id";

/// Token request body: parameter name → values in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyParameters(HashMap<String, Vec<String>>);

impl BodyParameters {
    /// Empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn from_form(body: &[u8]) -> Self {
        form_urlencoded::parse(body).into_owned().collect()
    }

    /// Append a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First value of `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values of `key`.
    #[must_use]
    pub fn all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BodyParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Mutable per-request authentication record.
///
/// `failure_reason` is for operators only and is never sent to the client.
#[derive(Debug, Clone, Default)]
pub struct ClientAuthnContext {
    /// Resolved client identifier
    pub client_id: Option<String>,
    /// Authenticator-specific parameters (e.g. `authenticatorType`)
    pub parameters: HashMap<String, String>,
    /// Whether the client was authenticated
    pub authenticated: bool,
    /// Authenticator that made the decision
    pub authenticator_name: Option<String>,
    /// Why authentication failed
    pub failure_reason: Option<String>,
}

impl ClientAuthnContext {
    /// Fresh context with no client identified.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with a client identifier already resolved.
    #[must_use]
    pub fn with_client_id(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    /// Set an authenticator-specific parameter.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Authenticator-specific parameter.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Record a successful decision.
    pub fn record_success(&mut self, authenticator: &str) {
        self.authenticated = true;
        self.authenticator_name = Some(authenticator.to_string());
        self.failure_reason = None;
    }

    /// Record a failed decision.
    pub fn record_failure(&mut self, authenticator: &str, reason: impl Into<String>) {
        self.authenticated = false;
        self.authenticator_name = Some(authenticator.to_string());
        self.failure_reason = Some(reason.into());
    }
}
