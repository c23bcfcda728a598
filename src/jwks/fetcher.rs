//! JWKS retrieval over HTTP.
//!
//! Every call goes to the network: key sets are fetched fresh per
//! authentication attempt, with no cache and no in-flight deduplication.
//! A non-2xx status, an oversized body or a body that is not a JWK Set fails
//! the whole fetch; partial results are never returned.

use tracing::debug;
use url::Url;

use crate::config::JwksConfig;
use crate::jwks::model::{JwksDocument, KeyEntry};
use crate::{Error, Result};

/// Trait abstracting key set retrieval.
#[async_trait::async_trait]
pub trait JwksFetcher: Send + Sync + 'static {
    /// Fetch and parse the key set at `url`.
    ///
    /// # Errors
    ///
    /// `Error::JwksFetch` on transport failure or non-2xx status,
    /// `Error::JwksParse` when the body is not a JWK Set.
    async fn fetch(&self, url: &Url) -> Result<Vec<KeyEntry>>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpJwksFetcher {
    http: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpJwksFetcher {
    /// Build a fetcher honouring the configured timeout, scheme restriction
    /// and body limit.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be constructed.
    pub fn new(config: &JwksConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .https_only(config.https_only)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build JWKS HTTP client: {e}")))?;
        Ok(Self {
            http,
            max_body_bytes: config.max_body_bytes,
        })
    }

    async fn read_limited(&self, mut response: reqwest::Response) -> Result<Vec<u8>> {
        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes as u64 {
                return Err(Error::JwksFetch(format!(
                    "response of {len} bytes exceeds limit of {}",
                    self.max_body_bytes
                )));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::JwksFetch(format!("Failed to read JWKS body: {e}")))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(Error::JwksFetch(format!(
                    "response exceeds limit of {} bytes",
                    self.max_body_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl JwksFetcher for HttpJwksFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<KeyEntry>> {
        debug!(jwks_uri = %url, "Fetching JWKS");

        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::JwksFetch(format!("Failed to fetch JWKS: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::JwksFetch(format!("JWKS endpoint returned HTTP {status}")));
        }

        let body = self.read_limited(response).await?;
        let keys = parse_key_set(&body)?;
        debug!(jwks_uri = %url, keys = keys.len(), "Fetched JWKS");
        Ok(keys)
    }
}

/// Parse a JWK Set body into its key entries.
///
/// # Errors
///
/// `Error::JwksParse` if the body is not JSON or lacks a `keys` array.
pub fn parse_key_set(body: &[u8]) -> Result<Vec<KeyEntry>> {
    serde_json::from_slice::<JwksDocument>(body)
        .map(|doc| doc.keys)
        .map_err(|e| Error::JwksParse(e.to_string()))
}
