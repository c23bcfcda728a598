//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::Request;
use base64::{Engine, engine::general_purpose::STANDARD};
use mtls_client_auth::MutualTlsClientAuthenticator;
use mtls_client_auth::config::{DEFAULT_TENANT_DOMAIN, JwksConfig, MtlsSettings};
use mtls_client_auth::jwks::{HttpJwksFetcher, JWKS_URI_PROPERTY, JwksResolver};
use mtls_client_auth::mtls::{Certificate, CertificateSource, PeerCertificate};
use mtls_client_auth::registry::{InMemoryClientRegistry, RegisteredClientApp, ServiceProvider};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

pub const CLIENT_ID: &str = "someclientid";
pub const CERT_HEADER: &str = "x-client-cert";

/// Self-signed DER certificate with `CN=<cn>`.
pub fn self_signed(cn: &str) -> Vec<u8> {
    let mut params = CertificateParams::new(vec!["client.example.com".to_string()]).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, "wso2");
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    let key_pair = KeyPair::generate().unwrap();
    params.self_signed(&key_pair).unwrap().der().to_vec()
}

pub fn certificate(cn: &str) -> Certificate {
    Certificate::from_der(&self_signed(cn)).unwrap()
}

/// PEM armour with 64-column lines.
pub fn to_pem(der: &[u8]) -> String {
    let b64 = STANDARD.encode(der);
    let lines: Vec<&str> = b64
        .as_bytes()
        .chunks(64)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect();
    format!(
        "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
        lines.join("\n")
    )
}

/// Registration for [`CLIENT_ID`] with an optional `jwksURI` property.
pub fn app(jwks_uri: Option<&str>) -> RegisteredClientApp {
    let mut sp = ServiceProvider {
        name: "travelocity".into(),
        ..ServiceProvider::default()
    };
    if let Some(uri) = jwks_uri {
        sp.properties.insert(JWKS_URI_PROPERTY.into(), uri.into());
    }
    RegisteredClientApp {
        client_id: CLIENT_ID.into(),
        tenant_domain: DEFAULT_TENANT_DOMAIN.into(),
        subject_dn: None,
        service_provider: sp,
    }
}

/// Fetcher that allows plain HTTP, for local mock servers.
pub fn http_fetcher() -> HttpJwksFetcher {
    HttpJwksFetcher::new(&JwksConfig {
        https_only: false,
        ..JwksConfig::default()
    })
    .unwrap()
}

/// Authenticator over `registry` with the header fallback enabled.
pub fn authenticator(registry: InMemoryClientRegistry) -> MutualTlsClientAuthenticator {
    let settings = MtlsSettings {
        header: Some(CERT_HEADER.into()),
        ..MtlsSettings::default()
    };
    MutualTlsClientAuthenticator::new(
        settings.clone(),
        CertificateSource::new(settings.header),
        Arc::new(registry),
        JwksResolver::new(Arc::new(http_fetcher())),
    )
}

/// Token request terminated with `cert` as the TLS peer certificate.
pub fn tls_request(cert: Option<&Certificate>) -> Request<()> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/oauth2/token")
        .body(())
        .unwrap();
    if let Some(c) = cert {
        req.extensions_mut().insert(PeerCertificate(c.clone()));
    }
    req
}

/// Token request whose certificate arrives in the proxy header.
pub fn proxied_request(header_value: &str) -> Request<()> {
    Request::builder()
        .method("POST")
        .uri("/oauth2/token")
        .header(CERT_HEADER, header_value)
        .body(())
        .unwrap()
}
