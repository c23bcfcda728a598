//! JWKS retrieval and matching against a mock key server

mod common;

use base64::{Engine, engine::general_purpose::STANDARD};
use common::{CLIENT_ID, app, authenticator, certificate, http_fetcher, self_signed, tls_request};
use mtls_client_auth::ClientAuthenticator;
use mtls_client_auth::Error;
use mtls_client_auth::config::JwksConfig;
use mtls_client_auth::context::{BodyParameters, ClientAuthnContext};
use mtls_client_auth::jwks::{HttpJwksFetcher, JwksFetcher};
use mtls_client_auth::mtls::{Certificate, Thumbprints};
use mtls_client_auth::registry::InMemoryClientRegistry;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_jwks(body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

async fn authenticate_against(server: &MockServer, cert: &Certificate) -> (bool, ClientAuthnContext) {
    let registry = InMemoryClientRegistry::new();
    registry.register(app(Some(&format!("{}/jwks", server.uri()))), None);
    let auth = authenticator(registry);

    let mut ctx = ClientAuthnContext::with_client_id(CLIENT_ID);
    let ok = auth
        .authenticate_client(&tls_request(Some(cert)), &BodyParameters::new(), &mut ctx)
        .await;
    (ok, ctx)
}

#[tokio::test]
async fn test_x5t_s256_match_authenticates() {
    let cert = certificate("jwks-client");
    let thumbprints = Thumbprints::of(&cert);
    let server = serve_jwks(json!({
        "keys": [
            { "kty": "RSA", "kid": "other", "x5t#S256": "dn/viC56rPBozVX4DxPaHIzxocfK" },
            { "kty": "RSA", "kid": "mine", "use": "sig", "x5t#S256": thumbprints.x5t_s256() }
        ]
    }))
    .await;

    let (ok, ctx) = authenticate_against(&server, &cert).await;
    assert!(ok);
    assert!(ctx.authenticated);
}

#[tokio::test]
async fn test_x5t_match_authenticates() {
    let cert = certificate("jwks-sha1");
    let server = serve_jwks(json!({
        "keys": [{ "kty": "EC", "x5t": Thumbprints::of(&cert).x5t() }]
    }))
    .await;

    assert!(authenticate_against(&server, &cert).await.0);
}

#[tokio::test]
async fn test_x5c_leaf_match_authenticates() {
    let der = self_signed("jwks-x5c");
    let cert = Certificate::from_der(&der).unwrap();
    let server = serve_jwks(json!({
        "keys": [{ "kty": "RSA", "x5c": [STANDARD.encode(&der)] }]
    }))
    .await;

    assert!(authenticate_against(&server, &cert).await.0);
}

#[tokio::test]
async fn test_no_matching_key_is_rejected() {
    let server = serve_jwks(json!({
        "keys": [{ "kty": "RSA", "x5t#S256": Thumbprints::of(&certificate("someone-else")).x5t_s256() }]
    }))
    .await;

    let (ok, ctx) = authenticate_against(&server, &certificate("me")).await;
    assert!(!ok);
    assert!(ctx.failure_reason.is_some());
}

#[tokio::test]
async fn test_server_error_is_rejected_without_panic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (ok, ctx) = authenticate_against(&server, &certificate("c")).await;
    assert!(!ok);
    assert!(ctx.failure_reason.unwrap().contains("HTTP 500"));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"keys\": not json"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/jwks", server.uri())).unwrap();
    let err = http_fetcher().fetch(&url).await.unwrap_err();
    assert!(matches!(err, Error::JwksParse(_)));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = serve_jwks(json!({ "keys": [{ "kid": "x".repeat(4096) }] })).await;
    let fetcher = HttpJwksFetcher::new(&JwksConfig {
        https_only: false,
        max_body_bytes: 1024,
        ..JwksConfig::default()
    })
    .unwrap();

    let url = Url::parse(&format!("{}/jwks", server.uri())).unwrap();
    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err, Error::JwksFetch(_)));
}

#[tokio::test]
async fn test_https_only_refuses_plain_http() {
    let server = serve_jwks(json!({ "keys": [] })).await;
    let fetcher = HttpJwksFetcher::new(&JwksConfig::default()).unwrap();

    let url = Url::parse(&format!("{}/jwks", server.uri())).unwrap();
    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err, Error::JwksFetch(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_rejected() {
    // Port 9 (discard) on localhost: connection refused
    let registry = InMemoryClientRegistry::new();
    registry.register(app(Some("http://127.0.0.1:9/jwks")), None);
    let auth = authenticator(registry);

    let mut ctx = ClientAuthnContext::with_client_id(CLIENT_ID);
    let ok = auth
        .authenticate_client(&tls_request(Some(&certificate("c"))), &BodyParameters::new(), &mut ctx)
        .await;
    assert!(!ok);
}
