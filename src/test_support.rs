//! Shared helpers for unit tests: throwaway certificates and key sets.

use base64::{Engine, engine::general_purpose::STANDARD};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

use crate::mtls::Certificate;

/// Generate a self-signed DER cert with `CN=<cn>`.
pub(crate) fn self_signed(cn: &str) -> Vec<u8> {
    self_signed_with_dn(&[(DnType::CommonName, cn)])
}

/// Generate a self-signed DER cert with the given subject attributes, in order.
pub(crate) fn self_signed_with_dn(attrs: &[(DnType, &str)]) -> Vec<u8> {
    let mut params = CertificateParams::new(vec!["client.example.com".to_string()])
        .expect("valid SAN");
    let mut dn = DistinguishedName::new();
    for (ty, value) in attrs {
        dn.push(ty.clone(), *value);
    }
    params.distinguished_name = dn;

    let key_pair = KeyPair::generate().expect("key generation failed");
    params
        .self_signed(&key_pair)
        .expect("rcgen cert generation failed")
        .der()
        .to_vec()
}

/// Parsed self-signed cert with `CN=<cn>`.
pub(crate) fn certificate(cn: &str) -> Certificate {
    Certificate::from_der(&self_signed(cn)).expect("rcgen output parses")
}

/// PEM-armour DER bytes with 64-column lines.
pub(crate) fn to_pem(der: &[u8]) -> String {
    let b64 = STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
    for line in b64.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(line).expect("base64 is ascii"));
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}
