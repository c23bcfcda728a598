//! JWK Set wire format (RFC 7517), limited to the members used for
//! certificate matching.

use serde::{Deserialize, Serialize};

/// A JWK Set document. `keys` is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwksDocument {
    /// Published keys, in document order
    pub keys: Vec<KeyEntry>,
}

/// One JWK. Members this crate does not inspect (`n`, `e`, `crv`, ...) are
/// dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    /// Key type (`RSA`, `EC`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kty: Option<String>,
    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Intended use (`sig`, `enc`)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// SHA-1 certificate thumbprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
    /// SHA-256 certificate thumbprint
    #[serde(rename = "x5t#S256", default, skip_serializing_if = "Option::is_none")]
    pub x5t_s256: Option<String>,
    /// Certificate chain, leaf first, standard base64 DER
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x5c: Vec<String>,
}
