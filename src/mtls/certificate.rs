//! Parsed X.509 client certificate.
//!
//! A [`Certificate`] keeps the exact DER bytes it was built from (the
//! authoritative comparison target) plus the subject DN extracted once at
//! parse time, both rendered and as individual attributes. It is immutable
//! after construction.

use std::fmt;
use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use x509_parser::certificate::X509Certificate;
use x509_parser::objects::{oid_registry, oid2abbrev};
use x509_parser::pem::Pem;
use x509_parser::prelude::FromDer;
use x509_parser::x509::X509Name;

use crate::{Error, Result};

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

// ─────────────────────────────────────────────────────────────────────────────
// Certificate
// ─────────────────────────────────────────────────────────────────────────────

/// A DER-encoded X.509 certificate with its subject DN.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject_dn: String,
    subject_attributes: Vec<(String, String)>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    ///
    /// Trailing bytes after the certificate structure are rejected.
    ///
    /// # Errors
    ///
    /// Returns `Error::CertificateDecoding` if the bytes are not a single
    /// well-formed X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rest, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::CertificateDecoding(format!("invalid DER certificate: {e}")))?;
        if !rest.is_empty() {
            return Err(Error::CertificateDecoding(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }

        Ok(Self {
            der: der.to_vec(),
            subject_dn: cert.subject().to_string(),
            subject_attributes: name_attributes(cert.subject()),
        })
    }

    /// Parse a certificate from PEM text or bare base64 DER.
    ///
    /// Accepts a full PEM block (with or without line breaks between the
    /// delimiters) or the base64 payload alone. Whitespace anywhere in the
    /// payload is ignored.
    pub fn from_pem_or_base64(text: &str) -> Result<Self> {
        let payload = strip_pem_armor(text);
        if payload.is_empty() {
            return Err(Error::CertificateDecoding("empty certificate value".into()));
        }
        let der = STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| Error::CertificateDecoding(format!("invalid base64: {e}")))?;
        Self::from_der(&der)
    }

    /// Load the first certificate from a PEM file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds no parseable
    /// `CERTIFICATE` block.
    pub fn from_pem_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let pem = Pem::iter_from_buffer(&data)
            .filter_map(std::result::Result::ok)
            .find(|p| p.label == "CERTIFICATE")
            .ok_or_else(|| {
                Error::CertificateDecoding(format!(
                    "no certificate found in '{}'",
                    path.display()
                ))
            })?;
        Self::from_der(&pem.contents)
    }

    /// Raw DER encoding.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name as rendered by `x509-parser`
    /// (e.g. `"C=SL, O=wso2, CN=travelocity.com"`).
    #[must_use]
    pub fn subject_dn(&self) -> &str {
        &self.subject_dn
    }

    /// Subject attributes as `(type, value)` pairs in certificate order.
    ///
    /// Types use the `x509-parser` abbreviation (`CN`, `O`, `Email`, ...) or
    /// the dotted OID when none is known. Values are unescaped.
    #[must_use]
    pub fn subject_attributes(&self) -> &[(String, String)] {
        &self.subject_attributes
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject_dn", &self.subject_dn)
            .field("der_len", &self.der.len())
            .finish()
    }
}

fn name_attributes(name: &X509Name<'_>) -> Vec<(String, String)> {
    name.iter_rdn()
        .flat_map(|rdn| rdn.iter())
        .map(|attr| {
            let ty = oid2abbrev(attr.attr_type(), oid_registry())
                .map(str::to_string)
                .unwrap_or_else(|_| attr.attr_type().to_id_string());
            let value = attr
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|_| hex::encode_upper(attr.as_slice()));
            (ty, value)
        })
        .collect()
}

/// Remove PEM delimiters and all whitespace, leaving the base64 payload.
///
/// The END marker is only searched for after the BEGIN marker.
fn strip_pem_armor(text: &str) -> String {
    let body = text
        .find(PEM_BEGIN)
        .map(|start| start + PEM_BEGIN.len())
        .and_then(|after| {
            text[after..]
                .find(PEM_END)
                .map(|len| &text[after..after + len])
        })
        .unwrap_or(text);
    body.chars().filter(|c| !c.is_whitespace()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
