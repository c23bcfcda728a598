//! Certificate thumbprints (`x5t`, `x5t#S256`).
//!
//! Digests are taken over the certificate's DER encoding and rendered as
//! base64url without padding (RFC 7515 §4.1.7, §4.1.8).
//!
//! Published key sets are not always that tidy. When comparing against a
//! JWK value, [`Thumbprints`] decodes the published string and compares raw
//! digest bytes, accepting:
//!
//! | Published form | Example (SHA-1 of empty input) |
//! |----------------|--------------------------------|
//! | base64url, no padding | `2jmj7l5rSw0yVb_vlWAYkK_YBwk` |
//! | standard base64, padded | `2jmj7l5rSw0yVb/vlWAYkK/YBwk=` |
//! | hex | `da39a3ee5e6b4b0d3255bfef95601890afd80709` |
//! | base64url of uppercase hex | `REEzOUEzRUU1RTZC...` |

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
use sha1::Sha1;
use sha2::Sha256;

use crate::mtls::certificate::Certificate;
use crate::{Error, Result};

const SHA1_LEN: usize = 20;
const SHA256_LEN: usize = 32;

/// SHA-1 thumbprint (`x5t`) of a certificate, base64url without padding.
#[must_use]
pub fn sha1(cert: &Certificate) -> String {
    URL_SAFE_NO_PAD.encode(sha1_digest(cert.der()))
}

/// SHA-256 thumbprint (`x5t#S256`) of a certificate, base64url without padding.
#[must_use]
pub fn sha256(cert: &Certificate) -> String {
    URL_SAFE_NO_PAD.encode(sha256_digest(cert.der()))
}

/// Parse one `x5c` chain entry (standard base64 DER, RFC 7517 §4.7).
///
/// # Errors
///
/// Returns `Error::CertificateDecoding` for bad base64 or bad DER.
pub fn parse_from_base64_der(value: &str) -> Result<Certificate> {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let der = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| Error::CertificateDecoding(format!("invalid x5c base64: {e}")))?;
    Certificate::from_der(&der)
}

fn sha1_digest(der: &[u8]) -> Vec<u8> {
    <Sha1 as sha1::Digest>::digest(der).to_vec()
}

fn sha256_digest(der: &[u8]) -> Vec<u8> {
    <Sha256 as sha2::Digest>::digest(der).to_vec()
}

// ─────────────────────────────────────────────────────────────────────────────
// Precomputed digests
// ─────────────────────────────────────────────────────────────────────────────

/// Both digests of one certificate, computed once per match attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbprints {
    sha1: Vec<u8>,
    sha256: Vec<u8>,
}

impl Thumbprints {
    /// Digest the certificate's DER encoding.
    #[must_use]
    pub fn of(cert: &Certificate) -> Self {
        Self {
            sha1: sha1_digest(cert.der()),
            sha256: sha256_digest(cert.der()),
        }
    }

    /// `x5t` rendering.
    #[must_use]
    pub fn x5t(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.sha1)
    }

    /// `x5t#S256` rendering.
    #[must_use]
    pub fn x5t_s256(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.sha256)
    }

    /// Does a published `x5t` value name this certificate?
    #[must_use]
    pub fn matches_x5t(&self, published: &str) -> bool {
        decode_published(published, SHA1_LEN)
            .iter()
            .any(|candidate| *candidate == self.sha1)
    }

    /// Does a published `x5t#S256` value name this certificate?
    #[must_use]
    pub fn matches_x5t_s256(&self, published: &str) -> bool {
        decode_published(published, SHA256_LEN)
            .iter()
            .any(|candidate| *candidate == self.sha256)
    }

    /// Either digest agrees with `other`'s.
    #[must_use]
    pub fn matches_either(&self, other: &Self) -> bool {
        self.sha1 == other.sha1 || self.sha256 == other.sha256
    }
}

/// Every plausible digest of `expected_len` bytes that `published` encodes.
fn decode_published(published: &str, expected_len: usize) -> Vec<Vec<u8>> {
    let trimmed = published.trim();
    let mut candidates = Vec::new();
    if trimmed.is_empty() {
        return candidates;
    }

    // Plain hex.
    if trimmed.len() == expected_len * 2 {
        if let Ok(bytes) = hex::decode(trimmed) {
            candidates.push(bytes);
        }
    }

    // base64 / base64url, padded or not: normalise to the standard alphabet.
    let normalised: String = trimmed
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    if let Ok(bytes) = STANDARD_NO_PAD.decode(normalised.as_bytes()) {
        if bytes.len() == expected_len {
            candidates.push(bytes);
        } else if bytes.len() == expected_len * 2 {
            // base64url of a hex string
            if let Some(decoded) = std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| hex::decode(s).ok())
            {
                candidates.push(decoded);
            }
        }
    }

    candidates
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{certificate, self_signed};

    #[test]
    fn sha256_thumbprint_is_43_char_base64url() {
        let cert = certificate("digest");
        let t = sha256(&cert);
        assert_eq!(t.len(), 43);
        assert!(!t.contains('=') && !t.contains('+') && !t.contains('/'));
    }

    #[test]
    fn sha1_thumbprint_is_27_char_base64url() {
        let cert = certificate("digest");
        assert_eq!(sha1(&cert).len(), 27);
    }

    #[test]
    fn thumbprints_agree_with_free_functions() {
        let cert = certificate("agree");
        let t = Thumbprints::of(&cert);
        assert_eq!(t.x5t(), sha1(&cert));
        assert_eq!(t.x5t_s256(), sha256(&cert));
    }

    #[test]
    fn different_certificates_have_different_thumbprints() {
        let a = Thumbprints::of(&certificate("a"));
        let b = Thumbprints::of(&certificate("b"));
        assert_ne!(a.x5t_s256(), b.x5t_s256());
        assert!(!a.matches_either(&b));
    }

    #[test]
    fn matches_x5t_accepts_all_published_encodings() {
        // GIVEN: a cert and its SHA-1 digest in every supported encoding
        let cert = certificate("encodings");
        let t = Thumbprints::of(&cert);
        let raw = sha1_digest(cert.der());
        let upper_hex = hex::encode_upper(&raw);

        // THEN: each encoding matches
        assert!(t.matches_x5t(&URL_SAFE_NO_PAD.encode(&raw)));
        assert!(t.matches_x5t(&STANDARD.encode(&raw)));
        assert!(t.matches_x5t(&hex::encode(&raw)));
        assert!(t.matches_x5t(&upper_hex));
        assert!(t.matches_x5t(&URL_SAFE_NO_PAD.encode(upper_hex.as_bytes())));
    }

    #[test]
    fn matches_x5t_s256_rejects_sha1_value() {
        // A SHA-1 digest published under x5t#S256 is the wrong length.
        let cert = certificate("lengths");
        let t = Thumbprints::of(&cert);
        assert!(!t.matches_x5t_s256(&t.x5t()));
        assert!(t.matches_x5t_s256(&t.x5t_s256()));
    }

    #[test]
    fn undecodable_values_never_match() {
        let t = Thumbprints::of(&certificate("junk"));
        assert!(!t.matches_x5t(""));
        assert!(!t.matches_x5t("!!not-base64!!"));
        assert!(!t.matches_x5t_s256("M2maFm3VYlMBOn3GetVWGXkrKrk"));
    }

    #[test]
    fn empty_input_digest_matches_known_hex() {
        assert_eq!(
            hex::encode(sha1_digest(b"")),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn parse_from_base64_der_round_trips_x5c_entry() {
        let der = self_signed("x5c-leaf");
        let cert = parse_from_base64_der(&STANDARD.encode(&der)).unwrap();
        assert_eq!(cert.der(), der.as_slice());
    }

    #[test]
    fn parse_from_base64_der_tolerates_line_breaks() {
        let der = self_signed("wrapped");
        let mut b64 = STANDARD.encode(&der);
        b64.insert(10, '\n');
        assert!(parse_from_base64_der(&b64).is_ok());
    }

    #[test]
    fn parse_from_base64_der_rejects_bad_input() {
        assert!(matches!(
            parse_from_base64_der("%%%"),
            Err(Error::CertificateDecoding(_))
        ));
        assert!(parse_from_base64_der(&STANDARD.encode(b"not der")).is_err());
    }
}
