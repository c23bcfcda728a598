//! Certificate matching: registered-certificate equality and JWKS thumbprint
//! membership.
//!
//! # Paths
//!
//! - [`certificates_equal`]: strict DER byte equality. Used when the client
//!   registered a full certificate.
//! - [`match_against_key_set`]: any key entry whose `x5t`, `x5t#S256`, or
//!   leaf `x5c` certificate names the presented certificate. First match
//!   wins; entry order affects latency only.
//! - [`subject_dn_matches`]: legacy comparison for deployments that
//!   registered a subject DN instead of a certificate.

use tracing::debug;

use crate::jwks::KeyEntry;
use crate::mtls::certificate::Certificate;
use crate::mtls::thumbprint::{Thumbprints, parse_from_base64_der};

/// DER byte equality.
#[must_use]
pub fn certificates_equal(a: &Certificate, b: &Certificate) -> bool {
    a.der() == b.der()
}

/// Does any entry of the key set advertise `cert`?
///
/// Digests of `cert` are computed once. An empty key set never matches.
#[must_use]
pub fn match_against_key_set(cert: &Certificate, keys: &[KeyEntry]) -> bool {
    if keys.is_empty() {
        return false;
    }
    let presented = Thumbprints::of(cert);
    keys.iter().any(|entry| key_entry_matches(&presented, entry))
}

/// Check a single key entry against precomputed digests.
#[must_use]
pub fn key_entry_matches(presented: &Thumbprints, entry: &KeyEntry) -> bool {
    if let Some(x5t) = entry.x5t.as_deref() {
        if presented.matches_x5t(x5t) {
            debug!(kid = ?entry.kid, "Key entry matched on x5t");
            return true;
        }
    }

    if let Some(x5t_s256) = entry.x5t_s256.as_deref() {
        if presented.matches_x5t_s256(x5t_s256) {
            debug!(kid = ?entry.kid, "Key entry matched on x5t#S256");
            return true;
        }
    }

    // Leaf certificate only: the remainder of the chain belongs to issuers.
    if let Some(leaf) = entry.x5c.first() {
        match parse_from_base64_der(leaf) {
            Ok(leaf_cert) => {
                if presented.matches_either(&Thumbprints::of(&leaf_cert)) {
                    debug!(kid = ?entry.kid, "Key entry matched on x5c leaf");
                    return true;
                }
            }
            Err(e) => {
                debug!(kid = ?entry.kid, error = %e, "Skipping undecodable x5c leaf");
            }
        }
    }

    false
}

// ─────────────────────────────────────────────────────────────────────────────
// Legacy subject-DN comparison
// ─────────────────────────────────────────────────────────────────────────────

/// Compare the certificate's subject DN with a registered DN string.
///
/// The registered string is parsed (RFC 4514 `\` escapes honoured) and
/// compared against the certificate's decoded subject attributes, not its
/// rendered DN. RDN order is ignored. Attribute types compare
/// case-insensitively; values compare exactly after trimming. A blank or
/// malformed registered DN never matches.
#[must_use]
pub fn subject_dn_matches(cert: &Certificate, registered_dn: &str) -> bool {
    let Some(registered) = parse_dn(registered_dn) else {
        debug!("Registered subject DN is malformed");
        return false;
    };
    let mut presented: Vec<(String, String)> = cert
        .subject_attributes()
        .iter()
        .map(|(ty, value)| (canonical_attribute_type(ty), value.trim().to_string()))
        .collect();
    presented.sort();
    !registered.is_empty() && registered == presented
}

/// Split a DN string into sorted `(TYPE, value)` pairs.
///
/// `None` if any fragment lacks `=`, has an empty type, or the string ends
/// in a dangling escape. A blank string yields an empty list.
fn parse_dn(dn: &str) -> Option<Vec<(String, String)>> {
    if dn.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in dn.chars() {
        if escaped {
            // Keep the marker so an escaped '=' is not taken as the separator.
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' || c == '+' {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if escaped {
        return None;
    }
    parts.push(current);

    let mut pairs = parts
        .iter()
        .map(|part| {
            let (ty, value) = split_unescaped_eq(part)?;
            let ty = ty.trim();
            if ty.is_empty() {
                return None;
            }
            Some((canonical_attribute_type(ty), unescape(value).trim().to_string()))
        })
        .collect::<Option<Vec<_>>>()?;
    pairs.sort();
    Some(pairs)
}

fn split_unescaped_eq(part: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in part.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' => return Some((&part[..i], &part[i + 1..])),
            _ => {}
        }
    }
    None
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    out
}

fn canonical_attribute_type(ty: &str) -> String {
    let upper = ty.to_ascii_uppercase();
    match upper.as_str() {
        "EMAIL" | "E" | "1.2.840.113549.1.9.1" => "EMAILADDRESS".to_string(),
        "S" => "ST".to_string(),
        _ => upper,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
