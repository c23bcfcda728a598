//! Mutual TLS client certificate handling.
//!
//! # Flow
//!
//! ```text
//! TLS handshake (or trusted proxy header)
//!   → CertificateSource::extract        → Certificate
//!   → registered certificate?           → certificates_equal
//!   → else registered JWKS?             → match_against_key_set
//! ```
//!
//! # Modules
//!
//! - [`certificate`]: parsed X.509 certificate (`Certificate`)
//! - [`source`]: request contract and certificate extraction (`CertificateSource`)
//! - [`thumbprint`]: `x5t` / `x5t#S256` computation and comparison
//! - [`matcher`]: direct and key-set matching

pub mod certificate;
pub mod matcher;
pub mod source;
pub mod thumbprint;

pub use certificate::Certificate;
pub use matcher::{certificates_equal, match_against_key_set, subject_dn_matches};
pub use source::{CertificateSource, ClientRequest, PeerCertificate};
pub use thumbprint::{Thumbprints, parse_from_base64_der};
