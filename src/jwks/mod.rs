//! Client key sets (RFC 7517) published at a registered JWKS endpoint.
//!
//! - [`model`]: wire types (`JwksDocument`, `KeyEntry`)
//! - [`fetcher`]: HTTP retrieval (`JwksFetcher`, `HttpJwksFetcher`)
//! - [`resolver`]: endpoint resolution from the registration (`JwksResolver`)

pub mod fetcher;
pub mod model;
pub mod resolver;

pub use fetcher::{HttpJwksFetcher, JwksFetcher, parse_key_set};
pub use model::{JwksDocument, KeyEntry};
pub use resolver::{JWKS_URI_PROPERTY, JwksResolver};
