//! # User Service Test Utilities
//!
//! Shared fixtures for the User Service tests.
//!
//! This crate provides:
//! - PEM key fixtures (RSA PKCS8 keys, the matching public key, and keys
//!   that must be rejected)
//! - Helpers to re-format PEM text (CRLF endings, re-wrapping, no armor)
//! - Fixed pod, cluster and project identifiers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use us_test_utils::*;
//!
//! let key = user_service::crypto::load_private_key(RSA_PRIMARY_PKCS8_PEM)?;
//! let crlf = with_crlf_line_endings(RSA_PRIMARY_PKCS8_PEM);
//! ```

pub mod crypto_fixtures;
pub mod test_ids;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use test_ids::*;
