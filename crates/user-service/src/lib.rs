//! User Service Library
//!
//! Startup plumbing for the user service: loading the token signing key
//! from configuration and describing the monitored resource that metrics
//! are attributed to.
//!
//! # Modules
//!
//! - `bootstrap` - Ordered, fail-fast startup sequence
//! - `config` - Service configuration
//! - `crypto` - Private key parsing and RS256 signing
//! - `errors` - Error types
//! - `monitoring` - Resource label derivation and instance metadata
//! - `observability` - Tracing setup and metrics
//! - `services` - Token issuance

pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod monitoring;
pub mod observability;
pub mod services;
