//! Common utilities and types shared across User Service components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for decoding PEM-armored key material
pub mod pem;
