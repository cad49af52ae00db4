//! Utility functions for key derivation, URL validation, and request handling.
//!
//! - [`key_codec`] - Short key derivation and custom key validation
//! - [`url_validator`] - URL validation for shortening
//! - [`client_ip`] - Client address extraction and visitor fingerprinting
//! - [`password`] - Argon2 password hashing

pub mod client_ip;
pub mod key_codec;
pub mod password;
pub mod url_validator;
