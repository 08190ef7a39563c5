//! # mux-security
//!
//! Symmetric encryption for stored provider API keys.
//!
//! Keys are encrypted at rest with AES-256-GCM; the string API produces
//! base64 of `nonce || ciphertext` so a single TEXT column holds everything.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod crypto;
pub mod error;

pub use crypto::Encryption;
pub use error::{Result, SecurityError};
