//! Data protection for values that leave the application
//!
//! Flow state is carried through the identity provider and back, so it is
//! encrypted and authenticated before it is handed to the remote service.
//! Protectors are derived from a provider by purpose; a payload protected
//! under one purpose chain cannot be unprotected under another.
//!
//! - [`key_ring`] - AES-256-GCM protector keyed from a master secret
//! - [`time_limited`] - Wraps a protector with an expiration
//! - [`state_format`] - Serialises flow state through a protector
//! - [`extensions`] - Purpose chains and string helpers

pub mod extensions;
pub mod key_ring;
pub mod state_format;
pub mod time_limited;

pub use extensions::{create_protector_chain, DataProtectorExt};
pub use key_ring::{KeyRing, KeyRingDataProtector};
pub use state_format::ProtectedStateFormat;
pub use time_limited::TimeLimitedDataProtector;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while protecting or unprotecting a payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtectionError {
    #[error("Invalid protection purpose '{0}'")]
    InvalidPurpose(String),

    #[error("Invalid protection key: {0}")]
    InvalidKey(String),

    #[error("The payload could not be decrypted or has been tampered with")]
    Cryptography,

    #[error("Invalid payload encoding: {0}")]
    Encoding(String),

    #[error("Lifetime {0} gives an expiration out of range")]
    InvalidLifetime(String),

    #[error("The payload expired at {expiration}")]
    Expired { expiration: DateTime<Utc> },

    #[error("State serialization failed: {0}")]
    Serialization(String),
}

/// Creates protectors isolated by purpose
pub trait DataProtectionProvider: Send + Sync {
    /// Derive a protector for `purpose`
    ///
    /// # Errors
    ///
    /// Returns [`ProtectionError::InvalidPurpose`] for a blank purpose or one
    /// containing a NUL character.
    fn create_protector(&self, purpose: &str) -> Result<Box<dyn DataProtector>, ProtectionError>;
}

/// Encrypts and authenticates payloads for a single purpose chain
///
/// A protector is also a provider: creating a protector from it appends a
/// sub-purpose to its chain.
pub trait DataProtector: DataProtectionProvider {
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    fn protect(&self, plaintext: &[u8]) -> Result<Vec<u8>, ProtectionError>;

    /// # Errors
    ///
    /// Returns an error if the payload is malformed, was protected under a
    /// different purpose chain or key, or has been modified.
    fn unprotect(&self, protected: &[u8]) -> Result<Vec<u8>, ProtectionError>;
}

pub(crate) fn validate_purpose(purpose: &str) -> Result<(), ProtectionError> {
    if purpose.trim().is_empty() || purpose.contains('\0') {
        return Err(ProtectionError::InvalidPurpose(purpose.to_string()));
    }
    Ok(())
}
