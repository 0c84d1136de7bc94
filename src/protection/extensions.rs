// Helpers layered over the protector traits

use super::{DataProtectionProvider, DataProtector, ProtectionError};
use base64::{engine::general_purpose, Engine as _};

/// Create a protector for `purpose` followed by each of `sub_purposes`
///
/// # Errors
///
/// Returns [`ProtectionError::InvalidPurpose`] if any purpose in the chain is
/// blank.
pub fn create_protector_chain<P>(
    provider: &P,
    purpose: &str,
    sub_purposes: &[&str],
) -> Result<Box<dyn DataProtector>, ProtectionError>
where
    P: DataProtectionProvider + ?Sized,
{
    let mut protector = provider.create_protector(purpose)?;
    for sub_purpose in sub_purposes {
        protector = protector.create_protector(sub_purpose)?;
    }
    Ok(protector)
}

/// String convenience methods for any protector
///
/// Protected strings are base64url without padding, so they can travel in
/// query strings unescaped.
pub trait DataProtectorExt: DataProtector {
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    fn protect_str(&self, plaintext: &str) -> Result<String, ProtectionError> {
        let protected = self.protect(plaintext.as_bytes())?;
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(protected))
    }

    /// # Errors
    ///
    /// Returns [`ProtectionError::Encoding`] for invalid base64 or UTF-8, or
    /// the underlying unprotect error.
    fn unprotect_str(&self, protected: &str) -> Result<String, ProtectionError> {
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(protected)
            .map_err(|e| ProtectionError::Encoding(e.to_string()))?;
        let plaintext = self.unprotect(&bytes)?;
        String::from_utf8(plaintext).map_err(|e| ProtectionError::Encoding(e.to_string()))
    }
}

impl<T: DataProtector + ?Sized> DataProtectorExt for T {}
