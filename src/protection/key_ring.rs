// AES-256-GCM data protection keyed from a single master secret

use super::{validate_purpose, DataProtectionProvider, DataProtector, ProtectionError};
use crate::settings::ProtectionSettings;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Master and derived key size (256 bits)
pub const KEY_SIZE: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Root provider holding the master key
///
/// Protectors created from it derive their own subkey, so the master key
/// never encrypts anything directly.
#[derive(Clone)]
pub struct KeyRing {
    master_key: Arc<[u8; KEY_SIZE]>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing").finish_non_exhaustive()
    }
}

impl KeyRing {
    /// # Errors
    ///
    /// Returns [`ProtectionError::InvalidKey`] unless `master_key` is exactly
    /// 32 bytes.
    pub fn new(master_key: &[u8]) -> Result<Self, ProtectionError> {
        let key: [u8; KEY_SIZE] = master_key.try_into().map_err(|_| {
            ProtectionError::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {}",
                master_key.len()
            ))
        })?;
        Ok(Self {
            master_key: Arc::new(key),
        })
    }

    /// Key ring with a fresh random master key
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        Self {
            master_key: Arc::new(key),
        }
    }

    /// Decode a base64 master key (standard or URL-safe alphabet)
    ///
    /// # Errors
    ///
    /// Returns [`ProtectionError::InvalidKey`] if the key is not valid base64
    /// or does not decode to 32 bytes.
    pub fn from_base64_key(encoded: &str) -> Result<Self, ProtectionError> {
        let encoded = encoded.trim();
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(encoded))
            .map_err(|e| ProtectionError::InvalidKey(e.to_string()))?;
        Self::new(&bytes)
    }

    /// # Errors
    ///
    /// Returns [`ProtectionError::InvalidKey`] if the configured key is
    /// unusable.
    pub fn from_settings(settings: &ProtectionSettings) -> Result<Self, ProtectionError> {
        Self::from_base64_key(&settings.key)
    }
}

impl DataProtectionProvider for KeyRing {
    fn create_protector(&self, purpose: &str) -> Result<Box<dyn DataProtector>, ProtectionError> {
        validate_purpose(purpose)?;
        let protector = KeyRingDataProtector::derive(
            Arc::clone(&self.master_key),
            vec![purpose.to_string()],
        )?;
        Ok(Box::new(protector))
    }
}

/// Protector bound to one purpose chain of a [`KeyRing`]
///
/// Payload layout is `nonce || ciphertext`, where the ciphertext carries the
/// GCM tag.
#[derive(Clone)]
pub struct KeyRingDataProtector {
    master_key: Arc<[u8; KEY_SIZE]>,
    purposes: Vec<String>,
    cipher: Aes256Gcm,
}

impl fmt::Debug for KeyRingDataProtector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRingDataProtector")
            .field("purposes", &self.purposes)
            .finish_non_exhaustive()
    }
}

impl KeyRingDataProtector {
    fn derive(
        master_key: Arc<[u8; KEY_SIZE]>,
        purposes: Vec<String>,
    ) -> Result<Self, ProtectionError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(master_key.as_slice())
            .map_err(|e| ProtectionError::InvalidKey(e.to_string()))?;
        mac.update(purposes.join("\0").as_bytes());
        let subkey = mac.finalize().into_bytes();
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(subkey.as_slice()));

        Ok(Self {
            master_key,
            purposes,
            cipher,
        })
    }

    /// Purpose chain this protector is bound to, outermost first
    #[must_use]
    pub fn purposes(&self) -> &[String] {
        &self.purposes
    }
}

impl DataProtectionProvider for KeyRingDataProtector {
    fn create_protector(&self, purpose: &str) -> Result<Box<dyn DataProtector>, ProtectionError> {
        validate_purpose(purpose)?;
        let mut purposes = self.purposes.clone();
        purposes.push(purpose.to_string());
        Ok(Box::new(Self::derive(Arc::clone(&self.master_key), purposes)?))
    }
}

impl DataProtector for KeyRingDataProtector {
    fn protect(&self, plaintext: &[u8]) -> Result<Vec<u8>, ProtectionError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| ProtectionError::Cryptography)?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(combined)
    }

    fn unprotect(&self, protected: &[u8]) -> Result<Vec<u8>, ProtectionError> {
        if protected.len() < NONCE_SIZE {
            return Err(ProtectionError::Encoding(format!(
                "payload of {} bytes is shorter than the nonce",
                protected.len()
            )));
        }

        let (nonce_bytes, ciphertext) = protected.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| ProtectionError::Cryptography)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protect_unprotect() {
        let protector = KeyRing::generate().create_protector("Flow").unwrap();
        let protected = protector.protect(b"payload").unwrap();

        assert_ne!(&protected[NONCE_SIZE..], b"payload");
        assert_eq!(protector.unprotect(&protected).unwrap(), b"payload");
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        let protector = KeyRing::generate().create_protector("Flow").unwrap();
        let first = protector.protect(b"same").unwrap();
        let second = protector.protect(b"same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_purposes_are_isolated() {
        let ring = KeyRing::generate();
        let login = ring.create_protector("Login").unwrap();
        let logout = ring.create_protector("Logout").unwrap();

        let protected = login.protect(b"state").unwrap();
        assert_eq!(logout.unprotect(&protected), Err(ProtectionError::Cryptography));
    }

    #[test]
    fn test_keys_are_isolated() {
        let first = KeyRing::generate().create_protector("Flow").unwrap();
        let second = KeyRing::generate().create_protector("Flow").unwrap();

        let protected = first.protect(b"state").unwrap();
        assert_eq!(second.unprotect(&protected), Err(ProtectionError::Cryptography));
    }

    #[test]
    fn test_tampering_is_detected() {
        let protector = KeyRing::generate().create_protector("Flow").unwrap();
        let mut protected = protector.protect(b"state").unwrap();
        let last = protected.len() - 1;
        protected[last] ^= 0x01;

        assert_eq!(protector.unprotect(&protected), Err(ProtectionError::Cryptography));
    }

    #[test]
    fn test_short_payload_is_rejected() {
        let protector = KeyRing::generate().create_protector("Flow").unwrap();
        assert!(matches!(
            protector.unprotect(&[1, 2, 3]),
            Err(ProtectionError::Encoding(_))
        ));
    }

    #[test]
    fn test_key_length_is_enforced() {
        assert!(matches!(
            KeyRing::new(&[0u8; 16]),
            Err(ProtectionError::InvalidKey(_))
        ));
        assert!(KeyRing::new(&[0u8; KEY_SIZE]).is_ok());
    }

    #[test]
    fn test_from_base64_key_accepts_both_alphabets() {
        let key = [0xfbu8; KEY_SIZE];
        let standard = general_purpose::STANDARD.encode(key);
        let url_safe = general_purpose::URL_SAFE_NO_PAD.encode(key);

        let from_standard = KeyRing::from_base64_key(&standard)
            .unwrap()
            .create_protector("Flow")
            .unwrap();
        let from_url_safe = KeyRing::from_base64_key(&url_safe)
            .unwrap()
            .create_protector("Flow")
            .unwrap();

        let protected = from_standard.protect(b"state").unwrap();
        assert_eq!(from_url_safe.unprotect(&protected).unwrap(), b"state");
    }

    #[test]
    fn test_from_settings_uses_configured_key() {
        let settings = ProtectionSettings {
            key: crate::testing::constants::TEST_PROTECTION_KEY.to_string(),
        };
        assert!(KeyRing::from_settings(&settings).is_ok());

        let settings = ProtectionSettings {
            key: "too-short".to_string(),
        };
        assert!(KeyRing::from_settings(&settings).is_err());
    }

    #[test]
    fn test_sub_purpose_extends_chain() {
        let ring = KeyRing::generate();
        let parent = KeyRingDataProtector::derive(
            Arc::clone(&ring.master_key),
            vec!["App".to_string()],
        )
        .unwrap();
        let child = parent.create_protector("State").unwrap();

        let protected = child.protect(b"state").unwrap();
        assert_eq!(parent.unprotect(&protected), Err(ProtectionError::Cryptography));
        assert_eq!(parent.purposes(), ["App".to_string()]);
    }
}
