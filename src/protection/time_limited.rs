// Expiring payloads on top of any data protector

use super::{DataProtectionProvider, DataProtector, ProtectionError};
use chrono::{DateTime, Duration, Utc};

/// Purpose appended to the wrapped protector's chain
pub const TIME_LIMITED_PURPOSE: &str = "TimeLimitedDataProtector.v1";

const EXPIRATION_SIZE: usize = 8;

/// Protector whose payloads carry an expiration
///
/// The expiration is stored as 8 big-endian bytes of unix milliseconds in
/// front of the plaintext, and both are protected together.
pub struct TimeLimitedDataProtector {
    inner: Box<dyn DataProtector>,
}

impl TimeLimitedDataProtector {
    /// # Errors
    ///
    /// Returns an error if the provider rejects the time-limited purpose.
    pub fn new<P>(provider: &P) -> Result<Self, ProtectionError>
    where
        P: DataProtectionProvider + ?Sized,
    {
        Ok(Self {
            inner: provider.create_protector(TIME_LIMITED_PURPOSE)?,
        })
    }

    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn protect_until(
        &self,
        plaintext: &[u8],
        expiration: DateTime<Utc>,
    ) -> Result<Vec<u8>, ProtectionError> {
        let mut payload = Vec::with_capacity(EXPIRATION_SIZE + plaintext.len());
        payload.extend_from_slice(&expiration.timestamp_millis().to_be_bytes());
        payload.extend_from_slice(plaintext);
        self.inner.protect(&payload)
    }

    /// # Errors
    ///
    /// Returns [`ProtectionError::InvalidLifetime`] if the expiration falls
    /// outside the representable range, or an error if encryption fails.
    pub fn protect_for(
        &self,
        plaintext: &[u8],
        lifetime: Duration,
    ) -> Result<Vec<u8>, ProtectionError> {
        let expiration = Utc::now()
            .checked_add_signed(lifetime)
            .ok_or_else(|| ProtectionError::InvalidLifetime(lifetime.to_string()))?;
        self.protect_until(plaintext, expiration)
    }

    /// Unprotect and return the plaintext together with its expiration
    ///
    /// # Errors
    ///
    /// Returns [`ProtectionError::Expired`] once the expiration has passed,
    /// or the inner protector's error.
    pub fn unprotect_with_expiration(
        &self,
        protected: &[u8],
    ) -> Result<(Vec<u8>, DateTime<Utc>), ProtectionError> {
        self.unprotect_at(protected, Utc::now())
    }

    fn unprotect_at(
        &self,
        protected: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(Vec<u8>, DateTime<Utc>), ProtectionError> {
        let mut payload = self.inner.unprotect(protected)?;
        if payload.len() < EXPIRATION_SIZE {
            return Err(ProtectionError::Encoding(
                "payload is missing its expiration".to_string(),
            ));
        }

        let mut millis = [0u8; EXPIRATION_SIZE];
        millis.copy_from_slice(&payload[..EXPIRATION_SIZE]);
        let expiration = DateTime::from_timestamp_millis(i64::from_be_bytes(millis))
            .ok_or_else(|| ProtectionError::Encoding("expiration out of range".to_string()))?;

        if now >= expiration {
            return Err(ProtectionError::Expired { expiration });
        }

        payload.drain(..EXPIRATION_SIZE);
        Ok((payload, expiration))
    }
}

impl DataProtectionProvider for TimeLimitedDataProtector {
    fn create_protector(&self, purpose: &str) -> Result<Box<dyn DataProtector>, ProtectionError> {
        Ok(Box::new(Self {
            inner: self.inner.create_protector(purpose)?,
        }))
    }
}

impl DataProtector for TimeLimitedDataProtector {
    /// Protect without a practical expiration
    fn protect(&self, plaintext: &[u8]) -> Result<Vec<u8>, ProtectionError> {
        self.protect_until(plaintext, DateTime::<Utc>::MAX_UTC)
    }

    fn unprotect(&self, protected: &[u8]) -> Result<Vec<u8>, ProtectionError> {
        self.unprotect_with_expiration(protected)
            .map(|(plaintext, _)| plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protection::KeyRing;

    fn protector(ring: &KeyRing) -> TimeLimitedDataProtector {
        TimeLimitedDataProtector::new(ring).unwrap()
    }

    #[test]
    fn test_unexpired_payload_round_trips_with_expiration() {
        let ring = KeyRing::generate();
        let protector = protector(&ring);
        let expiration = DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap()
            + Duration::minutes(5);

        let protected = protector.protect_until(b"state", expiration).unwrap();
        let (plaintext, returned) = protector.unprotect_with_expiration(&protected).unwrap();

        assert_eq!(plaintext, b"state");
        assert_eq!(returned, expiration);
    }

    #[test]
    fn test_expired_payload_is_rejected() {
        let ring = KeyRing::generate();
        let protector = protector(&ring);
        let protected = protector.protect_for(b"state", Duration::minutes(1)).unwrap();

        let later = Utc::now() + Duration::minutes(2);
        assert!(matches!(
            protector.unprotect_at(&protected, later),
            Err(ProtectionError::Expired { .. })
        ));
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let ring = KeyRing::generate();
        let protector = protector(&ring);

        let result = protector.protect_for(b"state", Duration::days(365 * 1_000_000));
        assert!(matches!(result, Err(ProtectionError::InvalidLifetime(_))));

        let result = protector.protect_for(b"state", Duration::days(-365 * 1_000_000));
        assert!(matches!(result, Err(ProtectionError::InvalidLifetime(_))));
    }

    #[test]
    fn test_plain_protect_does_not_expire() {
        let ring = KeyRing::generate();
        let protector = protector(&ring);
        let protected = protector.protect(b"state").unwrap();

        let far_future = Utc::now() + Duration::days(365 * 100);
        let (plaintext, _) = protector.unprotect_at(&protected, far_future).unwrap();
        assert_eq!(plaintext, b"state");
    }

    #[test]
    fn test_not_interchangeable_with_plain_protector() {
        let ring = KeyRing::generate();
        let plain = ring.create_protector(TIME_LIMITED_PURPOSE).unwrap();
        let timed = protector(&ring);

        let protected = plain.protect(b"state").unwrap();
        assert!(timed.unprotect(&protected).is_err());

        let protected = ring
            .create_protector("Other")
            .unwrap()
            .protect(b"state")
            .unwrap();
        assert_eq!(timed.unprotect(&protected), Err(ProtectionError::Cryptography));
    }

    #[test]
    fn test_sub_protectors_keep_expiration() {
        let ring = KeyRing::generate();
        let child = protector(&ring).create_protector("State").unwrap();
        let protected = child.protect(b"state").unwrap();
        assert_eq!(child.unprotect(&protected).unwrap(), b"state");
    }
}
