// Protected serialisation of flow state for the identity provider round trip

use super::{
    create_protector_chain, DataProtectionProvider, DataProtector, DataProtectorExt,
    ProtectionError,
};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;

pub const STATE_PURPOSE: &str = "RemoteAuthentication";
pub const STATE_SUB_PURPOSE: &str = "State";

/// Turns flow state into an opaque, tamper-proof string and back
///
/// Authentication services embed the protected string in the request sent
/// to the identity provider and restore the state when the callback
/// arrives.
pub struct ProtectedStateFormat<S> {
    protector: Box<dyn DataProtector>,
    _state: PhantomData<fn() -> S>,
}

impl<S> ProtectedStateFormat<S>
where
    S: Serialize + DeserializeOwned,
{
    /// # Errors
    ///
    /// Returns an error if the provider rejects the state purposes.
    pub fn new<P>(provider: &P) -> Result<Self, ProtectionError>
    where
        P: DataProtectionProvider + ?Sized,
    {
        Ok(Self {
            protector: create_protector_chain(provider, STATE_PURPOSE, &[STATE_SUB_PURPOSE])?,
            _state: PhantomData,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the state cannot be serialised or encrypted.
    pub fn protect(&self, state: &S) -> Result<String, ProtectionError> {
        let json = serde_json::to_string(state)
            .map_err(|e| ProtectionError::Serialization(e.to_string()))?;
        self.protector.as_ref().protect_str(&json)
    }

    /// # Errors
    ///
    /// Returns an error if the value was not produced by [`Self::protect`]
    /// with the same key, or no longer deserialises into `S`.
    pub fn unprotect(&self, protected: &str) -> Result<S, ProtectionError> {
        let json = self.protector.as_ref().unprotect_str(protected)?;
        serde_json::from_str(&json).map_err(|e| ProtectionError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteAuthenticationState;
    use crate::protection::{KeyRing, TimeLimitedDataProtector};

    #[test]
    fn test_state_round_trip() {
        let ring = KeyRing::generate();
        let format = ProtectedStateFormat::<RemoteAuthenticationState>::new(&ring).unwrap();
        let state = RemoteAuthenticationState::with_return_url("https://app.example/orders");

        let protected = format.protect(&state).unwrap();
        assert!(!protected.contains("orders"));
        assert_eq!(format.unprotect(&protected).unwrap(), state);
    }

    #[test]
    fn test_state_from_other_key_is_rejected() {
        let format =
            ProtectedStateFormat::<RemoteAuthenticationState>::new(&KeyRing::generate()).unwrap();
        let other =
            ProtectedStateFormat::<RemoteAuthenticationState>::new(&KeyRing::generate()).unwrap();

        let protected = other.protect(&RemoteAuthenticationState::new()).unwrap();
        assert_eq!(format.unprotect(&protected), Err(ProtectionError::Cryptography));
    }

    #[test]
    fn test_payload_of_wrong_shape_is_rejected() {
        let ring = KeyRing::generate();
        let raw = create_protector_chain(&ring, STATE_PURPOSE, &[STATE_SUB_PURPOSE]).unwrap();
        let protected = raw.protect_str("[1, 2, 3]").unwrap();

        let format = ProtectedStateFormat::<RemoteAuthenticationState>::new(&ring).unwrap();
        assert!(matches!(
            format.unprotect(&protected),
            Err(ProtectionError::Serialization(_))
        ));
    }

    #[test]
    fn test_works_over_time_limited_protector() {
        let ring = KeyRing::generate();
        let timed = TimeLimitedDataProtector::new(&ring).unwrap();
        let format = ProtectedStateFormat::<RemoteAuthenticationState>::new(&timed).unwrap();

        let state = RemoteAuthenticationState::with_return_url("https://app.example/");
        let protected = format.protect(&state).unwrap();
        assert_eq!(format.unprotect(&protected).unwrap(), state);
    }
}
