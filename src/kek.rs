//! Interface to the device key-encryption-key (KEK) service.
//!
//! The KEK wraps the master secret bundle before it reaches flash and
//! unwraps it when a derivation command loads it. The transform is in place
//! and length-preserving, so an encrypted record has the same fixed size as
//! a plaintext one.

use thiserror::Error;

/// Failure reported by a [`KeyEncryptionKey`] implementation.
#[derive(Debug, Error)]
pub enum KekError {
    /// The KEK has not been unlocked or is otherwise unavailable.
    #[error("key encryption key is unavailable")]
    Unavailable,
    /// The KEK was available but the operation failed.
    #[error("key encryption key operation failed: {0}")]
    Failed(String),
}

/// Trait for in-place encryption of secrets at rest.
pub trait KeyEncryptionKey {
    /// Encrypt `data` in place.
    fn encrypt(&self, data: &mut [u8]) -> Result<(), KekError>;

    /// Decrypt `data` in place.
    fn decrypt(&self, data: &mut [u8]) -> Result<(), KekError>;
}

impl<K: KeyEncryptionKey + ?Sized> KeyEncryptionKey for &K {
    fn encrypt(&self, data: &mut [u8]) -> Result<(), KekError> {
        (**self).encrypt(data)
    }

    fn decrypt(&self, data: &mut [u8]) -> Result<(), KekError> {
        (**self).decrypt(data)
    }
}
