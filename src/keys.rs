// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Secret-bearing key material.
//!
//! Every type here scrubs its secret on drop, so any exit path out of a
//! command (including an early `?`) leaves no scalar or chain code behind.

use crate::{
    curve::{CurveTrait, ScalarTrait, COMPRESSED_POINT_LEN, SCALAR_LEN},
    errors::{HdError, Result},
};
use std::fmt::Debug;
use tracing::error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a chain code in bytes.
pub const CHAIN_CODE_LEN: usize = 32;

/// Length of the decrypted secret bundle: scalar followed by chain code.
pub const SECRET_BUNDLE_LEN: usize = SCALAR_LEN + CHAIN_CODE_LEN;

/// The 32-byte chain code paired with every key in the tree.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ChainCode([u8; CHAIN_CODE_LEN]);

impl ChainCode {
    pub(crate) fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; CHAIN_CODE_LEN] = bytes.try_into().map_err(|_| {
            error!(
                "Chain code must be {CHAIN_CODE_LEN} bytes, got {}",
                bytes.len()
            );
            HdError::ExecutionError
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; CHAIN_CODE_LEN] {
        &self.0
    }
}

impl From<[u8; CHAIN_CODE_LEN]> for ChainCode {
    fn from(bytes: [u8; CHAIN_CODE_LEN]) -> Self {
        Self(bytes)
    }
}

impl Debug for ChainCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChainCode([redacted])")
    }
}

/// A private scalar together with its public point `Q = d·G`.
///
/// The scalar may be zero only if it was reconstructed from a corrupt
/// record; every scalar produced by derivation is in `[1, q)`.
#[derive(Clone)]
pub struct KeyPair<C: CurveTrait> {
    secret: C::Scalar,
    public: C,
}

impl<C: CurveTrait> KeyPair<C> {
    /// Build a key pair from a scalar, computing the public point.
    pub fn from_secret(secret: C::Scalar) -> Self {
        let public = C::scale_generator(&secret);
        Self { secret, public }
    }

    /// Build a key pair from a 32-byte big-endian scalar.
    ///
    /// Values not less than the curve order are rejected.
    pub fn from_secret_bytes(bytes: &[u8; SCALAR_LEN]) -> Result<Self> {
        let secret = C::Scalar::from_be_bytes(bytes).ok_or_else(|| {
            error!("Stored {:?} scalar is not below the curve order", C::ID);
            HdError::ExecutionError
        })?;
        Ok(Self::from_secret(secret))
    }

    pub fn secret(&self) -> &C::Scalar {
        &self.secret
    }

    pub fn public_point(&self) -> &C {
        &self.public
    }

    /// SEC1 compressed encoding of the public point.
    pub fn compressed_public_key(&self) -> Result<[u8; COMPRESSED_POINT_LEN]> {
        self.public.to_compressed()
    }
}

impl<C: CurveTrait> Drop for KeyPair<C> {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl<C: CurveTrait> Debug for KeyPair<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("secret", &"[redacted]")
            .field("public", &self.public)
            .finish()
    }
}

/// A node of the derivation tree: a key pair and its chain code.
#[derive(Clone, Debug)]
pub struct ExtendedKeyPair<C: CurveTrait> {
    pub(crate) key_pair: KeyPair<C>,
    pub(crate) chain_code: ChainCode,
}

impl<C: CurveTrait> ExtendedKeyPair<C> {
    pub fn new(key_pair: KeyPair<C>, chain_code: ChainCode) -> Self {
        Self {
            key_pair,
            chain_code,
        }
    }

    /// Rebuild a node from the decrypted `scalar ‖ chain code` bundle.
    pub fn from_secret_bundle(bundle: &[u8; SECRET_BUNDLE_LEN]) -> Result<Self> {
        let (scalar, chain_code) = bundle.split_at(SCALAR_LEN);
        let mut scalar_bytes = [0u8; SCALAR_LEN];
        scalar_bytes.copy_from_slice(scalar);
        let key_pair = KeyPair::from_secret_bytes(&scalar_bytes);
        scalar_bytes.zeroize();
        Ok(Self::new(key_pair?, ChainCode::from_slice(chain_code)?))
    }

    pub fn key_pair(&self) -> &KeyPair<C> {
        &self.key_pair
    }

    pub fn chain_code(&self) -> &ChainCode {
        &self.chain_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k256::K256;

    #[test]
    fn debug_output_is_redacted() {
        let bundle = [0x11u8; SECRET_BUNDLE_LEN];
        let node = ExtendedKeyPair::<K256>::from_secret_bundle(&bundle).unwrap();
        let rendered = format!("{node:?}");
        assert!(rendered.contains("secret: \"[redacted]\""));
        assert!(rendered.contains("ChainCode([redacted])"));
    }

    #[test]
    fn bundle_splits_scalar_and_chain_code() {
        let mut bundle = [0u8; SECRET_BUNDLE_LEN];
        bundle[31] = 0x01;
        bundle[32..].copy_from_slice(&[0xAB; CHAIN_CODE_LEN]);
        let node = ExtendedKeyPair::<K256>::from_secret_bundle(&bundle).unwrap();
        assert_eq!(node.chain_code().as_bytes(), &[0xAB; CHAIN_CODE_LEN]);
        assert_eq!(
            node.key_pair().compressed_public_key().unwrap(),
            K256::GENERATOR.to_compressed().unwrap()
        );
    }

    #[test]
    fn bundle_with_scalar_above_order_is_rejected() {
        let bundle = [0xFFu8; SECRET_BUNDLE_LEN];
        assert_eq!(
            ExtendedKeyPair::<K256>::from_secret_bundle(&bundle).unwrap_err(),
            HdError::ExecutionError
        );
    }
}
