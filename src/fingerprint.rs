//! Key fingerprints: the first four bytes of `RIPEMD160(SHA256(Q))` over the
//! compressed public key.

use crate::{curve::CurveTrait, errors::Result};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Length of a fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 4;

/// Short identifier of a public key.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Compute the fingerprint of a public point.
    pub fn of<C: CurveTrait>(public: &C) -> Result<Self> {
        let compressed = public.to_compressed()?;
        let hash160 = Ripemd160::digest(Sha256::digest(compressed));
        let mut fingerprint = [0u8; FINGERPRINT_LEN];
        fingerprint.copy_from_slice(&hash160[..FINGERPRINT_LEN]);
        Ok(Self(fingerprint))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }
}

impl From<[u8; FINGERPRINT_LEN]> for Fingerprint {
    fn from(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }
}
