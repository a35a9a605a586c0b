//! Elliptic Curve abstraction
use crate::errors::{HdError, Result};
use std::fmt::Debug;
use tracing::error;
use zeroize::{Zeroize, Zeroizing};

/// Length in bytes of a serialized scalar.
pub const SCALAR_LEN: usize = 32;

/// Length in bytes of a SEC1 compressed curve point.
pub const COMPRESSED_POINT_LEN: usize = 33;

/// Curves a master seed can be generated for.
///
/// The discriminant is the tag stored in the first byte of a
/// [`MasterSeedRecord`](crate::storage::MasterSeedRecord) and is also the
/// curve selector of the generate-master command.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum CurveId {
    /// secp256k1
    Secp256k1 = 0x01,
    /// NIST P-256 (secp256r1)
    Secp256r1 = 0x02,
}

/// HMAC key used to derive a master key from a seed, per curve.
const CURVE_DOMAINS: &[(CurveId, &[u8])] = &[
    (CurveId::Secp256k1, b"Bitcoin seed"),
    (CurveId::Secp256r1, b"Nist256p1 seed"),
];

impl CurveId {
    /// The on-disk / wire tag for this curve.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a curve by its tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        CURVE_DOMAINS
            .iter()
            .map(|(id, _)| *id)
            .find(|id| id.tag() == tag)
    }

    /// The domain-separation string keying master-key generation.
    pub fn domain_separator(self) -> Result<&'static [u8]> {
        CURVE_DOMAINS
            .iter()
            .find(|(id, _)| *id == self)
            .map(|(_, domain)| *domain)
            .ok_or_else(|| {
                error!("No domain separator registered for curve {self:?}");
                HdError::ExecutionError
            })
    }
}

/// Generic elliptic curve point.
pub trait CurveTrait: 'static + Clone + Copy + Debug + Send + Sync + Eq + PartialEq + Zeroize {
    /// Identifier of this curve.
    const ID: CurveId;

    /// A generator point.
    const GENERATOR: Self;

    /// The type of scalars.
    type Scalar: ScalarTrait;

    /// Multiply the generator by a scalar.
    fn scale_generator(scalar: &Self::Scalar) -> Self;

    /// Serialize the point in SEC1 compressed form.
    ///
    /// Fails for the identity point, which has no 33-byte encoding.
    fn to_compressed(&self) -> Result<[u8; COMPRESSED_POINT_LEN]>;
}

/// Scalar trait.
///
/// Scalars are secret; implementors must not implement `Debug` output that
/// reveals them through this crate's types.
pub trait ScalarTrait: Sync + Send + Clone + Copy + Zeroize {
    /// Return the zero scalar.
    fn zero() -> Self;

    /// True if and only if this is the zero scalar.
    fn is_zero(&self) -> bool;

    /// Add two scalars (mod the curve order).
    fn add(&self, other: &Self) -> Self;

    /// Interpret big-endian bytes as a scalar. Returns `None` if the value is
    /// not less than the curve order; no reduction takes place.
    fn from_be_bytes(bytes: &[u8; SCALAR_LEN]) -> Option<Self>;

    /// Serialize as 32 big-endian bytes.
    fn to_be_bytes(&self) -> Zeroizing<[u8; SCALAR_LEN]>;
}
