//! K256 functions

use crate::{
    curve::{CurveId, CurveTrait, ScalarTrait, COMPRESSED_POINT_LEN, SCALAR_LEN},
    errors::{HdError, Result},
};
use k256::{
    elliptic_curve::{sec1::ToEncodedPoint, Field, PrimeField},
    ProjectivePoint, Scalar as K256_Scalar,
};
use tracing::error;
use zeroize::{Zeroize, Zeroizing};

/// Wrapper around k256::ProjectivePoint so that we can implement
/// [`CurveTrait`] for it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Zeroize)]
pub struct K256(pub k256::ProjectivePoint);

impl K256 {
    pub(crate) const GENERATOR: Self = K256(ProjectivePoint::GENERATOR);

    pub(crate) fn multiply_by_scalar(&self, scalar: &K256_Scalar) -> Self {
        Self(self.0 * scalar)
    }

    /// Serialize the point as a compressed secp256k1 byte array.
    pub(crate) fn to_bytes(self) -> Result<[u8; COMPRESSED_POINT_LEN]> {
        let encoded = self.0.to_affine().to_encoded_point(true);
        encoded.as_bytes().try_into().map_err(|_| {
            error!("Failed to encode secp256k1 point: point at infinity");
            HdError::ExecutionError
        })
    }
}

impl From<ProjectivePoint> for K256 {
    fn from(p: ProjectivePoint) -> Self {
        Self(p)
    }
}

impl CurveTrait for K256 {
    const ID: CurveId = CurveId::Secp256k1;
    const GENERATOR: Self = K256::GENERATOR;
    type Scalar = K256_Scalar;

    fn scale_generator(scalar: &Self::Scalar) -> Self {
        K256::GENERATOR.multiply_by_scalar(scalar)
    }

    fn to_compressed(&self) -> Result<[u8; COMPRESSED_POINT_LEN]> {
        self.to_bytes()
    }
}

impl ScalarTrait for K256_Scalar {
    fn zero() -> Self {
        K256_Scalar::ZERO
    }

    fn is_zero(&self) -> bool {
        <K256_Scalar as Field>::is_zero(self).into()
    }

    fn add(&self, other: &Self) -> Self {
        *self + other
    }

    fn from_be_bytes(bytes: &[u8; SCALAR_LEN]) -> Option<Self> {
        <K256_Scalar as PrimeField>::from_repr(k256::FieldBytes::from(*bytes)).into()
    }

    fn to_be_bytes(&self) -> Zeroizing<[u8; SCALAR_LEN]> {
        let mut repr = <K256_Scalar as PrimeField>::to_repr(self);
        let mut bytes = Zeroizing::new([0u8; SCALAR_LEN]);
        bytes.copy_from_slice(&repr);
        repr[..].zeroize();
        bytes
    }
}

#[cfg(test)]
mod curve_point_tests {
    use super::*;

    #[test]
    fn generator_compresses_to_known_encoding() {
        let one = K256_Scalar::ONE;
        let g = K256::scale_generator(&one).to_compressed().unwrap();
        assert_eq!(
            hex::encode(g),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn identity_has_no_compressed_encoding() {
        let zero = <K256_Scalar as ScalarTrait>::zero();
        assert_eq!(
            K256::scale_generator(&zero).to_compressed(),
            Err(HdError::ExecutionError)
        );
    }

    #[test]
    fn scalar_bytes_reject_order_and_above() {
        // n = FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFE BAAEDCE6 AF48A03B BFD25E8C D0364141
        let mut n = [0xffu8; 32];
        n[15] = 0xfe;
        n[16..].copy_from_slice(&hex::decode("baaedce6af48a03bbfd25e8cd0364141").unwrap());
        assert!(<K256_Scalar as ScalarTrait>::from_be_bytes(&n).is_none());
        assert!(<K256_Scalar as ScalarTrait>::from_be_bytes(&[0xff; 32]).is_none());

        n[31] = 0x40;
        let below = <K256_Scalar as ScalarTrait>::from_be_bytes(&n).unwrap();
        assert_eq!(*ScalarTrait::to_be_bytes(&below), n);
        assert!(!ScalarTrait::is_zero(&below));
        let wrapped = ScalarTrait::add(&below, &K256_Scalar::ONE);
        assert!(ScalarTrait::is_zero(&wrapped));
    }
}
