//! P256 functions

use crate::{
    curve::{CurveId, CurveTrait, ScalarTrait, COMPRESSED_POINT_LEN, SCALAR_LEN},
    errors::{HdError, Result},
};
use p256::{
    elliptic_curve::{sec1::ToEncodedPoint, Field, PrimeField},
    ProjectivePoint, Scalar as P256_Scalar,
};
use tracing::error;
use zeroize::{Zeroize, Zeroizing};

/// Wrapper around p256::ProjectivePoint so that we can implement
/// [`CurveTrait`] for it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Zeroize)]
pub struct P256(pub p256::ProjectivePoint);

impl P256 {
    pub(crate) const GENERATOR: Self = P256(ProjectivePoint::GENERATOR);

    pub(crate) fn multiply_by_scalar(&self, scalar: &P256_Scalar) -> Self {
        Self(self.0 * scalar)
    }

    /// Serialize the point as a compressed secp256r1 byte array.
    pub(crate) fn to_bytes(self) -> Result<[u8; COMPRESSED_POINT_LEN]> {
        let encoded = self.0.to_affine().to_encoded_point(true);
        encoded.as_bytes().try_into().map_err(|_| {
            error!("Failed to encode secp256r1 point: point at infinity");
            HdError::ExecutionError
        })
    }
}

impl From<ProjectivePoint> for P256 {
    fn from(p: ProjectivePoint) -> Self {
        Self(p)
    }
}

impl CurveTrait for P256 {
    const ID: CurveId = CurveId::Secp256r1;
    const GENERATOR: Self = P256::GENERATOR;
    type Scalar = P256_Scalar;

    fn scale_generator(scalar: &Self::Scalar) -> Self {
        P256::GENERATOR.multiply_by_scalar(scalar)
    }

    fn to_compressed(&self) -> Result<[u8; COMPRESSED_POINT_LEN]> {
        self.to_bytes()
    }
}

impl ScalarTrait for P256_Scalar {
    fn zero() -> Self {
        P256_Scalar::ZERO
    }

    fn is_zero(&self) -> bool {
        <P256_Scalar as Field>::is_zero(self).into()
    }

    fn add(&self, other: &Self) -> Self {
        *self + other
    }

    fn from_be_bytes(bytes: &[u8; SCALAR_LEN]) -> Option<Self> {
        <P256_Scalar as PrimeField>::from_repr(p256::FieldBytes::from(*bytes)).into()
    }

    fn to_be_bytes(&self) -> Zeroizing<[u8; SCALAR_LEN]> {
        let mut repr = <P256_Scalar as PrimeField>::to_repr(self);
        let mut bytes = Zeroizing::new([0u8; SCALAR_LEN]);
        bytes.copy_from_slice(&repr);
        repr[..].zeroize();
        bytes
    }
}
