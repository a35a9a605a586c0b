//! Master key generation from a seed.

use crate::{
    curve::{CurveTrait, ScalarTrait},
    errors::Result,
    keys::{ChainCode, ExtendedKeyPair, KeyPair},
    slip0010::regenerate_until,
    utils::CRYPTOGRAPHIC_RETRY_MAX,
};
use tracing::debug;
use zeroize::Zeroizing;

/// Derive the master node for curve `C` from `seed`.
///
/// `I = HMAC-SHA512(domain(C), seed)`; the master scalar is `IL` and the
/// chain code `IR`. While `IL` is zero or not below the curve order the HMAC
/// is recomputed over `0x01 ‖ IR`.
pub fn master_key_from_seed<C: CurveTrait>(seed: &[u8]) -> Result<ExtendedKeyPair<C>> {
    master_key_bounded(seed, CRYPTOGRAPHIC_RETRY_MAX)
}

/// [`master_key_from_seed`] with an explicit bound on regenerated candidates.
pub(crate) fn master_key_bounded<C: CurveTrait>(
    seed: &[u8],
    max_attempts: usize,
) -> Result<ExtendedKeyPair<C>> {
    let domain = C::ID.domain_separator()?;
    debug!("Computing {:?} master key", C::ID);
    regenerate_until(domain, seed, 0, max_attempts, |il, ir| {
        let secret = Zeroizing::new(C::Scalar::from_be_bytes(il)?);
        (!secret.is_zero()).then(|| {
            ExtendedKeyPair::new(KeyPair::from_secret(*secret), ChainCode::from(*ir))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        curve::CurveId, errors::HdError, fingerprint::Fingerprint, k256::K256, p256::P256,
        slip0010::hmac_sha512, utils::testing::vector1_seed,
    };

    #[test]
    fn bip32_vector1_master() {
        let master = master_key_from_seed::<K256>(&vector1_seed()).unwrap();
        assert_eq!(
            hex::encode(master.chain_code().as_bytes()),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
        assert_eq!(
            hex::encode(*ScalarTrait::to_be_bytes(master.key_pair().secret())),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
        assert_eq!(
            hex::encode(master.key_pair().compressed_public_key().unwrap()),
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );
        assert_eq!(
            hex::encode(Fingerprint::of(master.key_pair().public_point()).unwrap().as_bytes()),
            "3442193e"
        );
    }

    #[test]
    fn p256_master_uses_its_own_domain() {
        let seed = vector1_seed();
        let master = master_key_from_seed::<P256>(&seed).unwrap();
        let i = hmac_sha512(CurveId::Secp256r1.domain_separator().unwrap(), &seed).unwrap();
        assert_eq!(&master.chain_code().as_bytes()[..], &i[32..]);
        assert_eq!(&ScalarTrait::to_be_bytes(master.key_pair().secret())[..], &i[..32]);

        let k1 = master_key_from_seed::<K256>(&seed).unwrap();
        assert_ne!(k1.chain_code(), master.chain_code());
    }

    #[test]
    fn short_and_empty_seeds_are_accepted() {
        assert!(master_key_from_seed::<K256>(&[]).is_ok());
        assert!(master_key_from_seed::<P256>(&[0x01]).is_ok());
    }

    #[test]
    fn exhausted_attempts_are_execution_errors() {
        assert_eq!(
            master_key_bounded::<K256>(&vector1_seed(), 0).unwrap_err(),
            HdError::ExecutionError
        );
        assert!(master_key_bounded::<K256>(&vector1_seed(), 1).is_ok());
    }
}
