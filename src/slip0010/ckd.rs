//! Private Child Key Derivation (CKDpriv) according to SLIP-0010.

use crate::{
    curve::{CurveTrait, ScalarTrait, COMPRESSED_POINT_LEN},
    errors::{HdError, Result},
    keys::{ChainCode, ExtendedKeyPair, KeyPair},
    path::HARDENED,
    slip0010::regenerate_until,
    utils::CRYPTOGRAPHIC_RETRY_MAX,
};
use tracing::{debug, error};
use zeroize::Zeroizing;

/// `0x00 ‖ ser256(k)` or `serP(K)`, followed by `ser32(i)`.
const CKD_INPUT_LEN: usize = COMPRESSED_POINT_LEN + 4;

/// True if `index` selects a hardened child.
pub fn is_hardened(index: u32) -> bool {
    index >= HARDENED
}

/// Derive the child of `parent` at `index`.
///
/// Hardened indices mix in the parent's private scalar; normal indices its
/// compressed public key. If the HMAC yields an unusable candidate the input
/// is rebuilt as `0x01 ‖ IR ‖ ser32(i)` and hashed again under the same
/// chain code.
///
/// On success the child scalar lies in `[1, q)`.
pub fn derive_child<C: CurveTrait>(
    parent: &ExtendedKeyPair<C>,
    index: u32,
) -> Result<ExtendedKeyPair<C>> {
    derive_child_bounded(parent, index, CRYPTOGRAPHIC_RETRY_MAX)
}

/// [`derive_child`] with an explicit bound on regenerated candidates.
pub(crate) fn derive_child_bounded<C: CurveTrait>(
    parent: &ExtendedKeyPair<C>,
    index: u32,
    max_attempts: usize,
) -> Result<ExtendedKeyPair<C>> {
    let parent_secret = parent.key_pair().secret();
    let mut data = Zeroizing::new([0u8; CKD_INPUT_LEN]);

    if is_hardened(index) {
        if parent_secret.is_zero() {
            error!("Hardened derivation requested from a null private key");
            return Err(HdError::NullParameter);
        }
        data[0] = 0x00;
        data[1..COMPRESSED_POINT_LEN].copy_from_slice(&*parent_secret.to_be_bytes());
    } else {
        data[..COMPRESSED_POINT_LEN].copy_from_slice(&parent.key_pair().compressed_public_key()?);
    }
    data[COMPRESSED_POINT_LEN..].copy_from_slice(&index.to_be_bytes());

    debug!("Deriving child {index:#010x} on {:?}", C::ID);
    regenerate_until(
        parent.chain_code().as_bytes(),
        &*data,
        4,
        max_attempts,
        |il, ir| {
            let shift = Zeroizing::new(C::Scalar::from_be_bytes(il)?);
            let candidate = Zeroizing::new(shift.add(parent_secret));
            (!candidate.is_zero()).then(|| {
                ExtendedKeyPair::new(KeyPair::from_secret(*candidate), ChainCode::from(*ir))
            })
        },
    )
}
