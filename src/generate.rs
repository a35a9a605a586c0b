// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Master seed generation and persistence.

use crate::{
    curve::{CurveId, CurveTrait, ScalarTrait, SCALAR_LEN},
    errors::{HdError, Result},
    k256::K256,
    kek::KeyEncryptionKey,
    keys::{ExtendedKeyPair, SECRET_BUNDLE_LEN},
    p256::P256,
    path::SlotIndex,
    slip0010::master::master_key_from_seed,
    storage::{MasterSeedRecord, SeedStorage},
};
use rand::{CryptoRng, RngCore};
use tracing::{error, info, instrument};
use zeroize::Zeroizing;

/// Longest caller-supplied seed accepted, and the length of a generated one.
pub const MAX_SEED_LEN: usize = 64;

/// Generate a master node for `curve` and store it, encrypted, at `slot`.
///
/// With no `seed` (or an empty one), [`MAX_SEED_LEN`] bytes are drawn from
/// `rng`. Any record already at `slot` is overwritten.
#[instrument(skip_all, err(Debug))]
pub fn generate_master<S, K, R>(
    storage: &mut S,
    kek: &K,
    rng: &mut R,
    curve: CurveId,
    slot: SlotIndex,
    seed: Option<&[u8]>,
) -> Result<()>
where
    S: SeedStorage + ?Sized,
    K: KeyEncryptionKey + ?Sized,
    R: RngCore + CryptoRng,
{
    info!("Generating {curve:?} master seed for slot {}", slot.index());

    let mut seed_bytes = Zeroizing::new([0u8; MAX_SEED_LEN]);
    let seed: &[u8] = match seed {
        Some(seed) if seed.len() > MAX_SEED_LEN => {
            error!(
                "Seed is {} bytes, at most {MAX_SEED_LEN} are accepted",
                seed.len()
            );
            return Err(HdError::MalformedParameters);
        }
        Some(seed) if !seed.is_empty() => seed,
        _ => {
            rng.fill_bytes(&mut seed_bytes[..]);
            &seed_bytes[..]
        }
    };

    let mut bundle = match curve {
        CurveId::Secp256k1 => secret_bundle(&master_key_from_seed::<K256>(seed)?),
        CurveId::Secp256r1 => secret_bundle(&master_key_from_seed::<P256>(seed)?),
    };

    kek.encrypt(&mut bundle[..]).map_err(|e| {
        error!("Failed to encrypt master seed: {e}");
        HdError::ExecutionError
    })?;
    let record = MasterSeedRecord::new(curve, *bundle);

    storage.store(slot, &record).map_err(|e| {
        error!("Failed to write master seed record: {e}");
        HdError::ExecutionError
    })?;
    storage.write_completed();
    Ok(())
}

/// `ser256(d) ‖ chain code`, the plaintext a record encrypts.
fn secret_bundle<C: CurveTrait>(
    master: &ExtendedKeyPair<C>,
) -> Zeroizing<[u8; SECRET_BUNDLE_LEN]> {
    let mut bundle = Zeroizing::new([0u8; SECRET_BUNDLE_LEN]);
    bundle[..SCALAR_LEN].copy_from_slice(&*master.key_pair().secret().to_be_bytes());
    bundle[SCALAR_LEN..].copy_from_slice(master.chain_code().as_bytes());
    bundle
}
