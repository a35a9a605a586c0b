// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Walking a derivation path from a stored master node.

use crate::{
    curve::{CurveId, CurveTrait},
    errors::{HdError, Result},
    fingerprint::Fingerprint,
    k256::K256,
    kek::KeyEncryptionKey,
    keys::{ExtendedKeyPair, SECRET_BUNDLE_LEN},
    p256::P256,
    path::DerivationPath,
    response::ExtendedKeyResponse,
    slip0010::ckd::derive_child,
    storage::SeedStorage,
};
use tracing::{error, info, instrument};
use zeroize::Zeroizing;

/// The node at the end of a path, with the metadata an extended key needs.
#[derive(Debug)]
pub struct DerivedNode<C: CurveTrait> {
    node: ExtendedKeyPair<C>,
    parent_fingerprint: Fingerprint,
    child_number: u32,
    depth: u8,
}

impl<C: CurveTrait> DerivedNode<C> {
    pub fn node(&self) -> &ExtendedKeyPair<C> {
        &self.node
    }

    /// Fingerprint of the parent node. For the master node itself this is
    /// the master's own fingerprint.
    pub fn parent_fingerprint(&self) -> &Fingerprint {
        &self.parent_fingerprint
    }

    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }
}

/// A derived node on whichever curve its master seed was generated for.
#[derive(Debug)]
pub enum DerivedKey {
    Secp256k1(DerivedNode<K256>),
    Secp256r1(DerivedNode<P256>),
}

impl DerivedKey {
    pub fn curve(&self) -> CurveId {
        match self {
            DerivedKey::Secp256k1(_) => CurveId::Secp256k1,
            DerivedKey::Secp256r1(_) => CurveId::Secp256r1,
        }
    }

    /// The public half of the node, ready to be returned to the host.
    pub fn to_response(&self) -> Result<ExtendedKeyResponse> {
        match self {
            DerivedKey::Secp256k1(node) => ExtendedKeyResponse::from_node(node),
            DerivedKey::Secp256r1(node) => ExtendedKeyResponse::from_node(node),
        }
    }
}

/// Load the master node in `path`'s slot and derive down `path`.
#[instrument(skip_all, err(Debug))]
pub fn derive_path<S, K>(storage: &S, kek: &K, path: &DerivationPath) -> Result<DerivedKey>
where
    S: SeedStorage + ?Sized,
    K: KeyEncryptionKey + ?Sized,
{
    info!(
        "Deriving depth {} path from slot {}",
        path.depth(),
        path.slot().index()
    );

    let record = storage
        .load(path.slot())
        .map_err(|e| {
            error!("Failed to read master seed record: {e}");
            HdError::ExecutionError
        })?
        .ok_or_else(|| {
            error!("No master seed in slot {}", path.slot().index());
            HdError::NotFound
        })?;

    let mut bundle: Zeroizing<[u8; SECRET_BUNDLE_LEN]> =
        Zeroizing::new(*record.encrypted_bundle());
    kek.decrypt(&mut bundle[..]).map_err(|e| {
        error!("Failed to decrypt master seed: {e}");
        HdError::ExecutionError
    })?;

    let curve = CurveId::from_tag(record.curve_tag()).ok_or_else(|| {
        error!("Stored curve tag {:#04x} is not supported", record.curve_tag());
        HdError::UnsupportedCurve
    })?;

    Ok(match curve {
        CurveId::Secp256k1 => DerivedKey::Secp256k1(derive_from_root(
            ExtendedKeyPair::from_secret_bundle(&bundle)?,
            path.indices(),
        )?),
        CurveId::Secp256r1 => DerivedKey::Secp256r1(derive_from_root(
            ExtendedKeyPair::from_secret_bundle(&bundle)?,
            path.indices(),
        )?),
    })
}

/// Apply [`derive_child`] once per index, starting at `root`.
///
/// Each parent is dropped (and wiped) as soon as its child exists.
pub fn derive_from_root<C: CurveTrait>(
    root: ExtendedKeyPair<C>,
    indices: &[u32],
) -> Result<DerivedNode<C>> {
    let depth = u8::try_from(indices.len()).map_err(|_| {
        error!("Derivation path of {} steps is too deep", indices.len());
        HdError::MalformedData
    })?;

    let mut current = root;
    let mut parent_fingerprint = None;
    let mut child_number = 0;
    for &index in indices {
        let child = derive_child(&current, index)?;
        parent_fingerprint = Some(Fingerprint::of(current.key_pair().public_point())?);
        child_number = index;
        current = child;
    }

    let parent_fingerprint = match parent_fingerprint {
        Some(fingerprint) => fingerprint,
        None => Fingerprint::of(current.key_pair().public_point())?,
    };
    Ok(DerivedNode {
        node: current,
        parent_fingerprint,
        child_number,
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        curve::ScalarTrait,
        generate::generate_master,
        keys::{ChainCode, KeyPair},
        path::{SlotIndex, HARDENED},
        slip0010::master::master_key_from_seed,
        storage::{MasterSeedRecord, MemoryStorage, RECORD_LEN},
        utils::testing::{init_testing, vector1_seed, FailingKek, FailingStorage, XorKek},
    };
    use hmac::{Hmac, Mac};
    use k256::elliptic_curve::{sec1::ToEncodedPoint, PrimeField};
    use sha2::Sha512;

    const KEK: XorKek = XorKek(0x5C);

    fn slot(n: u8) -> SlotIndex {
        SlotIndex::try_from(n).unwrap()
    }

    fn path(n: u8, indices: &[u32]) -> DerivationPath {
        DerivationPath::new(slot(n), indices.to_vec()).unwrap()
    }

    fn storage_with_vector1(curve: CurveId, n: u8) -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        let seed = vector1_seed();
        generate_master(
            &mut storage,
            &KEK,
            &mut init_testing(),
            curve,
            slot(n),
            Some(seed.as_slice()),
        )
        .unwrap();
        storage
    }

    fn response(storage: &MemoryStorage, path: &DerivationPath) -> ExtendedKeyResponse {
        derive_path(storage, &KEK, path)
            .unwrap()
            .to_response()
            .unwrap()
    }

    #[test]
    fn empty_path_returns_master() {
        let storage = storage_with_vector1(CurveId::Secp256k1, 0);
        let master = response(&storage, &path(0, &[]));
        assert_eq!(master.depth(), 0);
        assert_eq!(master.child_number(), 0);
        assert_eq!(hex::encode(master.parent_fingerprint().as_bytes()), "3442193e");
        assert_eq!(
            hex::encode(master.chain_code()),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
        assert_eq!(
            hex::encode(master.public_key()),
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );
    }

    #[test]
    fn bip32_vector1_path() {
        let storage = storage_with_vector1(CurveId::Secp256k1, 2);
        let key = derive_path(&storage, &KEK, &path(2, &[HARDENED, 1])).unwrap();
        assert_eq!(key.curve(), CurveId::Secp256k1);

        let response = key.to_response().unwrap();
        assert_eq!(response.depth(), 2);
        assert_eq!(response.child_number(), 1);
        assert_eq!(hex::encode(response.parent_fingerprint().as_bytes()), "5c1bd648");
        assert_eq!(
            hex::encode(response.chain_code()),
            "2a7857631386ba23dacac34180dd1983734e444fdbf774041578e9b6adb37c19"
        );
        assert_eq!(
            hex::encode(response.public_key()),
            "03501e454bf00751f24b1b489aa925215d66af2234e3891c3b21a52bedb3cd711c"
        );
    }

    #[test]
    fn single_hardened_step_matches_direct_computation() {
        let storage = storage_with_vector1(CurveId::Secp256k1, 0);
        let index = HARDENED | 1;
        let child = response(&storage, &path(0, &[index]));

        let master = master_key_from_seed::<K256>(&vector1_seed()).unwrap();
        let mut mac = Hmac::<Sha512>::new_from_slice(master.chain_code().as_bytes()).unwrap();
        mac.update(&[0x00]);
        mac.update(&*ScalarTrait::to_be_bytes(master.key_pair().secret()));
        mac.update(&index.to_be_bytes());
        let i = mac.finalize().into_bytes();

        let il_bytes: [u8; 32] = i[..32].try_into().unwrap();
        let il = k256::Scalar::from_repr(il_bytes.into()).unwrap();
        let scalar = il + master.key_pair().secret();
        let expected_public = (k256::ProjectivePoint::GENERATOR * scalar)
            .to_affine()
            .to_encoded_point(true);

        assert_eq!(child.depth(), 1);
        assert_eq!(child.child_number(), index);
        assert_eq!(&child.chain_code()[..], &i[32..]);
        assert_eq!(&child.public_key()[..], expected_public.as_bytes());
        assert_eq!(hex::encode(child.parent_fingerprint().as_bytes()), "3442193e");
    }

    #[test]
    fn parent_fingerprint_chains_through_path() {
        let storage = storage_with_vector1(CurveId::Secp256r1, 9);
        let indices = [HARDENED | 44, HARDENED, 7, 0];
        for depth in 1..indices.len() {
            let parent = derive_path(&storage, &KEK, &path(9, &indices[..depth - 1])).unwrap();
            let child = response(&storage, &path(9, &indices[..depth]));
            let DerivedKey::Secp256r1(parent) = parent else {
                panic!("slot 9 holds a secp256r1 seed");
            };
            let expected = Fingerprint::of(parent.node().key_pair().public_point()).unwrap();
            assert_eq!(child.parent_fingerprint(), &expected);
            assert_eq!(usize::from(child.depth()), depth);
            assert_eq!(child.child_number(), indices[depth - 1]);
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let mut rng = init_testing();
        let mut storage = MemoryStorage::new();
        generate_master(
            &mut storage,
            &KEK,
            &mut rng,
            CurveId::Secp256r1,
            slot(3),
            None,
        )
        .unwrap();
        let p = path(3, &[HARDENED, 1, 2, HARDENED | 3]);
        assert_eq!(response(&storage, &p), response(&storage, &p));
    }

    #[test]
    fn longest_path_derives() {
        let storage = storage_with_vector1(CurveId::Secp256k1, 1);
        let indices: Vec<u32> = (0..15)
            .map(|i| if i % 2 == 0 { HARDENED | i } else { i })
            .collect();
        let leaf = response(&storage, &path(1, &indices));
        assert_eq!(leaf.depth(), 15);
        assert_eq!(leaf.child_number(), HARDENED | 14);
    }

    #[test]
    fn missing_slot_is_not_found() {
        let storage = storage_with_vector1(CurveId::Secp256k1, 0);
        assert_eq!(
            derive_path(&storage, &KEK, &path(5, &[1])).unwrap_err(),
            HdError::NotFound
        );
    }

    #[test]
    fn collaborator_failures_are_execution_errors() {
        let storage = storage_with_vector1(CurveId::Secp256k1, 0);
        assert_eq!(
            derive_path(&storage, &FailingKek, &path(0, &[1])).unwrap_err(),
            HdError::ExecutionError
        );
        assert_eq!(
            derive_path(&FailingStorage::default(), &KEK, &path(0, &[1])).unwrap_err(),
            HdError::ExecutionError
        );
    }

    #[test]
    fn unknown_curve_tag_is_unsupported() {
        let mut storage = MemoryStorage::new();
        let mut bytes = [0x11u8; RECORD_LEN];
        bytes[0] = 0x07;
        let record = MasterSeedRecord::try_from_bytes(&bytes).unwrap();
        storage.store(slot(6), &record).unwrap();
        assert_eq!(
            derive_path(&storage, &KEK, &path(6, &[])).unwrap_err(),
            HdError::UnsupportedCurve
        );
    }

    #[test]
    fn stored_scalar_above_order_is_execution_error() {
        let mut storage = MemoryStorage::new();
        let mut bundle = [0xFFu8; SECRET_BUNDLE_LEN];
        KEK.encrypt(&mut bundle).unwrap();
        storage
            .store(slot(0), &MasterSeedRecord::new(CurveId::Secp256r1, bundle))
            .unwrap();
        assert_eq!(
            derive_path(&storage, &KEK, &path(0, &[1])).unwrap_err(),
            HdError::ExecutionError
        );
    }

    #[test]
    fn zero_root_scalar_fails_hardened_derivation() {
        let root = ExtendedKeyPair::<K256>::new(
            KeyPair::from_secret(<k256::Scalar as ScalarTrait>::zero()),
            ChainCode::from([0x01; 32]),
        );
        assert_eq!(
            derive_from_root(root.clone(), &[HARDENED]).unwrap_err(),
            HdError::NullParameter
        );
        assert_eq!(
            derive_from_root(root, &[0]).unwrap_err(),
            HdError::ExecutionError
        );
    }
}
