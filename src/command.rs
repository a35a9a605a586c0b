// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Command dispatch.
//!
//! A command arrives as a mode byte (`P1`), a parameter byte (`P2`) and a
//! data payload. [`HdKeyStore`] routes it to master seed generation or to
//! path derivation and reports the outcome as a [`StatusWord`].

use crate::{
    curve::CurveId,
    derive::derive_path,
    errors::{HdError, Result, StatusWord},
    generate::generate_master,
    kek::KeyEncryptionKey,
    path::{DerivationPath, SlotIndex},
    storage::SeedStorage,
};
use rand::{CryptoRng, RngCore};
use tracing::{error, info, instrument};

/// `P1`: generate a secp256k1 master seed in slot `P2`.
pub const MODE_GENERATE_SECP256K1: u8 = 0x01;
/// `P1`: generate a secp256r1 master seed in slot `P2`.
pub const MODE_GENERATE_SECP256R1: u8 = 0x02;
/// `P1`: derive the path in the data payload.
pub const MODE_DERIVE: u8 = 0x03;

/// A decoded command.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    GenerateMaster {
        curve: CurveId,
        slot: SlotIndex,
        seed: &'a [u8],
    },
    Derive(DerivationPath),
}

impl<'a> Command<'a> {
    /// Decode a command. All parameter checks happen here, before any
    /// collaborator is touched.
    pub fn parse(p1: u8, p2: u8, data: &'a [u8]) -> Result<Self> {
        let curve = match p1 {
            MODE_GENERATE_SECP256K1 => CurveId::Secp256k1,
            MODE_GENERATE_SECP256R1 => CurveId::Secp256r1,
            MODE_DERIVE => return Ok(Command::Derive(DerivationPath::parse(data)?)),
            _ => {
                error!("Unknown command mode {p1:#04x}");
                return Err(HdError::MalformedParameters);
            }
        };
        Ok(Command::GenerateMaster {
            curve,
            slot: SlotIndex::try_from(p2)?,
            seed: data,
        })
    }
}

/// The derivation core bound to its storage and KEK.
#[derive(Debug)]
pub struct HdKeyStore<S, K> {
    storage: S,
    kek: K,
}

impl<S: SeedStorage, K: KeyEncryptionKey> HdKeyStore<S, K> {
    pub fn new(storage: S, kek: K) -> Self {
        Self { storage, kek }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Execute one command and return its response payload.
    ///
    /// Generation has an empty response; derivation returns the 78-byte
    /// extended public key.
    #[instrument(skip_all, err(Debug))]
    pub fn process<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        p1: u8,
        p2: u8,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        match Command::parse(p1, p2, data)? {
            Command::GenerateMaster { curve, slot, seed } => {
                generate_master(&mut self.storage, &self.kek, rng, curve, slot, Some(seed))?;
                info!("Master seed stored in slot {}", slot.index());
                Ok(Vec::new())
            }
            Command::Derive(path) => {
                let derived = derive_path(&self.storage, &self.kek, &path)?;
                let response = derived.to_response()?;
                info!(
                    "Derived {:?} key at depth {}",
                    derived.curve(),
                    response.depth()
                );
                Ok(response.to_bytes().to_vec())
            }
        }
    }

    /// Like [`Self::process`], but in the shape the transport expects: the
    /// response bytes (empty on any error) and a status word.
    pub fn process_apdu<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        p1: u8,
        p2: u8,
        data: &[u8],
    ) -> (Vec<u8>, StatusWord) {
        let result = self.process(rng, p1, p2, data);
        let status = StatusWord::from(&result);
        (result.unwrap_or_default(), status)
    }
}
