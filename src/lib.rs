// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Hierarchical deterministic key derivation for a smart-card HSM.
//!
//! The device keeps up to [`MAX_SLOTS`](path::MAX_SLOTS) master seeds, each
//! encrypted under a device key-encryption key and tagged with the curve it
//! was generated for (secp256k1 or secp256r1). A host can:
//!
//! - generate a master seed into a slot, from its own seed material or from
//!   fresh randomness ([`generate::generate_master`]);
//! - derive a child key along a BIP32 / SLIP-0010 path below a stored master
//!   and receive its 78-byte extended public key ([`derive::derive_path`],
//!   [`response::ExtendedKeyResponse`]).
//!
//! Private keys never leave the device. Storage, the KEK, and randomness are
//! supplied by the caller through [`storage::SeedStorage`],
//! [`kek::KeyEncryptionKey`] and [`rand::RngCore`]; [`command::HdKeyStore`]
//! ties them together behind the mode/parameter/payload command surface.
//!
//! ```
//! use hsm_hd_derivation::{
//!     command::{HdKeyStore, MODE_DERIVE, MODE_GENERATE_SECP256K1},
//!     errors::StatusWord,
//!     kek::{KekError, KeyEncryptionKey},
//!     path::{DerivationPath, SlotIndex, HARDENED},
//!     storage::MemoryStorage,
//! };
//!
//! struct NullKek;
//! impl KeyEncryptionKey for NullKek {
//!     fn encrypt(&self, _: &mut [u8]) -> Result<(), KekError> { Ok(()) }
//!     fn decrypt(&self, _: &mut [u8]) -> Result<(), KekError> { Ok(()) }
//! }
//!
//! let mut rng = rand::rngs::OsRng;
//! let mut store = HdKeyStore::new(MemoryStorage::new(), NullKek);
//!
//! let (_, status) = store.process_apdu(&mut rng, MODE_GENERATE_SECP256K1, 0, &[]);
//! assert_eq!(status, StatusWord::OK);
//!
//! let path = DerivationPath::new(SlotIndex::try_from(0)?, vec![HARDENED | 44, 0])?;
//! let (xpub, status) = store.process_apdu(&mut rng, MODE_DERIVE, 0, &path.to_tlv()?);
//! assert_eq!(status, StatusWord::OK);
//! assert_eq!(xpub.len(), 78);
//! # Ok::<(), hsm_hd_derivation::errors::HdError>(())
//! ```

pub mod command;
pub mod curve;
pub mod derive;
pub mod errors;
pub mod fingerprint;
pub mod generate;
pub mod k256;
pub mod kek;
pub mod keys;
pub mod p256;
pub mod path;
pub mod response;
pub mod slip0010;
pub mod storage;
pub mod tlv;
mod utils;

pub use command::HdKeyStore;
pub use errors::{HdError, Result, StatusWord};
