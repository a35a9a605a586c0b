// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use crate::errors::{HdError, Result};
use tracing::error;

/// Upper bound on the regenerate-candidate loops of master and child key
/// derivation. A correct HMAC needs more than one iteration with probability
/// around 2^-127.
pub(crate) const CRYPTOGRAPHIC_RETRY_MAX: usize = 500usize;

/// Helper type for parsing a byte slice field by field.
pub(crate) struct ParseBytes<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ParseBytes<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> ParseBytes<'a> {
        ParseBytes { bytes, offset: 0 }
    }

    /// Take next `n` bytes from array.
    pub(crate) fn take_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(n).ok_or(HdError::MalformedData)?;
        let slice = self.bytes.get(self.offset..end).ok_or_else(|| {
            error!(
                "Tried to take {n} bytes at offset {} of a {}-byte buffer",
                self.offset,
                self.bytes.len()
            );
            HdError::MalformedData
        })?;
        self.offset = end;
        Ok(slice)
    }

    /// Take the next `N` bytes as a fixed-size array.
    pub(crate) fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take_bytes(N)?);
        Ok(array)
    }

    pub(crate) fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take_bytes(1)?[0])
    }

    /// Parse the next 4 bytes as a big-endian encoded u32.
    pub(crate) fn take_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Fail unless every byte has been consumed.
    pub(crate) fn finish(self) -> Result<()> {
        if !self.is_empty() {
            error!(
                "{} trailing bytes left after parsing",
                self.bytes.len() - self.offset
            );
            return Err(HdError::MalformedData);
        }
        Ok(())
    }
}


////////////////////////////
// Test Utility Functions //
////////////////////////////

/// Returns an rng to be used for testing, plus the collaborator doubles the
/// command tests run against.
#[cfg(test)]
pub(crate) mod testing {
    use crate::{
        kek::{KekError, KeyEncryptionKey},
        path::SlotIndex,
        storage::{MasterSeedRecord, SeedStorage, StorageError},
    };
    use rand::{
        rngs::{OsRng, StdRng},
        Rng, SeedableRng,
    };
    use tracing_subscriber::{
        filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    /// Initialize any fields necessary for our tests.
    ///
    /// This will print the rng seed to stderr so that if a test fails, the
    /// failing seed can be recovered and used for debugging.
    pub(crate) fn init_testing() -> StdRng {
        let mut seeder = OsRng;
        let seed = seeder.gen();
        eprintln!(
            "To re-run test with the same randomness, use init_testing_with_seed() with the following seed:"
        );
        eprintln!("\t{seed:?}");
        StdRng::from_seed(seed)
    }

    /// A seeded version of [`init_testing`] that also turns on logging.
    ///
    /// Only call this while debugging; several tests feed bad input on
    /// purpose and the resulting `error!` events are noise otherwise.
    #[allow(unused)]
    pub(crate) fn init_testing_with_seed(seed: [u8; 32]) -> StdRng {
        let logging_level = EnvFilter::from_default_env()
            .max_level_hint()
            .and_then(|hint| hint.into_level())
            .unwrap_or(tracing::Level::DEBUG);

        let targets = Targets::new().with_target("hsm_hd_derivation", logging_level);
        let stdout_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_filter(targets);

        // It's okay if this fails. It just means logging has already been set up for
        // this thread.
        let _ = tracing_subscriber::registry().with(stdout_layer).try_init();

        StdRng::from_seed(seed)
    }

    /// Seed of the BIP32 / SLIP-0010 test vector 1.
    pub(crate) fn vector1_seed() -> Vec<u8> {
        hex::decode("000102030405060708090a0b0c0d0e0f").unwrap()
    }

    /// Length-preserving stand-in for the device KEK.
    pub(crate) struct XorKek(pub u8);

    impl KeyEncryptionKey for XorKek {
        fn encrypt(&self, data: &mut [u8]) -> Result<(), KekError> {
            data.iter_mut().for_each(|b| *b ^= self.0);
            Ok(())
        }

        fn decrypt(&self, data: &mut [u8]) -> Result<(), KekError> {
            self.encrypt(data)
        }
    }

    /// A KEK whose every operation fails.
    pub(crate) struct FailingKek;

    impl KeyEncryptionKey for FailingKek {
        fn encrypt(&self, _data: &mut [u8]) -> Result<(), KekError> {
            Err(KekError::Unavailable)
        }

        fn decrypt(&self, _data: &mut [u8]) -> Result<(), KekError> {
            Err(KekError::Unavailable)
        }
    }

    /// Storage whose every operation fails, counting how often it was asked.
    #[derive(Default)]
    pub(crate) struct FailingStorage {
        pub(crate) loads: std::cell::Cell<usize>,
    }

    impl SeedStorage for FailingStorage {
        fn load(&self, _slot: SlotIndex) -> Result<Option<MasterSeedRecord>, StorageError> {
            self.loads.set(self.loads.get() + 1);
            Err(StorageError::Io("flash read failed".into()))
        }

        fn store(&mut self, _slot: SlotIndex, _record: &MasterSeedRecord) -> Result<(), StorageError> {
            Err(StorageError::Io("flash write failed".into()))
        }
    }
}
