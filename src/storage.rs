//! Persistent master seed records and the storage interface they live behind.

use crate::{
    curve::CurveId,
    keys::SECRET_BUNDLE_LEN,
    path::{SlotIndex, MAX_SLOTS},
};
use thiserror::Error;

/// Size of a record on flash: curve tag followed by the encrypted bundle.
pub const RECORD_LEN: usize = 1 + SECRET_BUNDLE_LEN;

/// Failure reported by a [`SeedStorage`] implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A stored record does not have the fixed record size.
    #[error("stored record has length {0}, expected {RECORD_LEN}")]
    InvalidRecordLength(usize),
    /// The underlying medium failed.
    #[error("storage I/O failure: {0}")]
    Io(String),
}

/// The persisted root of one derivation tree.
///
/// The curve tag is stored in clear; the `scalar ‖ chain code` bundle is
/// only ever held here in its KEK-encrypted form.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterSeedRecord {
    curve_tag: u8,
    encrypted_bundle: [u8; SECRET_BUNDLE_LEN],
}

impl MasterSeedRecord {
    pub fn new(curve: CurveId, encrypted_bundle: [u8; SECRET_BUNDLE_LEN]) -> Self {
        Self {
            curve_tag: curve.tag(),
            encrypted_bundle,
        }
    }

    /// The raw curve tag. It is not validated here: an unknown tag is only
    /// an error once a derivation tries to use the record.
    pub fn curve_tag(&self) -> u8 {
        self.curve_tag
    }

    pub fn encrypted_bundle(&self) -> &[u8; SECRET_BUNDLE_LEN] {
        &self.encrypted_bundle
    }

    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[0] = self.curve_tag;
        bytes[1..].copy_from_slice(&self.encrypted_bundle);
        bytes
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() != RECORD_LEN {
            return Err(StorageError::InvalidRecordLength(bytes.len()));
        }
        let mut encrypted_bundle = [0u8; SECRET_BUNDLE_LEN];
        encrypted_bundle.copy_from_slice(&bytes[1..]);
        Ok(Self {
            curve_tag: bytes[0],
            encrypted_bundle,
        })
    }
}

impl std::fmt::Debug for MasterSeedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSeedRecord")
            .field("curve_tag", &self.curve_tag)
            .finish_non_exhaustive()
    }
}

/// Slot-addressed storage for [`MasterSeedRecord`]s.
pub trait SeedStorage {
    /// Read the record at `slot`, or `None` if the slot has never been
    /// written.
    fn load(&self, slot: SlotIndex) -> Result<Option<MasterSeedRecord>, StorageError>;

    /// Replace the record at `slot`.
    ///
    /// Implementations must make the replacement atomic: a later `load` sees
    /// either the old record or the new one, never a mix.
    fn store(&mut self, slot: SlotIndex, record: &MasterSeedRecord) -> Result<(), StorageError>;

    /// Signal that a write sequence has finished so that the medium may
    /// schedule wear levelling or compaction.
    fn write_completed(&mut self) {}
}

/// In-memory [`SeedStorage`] with one cell per slot.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: [Option<[u8; RECORD_LEN]>; MAX_SLOTS as usize],
    completed_writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write sequences signalled through
    /// [`SeedStorage::write_completed`].
    pub fn completed_writes(&self) -> usize {
        self.completed_writes
    }

    /// Raw bytes of the record at `slot`, as they would sit on flash.
    pub fn raw_record(&self, slot: SlotIndex) -> Option<&[u8; RECORD_LEN]> {
        self.slots[slot.index()].as_ref()
    }
}

impl SeedStorage for MemoryStorage {
    fn load(&self, slot: SlotIndex) -> Result<Option<MasterSeedRecord>, StorageError> {
        self.slots[slot.index()]
            .as_ref()
            .map(|bytes| MasterSeedRecord::try_from_bytes(bytes))
            .transpose()
    }

    fn store(&mut self, slot: SlotIndex, record: &MasterSeedRecord) -> Result<(), StorageError> {
        self.slots[slot.index()] = Some(record.to_bytes());
        Ok(())
    }

    fn write_completed(&mut self) {
        self.completed_writes += 1;
    }
}
