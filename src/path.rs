//! Derivation paths and their TLV request encoding.

use crate::{
    errors::{HdError, Result},
    tlv::{write_tlv, TlvWalker},
};
use tracing::error;

/// Number of master seed slots.
pub const MAX_SLOTS: u8 = 10;

/// Maximum number of TLV elements in a path, selector included.
pub const MAX_PATH_ELEMENTS: usize = 16;

/// Tag every path element must carry.
pub const INDEX_TAG: u16 = 0x02;

/// First hardened child index.
pub const HARDENED: u32 = 0x8000_0000;

/// Index of a master seed slot, in `0..MAX_SLOTS`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for SlotIndex {
    type Error = HdError;

    fn try_from(slot: u8) -> Result<Self> {
        if slot >= MAX_SLOTS {
            error!("Slot {slot} is out of range (0..{MAX_SLOTS})");
            return Err(HdError::MalformedParameters);
        }
        Ok(Self(slot))
    }
}

impl From<SlotIndex> for u8 {
    fn from(slot: SlotIndex) -> Self {
        slot.0
    }
}

/// A slot selector followed by up to fifteen raw child indices.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DerivationPath {
    slot: SlotIndex,
    indices: Vec<u32>,
}

impl DerivationPath {
    pub fn new(slot: SlotIndex, indices: Vec<u32>) -> Result<Self> {
        if indices.len() >= MAX_PATH_ELEMENTS {
            error!(
                "Path has {} indices, at most {} are allowed",
                indices.len(),
                MAX_PATH_ELEMENTS - 1
            );
            return Err(HdError::MalformedData);
        }
        Ok(Self { slot, indices })
    }

    /// Parse a derivation request payload.
    ///
    /// The first element is the one-byte slot selector, every later element
    /// a four-byte big-endian child index, and every element must carry
    /// [`INDEX_TAG`]. Nothing is read from storage here.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            error!("Empty derivation payload");
            return Err(HdError::WrongLength);
        }

        let mut slot = None;
        let mut indices = Vec::new();
        for (pos, element) in TlvWalker::new(data).enumerate() {
            let element = element?;
            if pos >= MAX_PATH_ELEMENTS {
                error!("Derivation path has more than {MAX_PATH_ELEMENTS} elements");
                return Err(HdError::MalformedData);
            }
            if element.tag != INDEX_TAG {
                error!(
                    "Path element {pos} has tag {:#06x}, expected {INDEX_TAG:#04x}",
                    element.tag
                );
                return Err(HdError::MalformedData);
            }
            match (pos, element.value) {
                (0, [selector]) => slot = Some(*selector),
                (1.., &[a, b, c, d]) => indices.push(u32::from_be_bytes([a, b, c, d])),
                (_, value) => {
                    error!(
                        "Path element {pos} has a {}-byte value, expected {}",
                        value.len(),
                        if pos == 0 { 1 } else { 4 }
                    );
                    return Err(HdError::MalformedData);
                }
            }
        }

        // A non-empty payload always yields a first element or a walker error.
        let slot = slot.ok_or(HdError::MalformedData)?;
        Self::new(SlotIndex::try_from(slot)?, indices)
    }

    /// Encode as a derivation request payload; the inverse of [`Self::parse`].
    pub fn to_tlv(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(3 + 6 * self.indices.len());
        write_tlv(&mut out, INDEX_TAG as u8, &[self.slot.0])?;
        for index in &self.indices {
            write_tlv(&mut out, INDEX_TAG as u8, &index.to_be_bytes())?;
        }
        Ok(out)
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// Child indices after the selector.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of derivation steps.
    pub fn depth(&self) -> u8 {
        // Bounded by MAX_PATH_ELEMENTS in `new`.
        self.indices.len() as u8
    }
}
