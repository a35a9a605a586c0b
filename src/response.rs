//! The 78-byte extended public key returned by a derivation command.
//!
//! Layout, all integers big-endian:
//!
//! | bytes  | field              |
//! |--------|--------------------|
//! | 0..4   | version `0488B21E` |
//! | 4      | depth              |
//! | 5..9   | parent fingerprint |
//! | 9..13  | child number       |
//! | 13..45 | chain code         |
//! | 45..78 | compressed pubkey  |

use crate::{
    curve::{CurveTrait, COMPRESSED_POINT_LEN},
    derive::DerivedNode,
    errors::{HdError, Result},
    fingerprint::{Fingerprint, FINGERPRINT_LEN},
    keys::CHAIN_CODE_LEN,
    utils::ParseBytes,
};
use tracing::error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Version prefix of every response.
pub const EXTENDED_KEY_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

/// Encoded size of an [`ExtendedKeyResponse`].
pub const EXTENDED_KEY_LEN: usize =
    4 + 1 + FINGERPRINT_LEN + 4 + CHAIN_CODE_LEN + COMPRESSED_POINT_LEN;

/// Extended public key of a derived node.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ExtendedKeyResponse {
    depth: u8,
    #[zeroize(skip)]
    parent_fingerprint: Fingerprint,
    child_number: u32,
    chain_code: [u8; CHAIN_CODE_LEN],
    public_key: [u8; COMPRESSED_POINT_LEN],
}

impl ExtendedKeyResponse {
    pub fn from_node<C: CurveTrait>(derived: &DerivedNode<C>) -> Result<Self> {
        Ok(Self {
            depth: derived.depth(),
            parent_fingerprint: *derived.parent_fingerprint(),
            child_number: derived.child_number(),
            chain_code: *derived.node().chain_code().as_bytes(),
            public_key: derived.node().key_pair().compressed_public_key()?,
        })
    }

    /// Number of derivation steps below the master node.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> &Fingerprint {
        &self.parent_fingerprint
    }

    /// Index of the last derivation step, or 0 for the master node.
    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    pub fn chain_code(&self) -> &[u8; CHAIN_CODE_LEN] {
        &self.chain_code
    }

    pub fn public_key(&self) -> &[u8; COMPRESSED_POINT_LEN] {
        &self.public_key
    }

    /// Encode in wire order.
    pub fn to_bytes(&self) -> [u8; EXTENDED_KEY_LEN] {
        FieldWriter::new()
            .put(&EXTENDED_KEY_VERSION)
            .put(&[self.depth])
            .put(self.parent_fingerprint.as_bytes())
            .put(&self.child_number.to_be_bytes())
            .put(&self.chain_code)
            .put(&self.public_key)
            .finish()
    }

    /// Decode a response, as a host would.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut parser = ParseBytes::new(bytes);
        let version: [u8; 4] = parser.take_array()?;
        if version != EXTENDED_KEY_VERSION {
            error!("Unexpected extended key version {version:02x?}");
            return Err(HdError::MalformedData);
        }
        let response = Self {
            depth: parser.take_u8()?,
            parent_fingerprint: Fingerprint::from(parser.take_array()?),
            child_number: parser.take_u32_be()?,
            chain_code: parser.take_array()?,
            public_key: parser.take_array()?,
        };
        parser.finish()?;
        Ok(response)
    }
}

/// Fills a fixed-size buffer one field at a time.
struct FieldWriter<const N: usize> {
    buf: [u8; N],
    offset: usize,
}

impl<const N: usize> FieldWriter<N> {
    fn new() -> Self {
        Self {
            buf: [0u8; N],
            offset: 0,
        }
    }

    fn put(mut self, field: &[u8]) -> Self {
        let end = self.offset + field.len();
        self.buf[self.offset..end].copy_from_slice(field);
        self.offset = end;
        self
    }

    fn finish(self) -> [u8; N] {
        debug_assert_eq!(self.offset, N, "response fields do not fill the layout");
        self.buf
    }
}
