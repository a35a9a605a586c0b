//! Minimal BER-style TLV walker for command payloads.
//!
//! Tags are one byte, or two bytes when the low five bits of the first byte
//! are all set. Lengths use the short form (`< 0x80`) or the long forms
//! `0x81 nn` and `0x82 nn nn`.

use crate::{
    errors::{HdError, Result},
    utils::ParseBytes,
};
use tracing::error;

/// One tag/value element borrowed from the payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tlv<'a> {
    pub tag: u16,
    pub value: &'a [u8],
}

/// Iterator over the TLV elements of a payload.
///
/// Yields an error once (and then stops) if the payload is truncated or uses
/// an unsupported length form.
pub struct TlvWalker<'a> {
    parser: ParseBytes<'a>,
    failed: bool,
}

impl<'a> TlvWalker<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            parser: ParseBytes::new(data),
            failed: false,
        }
    }

    fn read_element(&mut self) -> Result<Tlv<'a>> {
        let first = self.parser.take_u8()?;
        let tag = if first & 0x1F == 0x1F {
            u16::from_be_bytes([first, self.parser.take_u8()?])
        } else {
            u16::from(first)
        };
        let len = match self.parser.take_u8()? {
            short @ 0x00..=0x7F => usize::from(short),
            0x81 => usize::from(self.parser.take_u8()?),
            0x82 => usize::from(u16::from_be_bytes(self.parser.take_array()?)),
            other => {
                error!("Unsupported TLV length prefix {other:#04x}");
                return Err(HdError::MalformedData);
            }
        };
        let value = self.parser.take_bytes(len)?;
        Ok(Tlv { tag, value })
    }
}

impl<'a> Iterator for TlvWalker<'a> {
    type Item = Result<Tlv<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.parser.is_empty() {
            return None;
        }
        let element = self.read_element();
        self.failed = element.is_err();
        Some(element)
    }
}

/// Append one element with a single-byte tag to `out`.
///
/// Values longer than `0xFFFF` bytes have no supported length form; they are
/// rejected and `out` is left untouched.
pub fn write_tlv(out: &mut Vec<u8>, tag: u8, value: &[u8]) -> Result<()> {
    let len = u16::try_from(value.len()).map_err(|_| {
        error!("TLV value of {} bytes is too long to encode", value.len());
        HdError::MalformedData
    })?;
    out.push(tag);
    match len {
        0..=0x7F => out.push(len as u8),
        0x80..=0xFF => out.extend_from_slice(&[0x81, len as u8]),
        _ => {
            out.push(0x82);
            out.extend_from_slice(&len.to_be_bytes());
        }
    }
    out.extend_from_slice(value);
    Ok(())
}
