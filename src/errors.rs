// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Error taxonomy for the derivation core.
//!
//! Every variant aborts the command before any response bytes are produced,
//! and every variant maps to its own [`StatusWord`].

use thiserror::Error;

/// Default result type for this crate.
pub type Result<T> = std::result::Result<T, HdError>;

/// Errors surfaced to the command transport.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum HdError {
    /// Bad curve selector, slot or path selector, or an oversized seed.
    #[error("malformed command parameters")]
    MalformedParameters,
    /// A TLV element had the wrong tag or a value of the wrong length.
    #[error("malformed command data")]
    MalformedData,
    /// The derivation payload was empty.
    #[error("wrong command length")]
    WrongLength,
    /// There is no master seed record at the requested slot.
    #[error("master seed record not found")]
    NotFound,
    /// Encryption, decryption or storage I/O failed, or a retry loop hit its
    /// iteration cap.
    #[error("execution error")]
    ExecutionError,
    /// Hardened derivation was attempted from a zero private scalar.
    #[error("null private key parameter")]
    NullParameter,
    /// The stored curve tag is not one we know about.
    #[error("unsupported curve")]
    UnsupportedCurve,
}

impl HdError {
    /// The status word reported to the host for this error.
    pub fn status_word(&self) -> StatusWord {
        match self {
            HdError::MalformedParameters => StatusWord::INCORRECT_P1P2,
            HdError::MalformedData => StatusWord::WRONG_DATA,
            HdError::WrongLength => StatusWord::WRONG_LENGTH,
            HdError::NotFound => StatusWord::FILE_NOT_FOUND,
            HdError::ExecutionError => StatusWord::EXEC_ERROR,
            HdError::NullParameter => StatusWord::CONDITIONS_NOT_SATISFIED,
            HdError::UnsupportedCurve => StatusWord::FUNC_NOT_SUPPORTED,
        }
    }
}

/// ISO 7816 status word.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub const OK: Self = Self(0x9000);
    pub const WRONG_LENGTH: Self = Self(0x6700);
    pub const EXEC_ERROR: Self = Self(0x6400);
    pub const CONDITIONS_NOT_SATISFIED: Self = Self(0x6985);
    pub const WRONG_DATA: Self = Self(0x6A80);
    pub const FUNC_NOT_SUPPORTED: Self = Self(0x6A81);
    pub const FILE_NOT_FOUND: Self = Self(0x6A82);
    pub const INCORRECT_P1P2: Self = Self(0x6A86);

    /// The two status bytes, `SW1 SW2`.
    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl<T> From<&Result<T>> for StatusWord {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => StatusWord::OK,
            Err(e) => e.status_word(),
        }
    }
}
