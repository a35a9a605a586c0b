//! Components for working with SLIP-0010.
//!
//! A description of SLIP-0010 can be found here: <https://github.com/satoshilabs/slips/blob/master/slip-0010.md>.
//! This is a method for achieving HD (hierarchical deterministic) wallets
//! whereby a single master key is created from a seed and then used to
//! generate a hierarchy of child keys. Both hardened and normal private
//! derivation are supported, on secp256k1 and secp256r1.
//!
//! Both master and child derivation may draw a candidate scalar that is zero
//! or not below the curve order. The candidate is then regenerated from the
//! right half of the previous HMAC output; the loops are capped at
//! [`CRYPTOGRAPHIC_RETRY_MAX`](crate::utils::CRYPTOGRAPHIC_RETRY_MAX)
//! iterations.

//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

pub mod ckd;
pub mod master;

use crate::errors::{HdError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use tracing::{debug, error};
use zeroize::{Zeroize, Zeroizing};

type HmacSha512 = Hmac<Sha512>;

/// Length of an HMAC-SHA512 output.
pub(crate) const HMAC_OUTPUT_LEN: usize = 64;

/// Compute `HMAC-SHA512(key, data)` into a buffer that is wiped on drop.
pub(crate) fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<Zeroizing<[u8; HMAC_OUTPUT_LEN]>> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|_| {
        error!("Failed to initialise HMAC-SHA512");
        HdError::ExecutionError
    })?;
    mac.update(data);
    let mut tag = mac.finalize().into_bytes();
    let mut output = Zeroizing::new([0u8; HMAC_OUTPUT_LEN]);
    output.copy_from_slice(&tag);
    tag[..].zeroize();
    Ok(output)
}

/// Split an HMAC output into `(IL, IR)`.
pub(crate) fn split_output(
    i: &[u8; HMAC_OUTPUT_LEN],
) -> (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>) {
    let mut il = Zeroizing::new([0u8; 32]);
    let mut ir = Zeroizing::new([0u8; 32]);
    il.copy_from_slice(&i[..32]);
    ir.copy_from_slice(&i[32..]);
    (il, ir)
}

/// The regenerate-candidate loop shared by master and child derivation.
///
/// `I = HMAC-SHA512(key, data)` is split into `(IL, IR)` and offered to
/// `accept`. After a rejection the input becomes `0x01 ‖ IR ‖ tail`, where
/// `tail` is the last `tail_len` bytes of `data`, and the HMAC is recomputed
/// under the same key. Gives up with [`HdError::ExecutionError`] once
/// `max_attempts` candidates have been rejected.
pub(crate) fn regenerate_until<T>(
    key: &[u8],
    data: &[u8],
    tail_len: usize,
    max_attempts: usize,
    mut accept: impl FnMut(&[u8; 32], &[u8; 32]) -> Option<T>,
) -> Result<T> {
    let tail = &data[data.len().saturating_sub(tail_len)..];

    // Sized for every retry input too, so it never reallocates and leaves an
    // unwiped copy behind.
    let mut input = Zeroizing::new(Vec::with_capacity(data.len().max(33 + tail.len())));
    input.extend_from_slice(data);

    for attempt in 1..=max_attempts {
        let i = hmac_sha512(key, &input)?;
        let (il, ir) = split_output(&i);
        if let Some(accepted) = accept(&il, &ir) {
            return Ok(accepted);
        }

        debug!("Candidate {attempt} rejected, regenerating");
        input.clear();
        input.push(0x01);
        input.extend_from_slice(&*ir);
        input.extend_from_slice(tail);
    }

    error!("Key derivation did not converge after {max_attempts} attempts");
    Err(HdError::ExecutionError)
}
