// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Keyed digests of secret keys.

use blake2::digest::consts::U32;
use blake2::digest::{KeyInit, Mac};
use blake2::Blake2bMac;

use crate::error::{CryptoError, CryptoResult};

/// Keyed BLAKE2b-256 of `input`, with the UTF-8 bytes of `salt` as the key.
///
/// The server indexes secrets by this digest, so the same key name under the
/// same environment salt always produces the same hex string.
pub fn keyed_digest(input: &str, salt: &str) -> CryptoResult<String> {
	let mut mac = <Blake2bMac<U32> as KeyInit>::new_from_slice(salt.as_bytes())
		.map_err(|e| CryptoError::InvalidSalt(e.to_string()))?;
	mac.update(input.as_bytes());
	Ok(hex::encode(mac.finalize().into_bytes()))
}
