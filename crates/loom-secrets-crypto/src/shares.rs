// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Two-share secret splitting for account private keys.
//!
//! An account key is split into two XOR shares. One share travels inside the
//! credential token; the other is stored server-side, wrapped under a key that
//! also travels inside the token.

use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{decode_key, PrivateKey};
use crate::sealed::decrypt_raw;

/// XOR two hex-encoded shares into a private key.
pub fn reconstruct_private_key(share0: &str, share1: &str) -> CryptoResult<PrivateKey> {
	let a = Zeroizing::new(hex::decode(share0.trim())?);
	let b = Zeroizing::new(hex::decode(share1.trim())?);
	if a.len() != b.len() {
		return Err(CryptoError::ShareMismatch(format!(
			"shares differ in length ({} vs {})",
			a.len(),
			b.len()
		)));
	}

	let combined: Zeroizing<Vec<u8>> =
		Zeroizing::new(a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect());
	let combined_hex = Zeroizing::new(hex::encode(combined.as_slice()));
	PrivateKey::from_hex(&combined_hex)
}

/// Decrypt a hex-encoded wrapped share with a hex-encoded unwrap key.
///
/// The wrapped share is `ciphertext || nonce`; the plaintext is itself the
/// hex form of the share.
pub fn unwrap_share(
	wrapped_share_hex: &str,
	unwrap_key_hex: &str,
) -> CryptoResult<Zeroizing<String>> {
	let key = Zeroizing::new(decode_key(unwrap_key_hex)?);
	let wrapped = hex::decode(wrapped_share_hex.trim())?;

	let plaintext = decrypt_raw(&key, &wrapped)?;
	let share = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::InvalidUtf8)?;
	Ok(Zeroizing::new(share.to_string()))
}

/// Split a private key into two random shares. Used when provisioning accounts and in tests.
pub fn split_private_key(key: &PrivateKey) -> (Zeroizing<String>, Zeroizing<String>) {
	let mask = PrivateKey::generate();
	let share1: Vec<u8> = key
		.expose_bytes()
		.iter()
		.zip(mask.expose_bytes().iter())
		.map(|(k, m)| k ^ m)
		.collect();
	(mask.to_hex(), Zeroizing::new(hex::encode(share1)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sealed::encrypt_raw;

	#[test]
	fn split_then_reconstruct_yields_original() {
		let key = PrivateKey::generate();
		let (s0, s1) = split_private_key(&key);
		let rebuilt = reconstruct_private_key(&s0, &s1).unwrap();
		assert_eq!(rebuilt.expose_bytes(), key.expose_bytes());
	}

	#[test]
	fn single_share_reveals_nothing_useful() {
		let key = PrivateKey::generate();
		let (s0, s1) = split_private_key(&key);
		assert_ne!(s0.as_str(), key.to_hex().as_str());
		assert_ne!(s1.as_str(), key.to_hex().as_str());
	}

	#[test]
	fn mismatched_share_lengths_fail() {
		assert!(matches!(
			reconstruct_private_key("00ff", "00"),
			Err(CryptoError::ShareMismatch(_))
		));
	}

	#[test]
	fn unwrap_share_decrypts_hex_payload() {
		let unwrap_key = [3u8; 32];
		let share = "a1b2c3d4";
		let wrapped = hex::encode(encrypt_raw(&unwrap_key, share.as_bytes()).unwrap());

		let unwrapped = unwrap_share(&wrapped, &hex::encode(unwrap_key)).unwrap();
		assert_eq!(unwrapped.as_str(), share);
	}

	#[test]
	fn unwrap_share_with_wrong_key_fails() {
		let wrapped = hex::encode(encrypt_raw(&[3u8; 32], b"share").unwrap());
		assert!(unwrap_share(&wrapped, &hex::encode([4u8; 32])).is_err());
	}
}
