// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! X25519 key material used by the envelope scheme.

use std::fmt;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use rand::rngs::OsRng;
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CryptoError, CryptoResult};

/// Size of X25519 keys in bytes.
pub const KEY_SIZE: usize = 32;

pub(crate) fn decode_key(hex_str: &str) -> CryptoResult<[u8; KEY_SIZE]> {
	let bytes = Zeroizing::new(hex::decode(hex_str.trim())?);
	if bytes.len() != KEY_SIZE {
		return Err(CryptoError::InvalidKeyLength {
			expected: KEY_SIZE,
			actual: bytes.len(),
		});
	}
	let mut arr = [0u8; KEY_SIZE];
	arr.copy_from_slice(&bytes);
	Ok(arr)
}

/// An X25519 private key.
///
/// Debug and Display output is redacted; the hex form is only available
/// through [`PrivateKey::to_hex`], which returns a zeroizing buffer.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct PrivateKey {
	bytes: [u8; KEY_SIZE],
}

impl PrivateKey {
	/// Generate a random private key.
	pub fn generate() -> Self {
		let secret = StaticSecret::random_from_rng(OsRng);
		Self {
			bytes: secret.to_bytes(),
		}
	}

	pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
		Self { bytes }
	}

	pub fn from_hex(s: &str) -> CryptoResult<Self> {
		Ok(Self {
			bytes: decode_key(s)?,
		})
	}

	pub fn to_hex(&self) -> Zeroizing<String> {
		Zeroizing::new(hex::encode(self.bytes))
	}

	/// Derive the matching public key.
	pub fn public_key(&self) -> PublicKey {
		let secret = StaticSecret::from(self.bytes);
		PublicKey {
			bytes: *x25519_dalek::PublicKey::from(&secret).as_bytes(),
		}
	}

	pub(crate) fn static_secret(&self) -> StaticSecret {
		StaticSecret::from(self.bytes)
	}

	pub fn expose_bytes(&self) -> &[u8; KEY_SIZE] {
		&self.bytes
	}
}

impl fmt::Debug for PrivateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PrivateKey")
			.field("bytes", &"[REDACTED]")
			.finish()
	}
}

impl fmt::Display for PrivateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[REDACTED]")
	}
}

/// An X25519 public key, rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
	bytes: [u8; KEY_SIZE],
}

impl PublicKey {
	pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
		Self { bytes }
	}

	pub fn from_hex(s: &str) -> CryptoResult<Self> {
		Ok(Self {
			bytes: decode_key(s)?,
		})
	}

	pub fn to_hex(&self) -> String {
		hex::encode(self.bytes)
	}

	pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
		&self.bytes
	}

	pub(crate) fn dalek(&self) -> x25519_dalek::PublicKey {
		x25519_dalek::PublicKey::from(self.bytes)
	}
}

impl fmt::Debug for PublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
	}
}

impl fmt::Display for PublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

/// A public/private key pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
	pub public: PublicKey,
	pub private: PrivateKey,
}

impl KeyPair {
	/// Generate a random key pair.
	pub fn generate() -> Self {
		Self::from_private(PrivateKey::generate())
	}

	pub fn from_private(private: PrivateKey) -> Self {
		Self {
			public: private.public_key(),
			private,
		}
	}

	/// Deterministically derive a key pair from seed bytes.
	///
	/// The private scalar is the 32-byte BLAKE2b hash of the seed, which keeps
	/// derived keys compatible with libsodium's `crypto_kx_seed_keypair`.
	pub fn from_seed(seed: &[u8]) -> Self {
		let digest = Blake2b::<U32>::digest(seed);
		let mut bytes = [0u8; KEY_SIZE];
		bytes.copy_from_slice(&digest);
		Self::from_private(PrivateKey::from_bytes(bytes))
	}

	/// Derive a key pair from a hex-encoded seed.
	pub fn from_seed_hex(seed_hex: &str) -> CryptoResult<Self> {
		let seed = Zeroizing::new(hex::decode(seed_hex.trim())?);
		Ok(Self::from_seed(&seed))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn private_key_debug_is_redacted() {
		let key = PrivateKey::generate();
		let debug = format!("{key:?}");
		assert!(debug.contains("[REDACTED]"));
		assert!(!debug.contains(key.to_hex().as_str()));
		assert_eq!(format!("{key}"), "[REDACTED]");
	}

	#[test]
	fn rejects_short_keys() {
		let err = PublicKey::from_hex("abcd").unwrap_err();
		assert!(matches!(
			err,
			CryptoError::InvalidKeyLength {
				expected: 32,
				actual: 2
			}
		));
	}

	#[test]
	fn rejects_non_hex_keys() {
		assert!(matches!(
			PrivateKey::from_hex("zz"),
			Err(CryptoError::InvalidHex(_))
		));
	}

	#[test]
	fn seed_derivation_is_deterministic() {
		let a = KeyPair::from_seed(b"environment seed");
		let b = KeyPair::from_seed(b"environment seed");
		let c = KeyPair::from_seed(b"another seed");
		assert_eq!(a.public, b.public);
		assert_ne!(a.public, c.public);
	}

	proptest! {
		#[test]
		fn hex_roundtrip_preserves_keys(bytes in any::<[u8; 32]>()) {
			let private = PrivateKey::from_bytes(bytes);
			let parsed = PrivateKey::from_hex(&private.to_hex()).unwrap();
			prop_assert_eq!(parsed.expose_bytes(), private.expose_bytes());
			prop_assert_eq!(parsed.public_key(), private.public_key());
		}
	}
}
