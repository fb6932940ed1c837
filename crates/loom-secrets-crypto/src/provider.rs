// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cryptographic provider abstraction.
//!
//! The secrets engine never touches primitives directly; it goes through this
//! trait so an alternative implementation (hardware-backed keys, a test double)
//! can be swapped in without changing the engine.

use zeroize::Zeroizing;

use crate::digest;
use crate::error::CryptoResult;
use crate::keys::{KeyPair, PrivateKey, PublicKey};
use crate::sealed;
use crate::shares;

/// Operations the secrets engine needs from the cryptographic layer.
pub trait CryptoProvider: Send + Sync {
	/// Seal `plaintext` to `recipient`.
	fn encrypt(&self, plaintext: &str, recipient: &PublicKey) -> CryptoResult<String>;

	/// Open a sealed string with the recipient key pair.
	fn decrypt(
		&self,
		ciphertext: &str,
		private: &PrivateKey,
		public: &PublicKey,
	) -> CryptoResult<String>;

	/// Derive a key pair from a hex-encoded seed.
	fn derive_key_pair(&self, seed_hex: &str) -> CryptoResult<KeyPair>;

	/// Unwrap the server-held share of an account key.
	fn unwrap_share(&self, wrapped_share: &str, unwrap_key: &str)
		-> CryptoResult<Zeroizing<String>>;

	/// Combine two hex shares into a private key.
	fn reconstruct_private_key(&self, share0: &str, share1: &str) -> CryptoResult<PrivateKey>;

	/// Salted, deterministic fingerprint of `plaintext`.
	fn keyed_digest(&self, plaintext: &str, salt: &str) -> CryptoResult<String>;
}

/// Software implementation backed by X25519, XChaCha20-Poly1305 and BLAKE2b.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareCryptoProvider;

impl SoftwareCryptoProvider {
	pub fn new() -> Self {
		Self
	}
}

impl CryptoProvider for SoftwareCryptoProvider {
	fn encrypt(&self, plaintext: &str, recipient: &PublicKey) -> CryptoResult<String> {
		sealed::encrypt_asymmetric(plaintext, recipient)
	}

	fn decrypt(
		&self,
		ciphertext: &str,
		private: &PrivateKey,
		public: &PublicKey,
	) -> CryptoResult<String> {
		sealed::decrypt_asymmetric(ciphertext, private, public)
	}

	fn derive_key_pair(&self, seed_hex: &str) -> CryptoResult<KeyPair> {
		KeyPair::from_seed_hex(seed_hex)
	}

	fn unwrap_share(
		&self,
		wrapped_share: &str,
		unwrap_key: &str,
	) -> CryptoResult<Zeroizing<String>> {
		shares::unwrap_share(wrapped_share, unwrap_key)
	}

	fn reconstruct_private_key(&self, share0: &str, share1: &str) -> CryptoResult<PrivateKey> {
		shares::reconstruct_private_key(share0, share1)
	}

	fn keyed_digest(&self, plaintext: &str, salt: &str) -> CryptoResult<String> {
		digest::keyed_digest(plaintext, salt)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn provider_roundtrips_through_trait_object() {
		let provider: Box<dyn CryptoProvider> = Box::new(SoftwareCryptoProvider::new());
		let kp = provider.derive_key_pair(&hex::encode([9u8; 32])).unwrap();

		let ct = provider.encrypt("value", &kp.public).unwrap();
		assert_eq!(provider.decrypt(&ct, &kp.private, &kp.public).unwrap(), "value");
	}

	#[test]
	fn derived_key_pair_matches_seed_derivation() {
		let provider = SoftwareCryptoProvider::new();
		let seed = [1u8; 32];
		let kp = provider.derive_key_pair(&hex::encode(seed)).unwrap();
		assert_eq!(kp.public, KeyPair::from_seed(&seed).public);
	}
}
