// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sealed-box style encryption of strings to an X25519 public key.
//!
//! Ciphertext format: `ph:v1:<ephemeral public key hex>:<base64(ciphertext || nonce)>`.
//! The payload is XChaCha20-Poly1305 under a session key agreed between a
//! fresh ephemeral key pair and the recipient.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
	aead::{Aead, KeyInit},
	Key, XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{KeyPair, PrivateKey, PublicKey, KEY_SIZE};
use crate::kx;

/// Leading tag of every sealed ciphertext.
pub const CIPHERTEXT_PREFIX: &str = "ph";

/// Format version written by [`encrypt_asymmetric`].
pub const CIPHERTEXT_VERSION: u32 = 1;

/// Size of an XChaCha20 nonce in bytes.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypt raw bytes, returning `ciphertext || nonce`.
pub fn encrypt_raw(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
	let cipher = XChaCha20Poly1305::new(Key::from_slice(key));

	let mut nonce = [0u8; NONCE_SIZE];
	OsRng.fill_bytes(&mut nonce);

	let mut out = cipher
		.encrypt(XNonce::from_slice(&nonce), plaintext)
		.map_err(|e| CryptoError::Encryption(e.to_string()))?;
	out.extend_from_slice(&nonce);
	Ok(out)
}

/// Decrypt `ciphertext || nonce` produced by [`encrypt_raw`].
pub fn decrypt_raw(key: &[u8; KEY_SIZE], data: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
	if data.len() < NONCE_SIZE + TAG_SIZE {
		return Err(CryptoError::Decryption(format!(
			"payload too short: {} bytes",
			data.len()
		)));
	}

	let (ciphertext, nonce) = data.split_at(data.len() - NONCE_SIZE);
	let cipher = XChaCha20Poly1305::new(Key::from_slice(key));

	let plaintext = cipher
		.decrypt(XNonce::from_slice(nonce), ciphertext)
		.map_err(|e| CryptoError::Decryption(e.to_string()))?;

	Ok(Zeroizing::new(plaintext))
}

/// Encrypt a string to `recipient`.
pub fn encrypt_asymmetric(plaintext: &str, recipient: &PublicKey) -> CryptoResult<String> {
	let ephemeral = KeyPair::generate();
	let session = kx::client_session_keys(&ephemeral, recipient)?;

	let sealed = encrypt_raw(&session.tx, plaintext.as_bytes())?;

	Ok(format!(
		"{CIPHERTEXT_PREFIX}:v{CIPHERTEXT_VERSION}:{}:{}",
		ephemeral.public.to_hex(),
		BASE64.encode(sealed)
	))
}

/// Decrypt a sealed string using the recipient's key pair.
///
/// `public` must be the public half belonging to `private`; it takes part in
/// the session hash, so a mismatched pair fails authentication.
pub fn decrypt_asymmetric(
	ciphertext: &str,
	private: &PrivateKey,
	public: &PublicKey,
) -> CryptoResult<String> {
	let segments: Vec<&str> = ciphertext.split(':').collect();
	if segments.len() != 4 {
		return Err(CryptoError::InvalidCiphertext(format!(
			"expected 4 segments, got {}",
			segments.len()
		)));
	}
	if segments[0] != CIPHERTEXT_PREFIX {
		return Err(CryptoError::InvalidCiphertext(format!(
			"unknown prefix '{}'",
			segments[0]
		)));
	}

	let ephemeral = PublicKey::from_hex(segments[2])?;
	let payload = BASE64.decode(segments[3])?;

	let recipient = KeyPair {
		public: *public,
		private: private.clone(),
	};
	let session = kx::server_session_keys(&recipient, &ephemeral)?;

	let plaintext = decrypt_raw(&session.rx, &payload)?;
	String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::InvalidUtf8)
}
