// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the cryptographic provider.

use thiserror::Error;

/// Errors raised by key handling, sealing and digest operations.
#[derive(Debug, Error)]
pub enum CryptoError {
	/// Key material did not have the expected length.
	#[error("invalid key length: expected {expected} bytes, got {actual}")]
	InvalidKeyLength { expected: usize, actual: usize },

	/// Hex decoding failed.
	#[error("invalid hex encoding: {0}")]
	InvalidHex(#[from] hex::FromHexError),

	/// Base64 decoding failed.
	#[error("invalid base64 encoding: {0}")]
	InvalidBase64(#[from] base64::DecodeError),

	/// Ciphertext string was not in the expected `prefix:version:key:payload` shape.
	#[error("invalid ciphertext: {0}")]
	InvalidCiphertext(String),

	/// Key exchange produced an all-zero shared secret.
	#[error("key exchange failed: peer public key is a low-order point")]
	NonContributory,

	/// AEAD encryption failed.
	#[error("encryption failed: {0}")]
	Encryption(String),

	/// AEAD decryption failed (wrong key or tampered ciphertext).
	#[error("decryption failed: {0}")]
	Decryption(String),

	/// Decrypted bytes were not valid UTF-8.
	#[error("decrypted payload is not valid UTF-8")]
	InvalidUtf8,

	/// Secret shares could not be combined.
	#[error("share mismatch: {0}")]
	ShareMismatch(String),

	/// Digest salt could not be used as a BLAKE2b key.
	#[error("invalid digest salt: {0}")]
	InvalidSalt(String),

	/// Unknown random secret kind.
	#[error("unsupported random secret type: {0}")]
	UnsupportedRandomKind(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
