// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Opens an environment's wrapped key material.
//!
//! The account private key is split in two: one share rides in the
//! credential token, the other is stored server-side wrapped under a key
//! that also rides in the token. Rejoining them opens the environment's
//! wrapped seed and salt, and the seed deterministically yields the
//! environment key pair.

use std::fmt;

use loom_secrets_client::{Credential, EnvironmentKey, UserContext};
use loom_secrets_crypto::{CryptoError, CryptoProvider, PrivateKey, PublicKey};
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::error::{SecretsError, SecretsResult};

/// Key material for one environment.
pub struct EnvironmentKeys {
	/// Secrets are sealed to this key.
	pub public: PublicKey,
	pub private: PrivateKey,
	/// Salt for key digests.
	pub salt: Zeroizing<String>,
}

impl EnvironmentKeys {
	/// Seal `plaintext` to this environment.
	pub fn seal<C: CryptoProvider + ?Sized>(
		&self,
		crypto: &C,
		plaintext: &str,
	) -> SecretsResult<String> {
		Ok(crypto.encrypt(plaintext, &self.public)?)
	}

	/// Open a value sealed to this environment.
	pub fn open<C: CryptoProvider + ?Sized>(
		&self,
		crypto: &C,
		ciphertext: &str,
	) -> SecretsResult<String> {
		Ok(crypto.decrypt(ciphertext, &self.private, &self.public)?)
	}

	/// Keyed digest of a plaintext key name.
	pub fn digest<C: CryptoProvider + ?Sized>(
		&self,
		crypto: &C,
		key: &str,
	) -> SecretsResult<String> {
		Ok(crypto.keyed_digest(key, &self.salt)?)
	}
}

impl fmt::Debug for EnvironmentKeys {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EnvironmentKeys")
			.field("public", &self.public)
			.field("private", &self.private)
			.field("salt", &"[REDACTED]")
			.finish()
	}
}

/// Decrypts account-sealed values and opens environment keys.
pub struct EnvelopeCodec<'a, C: CryptoProvider + ?Sized> {
	crypto: &'a C,
	credential: &'a Credential,
}

fn envelope(stage: &str) -> impl Fn(CryptoError) -> SecretsError + '_ {
	move |e| SecretsError::Envelope(format!("{stage}: {e}"))
}

impl<'a, C: CryptoProvider + ?Sized> EnvelopeCodec<'a, C> {
	pub fn new(crypto: &'a C, credential: &'a Credential) -> Self {
		Self { crypto, credential }
	}

	/// Decrypt a value sealed to the account key.
	pub fn account_decrypt(
		&self,
		wrapped_key_share: &str,
		ciphertext: &str,
	) -> SecretsResult<Zeroizing<String>> {
		let share1 = self
			.crypto
			.unwrap_share(wrapped_key_share, self.credential.share_unwrap_key())
			.map_err(envelope("unwrap key share"))?;
		let account_private = self
			.crypto
			.reconstruct_private_key(self.credential.key_share0(), &share1)
			.map_err(envelope("reconstruct account key"))?;
		let account_public = PublicKey::from_hex(self.credential.account_public_key())
			.map_err(envelope("account public key"))?;

		self.crypto
			.decrypt(ciphertext, &account_private, &account_public)
			.map(Zeroizing::new)
			.map_err(envelope("decrypt"))
	}

	/// Derive the key pair and digest salt of `env_key`.
	///
	/// Any failure is fatal: no partial key material is returned.
	#[instrument(skip(self, user, env_key), fields(environment_id = %env_key.environment.id))]
	pub fn open(
		&self,
		user: &UserContext,
		env_key: &EnvironmentKey,
	) -> SecretsResult<EnvironmentKeys> {
		let seed = self.account_decrypt(&user.wrapped_key_share, &env_key.wrapped_seed)?;
		let salt = self.account_decrypt(&user.wrapped_key_share, &env_key.wrapped_salt)?;

		let derived = self
			.crypto
			.derive_key_pair(&seed)
			.map_err(envelope("derive environment key pair"))?;
		let public = PublicKey::from_hex(&env_key.identity_key)
			.map_err(envelope("environment identity key"))?;

		debug!("environment keys opened");
		Ok(EnvironmentKeys {
			public,
			private: derived.private,
			salt,
		})
	}
}
