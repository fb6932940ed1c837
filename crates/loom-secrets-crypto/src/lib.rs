// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cryptographic provider for the Loom secrets client.
//!
//! Secrets are sealed to per-environment X25519 keys. Environment seeds and
//! digest salts are themselves sealed to the account key, which is split into
//! two XOR shares: one in the credential token, one wrapped on the server.
//!
//! # Example
//!
//! ```
//! use loom_secrets_crypto::{CryptoProvider, KeyPair, SoftwareCryptoProvider};
//!
//! let provider = SoftwareCryptoProvider::new();
//! let env = KeyPair::generate();
//!
//! let sealed = provider.encrypt("postgres://db", &env.public).unwrap();
//! let opened = provider.decrypt(&sealed, &env.private, &env.public).unwrap();
//! assert_eq!(opened, "postgres://db");
//! ```

pub mod digest;
pub mod error;
pub mod keys;
mod kx;
pub mod provider;
pub mod random;
pub mod sealed;
pub mod shares;

pub use error::{CryptoError, CryptoResult};
pub use keys::{KeyPair, PrivateKey, PublicKey, KEY_SIZE};
pub use provider::{CryptoProvider, SoftwareCryptoProvider};
pub use random::{generate_random_secret, RandomKind, DEFAULT_RANDOM_LENGTH};
