// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backend client for the Loom secrets service.
//!
//! This crate knows how to authenticate with a credential token, fetch
//! account metadata and sealed secret records, and submit batches of
//! already-encrypted secrets. It never sees plaintext; encryption and
//! decryption live in `loom-secrets-crypto` and are driven by the
//! `loom-secrets` engine.
//!
//! [`SecretsBackend`] is the seam: [`HttpBackend`] talks HTTPS to a real
//! server and [`MemoryBackend`] keeps records in memory for tests.

pub mod backend;
pub mod credential;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use backend::SecretsBackend;
pub use credential::{Credential, TokenKind};
pub use error::{ClientError, ClientResult};
pub use http::{user_agent, HttpBackend};
pub use memory::MemoryBackend;
pub use types::{
	Application, DynamicSecretRecord, Environment, EnvironmentKey, FetchSecretsRequest,
	KeyMapEntry, Lease, LeaseCredential, Organisation, OverridePayload, RawSecretRecord,
	SecretOverride, SecretPayload, StaticSecretRecord, UserContext,
};
