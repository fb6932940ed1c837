// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backend abstraction consumed by the secrets engine.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::types::{FetchSecretsRequest, Lease, RawSecretRecord, SecretPayload, UserContext};

/// Authenticated access to secret records and account metadata.
///
/// Implementations are bound to one credential at construction.
#[async_trait]
pub trait SecretsBackend: Send + Sync {
	/// Account, applications and wrapped environment keys for the credential.
	async fn fetch_user_context(&self) -> ClientResult<UserContext>;

	/// Raw records of one environment, optionally restricted to a path.
	async fn fetch_secrets(&self, request: &FetchSecretsRequest)
		-> ClientResult<Vec<RawSecretRecord>>;

	/// Create a batch of secrets.
	async fn create_secrets(&self, environment_id: &str, secrets: &[SecretPayload])
		-> ClientResult<()>;

	/// Update a batch of secrets, matched by `id`.
	async fn update_secrets(&self, environment_id: &str, secrets: &[SecretPayload])
		-> ClientResult<()>;

	/// Delete secrets by id.
	async fn delete_secrets(&self, environment_id: &str, ids: &[String]) -> ClientResult<()>;

	/// Extend a dynamic secret lease.
	async fn renew_lease(&self, lease_id: &str, ttl: Option<u64>) -> ClientResult<Lease>;

	/// Revoke a dynamic secret lease before it expires.
	async fn revoke_lease(&self, lease_id: &str) -> ClientResult<()>;
}
