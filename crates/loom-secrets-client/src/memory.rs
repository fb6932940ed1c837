// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`SecretsBackend`] for tests and offline tooling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::backend::SecretsBackend;
use crate::error::{ClientError, ClientResult};
use crate::types::{
	FetchSecretsRequest, Lease, RawSecretRecord, SecretOverride, SecretPayload, StaticSecretRecord,
	UserContext,
};

/// Stores records per environment id and counts fetches.
#[derive(Debug)]
pub struct MemoryBackend {
	user_context: UserContext,
	records: RwLock<HashMap<String, Vec<RawSecretRecord>>>,
	fetches: AtomicUsize,
}

impl MemoryBackend {
	pub fn new(user_context: UserContext) -> Self {
		Self {
			user_context,
			records: RwLock::new(HashMap::new()),
			fetches: AtomicUsize::new(0),
		}
	}

	/// Store a record as-is. Used to seed dynamic secrets.
	pub async fn insert_record(&self, environment_id: &str, record: RawSecretRecord) {
		self.records
			.write()
			.await
			.entry(environment_id.to_string())
			.or_default()
			.push(record);
	}

	/// Every record stored for an environment.
	pub async fn records(&self, environment_id: &str) -> Vec<RawSecretRecord> {
		self.records
			.read()
			.await
			.get(environment_id)
			.cloned()
			.unwrap_or_default()
	}

	/// Number of `fetch_secrets` calls served so far.
	pub fn fetch_count(&self) -> usize {
		self.fetches.load(Ordering::SeqCst)
	}

	fn static_record(id: String, payload: &SecretPayload) -> StaticSecretRecord {
		StaticSecretRecord {
			id,
			key: payload.key.clone(),
			value: payload.value.clone(),
			key_digest: payload.key_digest.clone(),
			comment: Some(payload.comment.clone()),
			tags: payload.tags.clone(),
			path: payload.path.clone(),
			personal_override: payload.personal_override.as_ref().map(|o| SecretOverride {
				value: o.value.clone(),
				is_active: o.is_active,
			}),
		}
	}

	fn find_lease<'a>(
		records: &'a mut HashMap<String, Vec<RawSecretRecord>>,
		lease_id: &str,
	) -> Option<&'a mut Option<Lease>> {
		records
			.values_mut()
			.flat_map(|list| list.iter_mut())
			.filter_map(|record| match record {
				RawSecretRecord::Dynamic(d) => Some(&mut d.lease),
				RawSecretRecord::Static(_) => None,
			})
			.find(|lease| matches!(lease, Some(l) if l.id == lease_id))
	}
}

#[async_trait]
impl SecretsBackend for MemoryBackend {
	async fn fetch_user_context(&self) -> ClientResult<UserContext> {
		Ok(self.user_context.clone())
	}

	async fn fetch_secrets(
		&self,
		request: &FetchSecretsRequest,
	) -> ClientResult<Vec<RawSecretRecord>> {
		self.fetches.fetch_add(1, Ordering::SeqCst);
		let records = self.records.read().await;
		let matching = records
			.get(&request.environment_id)
			.map(|list| {
				list.iter()
					.filter(|r| request.path.as_deref().map_or(true, |p| r.path() == p))
					.filter(|r| request.dynamic || matches!(r, RawSecretRecord::Static(_)))
					.cloned()
					.map(|mut r| {
						if let RawSecretRecord::Dynamic(d) = &mut r {
							if !request.lease {
								d.lease = None;
							}
						}
						r
					})
					.collect::<Vec<_>>()
			})
			.unwrap_or_default();

		debug!(environment_id = %request.environment_id, count = matching.len(), "memory fetch");
		Ok(matching)
	}

	async fn create_secrets(
		&self,
		environment_id: &str,
		secrets: &[SecretPayload],
	) -> ClientResult<()> {
		let mut records = self.records.write().await;
		let list = records.entry(environment_id.to_string()).or_default();
		for payload in secrets {
			let record = Self::static_record(Uuid::new_v4().to_string(), payload);
			list.push(RawSecretRecord::Static(record));
		}
		Ok(())
	}

	async fn update_secrets(
		&self,
		environment_id: &str,
		secrets: &[SecretPayload],
	) -> ClientResult<()> {
		let mut records = self.records.write().await;
		let list = records
			.get_mut(environment_id)
			.ok_or_else(|| ClientError::NotFound(format!("environment {environment_id}")))?;

		// Validate the whole batch before touching anything.
		let mut positions = Vec::with_capacity(secrets.len());
		for payload in secrets {
			let id = payload
				.id
				.as_deref()
				.ok_or_else(|| ClientError::Api {
					status: 400,
					message: "secret id is required for update".to_string(),
				})?;
			let position = list
				.iter()
				.position(|r| matches!(r, RawSecretRecord::Static(s) if s.id == id))
				.ok_or_else(|| ClientError::NotFound(format!("secret {id}")))?;
			positions.push((position, id.to_string()));
		}

		for ((position, id), payload) in positions.into_iter().zip(secrets) {
			list[position] = RawSecretRecord::Static(Self::static_record(id, payload));
		}
		Ok(())
	}

	async fn delete_secrets(&self, environment_id: &str, ids: &[String]) -> ClientResult<()> {
		let mut records = self.records.write().await;
		if let Some(list) = records.get_mut(environment_id) {
			list.retain(|r| !ids.iter().any(|id| id == r.id()));
		}
		Ok(())
	}

	async fn renew_lease(&self, lease_id: &str, ttl: Option<u64>) -> ClientResult<Lease> {
		let mut records = self.records.write().await;
		let slot = Self::find_lease(&mut records, lease_id)
			.ok_or_else(|| ClientError::NotFound(format!("lease {lease_id}")))?;
		let lease = slot
			.as_mut()
			.ok_or_else(|| ClientError::NotFound(format!("lease {lease_id}")))?;
		if ttl.is_some() {
			lease.ttl = ttl;
		}
		Ok(lease.clone())
	}

	async fn revoke_lease(&self, lease_id: &str) -> ClientResult<()> {
		let mut records = self.records.write().await;
		let slot = Self::find_lease(&mut records, lease_id)
			.ok_or_else(|| ClientError::NotFound(format!("lease {lease_id}")))?;
		*slot = None;
		Ok(())
	}
}
