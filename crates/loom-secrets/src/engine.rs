// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Get, create, update and delete against a [`SecretsBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use loom_secrets_client::{
	Credential, FetchSecretsRequest, HttpBackend, Lease, OverridePayload, RawSecretRecord,
	SecretPayload, SecretsBackend, StaticSecretRecord,
};
use loom_secrets_config::{AccountRegistry, ClientSettings, ConfigError, FileProjectConfigStore};
use loom_secrets_crypto::{generate_random_secret, CryptoProvider, SoftwareCryptoProvider};
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

use crate::cache::ResolutionCache;
use crate::context::{ContextResolver, ResolvedContext};
use crate::dynamic::DynamicMaterializer;
use crate::envelope::{EnvelopeCodec, EnvironmentKeys};
use crate::error::{SecretsError, SecretsResult};
use crate::resolve::{ReferenceResolver, SecretSource};
use crate::tags::tag_matches;
use crate::types::{
	normalize_path, AppSelector, CreateRequest, DeleteOutcome, DeleteRequest, GetRequest, NewValue,
	ResolvedSecret, UpdateOutcome, UpdateRequest, ROOT_PATH,
};

/// Normalized path, or `None` for an absent or empty path.
fn path_filter(path: Option<&str>) -> Option<String> {
	path.filter(|p| !p.is_empty()).map(normalize_path)
}

/// Pick the credential to use: the configured service token, else the default account's token.
pub fn select_credential(
	settings: &ClientSettings,
	accounts: &AccountRegistry,
) -> SecretsResult<Credential> {
	if let Some(token) = &settings.service_token {
		debug!("using service token from settings");
		return Ok(Credential::parse(token)?);
	}

	let account = accounts.default_account()?;
	let token = account.token.as_deref().ok_or_else(|| {
		ConfigError::validation(format!("account '{}' has no stored token", account.id))
	})?;
	Ok(Credential::parse(token)?)
}

/// The secrets engine.
///
/// Each operation fetches the user context, resolves the target
/// environment and opens its keys before touching any secret.
pub struct SecretsEngine<B, C = SoftwareCryptoProvider> {
	backend: B,
	crypto: C,
	credential: Credential,
	resolver: ContextResolver,
}

impl SecretsEngine<HttpBackend> {
	/// Engine talking to `settings.host`, with project configs discovered
	/// from the working directory.
	pub fn connect(settings: &ClientSettings, credential: Credential) -> SecretsResult<Self> {
		let backend = HttpBackend::new(settings, credential.clone())?;
		let resolver = ContextResolver::new(Arc::new(FileProjectConfigStore::new()))
			.with_search_depth(settings.config_search_depth);
		Ok(Self::new(backend, SoftwareCryptoProvider::new(), credential, resolver))
	}
}

impl<B: SecretsBackend, C: CryptoProvider> SecretsEngine<B, C> {
	pub fn new(backend: B, crypto: C, credential: Credential, resolver: ContextResolver) -> Self {
		Self {
			backend,
			crypto,
			credential,
			resolver,
		}
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	pub fn context_resolver(&self) -> &ContextResolver {
		&self.resolver
	}

	/// Resolve `selector` without opening any keys.
	pub async fn resolve_context(&self, selector: &AppSelector) -> SecretsResult<ResolvedContext> {
		let user = self.backend.fetch_user_context().await?;
		self.resolver.resolve(&user, selector)
	}

	async fn open(
		&self,
		selector: &AppSelector,
	) -> SecretsResult<(ResolvedContext, EnvironmentKeys)> {
		let user = self.backend.fetch_user_context().await?;
		let context = self.resolver.resolve(&user, selector)?;
		let keys = EnvelopeCodec::new(&self.crypto, &self.credential)
			.open(&user, &context.environment_key)?;
		Ok((context, keys))
	}

	/// Decrypt one static record, or `None` if it is filtered out or unreadable.
	fn decrypt_static(
		&self,
		context: &ResolvedContext,
		keys: &EnvironmentKeys,
		record: &StaticSecretRecord,
		request: &GetRequest,
	) -> Option<ResolvedSecret> {
		if let Some(tag) = request.tag.as_deref().filter(|t| !t.is_empty()) {
			if !tag_matches(&record.tags, tag) {
				return None;
			}
		}

		let active_override = record.personal_override.as_ref().filter(|o| o.is_active);
		let sealed_value = active_override.map_or(&record.value, |o| &o.value);

		let key = match keys.open(&self.crypto, &record.key) {
			Ok(key) => key,
			Err(e) => {
				warn!(secret_id = %record.id, error = %e, "skipping secret with undecryptable key");
				return None;
			}
		};
		let value = match keys.open(&self.crypto, sealed_value) {
			Ok(value) => value,
			Err(e) => {
				warn!(secret_id = %record.id, error = %e, "skipping secret with undecryptable value");
				return None;
			}
		};
		if !request.keys.is_empty() && !request.keys.contains(&key) {
			return None;
		}

		let comment = record
			.comment
			.as_deref()
			.filter(|c| !c.is_empty())
			.map(|c| keys.open(&self.crypto, c).unwrap_or_default())
			.unwrap_or_default();

		Some(ResolvedSecret {
			key,
			value,
			path: normalize_path(&record.path),
			application: context.app_name.clone(),
			environment: context.env_name.clone(),
			tags: record.tags.clone(),
			comment,
			overridden: active_override.is_some(),
			is_dynamic: false,
			dynamic_group: None,
		})
	}

	/// Fetch and decrypt secrets.
	///
	/// Records that fail to decrypt are skipped and logged.
	#[instrument(skip(self, request), fields(path = ?request.path, dynamic = request.dynamic))]
	pub async fn get(&self, request: &GetRequest) -> SecretsResult<Vec<ResolvedSecret>> {
		let (context, keys) = self.open(&request.selector).await?;

		let fetch = FetchSecretsRequest {
			environment_id: context.env_id.clone(),
			path: path_filter(request.path.as_deref()),
			dynamic: request.dynamic,
			lease: request.lease,
			lease_ttl: request.lease_ttl,
		};
		let records = self.backend.fetch_secrets(&fetch).await?;

		let materializer =
			DynamicMaterializer::new(&self.crypto, &keys, &context.app_name, &context.env_name);
		let mut secrets = Vec::with_capacity(records.len());
		for record in &records {
			match record {
				RawSecretRecord::Static(record) => {
					secrets.extend(self.decrypt_static(&context, &keys, record, request));
				}
				RawSecretRecord::Dynamic(record) => {
					secrets.extend(materializer.materialize(record, &request.keys));
				}
			}
		}

		debug!(
			environment_id = %context.env_id,
			fetched = records.len(),
			returned = secrets.len(),
			"secrets decrypted"
		);
		Ok(secrets)
	}

	/// [`get`](Self::get), then expand references in every value.
	pub async fn get_expanded(
		&self,
		request: &GetRequest,
		cache: &mut ResolutionCache,
	) -> SecretsResult<Vec<ResolvedSecret>> {
		let secrets = self.get(request).await?;
		let Some(first) = secrets.first() else {
			return Ok(secrets);
		};
		let (app, env) = (first.application.clone(), first.environment.clone());
		Ok(self
			.reference_resolver(cache)
			.resolve_secrets(&secrets, &app, &env)
			.await)
	}

	/// Encrypt and store new secrets in one batch.
	///
	/// Nothing is submitted if any secret fails to encrypt.
	#[instrument(skip(self, request), fields(count = request.secrets.len(), path = ?request.path))]
	pub async fn create(&self, request: &CreateRequest) -> SecretsResult<()> {
		if request.secrets.is_empty() {
			return Ok(());
		}
		let (context, keys) = self.open(&request.selector).await?;
		let path = path_filter(request.path.as_deref()).unwrap_or_else(|| ROOT_PATH.to_string());
		let override_value = request.override_value.as_deref().filter(|v| !v.is_empty());

		let mut payloads = Vec::with_capacity(request.secrets.len());
		for secret in &request.secrets {
			let value = match &secret.value {
				NewValue::Literal(value) => Zeroizing::new(value.clone()),
				NewValue::Random { kind, length } => {
					Zeroizing::new(generate_random_secret(*kind, *length))
				}
			};
			let personal_override = match override_value {
				Some(v) => Some(OverridePayload {
					value: keys.seal(&self.crypto, v)?,
					is_active: true,
				}),
				None => None,
			};

			payloads.push(SecretPayload {
				id: None,
				key: keys.seal(&self.crypto, &secret.key)?,
				key_digest: keys.digest(&self.crypto, &secret.key)?,
				value: keys.seal(&self.crypto, &value)?,
				path: path.clone(),
				tags: Vec::new(),
				comment: String::new(),
				personal_override,
			});
		}

		self.backend.create_secrets(&context.env_id, &payloads).await?;
		info!(environment_id = %context.env_id, count = payloads.len(), "secrets created");
		Ok(())
	}

	/// Change a secret's value, path or personal override.
	///
	/// A missing key is reported as [`UpdateOutcome::NotFound`], not an error.
	#[instrument(skip(self, request), fields(source_path = %request.source_path))]
	pub async fn update(&self, request: &UpdateRequest) -> SecretsResult<UpdateOutcome> {
		let (context, keys) = self.open(&request.selector).await?;

		let fetch = FetchSecretsRequest {
			environment_id: context.env_id.clone(),
			path: path_filter(Some(&request.source_path)),
			..Default::default()
		};
		let records = self.backend.fetch_secrets(&fetch).await?;

		let existing = records
			.iter()
			.filter_map(|record| match record {
				RawSecretRecord::Static(record) => Some(record),
				RawSecretRecord::Dynamic(_) => None,
			})
			.find(|record| {
				keys.open(&self.crypto, &record.key)
					.is_ok_and(|key| key == request.key)
			});
		let Some(existing) = existing else {
			debug!("update target not found");
			return Ok(UpdateOutcome::NotFound {
				key: request.key.clone(),
				path: request.source_path.clone(),
			});
		};

		let sealed_value = keys.seal(&self.crypto, &request.value)?;
		let personal_override = if request.toggle_override {
			let current = existing
				.personal_override
				.as_ref()
				.ok_or_else(|| SecretsError::OverrideNotFound(request.key.clone()))?;
			Some(OverridePayload {
				value: current.value.clone(),
				is_active: !current.is_active,
			})
		} else if request.set_override {
			Some(match &existing.personal_override {
				None => OverridePayload {
					value: sealed_value.clone(),
					is_active: true,
				},
				Some(current) => OverridePayload {
					value: if request.value.is_empty() {
						current.value.clone()
					} else {
						sealed_value.clone()
					},
					is_active: current.is_active,
				},
			})
		} else {
			None
		};

		// Override changes leave the shared value untouched.
		let value = if personal_override.is_some() {
			existing.value.clone()
		} else {
			sealed_value
		};
		let path = path_filter(request.destination_path.as_deref())
			.unwrap_or_else(|| existing.path.clone());

		let payload = SecretPayload {
			id: Some(existing.id.clone()),
			key: keys.seal(&self.crypto, &request.key)?,
			key_digest: keys.digest(&self.crypto, &request.key)?,
			value,
			path,
			tags: existing.tags.clone(),
			comment: existing.comment.clone().unwrap_or_default(),
			personal_override,
		};

		self.backend
			.update_secrets(&context.env_id, std::slice::from_ref(&payload))
			.await?;
		info!(environment_id = %context.env_id, secret_id = %existing.id, "secret updated");
		Ok(UpdateOutcome::Updated)
	}

	/// Delete secrets by key. Keys with no match are returned, not raised.
	#[instrument(skip(self, request), fields(count = request.keys.len(), path = ?request.path))]
	pub async fn delete(&self, request: &DeleteRequest) -> SecretsResult<DeleteOutcome> {
		let (context, keys) = self.open(&request.selector).await?;
		let path = path_filter(request.path.as_deref());

		let fetch = FetchSecretsRequest {
			environment_id: context.env_id.clone(),
			path: path.clone(),
			..Default::default()
		};
		let records = self.backend.fetch_secrets(&fetch).await?;

		let candidates: Vec<(&str, String)> = records
			.iter()
			.filter_map(|record| match record {
				RawSecretRecord::Static(record) => Some(record),
				RawSecretRecord::Dynamic(_) => None,
			})
			.filter(|record| path.as_deref().map_or(true, |p| normalize_path(&record.path) == p))
			.filter_map(|record| {
				keys.open(&self.crypto, &record.key)
					.ok()
					.map(|key| (record.id.as_str(), key))
			})
			.collect();

		let mut ids: Vec<String> = Vec::new();
		let mut outcome = DeleteOutcome::default();
		for key in &request.keys {
			match candidates.iter().find(|(_, candidate)| candidate == key) {
				Some((id, _)) => {
					if !ids.iter().any(|existing| existing == id) {
						ids.push(id.to_string());
					}
				}
				None => outcome.keys_not_found.push(key.clone()),
			}
		}

		if !ids.is_empty() {
			self.backend.delete_secrets(&context.env_id, &ids).await?;
		}
		outcome.deleted = ids.len();
		info!(
			environment_id = %context.env_id,
			deleted = outcome.deleted,
			not_found = outcome.keys_not_found.len(),
			"secrets deleted"
		);
		Ok(outcome)
	}

	/// Extend a dynamic secret lease.
	pub async fn renew_lease(&self, lease_id: &str, ttl: Option<u64>) -> SecretsResult<Lease> {
		Ok(self.backend.renew_lease(lease_id, ttl).await?)
	}

	pub async fn revoke_lease(&self, lease_id: &str) -> SecretsResult<()> {
		Ok(self.backend.revoke_lease(lease_id).await?)
	}

	/// A reference resolver that fetches missing buckets through this engine.
	pub fn reference_resolver<'a>(
		&'a self,
		cache: &'a mut ResolutionCache,
	) -> ReferenceResolver<'a, Self> {
		ReferenceResolver::new(self, cache)
	}
}

#[async_trait]
impl<B: SecretsBackend, C: CryptoProvider> SecretSource for SecretsEngine<B, C> {
	async fn fetch_bucket(
		&self,
		app: &str,
		env: &str,
		path: &str,
	) -> SecretsResult<Vec<ResolvedSecret>> {
		let request = GetRequest {
			path: Some(path.to_string()),
			..GetRequest::new(AppSelector::by_name(app, env))
		};
		self.get(&request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_secrets_config::Account;

	fn settings(service_token: Option<&str>) -> ClientSettings {
		ClientSettings {
			service_token: service_token.map(str::to_string),
			..ClientSettings::default()
		}
	}

	fn account(id: &str, token: Option<&str>) -> Account {
		Account {
			id: id.to_string(),
			host: "https://console.phase.dev".to_string(),
			email: None,
			organization_id: None,
			organization_name: None,
			wrapped_key_share: None,
			token: token.map(str::to_string),
		}
	}

	#[test]
	fn service_token_takes_precedence() {
		let mut accounts = AccountRegistry::default();
		accounts.upsert(account("alice", Some("pss_user:v1:user:pub:s:u")));

		let credential = select_credential(
			&settings(Some("pss_service:v2:svc:pub:s:u")),
			&accounts,
		)
		.unwrap();
		assert_eq!(credential.authorization_header(), "Bearer ServiceAccount svc");
	}

	#[test]
	fn falls_back_to_default_account() {
		let mut accounts = AccountRegistry::default();
		accounts.upsert(account("alice", Some("pss_user:v1:user:pub:s:u")));

		let credential = select_credential(&settings(None), &accounts).unwrap();
		assert_eq!(credential.authorization_header(), "Bearer User user");
	}

	#[test]
	fn missing_credentials_are_config_errors() {
		let err = select_credential(&settings(None), &AccountRegistry::default()).unwrap_err();
		assert!(matches!(err, SecretsError::Config(ConfigError::NoDefaultAccount)));

		let mut accounts = AccountRegistry::default();
		accounts.upsert(account("alice", None));
		let err = select_credential(&settings(None), &accounts).unwrap_err();
		assert!(matches!(err, SecretsError::Config(ConfigError::Validation(_))));
	}

	#[test]
	fn connect_builds_http_engine() {
		let credential = Credential::parse("pss_user:v1:tok:pub:s:u").unwrap();
		let engine = SecretsEngine::connect(&ClientSettings::default(), credential).unwrap();
		assert_eq!(engine.backend().host(), "https://console.phase.dev");
		assert_eq!(engine.context_resolver().search_depth(), 8);
	}

	#[test]
	fn empty_paths_do_not_filter() {
		assert_eq!(path_filter(None), None);
		assert_eq!(path_filter(Some("")), None);
		assert_eq!(path_filter(Some("db")), Some("/db".to_string()));
	}
}
