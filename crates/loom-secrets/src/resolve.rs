// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recursive expansion of `${...}` references in secret values.
//!
//! Unresolvable references are never errors; they stay in the output as
//! literal text. Each top-level call visits a reference at most once, so
//! circular references terminate and stay literal.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, instrument};

use crate::cache::{CacheKey, ResolutionCache};
use crate::error::SecretsResult;
use crate::reference::{contains_placeholder, placeholders, Reference};
use crate::types::{ResolvedSecret, ROOT_PATH};

/// Where buckets missing from the cache are fetched from.
#[async_trait]
pub trait SecretSource: Send + Sync {
	/// Every secret of `app`/`env` stored at `path`.
	async fn fetch_bucket(&self, app: &str, env: &str, path: &str)
		-> SecretsResult<Vec<ResolvedSecret>>;
}

/// Already-fetched secrets of the current application: env -> path -> key -> value.
#[derive(Default)]
struct SecretIndex<'a> {
	environments: HashMap<&'a str, HashMap<&'a str, HashMap<&'a str, &'a str>>>,
}

impl<'a> SecretIndex<'a> {
	fn build(secrets: &'a [ResolvedSecret]) -> Self {
		let mut index = Self::default();
		for secret in secrets {
			index
				.environments
				.entry(secret.environment.as_str())
				.or_default()
				.entry(secret.path.as_str())
				.or_default()
				.insert(secret.key.as_str(), secret.value.as_str());
		}
		index
	}

	/// Exact, then case-insensitive, then substring in either direction
	/// (shortest, then lexicographically first).
	fn find_environment(&self, name: &str) -> Option<&'a str> {
		if let Some((env, _)) = self.environments.get_key_value(name) {
			return Some(*env);
		}
		if let Some(env) = self
			.environments
			.keys()
			.filter(|env| env.eq_ignore_ascii_case(name))
			.min()
		{
			return Some(*env);
		}

		let wanted = name.to_lowercase();
		self.environments
			.keys()
			.filter(|env| {
				let lowered = env.to_lowercase();
				lowered.contains(&wanted) || wanted.contains(&lowered)
			})
			.min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
			.copied()
	}

	fn lookup(&self, reference: &Reference, current_env: &str) -> Option<&'a str> {
		let env = self.find_environment(&reference.env)?;
		let paths = self.environments.get(env)?;

		let at_path = paths
			.get(reference.path.as_str())
			.and_then(|keys| keys.get(reference.key.as_str()));
		if let Some(value) = at_path {
			return Some(*value);
		}
		if reference.env.eq_ignore_ascii_case(current_env) {
			return paths
				.get(ROOT_PATH)
				.and_then(|keys| keys.get(reference.key.as_str()))
				.copied();
		}
		None
	}
}

fn cache_key(reference: &Reference, path: &str) -> CacheKey {
	CacheKey::new(reference.app.as_str(), reference.env.as_str(), path)
}

/// Expands references using a caller-owned [`ResolutionCache`].
pub struct ReferenceResolver<'a, S: SecretSource + ?Sized> {
	source: &'a S,
	cache: &'a mut ResolutionCache,
}

impl<'a, S: SecretSource + ?Sized> ReferenceResolver<'a, S> {
	pub fn new(source: &'a S, cache: &'a mut ResolutionCache) -> Self {
		Self { source, cache }
	}

	/// Expand every reference in `value`.
	///
	/// `all_secrets` are the already-decrypted secrets of the current
	/// context; they are consulted first and primed into the cache.
	#[instrument(skip_all, fields(app = %current_app, env = %current_env))]
	pub async fn resolve_all_secrets(
		&mut self,
		value: &str,
		all_secrets: &[ResolvedSecret],
		current_app: &str,
		current_env: &str,
	) -> String {
		if !contains_placeholder(value) {
			return value.to_string();
		}

		self.cache.prime(all_secrets, current_app);
		let index = SecretIndex::build(all_secrets);
		let mut visited = HashSet::new();
		self.resolve_value(value, &index, current_app, current_app, current_env, &mut visited)
			.await
	}

	/// Expand references in the value of every secret in `secrets`.
	pub async fn resolve_secrets(
		&mut self,
		secrets: &[ResolvedSecret],
		current_app: &str,
		current_env: &str,
	) -> Vec<ResolvedSecret> {
		let mut resolved = Vec::with_capacity(secrets.len());
		for secret in secrets {
			let value = self
				.resolve_all_secrets(&secret.value, secrets, current_app, current_env)
				.await;
			resolved.push(ResolvedSecret {
				value,
				..secret.clone()
			});
		}
		resolved
	}

	/// Fetch the bucket for `key` unless the cache already holds all of it.
	async fn fill_bucket(&mut self, key: &CacheKey) {
		if self.cache.contains(key) {
			return;
		}

		match self.source.fetch_bucket(&key.app, &key.env, &key.path).await {
			Ok(secrets) => {
				let bucket = secrets
					.into_iter()
					.map(|secret| (secret.key, secret.value))
					.collect();
				self.cache.insert_bucket(key.clone(), bucket);
			}
			Err(e) => {
				debug!(
					app = %key.app,
					env = %key.env,
					path = %key.path,
					error = %e,
					"reference bucket unavailable"
				);
			}
		}
	}

	/// Fetch every bucket the references point at that the index cannot answer.
	async fn prefetch(
		&mut self,
		references: &[Reference],
		index: &SecretIndex<'_>,
		origin_app: &str,
		current_env: &str,
	) {
		let mut requested = HashSet::new();
		for reference in references {
			if reference.app == origin_app && index.lookup(reference, current_env).is_some() {
				continue;
			}
			let key = cache_key(reference, &reference.path);
			if requested.insert(key.clone()) {
				self.fill_bucket(&key).await;
			}
		}
	}

	/// Look `reference` up in the cache. Within the current environment a
	/// miss at the referenced path retries at the root path.
	async fn cached_value(&mut self, reference: &Reference, current_env: &str) -> Option<String> {
		let key = cache_key(reference, &reference.path);
		if let Some(value) = self.cache.get(&key, &reference.key) {
			return Some(value.to_string());
		}
		if key.path == ROOT_PATH || !reference.env.eq_ignore_ascii_case(current_env) {
			return None;
		}

		let root = cache_key(reference, ROOT_PATH);
		self.fill_bucket(&root).await;
		self.cache.get(&root, &reference.key).map(str::to_string)
	}

	fn resolve_value<'r>(
		&'r mut self,
		value: &'r str,
		index: &'r SecretIndex<'r>,
		origin_app: &'r str,
		current_app: &'r str,
		current_env: &'r str,
		visited: &'r mut HashSet<Reference>,
	) -> BoxFuture<'r, String>
	where
		S: 'r,
	{
		async move {
			let parsed: Vec<(&str, Reference)> = placeholders(value)
				.filter_map(|(full, body)| match Reference::parse(body, current_app, current_env) {
					Ok(reference) => Some((full, reference)),
					Err(e) => {
						debug!(error = %e, "leaving reference unresolved");
						None
					}
				})
				.collect();
			if parsed.is_empty() {
				return value.to_string();
			}

			let references: Vec<Reference> = parsed.iter().map(|(_, r)| r.clone()).collect();
			self.prefetch(&references, index, origin_app, current_env).await;

			let mut resolved = value.to_string();
			for (full, reference) in parsed {
				if !visited.insert(reference.clone()) {
					continue;
				}

				let found = if reference.app == origin_app {
					index.lookup(&reference, current_env).map(str::to_string)
				} else {
					None
				};
				let found = match found {
					Some(value) => Some(value),
					None => self.cached_value(&reference, current_env).await,
				};
				let Some(mut replacement) = found else {
					continue;
				};

				if contains_placeholder(&replacement) {
					let nested = self
						.resolve_value(
							&replacement,
							index,
							origin_app,
							&reference.app,
							&reference.env,
							visited,
						)
						.await;
					replacement = nested;
				}
				resolved = resolved.replace(full, &replacement);
			}
			resolved
		}
		.boxed()
	}
}
