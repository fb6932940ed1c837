// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decrypted secrets cached for one command or session.

use std::collections::{HashMap, HashSet};
use std::fmt;

use zeroize::Zeroize;

use crate::types::{normalize_path, ResolvedSecret};

/// Identifies one fetched bucket: an application, environment and path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	pub app: String,
	pub env: String,
	pub path: String,
}

impl CacheKey {
	pub fn new(app: impl Into<String>, env: impl Into<String>, path: &str) -> Self {
		Self {
			app: app.into(),
			env: env.into(),
			path: normalize_path(path),
		}
	}
}

/// Key name to plaintext value, per [`CacheKey`].
///
/// Owned by the caller and passed to each resolution; values are zeroized
/// when the cache is cleared or dropped.
///
/// A bucket is complete only when it was stored whole by
/// [`insert_bucket`](Self::insert_bucket). Primed buckets may hold a
/// filtered subset and never count as complete.
#[derive(Default)]
pub struct ResolutionCache {
	buckets: HashMap<CacheKey, HashMap<String, String>>,
	complete: HashSet<CacheKey>,
}

impl ResolutionCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether the whole bucket for `key` has been fetched.
	pub fn contains(&self, key: &CacheKey) -> bool {
		self.complete.contains(key)
	}

	pub fn get(&self, key: &CacheKey, name: &str) -> Option<&str> {
		self.buckets.get(key)?.get(name).map(String::as_str)
	}

	/// Store a complete bucket, replacing any previous contents.
	pub fn insert_bucket(&mut self, key: CacheKey, values: HashMap<String, String>) {
		self.complete.insert(key.clone());
		if let Some(mut old) = self.buckets.insert(key, values) {
			zeroize_bucket(&mut old);
		}
	}

	/// Merge already-decrypted secrets into their buckets.
	///
	/// Secrets without an application are filed under `fallback_app`.
	/// Primed buckets stay incomplete until fetched.
	pub fn prime(&mut self, secrets: &[ResolvedSecret], fallback_app: &str) {
		for secret in secrets {
			let app: &str = if secret.application.is_empty() {
				fallback_app
			} else {
				&secret.application
			};
			if app.is_empty() || secret.environment.is_empty() || secret.key.is_empty() {
				continue;
			}
			self.buckets
				.entry(CacheKey::new(app, secret.environment.as_str(), &secret.path))
				.or_default()
				.insert(secret.key.clone(), secret.value.clone());
		}
	}

	/// Number of cached buckets.
	pub fn len(&self) -> usize {
		self.buckets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buckets.is_empty()
	}

	pub fn clear(&mut self) {
		for bucket in self.buckets.values_mut() {
			zeroize_bucket(bucket);
		}
		self.buckets.clear();
		self.complete.clear();
	}
}

fn zeroize_bucket(bucket: &mut HashMap<String, String>) {
	for value in bucket.values_mut() {
		value.zeroize();
	}
}

impl Drop for ResolutionCache {
	fn drop(&mut self) {
		self.clear();
	}
}

impl fmt::Debug for ResolutionCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolutionCache")
			.field("buckets", &self.buckets.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn secret(app: &str, env: &str, path: &str, key: &str, value: &str) -> ResolvedSecret {
		ResolvedSecret {
			key: key.to_string(),
			value: value.to_string(),
			path: path.to_string(),
			application: app.to_string(),
			environment: env.to_string(),
			tags: vec![],
			comment: String::new(),
			overridden: false,
			is_dynamic: false,
			dynamic_group: None,
		}
	}

	#[test]
	fn keys_with_separator_characters_do_not_collide() {
		let mut cache = ResolutionCache::new();
		cache.insert_bucket(
			CacheKey::new("a|b", "c", "/"),
			HashMap::from([("K".to_string(), "1".to_string())]),
		);
		cache.insert_bucket(
			CacheKey::new("a", "b|c", "/"),
			HashMap::from([("K".to_string(), "2".to_string())]),
		);

		assert_eq!(cache.len(), 2);
		assert_eq!(cache.get(&CacheKey::new("a|b", "c", "/"), "K"), Some("1"));
		assert_eq!(cache.get(&CacheKey::new("a", "b|c", "/"), "K"), Some("2"));
	}

	#[test]
	fn prime_groups_by_bucket_and_uses_fallback_app() {
		let mut cache = ResolutionCache::new();
		cache.prime(
			&[
				secret("app", "Development", "/", "A", "1"),
				secret("", "Development", "", "B", "2"),
				secret("app", "Development", "/db", "C", "3"),
				secret("app", "", "/", "D", "4"),
			],
			"app",
		);

		let root = CacheKey::new("app", "Development", "");
		assert_eq!(cache.get(&root, "A"), Some("1"));
		assert_eq!(cache.get(&root, "B"), Some("2"));
		assert_eq!(cache.get(&CacheKey::new("app", "Development", "db"), "C"), Some("3"));
		assert_eq!(cache.len(), 2);
	}

	#[test]
	fn primed_buckets_are_not_complete() {
		let mut cache = ResolutionCache::new();
		let key = CacheKey::new("app", "Development", "/");
		cache.prime(&[secret("app", "Development", "/", "A", "1")], "app");
		assert!(!cache.contains(&key));
		assert_eq!(cache.get(&key, "A"), Some("1"));

		cache.insert_bucket(
			key.clone(),
			HashMap::from([
				("A".to_string(), "1".to_string()),
				("B".to_string(), "2".to_string()),
			]),
		);
		assert!(cache.contains(&key));
		assert_eq!(cache.get(&key, "B"), Some("2"));

		cache.clear();
		assert!(!cache.contains(&key));
	}

	#[test]
	fn insert_replaces_whole_bucket() {
		let mut cache = ResolutionCache::new();
		let key = CacheKey::new("app", "dev", "/");
		cache.insert_bucket(key.clone(), HashMap::from([("A".to_string(), "1".to_string())]));
		cache.insert_bucket(key.clone(), HashMap::from([("B".to_string(), "2".to_string())]));

		assert_eq!(cache.get(&key, "A"), None);
		assert_eq!(cache.get(&key, "B"), Some("2"));
	}

	#[test]
	fn debug_lists_buckets_only() {
		let mut cache = ResolutionCache::new();
		cache.prime(&[secret("app", "dev", "/", "A", "topsecret")], "app");
		let debug = format!("{cache:?}");
		assert!(debug.contains("dev"));
		assert!(!debug.contains("topsecret"));
		cache.clear();
		assert!(cache.is_empty());
	}
}
