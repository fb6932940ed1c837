// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Expansion of dynamic secret records into key/value pairs.

use std::collections::HashMap;

use loom_secrets_client::{DynamicSecretRecord, Lease};
use loom_secrets_crypto::CryptoProvider;
use tracing::warn;

use crate::envelope::EnvironmentKeys;
use crate::types::{normalize_path, ResolvedSecret};

/// Materializes dynamic records for one environment.
pub struct DynamicMaterializer<'a, C: CryptoProvider + ?Sized> {
	crypto: &'a C,
	keys: &'a EnvironmentKeys,
	application: &'a str,
	environment: &'a str,
}

impl<'a, C: CryptoProvider + ?Sized> DynamicMaterializer<'a, C> {
	pub fn new(
		crypto: &'a C,
		keys: &'a EnvironmentKeys,
		application: &'a str,
		environment: &'a str,
	) -> Self {
		Self {
			crypto,
			keys,
			application,
			environment,
		}
	}

	/// `"<name> (<provider>)"`; an undecryptable name is shown as stored.
	fn group_label(&self, record: &DynamicSecretRecord) -> String {
		let name = if record.key.is_empty() {
			String::new()
		} else {
			self.keys
				.open(self.crypto, &record.key)
				.unwrap_or_else(|_| record.key.clone())
		};
		format!("{name} ({})", record.provider)
	}

	/// Decrypt the lease's credentials. Entries whose key cannot be opened are dropped.
	fn credentials(&self, lease: &Lease) -> HashMap<String, String> {
		let mut credentials = HashMap::new();
		for credential in &lease.credentials {
			if credential.key.is_empty() {
				continue;
			}
			let Ok(key) = self.keys.open(self.crypto, &credential.key) else {
				warn!(lease_id = %lease.id, "skipping undecryptable lease credential");
				continue;
			};
			let value = if credential.value.is_empty() {
				String::new()
			} else {
				self.keys
					.open(self.crypto, &credential.value)
					.unwrap_or_default()
			};
			credentials.insert(key, value);
		}
		credentials
	}

	/// One secret per key-map entry, valued from the lease when it supplies one.
	///
	/// Without a lease every value is empty. `keys` filters by exact name.
	pub fn materialize(
		&self,
		record: &DynamicSecretRecord,
		keys: &[String],
	) -> Vec<ResolvedSecret> {
		let group = self.group_label(record);
		let path = normalize_path(&record.path);
		let credentials = record
			.lease
			.as_ref()
			.map(|lease| self.credentials(lease))
			.unwrap_or_default();

		record
			.key_map
			.iter()
			.filter(|entry| !entry.key_name.is_empty())
			.filter_map(|entry| match self.keys.open(self.crypto, &entry.key_name) {
				Ok(name) => Some(name),
				Err(e) => {
					warn!(secret_id = %record.id, error = %e, "skipping undecryptable key map entry");
					None
				}
			})
			.filter(|name| keys.is_empty() || keys.contains(name))
			.map(|name| ResolvedSecret {
				value: credentials.get(&name).cloned().unwrap_or_default(),
				key: name,
				path: path.clone(),
				application: self.application.to_string(),
				environment: self.environment.to_string(),
				tags: Vec::new(),
				comment: String::new(),
				overridden: false,
				is_dynamic: true,
				dynamic_group: Some(group.clone()),
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_secrets_client::{KeyMapEntry, LeaseCredential};
	use loom_secrets_crypto::{KeyPair, SoftwareCryptoProvider};
	use zeroize::Zeroizing;

	fn keys() -> EnvironmentKeys {
		let pair = KeyPair::generate();
		EnvironmentKeys {
			public: pair.public,
			private: pair.private,
			salt: Zeroizing::new("00".repeat(32)),
		}
	}

	fn record(keys: &EnvironmentKeys, lease: Option<Lease>) -> DynamicSecretRecord {
		let crypto = SoftwareCryptoProvider::new();
		DynamicSecretRecord {
			id: "dyn-1".to_string(),
			key: keys.seal(&crypto, "ci-user").unwrap(),
			provider: "aws".to_string(),
			path: String::new(),
			key_map: ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"]
				.iter()
				.map(|k| KeyMapEntry {
					id: None,
					key_name: keys.seal(&crypto, k).unwrap(),
				})
				.collect(),
			lease,
		}
	}

	#[test]
	fn without_lease_every_entry_is_empty() {
		let crypto = SoftwareCryptoProvider::new();
		let keys = keys();
		let secrets = DynamicMaterializer::new(&crypto, &keys, "app", "Development")
			.materialize(&record(&keys, None), &[]);

		assert_eq!(secrets.len(), 2);
		for secret in &secrets {
			assert!(secret.is_dynamic);
			assert_eq!(secret.value, "");
			assert_eq!(secret.path, "/");
			assert_eq!(secret.dynamic_group.as_deref(), Some("ci-user (aws)"));
		}
	}

	#[test]
	fn lease_supplies_values_and_missing_credentials_stay_empty() {
		let crypto = SoftwareCryptoProvider::new();
		let keys = keys();
		let lease = Lease {
			id: "lease-1".to_string(),
			ttl: Some(3600),
			expires_at: None,
			credentials: vec![
				LeaseCredential {
					key: keys.seal(&crypto, "AWS_ACCESS_KEY_ID").unwrap(),
					value: keys.seal(&crypto, "AKIA123").unwrap(),
				},
				LeaseCredential {
					key: "garbage".to_string(),
					value: keys.seal(&crypto, "ignored").unwrap(),
				},
			],
		};

		let secrets = DynamicMaterializer::new(&crypto, &keys, "app", "Development")
			.materialize(&record(&keys, Some(lease)), &[]);
		assert_eq!(secrets[0].key, "AWS_ACCESS_KEY_ID");
		assert_eq!(secrets[0].value, "AKIA123");
		assert_eq!(secrets[1].key, "AWS_SECRET_ACCESS_KEY");
		assert_eq!(secrets[1].value, "");
	}

	#[test]
	fn key_filter_and_undecryptable_names() {
		let crypto = SoftwareCryptoProvider::new();
		let keys = keys();
		let mut record = record(&keys, None);
		record.key = "not-a-ciphertext".to_string();
		record.key_map.push(KeyMapEntry {
			id: None,
			key_name: "broken".to_string(),
		});

		let materializer = DynamicMaterializer::new(&crypto, &keys, "app", "Development");
		let all = materializer.materialize(&record, &[]);
		assert_eq!(all.len(), 2);
		assert_eq!(all[0].dynamic_group.as_deref(), Some("not-a-ciphertext (aws)"));

		let filtered = materializer.materialize(&record, &["AWS_SECRET_ACCESS_KEY".to_string()]);
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].key, "AWS_SECRET_ACCESS_KEY");
	}
}
