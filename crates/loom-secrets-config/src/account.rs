// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authenticated accounts and the default-account registry.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};

/// An account created by a successful login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
	pub id: String,
	pub host: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub organization_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub organization_name: Option<String>,
	/// Server-held account key share, wrapped under a key carried by the token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub wrapped_key_share: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
}

impl fmt::Debug for Account {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Account")
			.field("id", &self.id)
			.field("host", &self.host)
			.field("email", &self.email)
			.field("organization_id", &self.organization_id)
			.field("organization_name", &self.organization_name)
			.field(
				"wrapped_key_share",
				&self.wrapped_key_share.as_ref().map(|_| "[REDACTED]"),
			)
			.field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
			.finish()
	}
}

/// Every known account plus the id of the default one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccountRegistry {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_account: Option<String>,
	#[serde(default)]
	pub accounts: Vec<Account>,
}

impl AccountRegistry {
	pub fn get(&self, id: &str) -> Option<&Account> {
		self.accounts.iter().find(|a| a.id == id)
	}

	/// The account currently marked as default.
	pub fn default_account(&self) -> ConfigResult<&Account> {
		let id = self
			.default_account
			.as_deref()
			.ok_or(ConfigError::NoDefaultAccount)?;
		self.get(id)
			.ok_or_else(|| ConfigError::AccountNotFound(id.to_string()))
	}

	/// Insert an account, replacing any account with the same id.
	///
	/// The first account added becomes the default.
	pub fn upsert(&mut self, account: Account) {
		if self.default_account.is_none() {
			self.default_account = Some(account.id.clone());
		}
		match self.accounts.iter_mut().find(|a| a.id == account.id) {
			Some(existing) => *existing = account,
			None => self.accounts.push(account),
		}
	}

	pub fn set_default(&mut self, id: &str) -> ConfigResult<()> {
		if self.get(id).is_none() {
			return Err(ConfigError::AccountNotFound(id.to_string()));
		}
		self.default_account = Some(id.to_string());
		Ok(())
	}

	/// Remove an account. Removing the default promotes the first remaining account.
	pub fn remove(&mut self, id: &str) -> ConfigResult<Account> {
		let index = self
			.accounts
			.iter()
			.position(|a| a.id == id)
			.ok_or_else(|| ConfigError::AccountNotFound(id.to_string()))?;
		let removed = self.accounts.remove(index);

		if self.default_account.as_deref() == Some(id) {
			self.default_account = self.accounts.first().map(|a| a.id.clone());
		}
		Ok(removed)
	}
}

/// Persistence for the account registry.
#[async_trait]
pub trait AccountStore: Send + Sync + fmt::Debug {
	/// Load the registry; a missing store yields an empty registry.
	async fn load(&self) -> ConfigResult<AccountRegistry>;

	/// Replace the stored registry.
	async fn save(&self, registry: &AccountRegistry) -> ConfigResult<()>;
}

/// JSON file store, written atomically with 0600 permissions on Unix.
#[derive(Debug, Clone)]
pub struct FileAccountStore {
	path: PathBuf,
}

impl FileAccountStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl AccountStore for FileAccountStore {
	async fn load(&self) -> ConfigResult<AccountRegistry> {
		if !self.path.exists() {
			return Ok(AccountRegistry::default());
		}

		let contents = fs::read_to_string(&self.path).await?;
		serde_json::from_str(&contents).map_err(|source| ConfigError::JsonParse {
			path: self.path.clone(),
			source,
		})
	}

	async fn save(&self, registry: &AccountRegistry) -> ConfigResult<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).await?;
		}

		let contents = serde_json::to_string_pretty(registry)?;

		let temp_path = self.path.with_extension("tmp");
		let mut file = fs::File::create(&temp_path).await?;
		file.write_all(contents.as_bytes()).await?;
		file.sync_all().await?;
		drop(file);

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let perms = std::fs::Permissions::from_mode(0o600);
			if let Err(e) = std::fs::set_permissions(&temp_path, perms) {
				warn!(path = ?temp_path, error = %e, "Failed to set file permissions to 0600");
			}
		}

		fs::rename(&temp_path, &self.path).await?;

		debug!(path = ?self.path, accounts = registry.accounts.len(), "Account registry written");
		Ok(())
	}
}

/// In-memory account store for testing.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
	registry: tokio::sync::RwLock<AccountRegistry>,
}

impl MemoryAccountStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
	async fn load(&self) -> ConfigResult<AccountRegistry> {
		Ok(self.registry.read().await.clone())
	}

	async fn save(&self, registry: &AccountRegistry) -> ConfigResult<()> {
		*self.registry.write().await = registry.clone();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn account(id: &str) -> Account {
		Account {
			id: id.to_string(),
			host: "https://console.phase.dev".to_string(),
			email: Some(format!("{id}@example.com")),
			organization_id: Some("org-1".to_string()),
			organization_name: Some("Acme".to_string()),
			wrapped_key_share: Some("deadbeef".to_string()),
			token: Some("pss_user:v1:token:pub:share0:unwrap".to_string()),
		}
	}

	#[test]
	fn first_account_becomes_default() {
		let mut registry = AccountRegistry::default();
		registry.upsert(account("alice"));
		registry.upsert(account("bob"));

		assert_eq!(registry.default_account().unwrap().id, "alice");
	}

	#[test]
	fn upsert_replaces_existing_account() {
		let mut registry = AccountRegistry::default();
		registry.upsert(account("alice"));
		let mut updated = account("alice");
		updated.organization_name = Some("Renamed".to_string());
		registry.upsert(updated);

		assert_eq!(registry.accounts.len(), 1);
		assert_eq!(
			registry.get("alice").unwrap().organization_name.as_deref(),
			Some("Renamed")
		);
	}

	#[test]
	fn set_default_requires_known_account() {
		let mut registry = AccountRegistry::default();
		registry.upsert(account("alice"));

		assert!(matches!(
			registry.set_default("mallory"),
			Err(ConfigError::AccountNotFound(_))
		));
	}

	#[test]
	fn removing_default_promotes_next_account() {
		let mut registry = AccountRegistry::default();
		registry.upsert(account("alice"));
		registry.upsert(account("bob"));

		registry.remove("alice").unwrap();
		assert_eq!(registry.default_account().unwrap().id, "bob");

		registry.remove("bob").unwrap();
		assert!(matches!(
			registry.default_account(),
			Err(ConfigError::NoDefaultAccount)
		));
	}

	#[test]
	fn debug_redacts_credentials() {
		let debug = format!("{:?}", account("alice"));
		assert!(!debug.contains("pss_user"));
		assert!(!debug.contains("deadbeef"));
		assert!(debug.contains("[REDACTED]"));
	}

	#[tokio::test]
	async fn test_file_store_roundtrip() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("nested").join("accounts.json");
		let store = FileAccountStore::new(&path);

		assert_eq!(store.load().await.unwrap(), AccountRegistry::default());

		let mut registry = AccountRegistry::default();
		registry.upsert(account("alice"));
		store.save(&registry).await.unwrap();

		assert!(path.exists());
		let raw = std::fs::read_to_string(&path).unwrap();
		assert!(raw.contains("\"default-account\""));
		assert_eq!(store.load().await.unwrap(), registry);
	}

	#[tokio::test]
	async fn test_memory_store_roundtrip() {
		let store = MemoryAccountStore::new();
		let mut registry = AccountRegistry::default();
		registry.upsert(account("alice"));

		store.save(&registry).await.unwrap();
		assert_eq!(store.load().await.unwrap(), registry);
	}
}
