// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types exchanged with the secrets backend.
//!
//! Every secret field named `key`, `value`, `comment` or `key_name` holds a
//! sealed ciphertext; plaintext never crosses this boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account metadata returned for the authenticated credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
	pub account_id: String,
	#[serde(default)]
	pub organisation: Option<Organisation>,
	#[serde(default)]
	pub apps: Vec<Application>,
	/// Server-held share of the account key, wrapped (hex).
	pub wrapped_key_share: String,
	#[serde(default)]
	pub offline_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
	pub id: String,
	pub name: String,
}

/// An application and the environments the account can open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub environment_keys: Vec<EnvironmentKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
	pub id: String,
	pub name: String,
	/// `dev`, `staging`, `prod` or `custom`.
	#[serde(default)]
	pub env_type: String,
}

/// Per-environment key material, sealed to the account key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentKey {
	pub id: String,
	pub environment: Environment,
	/// Environment public key (hex) that secrets are sealed to.
	pub identity_key: String,
	pub wrapped_seed: String,
	pub wrapped_salt: String,
}

/// A stored secret as fetched, before decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawSecretRecord {
	Static(StaticSecretRecord),
	Dynamic(DynamicSecretRecord),
}

impl RawSecretRecord {
	pub fn id(&self) -> &str {
		match self {
			RawSecretRecord::Static(r) => &r.id,
			RawSecretRecord::Dynamic(r) => &r.id,
		}
	}

	pub fn path(&self) -> &str {
		match self {
			RawSecretRecord::Static(r) => &r.path,
			RawSecretRecord::Dynamic(r) => &r.path,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticSecretRecord {
	pub id: String,
	pub key: String,
	pub value: String,
	#[serde(default)]
	pub key_digest: String,
	#[serde(default)]
	pub comment: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub path: String,
	/// The caller's personal override, if one exists.
	#[serde(default, rename = "override")]
	pub personal_override: Option<SecretOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretOverride {
	pub value: String,
	pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSecretRecord {
	pub id: String,
	/// Sealed display name.
	pub key: String,
	pub provider: String,
	#[serde(default)]
	pub path: String,
	#[serde(default)]
	pub key_map: Vec<KeyMapEntry>,
	#[serde(default)]
	pub lease: Option<Lease>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMapEntry {
	#[serde(default)]
	pub id: Option<String>,
	/// Sealed name of the generated credential.
	pub key_name: String,
}

/// A time-bounded grant of generated credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
	pub id: String,
	#[serde(default)]
	pub ttl: Option<u64>,
	#[serde(default)]
	pub expires_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub credentials: Vec<LeaseCredential>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseCredential {
	pub key: String,
	#[serde(default)]
	pub value: String,
}

/// Parameters of a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSecretsRequest {
	pub environment_id: String,
	pub path: Option<String>,
	pub dynamic: bool,
	pub lease: bool,
	pub lease_ttl: Option<u64>,
}

/// Body of one secret in a create or update batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretPayload {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub key: String,
	pub key_digest: String,
	pub value: String,
	pub path: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub comment: String,
	#[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
	pub personal_override: Option<OverridePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverridePayload {
	pub value: String,
	pub is_active: bool,
}
