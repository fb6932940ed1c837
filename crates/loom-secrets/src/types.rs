// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and result types of the engine's public operations.

use std::fmt;

use loom_secrets_crypto::RandomKind;
use serde::Serialize;

/// Path used when a secret or request does not name one.
pub const ROOT_PATH: &str = "/";

/// Environment assumed when neither the caller nor the project config names one.
pub const DEFAULT_ENVIRONMENT: &str = "Development";

/// Ensure a path starts with `/`; empty paths become the root.
pub fn normalize_path(path: &str) -> String {
	if path.is_empty() {
		ROOT_PATH.to_string()
	} else if path.starts_with('/') {
		path.to_string()
	} else {
		format!("/{path}")
	}
}

/// A decrypted secret.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSecret {
	pub key: String,
	pub value: String,
	pub path: String,
	pub application: String,
	pub environment: String,
	pub tags: Vec<String>,
	pub comment: String,
	/// The caller's personal override supplied `value`.
	pub overridden: bool,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub is_dynamic: bool,
	/// `"<name> (<provider>)"` for dynamic secrets.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dynamic_group: Option<String>,
}

impl fmt::Debug for ResolvedSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedSecret")
			.field("key", &self.key)
			.field("value", &"[REDACTED]")
			.field("path", &self.path)
			.field("application", &self.application)
			.field("environment", &self.environment)
			.field("tags", &self.tags)
			.field("overridden", &self.overridden)
			.field("is_dynamic", &self.is_dynamic)
			.field("dynamic_group", &self.dynamic_group)
			.finish()
	}
}

/// Which application and environment an operation targets.
///
/// Empty selectors fall back to the project config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSelector {
	pub app_name: Option<String>,
	pub app_id: Option<String>,
	pub env_name: Option<String>,
}

impl AppSelector {
	pub fn by_name(app_name: impl Into<String>, env_name: impl Into<String>) -> Self {
		Self {
			app_name: Some(app_name.into()),
			app_id: None,
			env_name: Some(env_name.into()),
		}
	}

	pub fn by_id(app_id: impl Into<String>, env_name: impl Into<String>) -> Self {
		Self {
			app_name: None,
			app_id: Some(app_id.into()),
			env_name: Some(env_name.into()),
		}
	}

	pub fn has_application(&self) -> bool {
		self.app_name.is_some() || self.app_id.is_some()
	}
}

#[derive(Debug, Clone, Default)]
pub struct GetRequest {
	pub selector: AppSelector,
	/// Only return these keys (exact match). Empty returns every key.
	pub keys: Vec<String>,
	pub tag: Option<String>,
	/// Restrict the fetch to one path. `None` returns every path.
	pub path: Option<String>,
	pub dynamic: bool,
	pub lease: bool,
	pub lease_ttl: Option<u64>,
}

impl GetRequest {
	pub fn new(selector: AppSelector) -> Self {
		Self {
			selector,
			..Default::default()
		}
	}
}

/// Source of a new secret's value.
#[derive(Clone, PartialEq, Eq)]
pub enum NewValue {
	Literal(String),
	Random { kind: RandomKind, length: usize },
}

impl fmt::Debug for NewValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NewValue::Literal(_) => f.write_str("Literal([REDACTED])"),
			NewValue::Random { kind, length } => f
				.debug_struct("Random")
				.field("kind", kind)
				.field("length", length)
				.finish(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSecret {
	pub key: String,
	pub value: NewValue,
}

impl NewSecret {
	pub fn literal(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: NewValue::Literal(value.into()),
		}
	}

	pub fn random(key: impl Into<String>, kind: RandomKind, length: usize) -> Self {
		Self {
			key: key.into(),
			value: NewValue::Random { kind, length },
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
	pub selector: AppSelector,
	pub secrets: Vec<NewSecret>,
	pub path: Option<String>,
	/// Attach an active personal override with this value to every secret.
	pub override_value: Option<String>,
}

#[derive(Clone)]
pub struct UpdateRequest {
	pub selector: AppSelector,
	pub key: String,
	pub value: String,
	pub source_path: String,
	/// Move the secret to this path.
	pub destination_path: Option<String>,
	/// Write `value` to the personal override instead of the shared value.
	pub set_override: bool,
	/// Flip the existing override's active flag.
	pub toggle_override: bool,
}

impl UpdateRequest {
	pub fn new(selector: AppSelector, key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			selector,
			key: key.into(),
			value: value.into(),
			source_path: ROOT_PATH.to_string(),
			destination_path: None,
			set_override: false,
			toggle_override: false,
		}
	}
}

impl fmt::Debug for UpdateRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UpdateRequest")
			.field("selector", &self.selector)
			.field("key", &self.key)
			.field("value", &"[REDACTED]")
			.field("source_path", &self.source_path)
			.field("destination_path", &self.destination_path)
			.field("set_override", &self.set_override)
			.field("toggle_override", &self.toggle_override)
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
	Updated,
	/// No secret with this key exists at the source path.
	NotFound { key: String, path: String },
}

impl fmt::Display for UpdateOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			UpdateOutcome::Updated => f.write_str("Success"),
			UpdateOutcome::NotFound { key, path } => {
				write!(f, "Key '{key}' doesn't exist in path '{path}'.")
			}
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
	pub selector: AppSelector,
	pub keys: Vec<String>,
	pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
	pub deleted: usize,
	/// Requested keys with no matching secret, in request order.
	pub keys_not_found: Vec<String>,
}
