// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client settings: a mergeable layer and the finalized runtime form.

use std::fmt;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::project::DEFAULT_SEARCH_DEPTH;

/// Host used when nothing else is configured.
pub const DEFAULT_HOST: &str = "https://console.phase.dev";

/// Partial settings from a single source. `None` means "not set here".
#[derive(Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsLayer {
	pub host: Option<String>,
	pub verify_ssl: Option<bool>,
	pub config_search_depth: Option<usize>,
	/// Only ever populated from the environment or explicit overrides.
	#[serde(skip)]
	pub service_token: Option<String>,
}

impl SettingsLayer {
	/// Overlay `other` on top of `self`.
	pub fn merge(&mut self, other: SettingsLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.verify_ssl.is_some() {
			self.verify_ssl = other.verify_ssl;
		}
		if other.config_search_depth.is_some() {
			self.config_search_depth = other.config_search_depth;
		}
		if other.service_token.is_some() {
			self.service_token = other.service_token;
		}
	}
}

impl fmt::Debug for SettingsLayer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SettingsLayer")
			.field("host", &self.host)
			.field("verify_ssl", &self.verify_ssl)
			.field("config_search_depth", &self.config_search_depth)
			.field("service_token", &self.service_token.as_ref().map(|_| "[REDACTED]"))
			.finish()
	}
}

/// Finalized client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSettings {
	/// API host without a trailing slash.
	pub host: String,
	pub verify_ssl: bool,
	pub config_search_depth: usize,
	pub service_token: Option<String>,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST.to_string(),
			verify_ssl: true,
			config_search_depth: DEFAULT_SEARCH_DEPTH,
			service_token: None,
		}
	}
}

impl ClientSettings {
	/// Apply defaults to a merged layer and validate the result.
	pub fn from_layer(layer: SettingsLayer) -> ConfigResult<Self> {
		let defaults = Self::default();
		let host = layer
			.host
			.map(|h| h.trim().trim_end_matches('/').to_string())
			.unwrap_or(defaults.host);
		let verify_ssl = layer.verify_ssl.unwrap_or(defaults.verify_ssl);

		if host.is_empty() {
			return Err(ConfigError::invalid_value("host", "must not be empty"));
		}
		if !host.starts_with("https://") && !host.starts_with("http://") {
			return Err(ConfigError::invalid_value(
				"host",
				format!("'{host}' is not an http(s) URL"),
			));
		}
		if verify_ssl && host.starts_with("http://") {
			return Err(ConfigError::validation(
				"host must use HTTPS (disable verify_ssl for plain HTTP hosts)",
			));
		}

		Ok(Self {
			host,
			verify_ssl,
			config_search_depth: layer
				.config_search_depth
				.unwrap_or(defaults.config_search_depth),
			service_token: layer.service_token.filter(|t| !t.trim().is_empty()),
		})
	}
}

impl fmt::Debug for ClientSettings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientSettings")
			.field("host", &self.host)
			.field("verify_ssl", &self.verify_ssl)
			.field("config_search_depth", &self.config_search_depth)
			.field("service_token", &self.service_token.as_ref().map(|_| "[REDACTED]"))
			.finish()
	}
}

/// Parse a boolean flag: `false`, `no` and `0` disable, anything else enables.
pub fn parse_bool_flag(value: &str) -> bool {
	!matches!(
		value.trim().to_ascii_lowercase().as_str(),
		"false" | "no" | "0"
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn empty_layer_yields_defaults() {
		let settings = ClientSettings::from_layer(SettingsLayer::default()).unwrap();
		assert_eq!(settings, ClientSettings::default());
	}

	#[test]
	fn trailing_slash_is_trimmed() {
		let settings = ClientSettings::from_layer(SettingsLayer {
			host: Some("https://secrets.example.com/".to_string()),
			..Default::default()
		})
		.unwrap();
		assert_eq!(settings.host, "https://secrets.example.com");
	}

	#[test]
	fn plain_http_requires_disabled_verification() {
		let layer = SettingsLayer {
			host: Some("http://localhost:8000".to_string()),
			..Default::default()
		};
		assert!(ClientSettings::from_layer(layer.clone()).is_err());

		let settings = ClientSettings::from_layer(SettingsLayer {
			verify_ssl: Some(false),
			..layer
		})
		.unwrap();
		assert!(!settings.verify_ssl);
	}

	#[test]
	fn merge_overrides_only_set_fields() {
		let mut base = SettingsLayer {
			host: Some("https://a.example".to_string()),
			config_search_depth: Some(3),
			..Default::default()
		};
		base.merge(SettingsLayer {
			host: Some("https://b.example".to_string()),
			..Default::default()
		});
		assert_eq!(base.host.as_deref(), Some("https://b.example"));
		assert_eq!(base.config_search_depth, Some(3));
	}

	#[test]
	fn debug_redacts_service_token() {
		let settings = ClientSettings {
			service_token: Some("pss_service:v2:secret".to_string()),
			..Default::default()
		};
		assert!(!format!("{settings:?}").contains("pss_service"));
	}

	#[test]
	fn bool_flags() {
		for off in ["false", "No", "0", " FALSE "] {
			assert!(!parse_bool_flag(off));
		}
		for on in ["true", "1", "yes", "anything"] {
			assert!(parse_bool_flag(on));
		}
	}

	proptest! {
		#[test]
		fn merge_with_empty_layer_is_identity(host in "https://[a-z]{1,12}\\.dev", depth in 0usize..32) {
			let mut layer = SettingsLayer {
				host: Some(host),
				config_search_depth: Some(depth),
				..Default::default()
			};
			let before = layer.clone();
			layer.merge(SettingsLayer::default());
			prop_assert!(layer == before);
		}
	}
}
