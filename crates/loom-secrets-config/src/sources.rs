// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Settings sources: defaults, user file, environment, explicit overrides.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::{ConfigError, ConfigResult};
use crate::paths::SecretsPaths;
use crate::settings::{parse_bool_flag, SettingsLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	UserFile = 30,
	Environment = 50,
	Explicit = 60,
}

/// Trait for settings sources.
pub trait SettingsSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	/// Precedence level
	fn precedence(&self) -> Precedence;

	/// Load a settings layer from this source
	fn load(&self) -> ConfigResult<SettingsLayer>;
}

/// Built-in defaults source. Defaults are applied during finalization.
pub struct DefaultsSource;

impl SettingsSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> ConfigResult<SettingsLayer> {
		Ok(SettingsLayer::default())
	}
}

/// TOML settings file. A missing file is an empty layer.
pub struct FileSource {
	path: PathBuf,
}

impl FileSource {
	/// User settings: ~/.config/loom/secrets/config.toml
	pub fn user(paths: &SecretsPaths) -> Self {
		Self {
			path: paths.settings_file.clone(),
		}
	}

	pub fn at(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl SettingsSource for FileSource {
	fn name(&self) -> &'static str {
		"user-config"
	}
	fn precedence(&self) -> Precedence {
		Precedence::UserFile
	}

	fn load(&self) -> ConfigResult<SettingsLayer> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "settings file not found, skipping");
			return Ok(SettingsLayer::default());
		}

		debug!(path = %self.path.display(), "loading settings file");
		let content = std::fs::read_to_string(&self.path)?;
		toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})
	}
}

/// Environment variables prefixed `LOOM_SECRETS_`.
pub struct EnvSource {
	vars: Vec<(String, String)>,
}

impl EnvSource {
	/// Snapshot the process environment.
	pub fn from_process() -> Self {
		Self::from_vars(std::env::vars())
	}

	pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
		Self {
			vars: vars
				.into_iter()
				.filter(|(k, _)| k.starts_with("LOOM_SECRETS_"))
				.collect(),
		}
	}
}

impl SettingsSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> ConfigResult<SettingsLayer> {
		let mut layer = SettingsLayer::default();

		for (key, value) in &self.vars {
			let value = value.trim();
			if value.is_empty() {
				continue;
			}

			trace!(key = %key, "processing env var");

			match key.as_str() {
				"LOOM_SECRETS_HOST" => layer.host = Some(value.to_string()),
				"LOOM_SECRETS_VERIFY_SSL" => layer.verify_ssl = Some(parse_bool_flag(value)),
				"LOOM_SECRETS_CONFIG_SEARCH_DEPTH" => {
					let depth = value.parse::<usize>().map_err(|e| {
						ConfigError::invalid_value("LOOM_SECRETS_CONFIG_SEARCH_DEPTH", e.to_string())
					})?;
					layer.config_search_depth = Some(depth);
				}
				"LOOM_SECRETS_SERVICE_TOKEN" => {
					trace!("loaded service token from environment");
					layer.service_token = Some(value.to_string());
				}
				_ => {}
			}
		}

		Ok(layer)
	}
}

/// Values passed explicitly by the embedding program (e.g. command-line flags).
pub struct ExplicitSource {
	layer: SettingsLayer,
}

impl ExplicitSource {
	pub fn new(layer: SettingsLayer) -> Self {
		Self { layer }
	}
}

impl SettingsSource for ExplicitSource {
	fn name(&self) -> &'static str {
		"explicit"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Explicit
	}

	fn load(&self) -> ConfigResult<SettingsLayer> {
		Ok(self.layer.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vars(pairs: &[(&str, &str)]) -> EnvSource {
		EnvSource::from_vars(
			pairs
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string())),
		)
	}

	#[test]
	fn env_source_reads_known_keys() {
		let layer = vars(&[
			("LOOM_SECRETS_HOST", "https://self-hosted.example"),
			("LOOM_SECRETS_VERIFY_SSL", "no"),
			("LOOM_SECRETS_CONFIG_SEARCH_DEPTH", "3"),
			("LOOM_SECRETS_SERVICE_TOKEN", "pss_service:v2:a:b:c:d"),
			("UNRELATED", "ignored"),
		])
		.load()
		.unwrap();

		assert_eq!(layer.host.as_deref(), Some("https://self-hosted.example"));
		assert_eq!(layer.verify_ssl, Some(false));
		assert_eq!(layer.config_search_depth, Some(3));
		assert!(layer.service_token.is_some());
	}

	#[test]
	fn env_source_rejects_bad_depth() {
		let result = vars(&[("LOOM_SECRETS_CONFIG_SEARCH_DEPTH", "deep")]).load();
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}

	#[test]
	fn file_source_missing_file_is_empty() {
		let layer = FileSource::at("/nonexistent/loom/config.toml").load().unwrap();
		assert_eq!(layer, SettingsLayer::default());
	}

	#[test]
	fn file_source_parses_toml() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "host = \"https://vault.example\"\nverify_ssl = true\n").unwrap();

		let layer = FileSource::at(&path).load().unwrap();
		assert_eq!(layer.host.as_deref(), Some("https://vault.example"));
		assert_eq!(layer.verify_ssl, Some(true));
	}

	#[test]
	fn file_source_reports_parse_errors_with_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "host = [").unwrap();

		match FileSource::at(&path).load() {
			Err(ConfigError::TomlParse { path: p, .. }) => assert_eq!(p, path),
			other => panic!("expected TomlParse error, got {other:?}"),
		}
	}
}
