// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Settings registry - manages sources and merges layers.

use tracing::{debug, info};

use crate::error::ConfigResult;
use crate::paths::SecretsPaths;
use crate::settings::{ClientSettings, SettingsLayer};
use crate::sources::{DefaultsSource, EnvSource, FileSource, SettingsSource};

/// Registry that manages settings sources and merges them.
pub struct SettingsRegistry {
	sources: Vec<Box<dyn SettingsSource>>,
}

impl SettingsRegistry {
	/// Create a new empty registry.
	pub fn new() -> Self {
		Self {
			sources: Vec::new(),
		}
	}

	/// Registry with defaults, the user settings file and the process environment.
	pub fn standard(paths: &SecretsPaths) -> Self {
		let mut registry = Self::new();
		registry.register(Box::new(DefaultsSource));
		registry.register(Box::new(FileSource::user(paths)));
		registry.register(Box::new(EnvSource::from_process()));
		registry
	}

	/// Register a settings source.
	pub fn register(&mut self, source: Box<dyn SettingsSource>) {
		debug!(source = source.name(), precedence = ?source.precedence(), "registering settings source");
		self.sources.push(source);
	}

	/// Load settings from all sources, merge, and validate.
	///
	/// Sources are sorted by precedence (lowest first) so higher precedence
	/// sources override lower ones. A source that fails to load aborts the
	/// merge; a missing file is not a failure.
	pub fn load(&self) -> ConfigResult<ClientSettings> {
		let mut sorted_sources: Vec<_> = self.sources.iter().collect();
		sorted_sources.sort_by_key(|s| s.precedence());

		let mut merged = SettingsLayer::default();
		for source in &sorted_sources {
			debug!(source = source.name(), "merging settings layer");
			merged.merge(source.load()?);
		}

		let settings = ClientSettings::from_layer(merged)?;

		info!(
			host = %settings.host,
			verify_ssl = settings.verify_ssl,
			config_search_depth = settings.config_search_depth,
			"settings loaded"
		);

		Ok(settings)
	}

	/// Get the number of registered sources.
	pub fn source_count(&self) -> usize {
		self.sources.len()
	}
}

impl Default for SettingsRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sources::{ExplicitSource, Precedence};

	#[test]
	fn test_registry_registers_sources() {
		let mut registry = SettingsRegistry::new();
		assert_eq!(registry.source_count(), 0);

		registry.register(Box::new(DefaultsSource));
		assert_eq!(registry.source_count(), 1);
	}

	/// Higher precedence wins regardless of registration order.
	#[test]
	fn test_precedence_merge_order() {
		let mut registry = SettingsRegistry::new();
		registry.register(Box::new(ExplicitSource::new(SettingsLayer {
			host: Some("https://explicit.example".to_string()),
			..Default::default()
		})));
		registry.register(Box::new(EnvSource::from_vars([
			("LOOM_SECRETS_HOST".to_string(), "https://env.example".to_string()),
			("LOOM_SECRETS_CONFIG_SEARCH_DEPTH".to_string(), "2".to_string()),
		])));
		registry.register(Box::new(DefaultsSource));

		let settings = registry.load().unwrap();
		assert_eq!(settings.host, "https://explicit.example");
		assert_eq!(settings.config_search_depth, 2);
	}

	#[test]
	fn test_user_file_between_defaults_and_env() {
		let dir = tempfile::tempdir().unwrap();
		let paths = SecretsPaths::under(dir.path());
		std::fs::write(
			&paths.settings_file,
			"host = \"https://file.example\"\nconfig_search_depth = 4\n",
		)
		.unwrap();

		let mut registry = SettingsRegistry::new();
		registry.register(Box::new(DefaultsSource));
		registry.register(Box::new(FileSource::user(&paths)));
		registry.register(Box::new(EnvSource::from_vars([(
			"LOOM_SECRETS_CONFIG_SEARCH_DEPTH".to_string(),
			"6".to_string(),
		)])));

		let settings = registry.load().unwrap();
		assert_eq!(settings.host, "https://file.example");
		assert_eq!(settings.config_search_depth, 6);
		assert!(Precedence::UserFile < Precedence::Environment);
	}
}
