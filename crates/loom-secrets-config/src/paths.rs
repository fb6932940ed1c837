// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG-compliant locations of the client's own files.

use std::path::PathBuf;

use crate::ConfigError;

/// Resolved paths for the secrets client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretsPaths {
	/// Directory holding all client files: ~/.config/loom/secrets/
	pub config_dir: PathBuf,
	/// Client settings: ~/.config/loom/secrets/config.toml
	pub settings_file: PathBuf,
	/// Account registry: ~/.config/loom/secrets/accounts.json
	pub accounts_file: PathBuf,
}

impl SecretsPaths {
	/// Lay out the client's files under an explicit directory.
	pub fn under(config_dir: impl Into<PathBuf>) -> Self {
		let config_dir = config_dir.into();
		Self {
			settings_file: config_dir.join("config.toml"),
			accounts_file: config_dir.join("accounts.json"),
			config_dir,
		}
	}
}

/// Resolve paths from `XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn resolve_paths() -> Result<SecretsPaths, ConfigError> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
		Some(dir) if !dir.is_empty() => PathBuf::from(dir),
		_ => dirs::home_dir()
			.ok_or(ConfigError::HomeDirNotFound)?
			.join(".config"),
	};

	let paths = SecretsPaths::under(config_home.join("loom").join("secrets"));
	tracing::debug!(config_dir = %paths.config_dir.display(), "resolved secrets client paths");
	Ok(paths)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn files_live_under_config_dir() {
		let paths = SecretsPaths::under("/tmp/loom-secrets");
		assert_eq!(paths.settings_file, PathBuf::from("/tmp/loom-secrets/config.toml"));
		assert_eq!(paths.accounts_file, PathBuf::from("/tmp/loom-secrets/accounts.json"));
	}
}
