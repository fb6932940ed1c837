// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project-local link between a working directory and an application.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};

/// File name looked up in the working directory and its ancestors.
pub const PROJECT_CONFIG_FILE: &str = ".loom-secrets.json";

/// Default number of ancestor directories searched.
pub const DEFAULT_SEARCH_DEPTH: usize = 8;

/// Contents of a project config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
	pub version: String,
	pub app_name: String,
	pub app_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_env: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub env_id: Option<String>,
	/// Whether subdirectories may inherit this config.
	#[serde(default)]
	pub monorepo_support: bool,
}

/// Discovery and persistence of project configs.
pub trait ProjectConfigStore: Send + Sync {
	/// Find the config that applies to `start_dir`.
	///
	/// The start directory's config is always honored. Configs in up to
	/// `max_depth` ancestors are honored only when they declare monorepo
	/// support; other ancestor configs are skipped and the search continues.
	fn find(&self, start_dir: &Path, max_depth: usize) -> Option<ProjectConfig>;

	/// Write `config` into `dir`, returning the written path.
	fn write(&self, dir: &Path, config: &ProjectConfig) -> ConfigResult<PathBuf>;
}

/// Filesystem-backed project config store.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileProjectConfigStore;

impl FileProjectConfigStore {
	pub fn new() -> Self {
		Self
	}

	fn read(path: &Path) -> ConfigResult<ProjectConfig> {
		let contents = std::fs::read_to_string(path)?;
		serde_json::from_str(&contents).map_err(|source| ConfigError::JsonParse {
			path: path.to_path_buf(),
			source,
		})
	}
}

impl ProjectConfigStore for FileProjectConfigStore {
	fn find(&self, start_dir: &Path, max_depth: usize) -> Option<ProjectConfig> {
		let mut current = Some(start_dir);

		for depth in 0..=max_depth {
			let dir = current?;
			let candidate = dir.join(PROJECT_CONFIG_FILE);

			if candidate.is_file() {
				match Self::read(&candidate) {
					Ok(config) if depth == 0 || config.monorepo_support => {
						debug!(path = %candidate.display(), depth, "using project config");
						return Some(config);
					}
					Ok(_) => {
						debug!(
							path = %candidate.display(),
							depth,
							"ancestor project config lacks monorepo support, skipping"
						);
					}
					Err(e) => {
						debug!(path = %candidate.display(), error = %e, "unreadable project config, skipping");
					}
				}
			}

			current = dir.parent();
		}

		None
	}

	fn write(&self, dir: &Path, config: &ProjectConfig) -> ConfigResult<PathBuf> {
		let path = dir.join(PROJECT_CONFIG_FILE);
		let contents = serde_json::to_string_pretty(config)?;

		let temp_path = path.with_extension("tmp");
		let mut file = std::fs::File::create(&temp_path)?;
		file.write_all(contents.as_bytes())?;
		file.sync_all()?;
		drop(file);

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let perms = std::fs::Permissions::from_mode(0o600);
			if let Err(e) = std::fs::set_permissions(&temp_path, perms) {
				warn!(path = ?temp_path, error = %e, "Failed to set file permissions to 0600");
			}
		}

		std::fs::rename(&temp_path, &path)?;
		debug!(path = %path.display(), "project config written");
		Ok(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn config(monorepo_support: bool) -> ProjectConfig {
		ProjectConfig {
			version: "2".to_string(),
			app_name: "TestApp".to_string(),
			app_id: "00000000-0000-0000-0000-000000000000".to_string(),
			default_env: Some("Development".to_string()),
			env_id: Some("00000000-0000-0000-0000-000000000001".to_string()),
			monorepo_support,
		}
	}

	fn nested(base: &Path) -> (PathBuf, PathBuf) {
		let parent = base.join("parent");
		let grandchild = parent.join("child").join("grandchild");
		std::fs::create_dir_all(&grandchild).unwrap();
		(parent, grandchild)
	}

	#[test]
	fn finds_config_in_start_dir_without_monorepo_flag() {
		let dir = TempDir::new().unwrap();
		let store = FileProjectConfigStore::new();
		store.write(dir.path(), &config(false)).unwrap();

		let found = store.find(dir.path(), DEFAULT_SEARCH_DEPTH).unwrap();
		assert_eq!(found.app_name, "TestApp");
	}

	#[test]
	fn honors_ancestor_with_monorepo_support() {
		let dir = TempDir::new().unwrap();
		let (parent, grandchild) = nested(dir.path());
		let store = FileProjectConfigStore::new();
		store.write(&parent, &config(true)).unwrap();

		let found = store.find(&grandchild, DEFAULT_SEARCH_DEPTH).unwrap();
		assert_eq!(found.app_id, "00000000-0000-0000-0000-000000000000");
	}

	#[test]
	fn ignores_ancestor_without_monorepo_support() {
		let dir = TempDir::new().unwrap();
		let (parent, grandchild) = nested(dir.path());
		let store = FileProjectConfigStore::new();
		store.write(&parent, &config(false)).unwrap();

		assert!(store.find(&grandchild, DEFAULT_SEARCH_DEPTH).is_none());
	}

	#[test]
	fn search_continues_past_non_monorepo_ancestor() {
		let dir = TempDir::new().unwrap();
		let (parent, grandchild) = nested(dir.path());
		let store = FileProjectConfigStore::new();
		store.write(&parent, &config(true)).unwrap();
		let mut blocking = config(false);
		blocking.app_name = "Child".to_string();
		store.write(&parent.join("child"), &blocking).unwrap();

		let found = store.find(&grandchild, DEFAULT_SEARCH_DEPTH).unwrap();
		assert_eq!(found.app_name, "TestApp");
	}

	#[test]
	fn respects_max_depth() {
		let dir = TempDir::new().unwrap();
		let (parent, grandchild) = nested(dir.path());
		let store = FileProjectConfigStore::new();
		store.write(&parent, &config(true)).unwrap();

		assert!(store.find(&grandchild, 1).is_none());
		assert!(store.find(&grandchild, 2).is_some());
	}

	#[test]
	fn malformed_config_is_skipped() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "{ not json").unwrap();

		assert!(FileProjectConfigStore::new()
			.find(dir.path(), DEFAULT_SEARCH_DEPTH)
			.is_none());
	}

	#[test]
	fn writes_camel_case_json() {
		let dir = TempDir::new().unwrap();
		let path = FileProjectConfigStore::new()
			.write(dir.path(), &config(true))
			.unwrap();

		let raw = std::fs::read_to_string(path).unwrap();
		assert!(raw.contains("\"appId\""));
		assert!(raw.contains("\"monorepoSupport\": true"));
	}

	#[cfg(unix)]
	#[test]
	fn written_config_is_private() {
		use std::os::unix::fs::PermissionsExt;

		let dir = TempDir::new().unwrap();
		let path = FileProjectConfigStore::new()
			.write(dir.path(), &config(false))
			.unwrap();

		let mode = std::fs::metadata(path).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}
}
