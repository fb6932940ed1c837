// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Loom secrets client.
//!
//! - [`project`]: `.loom-secrets.json` files linking a directory tree to an application
//! - [`account`]: logged-in accounts and which one is the default
//! - [`settings`], [`sources`], [`registry`]: layered client settings
//!   (defaults < user file < environment < explicit)

pub mod account;
pub mod error;
pub mod paths;
pub mod project;
pub mod registry;
pub mod settings;
pub mod sources;

pub use account::{Account, AccountRegistry, AccountStore, FileAccountStore, MemoryAccountStore};
pub use error::{ConfigError, ConfigResult};
pub use paths::{resolve_paths, SecretsPaths};
pub use project::{
	FileProjectConfigStore, ProjectConfig, ProjectConfigStore, DEFAULT_SEARCH_DEPTH,
	PROJECT_CONFIG_FILE,
};
pub use registry::SettingsRegistry;
pub use settings::{parse_bool_flag, ClientSettings, SettingsLayer, DEFAULT_HOST};
pub use sources::{
	DefaultsSource, EnvSource, ExplicitSource, FileSource, Precedence, SettingsSource,
};
