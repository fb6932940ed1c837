// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur while loading or persisting configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// I/O error reading or writing a config file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// JSON parsing error
	#[error("JSON parse error in {path}: {source}")]
	JsonParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	/// JSON serialization error
	#[error("JSON serialization error: {0}")]
	JsonSerialize(#[from] serde_json::Error),

	/// Validation error
	#[error("validation error: {0}")]
	Validation(String),

	/// Invalid value
	#[error("invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	/// No account has been marked as default
	#[error("no default account configured; log in or set a service token")]
	NoDefaultAccount,

	/// Account id not present in the registry
	#[error("no account found with id: {0}")]
	AccountNotFound(String),

	/// Home directory not found
	#[error("could not determine home directory")]
	HomeDirNotFound,
}

impl ConfigError {
	/// Create a validation error
	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}

	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
