// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the secrets engine.

use loom_secrets_client::ClientError;
use loom_secrets_config::ConfigError;
use loom_secrets_crypto::CryptoError;
use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// Per-record decryption failures never appear here; those records are
/// skipped and logged.
#[derive(Debug, Error)]
pub enum SecretsError {
	#[error(
		"no application context provided; link a project with a .loom-secrets.json file or pass an application name or id"
	)]
	NoApplicationContext,

	#[error("no application found with id '{0}'")]
	ApplicationIdNotFound(String),

	#[error("no application found with the name '{0}'")]
	ApplicationNameNotFound(String),

	#[error("environment '{environment}' not found in application '{application}'")]
	EnvironmentNotFound {
		environment: String,
		application: String,
	},

	/// Account or environment key material could not be opened.
	#[error("failed to open environment keys: {0}")]
	Envelope(String),

	#[error("no override found for key '{0}'; create one first with an override value")]
	OverrideNotFound(String),

	#[error(transparent)]
	Backend(#[from] ClientError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("cryptographic operation failed: {0}")]
	Crypto(#[from] CryptoError),
}

pub type SecretsResult<T> = Result<T, SecretsError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_name_the_missing_thing() {
		let err = SecretsError::EnvironmentNotFound {
			environment: "qa".to_string(),
			application: "backend".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"environment 'qa' not found in application 'backend'"
		);
		assert!(SecretsError::ApplicationIdNotFound("abc".to_string())
			.to_string()
			.contains("'abc'"));
	}

	#[test]
	fn backend_errors_pass_through_verbatim() {
		let err: SecretsError = ClientError::RateLimited.into();
		assert_eq!(err.to_string(), ClientError::RateLimited.to_string());
	}
}
