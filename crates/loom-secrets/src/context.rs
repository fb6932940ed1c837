// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turns application and environment hints into a concrete target.
//!
//! Hints come from the caller or, failing that, from the nearest project
//! config. Names are matched case-insensitively by substring; when several
//! names match, the shortest wins and equal lengths fall back to
//! lexicographic order so the choice never depends on server ordering.

use std::path::PathBuf;
use std::sync::Arc;

use loom_secrets_client::{Application, EnvironmentKey, UserContext};
use loom_secrets_config::{ProjectConfigStore, DEFAULT_SEARCH_DEPTH};
use tracing::{debug, instrument};

use crate::error::{SecretsError, SecretsResult};
use crate::types::{AppSelector, DEFAULT_ENVIRONMENT};

/// A fully resolved application/environment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
	pub app_name: String,
	pub app_id: String,
	pub env_name: String,
	pub env_id: String,
	/// The environment's key material as fetched.
	pub environment_key: EnvironmentKey,
}

impl ResolvedContext {
	/// Public key (hex) that secrets in this environment are sealed to.
	pub fn identity_key(&self) -> &str {
		&self.environment_key.identity_key
	}
}

/// Resolves [`AppSelector`]s against the account's applications.
#[derive(Clone)]
pub struct ContextResolver {
	store: Arc<dyn ProjectConfigStore>,
	start_dir: Option<PathBuf>,
	search_depth: usize,
}

impl ContextResolver {
	pub fn new(store: Arc<dyn ProjectConfigStore>) -> Self {
		Self {
			store,
			start_dir: None,
			search_depth: DEFAULT_SEARCH_DEPTH,
		}
	}

	/// Directory the project config search starts from. Defaults to the
	/// process working directory.
	pub fn with_start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.start_dir = Some(dir.into());
		self
	}

	pub fn with_search_depth(mut self, depth: usize) -> Self {
		self.search_depth = depth;
		self
	}

	pub fn search_depth(&self) -> usize {
		self.search_depth
	}

	/// Fill in missing selector fields from the project config.
	fn apply_project_config(&self, selector: &AppSelector) -> AppSelector {
		let mut effective = selector.clone();
		if selector.has_application() {
			return effective;
		}

		let start_dir = match &self.start_dir {
			Some(dir) => dir.clone(),
			None => match std::env::current_dir() {
				Ok(dir) => dir,
				Err(e) => {
					debug!(error = %e, "no working directory, skipping project config lookup");
					return effective;
				}
			},
		};

		if let Some(config) = self.store.find(&start_dir, self.search_depth) {
			debug!(app_id = %config.app_id, "using linked project");
			effective.app_id = Some(config.app_id);
			if effective.env_name.is_none() {
				effective.env_name = config.default_env;
			}
		}
		effective
	}

	#[instrument(skip(self, user), fields(app_name = ?selector.app_name, app_id = ?selector.app_id))]
	pub fn resolve(
		&self,
		user: &UserContext,
		selector: &AppSelector,
	) -> SecretsResult<ResolvedContext> {
		let effective = self.apply_project_config(selector);
		if !effective.has_application() {
			return Err(SecretsError::NoApplicationContext);
		}

		let env_name = effective
			.env_name
			.as_deref()
			.unwrap_or(DEFAULT_ENVIRONMENT);

		let app = select_application(
			&user.apps,
			effective.app_id.as_deref(),
			effective.app_name.as_deref(),
		)?;
		let env_key = select_environment(app, env_name)?;

		debug!(
			app = %app.name,
			environment = %env_key.environment.name,
			"resolved context"
		);
		Ok(ResolvedContext {
			app_name: app.name.clone(),
			app_id: app.id.clone(),
			env_name: env_key.environment.name.clone(),
			env_id: env_key.environment.id.clone(),
			environment_key: env_key.clone(),
		})
	}
}

/// Pick the candidate with the shortest name, then the lexicographically first.
fn most_specific<'a, T>(
	candidates: impl Iterator<Item = &'a T>,
	name: impl Fn(&T) -> &str,
) -> Option<&'a T>
where
	T: 'a,
{
	candidates.min_by(|a, b| {
		let (a, b) = (name(a), name(b));
		a.len().cmp(&b.len()).then_with(|| a.cmp(b))
	})
}

/// Find an application by exact id, or else by case-insensitive name substring.
pub fn select_application<'a>(
	apps: &'a [Application],
	app_id: Option<&str>,
	app_name: Option<&str>,
) -> SecretsResult<&'a Application> {
	if let Some(id) = app_id {
		return apps
			.iter()
			.find(|app| app.id == id)
			.ok_or_else(|| SecretsError::ApplicationIdNotFound(id.to_string()));
	}

	let Some(name) = app_name else {
		return Err(SecretsError::NoApplicationContext);
	};
	let wanted = name.to_lowercase();
	most_specific(
		apps.iter()
			.filter(|app| app.name.to_lowercase().contains(&wanted)),
		|app| app.name.as_str(),
	)
	.ok_or_else(|| SecretsError::ApplicationNameNotFound(name.to_string()))
}

/// Find an environment of `app` by case-insensitive name substring.
pub fn select_environment<'a>(
	app: &'a Application,
	env_name: &str,
) -> SecretsResult<&'a EnvironmentKey> {
	let wanted = env_name.to_lowercase();
	most_specific(
		app.environment_keys
			.iter()
			.filter(|key| key.environment.name.to_lowercase().contains(&wanted)),
		|key| key.environment.name.as_str(),
	)
	.ok_or_else(|| SecretsError::EnvironmentNotFound {
		environment: env_name.to_string(),
		application: app.name.clone(),
	})
}
