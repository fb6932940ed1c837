// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `${...}` placeholder grammar.
//!
//! ```text
//! ${KEY}                       same environment, root path
//! ${/db/KEY}                   same environment, path /db
//! ${staging.KEY}               environment "staging"
//! ${staging./db/KEY}           environment "staging", path /db
//! ${backend::staging.KEY}      application "backend", environment "staging"
//! ```

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::ROOT_PATH;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

const APP_SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
	#[error("invalid reference '{0}': cross-application references must specify an environment")]
	MissingEnvironment(String),
}

/// A parsed placeholder, with defaults from the current context filled in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
	pub app: String,
	pub env: String,
	pub path: String,
	pub key: String,
}

impl Reference {
	/// Parse a placeholder body (the text between `${` and `}`).
	pub fn parse(body: &str, current_app: &str, current_env: &str) -> Result<Self, ReferenceError> {
		let (app, rest, cross_app) = match body.split_once(APP_SEPARATOR) {
			Some((app, rest)) => (app, rest, true),
			None => (current_app, body, false),
		};

		let (env, rest) = match rest.split_once('.') {
			Some((env, _)) if cross_app && env.is_empty() => {
				return Err(ReferenceError::MissingEnvironment(body.to_string()))
			}
			Some((env, rest)) => (env, rest),
			None if cross_app => return Err(ReferenceError::MissingEnvironment(body.to_string())),
			None => (current_env, rest),
		};

		let (path, key) = split_path_and_key(rest);
		Ok(Self {
			app: app.to_string(),
			env: env.to_string(),
			path,
			key: key.to_string(),
		})
	}
}

/// Split `a/b/KEY` into (`/a/b`, `KEY`). Without a `/` the path is the root.
fn split_path_and_key(reference: &str) -> (String, &str) {
	match reference.rsplit_once('/') {
		Some((path, key)) if path.starts_with('/') => (path.to_string(), key),
		Some((path, key)) => (format!("/{path}"), key),
		None => (ROOT_PATH.to_string(), reference),
	}
}

/// Every placeholder in `value` as (full placeholder text, body), in order.
pub fn placeholders(value: &str) -> impl Iterator<Item = (&str, &str)> {
	PLACEHOLDER.captures_iter(value).filter_map(|caps| {
		let full = caps.get(0)?.as_str();
		let body = caps.get(1)?.as_str();
		Some((full, body))
	})
}

pub fn contains_placeholder(value: &str) -> bool {
	PLACEHOLDER.is_match(value)
}
