// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential tokens.
//!
//! A token has six `:`-separated segments:
//! `pss_service|pss_user : version : app token : account public key : key share 0 : share unwrap key`.
//! The first three authenticate requests; the last three let the client
//! rebuild the account private key together with the server-held share.

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroize;

use crate::error::{ClientError, ClientResult};

const SERVICE_PREFIX: &str = "pss_service";
const USER_PREFIX: &str = "pss_user";

/// How the backend should treat the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	User,
	Service,
	ServiceAccount,
}

impl TokenKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			TokenKind::User => "User",
			TokenKind::Service => "Service",
			TokenKind::ServiceAccount => "ServiceAccount",
		}
	}
}

impl fmt::Display for TokenKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A parsed credential token. Zeroized on drop, redacted in Debug.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credential {
	#[zeroize(skip)]
	kind: TokenKind,
	version: String,
	app_token: String,
	account_public_key: String,
	key_share0: String,
	share_unwrap_key: String,
}

impl Credential {
	pub fn parse(token: &str) -> ClientResult<Self> {
		let segments: Vec<&str> = token.trim().split(':').collect();
		if segments.len() != 6 {
			return Err(ClientError::InvalidToken(format!(
				"expected 6 segments, got {}",
				segments.len()
			)));
		}
		if segments.iter().any(|s| s.is_empty()) {
			return Err(ClientError::InvalidToken("empty token segment".to_string()));
		}

		let version = segments[1];
		let kind = match segments[0] {
			SERVICE_PREFIX if version == "v2" => TokenKind::ServiceAccount,
			SERVICE_PREFIX => TokenKind::Service,
			USER_PREFIX => TokenKind::User,
			other => {
				return Err(ClientError::InvalidToken(format!(
					"unknown token prefix '{other}'"
				)))
			}
		};

		Ok(Self {
			kind,
			version: version.to_string(),
			app_token: segments[2].to_string(),
			account_public_key: segments[3].to_string(),
			key_share0: segments[4].to_string(),
			share_unwrap_key: segments[5].to_string(),
		})
	}

	pub fn kind(&self) -> TokenKind {
		self.kind
	}

	pub fn version(&self) -> &str {
		&self.version
	}

	/// Value for the `Authorization` header.
	pub fn authorization_header(&self) -> String {
		format!("Bearer {} {}", self.kind, self.app_token)
	}

	/// Public key of the account the token belongs to (hex).
	pub fn account_public_key(&self) -> &str {
		&self.account_public_key
	}

	/// Client-held share of the account private key (hex).
	pub fn key_share0(&self) -> &str {
		&self.key_share0
	}

	/// Key that unwraps the server-held share (hex).
	pub fn share_unwrap_key(&self) -> &str {
		&self.share_unwrap_key
	}
}

impl FromStr for Credential {
	type Err = ClientError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credential")
			.field("kind", &self.kind)
			.field("version", &self.version)
			.field("app_token", &"[REDACTED]")
			.field("account_public_key", &self.account_public_key)
			.field("key_share0", &"[REDACTED]")
			.field("share_unwrap_key", &"[REDACTED]")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn parses_user_token() {
		let cred = Credential::parse("pss_user:v1:tok:pub:share:unwrap").unwrap();
		assert_eq!(cred.kind(), TokenKind::User);
		assert_eq!(cred.authorization_header(), "Bearer User tok");
		assert_eq!(cred.account_public_key(), "pub");
		assert_eq!(cred.key_share0(), "share");
		assert_eq!(cred.share_unwrap_key(), "unwrap");
	}

	#[test]
	fn service_token_kind_depends_on_version() {
		let v1 = Credential::parse("pss_service:v1:tok:pub:s:u").unwrap();
		let v2 = Credential::parse("pss_service:v2:tok:pub:s:u").unwrap();
		assert_eq!(v1.kind(), TokenKind::Service);
		assert_eq!(v2.kind(), TokenKind::ServiceAccount);
		assert_eq!(v2.authorization_header(), "Bearer ServiceAccount tok");
	}

	#[test]
	fn rejects_malformed_tokens() {
		for bad in ["", "pss_user:v1:tok", "pss_admin:v1:a:b:c:d", "pss_user:v1::b:c:d"] {
			assert!(
				matches!(Credential::parse(bad), Err(ClientError::InvalidToken(_))),
				"expected rejection for {bad:?}"
			);
		}
	}

	#[test]
	fn debug_does_not_leak_secrets() {
		let cred: Credential = "pss_user:v1:apptoken:pub:share0value:unwrapvalue"
			.parse()
			.unwrap();
		let debug = format!("{cred:?}");
		assert!(!debug.contains("apptoken"));
		assert!(!debug.contains("share0value"));
		assert!(!debug.contains("unwrapvalue"));
	}

	proptest! {
		#[test]
		fn wrong_segment_count_is_rejected(segments in prop::collection::vec("[a-z0-9]{1,8}", 0..12)) {
			prop_assume!(segments.len() != 6);
			let token = segments.join(":");
			prop_assert!(Credential::parse(&token).is_err());
		}
	}
}
