// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the backend client.

use thiserror::Error;

/// Errors that can occur when talking to the secrets backend.
#[derive(Debug, Error)]
pub enum ClientError {
	/// Credential token could not be parsed.
	#[error("invalid token: {0}")]
	InvalidToken(String),

	/// Could not reach the host (DNS or TCP failure).
	#[error("could not connect to {host}: {message}")]
	Connection { host: String, message: String },

	/// The request timed out in the transport.
	#[error("request to {host} timed out")]
	Timeout { host: String },

	/// TLS handshake or certificate verification failed.
	#[error("TLS error talking to {host}: {message}")]
	Tls { host: String, message: String },

	/// 401 or 403 from the backend.
	#[error("request not authorized (HTTP {status}); check that the token is valid and has access")]
	Unauthorized { status: u16 },

	/// 429 from the backend.
	#[error("rate limit exceeded, retry later")]
	RateLimited,

	/// Any other non-success status.
	#[error("API error (HTTP {status}): {message}")]
	Api { status: u16, message: String },

	/// Body could not be decoded.
	#[error("invalid response: {0}")]
	InvalidResponse(String),

	/// Client could not be constructed.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// Operation targets something the backend does not hold.
	#[error("not found: {0}")]
	NotFound(String),

	/// Other HTTP error.
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),
}

impl ClientError {
	/// Classify a transport failure from reqwest.
	pub fn from_reqwest(host: &str, err: reqwest::Error) -> Self {
		if err.is_timeout() {
			return Self::Timeout {
				host: host.to_string(),
			};
		}

		let chain = error_chain(&err);
		let lowered = chain.to_ascii_lowercase();
		if lowered.contains("certificate") || lowered.contains("tls") {
			return Self::Tls {
				host: host.to_string(),
				message: chain,
			};
		}
		if err.is_connect() {
			return Self::Connection {
				host: host.to_string(),
				message: chain,
			};
		}
		Self::Http(err)
	}

	/// Map a non-success status code to an error.
	pub fn from_status(status: u16, body: &str) -> Self {
		match status {
			401 | 403 => Self::Unauthorized { status },
			429 => Self::RateLimited,
			_ => Self::Api {
				status,
				message: sanitize_body_for_error(body, 200),
			},
		}
	}
}

fn error_chain(err: &dyn std::error::Error) -> String {
	let mut message = err.to_string();
	let mut source = err.source();
	while let Some(inner) = source {
		message.push_str(": ");
		message.push_str(&inner.to_string());
		source = inner.source();
	}
	message
}

/// Sanitize a response body for inclusion in error messages.
///
/// Truncates to `max_len` characters and strips control characters so that
/// server payloads cannot smuggle terminal escapes into logs.
pub(crate) fn sanitize_body_for_error(body: &str, max_len: usize) -> String {
	let sanitized: String = body
		.chars()
		.filter(|c| !c.is_control() || *c == ' ')
		.take(max_len)
		.collect();
	if body.chars().count() > max_len {
		format!("{sanitized}...")
	} else {
		sanitized
	}
}

/// Result type for backend client operations.
pub type ClientResult<T> = Result<T, ClientError>;
