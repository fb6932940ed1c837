// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP implementation of [`SecretsBackend`].

use async_trait::async_trait;
use loom_secrets_config::ClientSettings;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::backend::SecretsBackend;
use crate::credential::Credential;
use crate::error::{ClientError, ClientResult};
use crate::types::{FetchSecretsRequest, Lease, RawSecretRecord, SecretPayload, UserContext};

const SECRETS_PATH: &str = "/service/secrets/";
const USER_CONTEXT_PATH: &str = "/service/secrets/tokens/";
const LEASES_PATH: &str = "/service/public/v1/secrets/dynamic/leases/";

/// User agent sent with every request: `loom-secrets/{version} ({os}-{arch})`.
pub fn user_agent() -> String {
	format!(
		"loom-secrets/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[derive(Serialize)]
struct SecretsBody<'a, T: Serialize> {
	secrets: &'a [T],
}

#[derive(Serialize)]
struct LeaseBody<'a> {
	lease_id: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	ttl: Option<u64>,
}

/// Backend client over HTTPS.
pub struct HttpBackend {
	http_client: reqwest::Client,
	host: String,
	credential: Credential,
}

impl HttpBackend {
	/// Create a client for `settings.host`, authenticating as `credential`.
	///
	/// No request timeout is configured; callers that need one wrap the
	/// returned futures.
	pub fn new(settings: &ClientSettings, credential: Credential) -> ClientResult<Self> {
		if !settings.verify_ssl {
			warn!(host = %settings.host, "TLS certificate verification is disabled");
		}

		let http_client = reqwest::Client::builder()
			.user_agent(user_agent())
			.danger_accept_invalid_certs(!settings.verify_ssl)
			.build()
			.map_err(|e| ClientError::Configuration(format!("failed to create HTTP client: {e}")))?;

		Ok(Self {
			http_client,
			host: settings.host.clone(),
			credential,
		})
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	fn request(&self, method: Method, path: &str) -> RequestBuilder {
		self.http_client
			.request(method, format!("{}{}", self.host, path))
			.header(AUTHORIZATION, self.credential.authorization_header())
	}

	async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
		let response = builder
			.send()
			.await
			.map_err(|e| ClientError::from_reqwest(&self.host, e))?;

		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}

		let body = response.text().await.unwrap_or_default();
		Err(ClientError::from_status(status.as_u16(), &body))
	}

	async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
		self.send(builder)
			.await?
			.json()
			.await
			.map_err(|e| ClientError::InvalidResponse(e.to_string()))
	}

	fn environment_headers(environment_id: &str) -> ClientResult<HeaderMap> {
		let mut headers = HeaderMap::new();
		headers.insert("Environment", header_value(environment_id)?);
		Ok(headers)
	}
}

fn header_value(value: &str) -> ClientResult<HeaderValue> {
	HeaderValue::from_str(value)
		.map_err(|e| ClientError::Configuration(format!("invalid header value: {e}")))
}

#[async_trait]
impl SecretsBackend for HttpBackend {
	#[instrument(skip(self), fields(host = %self.host))]
	async fn fetch_user_context(&self) -> ClientResult<UserContext> {
		debug!("fetching user context");
		self.json(self.request(Method::GET, USER_CONTEXT_PATH)).await
	}

	#[instrument(
		skip(self, request),
		fields(environment_id = %request.environment_id, path = ?request.path)
	)]
	async fn fetch_secrets(
		&self,
		request: &FetchSecretsRequest,
	) -> ClientResult<Vec<RawSecretRecord>> {
		let mut headers = Self::environment_headers(&request.environment_id)?;
		if let Some(path) = &request.path {
			headers.insert("Path", header_value(path)?);
		}
		if request.dynamic {
			headers.insert("dynamic", HeaderValue::from_static("true"));
		}
		if request.lease {
			headers.insert("lease", HeaderValue::from_static("true"));
		}
		if let Some(ttl) = request.lease_ttl {
			headers.insert("lease-ttl", header_value(&ttl.to_string())?);
		}

		let records: Vec<RawSecretRecord> = self
			.json(self.request(Method::GET, SECRETS_PATH).headers(headers))
			.await?;
		debug!(count = records.len(), "fetched secret records");
		Ok(records)
	}

	#[instrument(skip(self, secrets), fields(count = secrets.len()))]
	async fn create_secrets(
		&self,
		environment_id: &str,
		secrets: &[SecretPayload],
	) -> ClientResult<()> {
		let builder = self
			.request(Method::POST, SECRETS_PATH)
			.headers(Self::environment_headers(environment_id)?)
			.json(&SecretsBody { secrets });
		self.send(builder).await?;
		Ok(())
	}

	#[instrument(skip(self, secrets), fields(count = secrets.len()))]
	async fn update_secrets(
		&self,
		environment_id: &str,
		secrets: &[SecretPayload],
	) -> ClientResult<()> {
		let builder = self
			.request(Method::PUT, SECRETS_PATH)
			.headers(Self::environment_headers(environment_id)?)
			.json(&SecretsBody { secrets });
		self.send(builder).await?;
		Ok(())
	}

	#[instrument(skip(self, ids), fields(count = ids.len()))]
	async fn delete_secrets(&self, environment_id: &str, ids: &[String]) -> ClientResult<()> {
		let builder = self
			.request(Method::DELETE, SECRETS_PATH)
			.headers(Self::environment_headers(environment_id)?)
			.json(&SecretsBody { secrets: ids });
		self.send(builder).await?;
		Ok(())
	}

	#[instrument(skip(self))]
	async fn renew_lease(&self, lease_id: &str, ttl: Option<u64>) -> ClientResult<Lease> {
		let builder = self
			.request(Method::PUT, LEASES_PATH)
			.json(&LeaseBody { lease_id, ttl });
		self.json(builder).await
	}

	#[instrument(skip(self))]
	async fn revoke_lease(&self, lease_id: &str) -> ClientResult<()> {
		let builder = self
			.request(Method::DELETE, LEASES_PATH)
			.json(&LeaseBody { lease_id, ttl: None });
		self.send(builder).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn credential() -> Credential {
		Credential::parse("pss_service:v2:apptoken:pub:share:unwrap").unwrap()
	}

	#[test]
	fn user_agent_has_expected_shape() {
		let ua = user_agent();
		assert!(ua.starts_with("loom-secrets/"));
		assert!(ua.contains(std::env::consts::OS));
	}

	#[test]
	fn builds_against_default_settings() {
		let backend = HttpBackend::new(&ClientSettings::default(), credential()).unwrap();
		assert_eq!(backend.host(), "https://console.phase.dev");
	}

	#[test]
	fn request_carries_bearer_token() {
		let backend = HttpBackend::new(&ClientSettings::default(), credential()).unwrap();
		let request = backend
			.request(Method::GET, SECRETS_PATH)
			.build()
			.unwrap();

		assert_eq!(request.url().as_str(), "https://console.phase.dev/service/secrets/");
		assert_eq!(
			request.headers().get(AUTHORIZATION).unwrap(),
			"Bearer ServiceAccount apptoken"
		);
	}

	#[test]
	fn environment_header_rejects_control_characters() {
		assert!(HttpBackend::environment_headers("env\n1").is_err());
		assert!(HttpBackend::environment_headers("env-1").is_ok());
	}
}
