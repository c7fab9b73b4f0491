// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenID Connect client for the identity provider.
//!
//! Implements both identity-provider collaborators over HTTP:
//!
//! - [`CredentialExchange`]: resource-owner password grant against
//!   `{url}/realms/{realm}/protocol/openid-connect/token`.
//! - [`TokenVerifier`]: `GET .../openid-connect/validate?access_token=...`,
//!   which answers with the token's claims.
//!
//! Errors reported by the provider as `{"error": ..., "error_description": ...}`
//! are passed through as rejections.

use std::time::Duration;

use accounts_config::{AuthServerConfig, ConfigError, SecretString};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::collaborators::{CredentialExchange, TokenClaims, TokenVerifier};
use crate::error::{CredentialError, TokenError};

#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
	error: String,
	error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	access_token: Option<SecretString>,
}

pub struct OidcClient {
	http_client: reqwest::Client,
	config: AuthServerConfig,
}

impl OidcClient {
	pub fn new(config: AuthServerConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		Url::parse(&config.url).map_err(|e| ConfigError::InvalidValue {
			key: "auth_server.url".to_string(),
			message: e.to_string(),
		})?;

		let http_client = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.request_timeout_secs))
			.build()
			.map_err(|e| ConfigError::InvalidValue {
				key: "auth_server".to_string(),
				message: format!("failed to build HTTP client: {e}"),
			})?;

		Ok(Self {
			http_client,
			config,
		})
	}

	pub fn config(&self) -> &AuthServerConfig {
		&self.config
	}
}

fn provider_error(body: &str) -> Option<ProviderErrorResponse> {
	serde_json::from_str::<ProviderErrorResponse>(body)
		.ok()
		.filter(|e| !e.error.is_empty())
}

fn token_transport_error(err: reqwest::Error) -> TokenError {
	if err.is_timeout() {
		TokenError::Timeout
	} else {
		TokenError::Network(err.to_string())
	}
}

fn credential_transport_error(err: reqwest::Error) -> CredentialError {
	if err.is_timeout() {
		CredentialError::Timeout
	} else {
		CredentialError::Network(err.to_string())
	}
}

#[async_trait]
impl TokenVerifier for OidcClient {
	#[tracing::instrument(skip(self, token), name = "OidcClient::verify")]
	async fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
		let response = self
			.http_client
			.get(self.config.validate_endpoint())
			.header("Accept", "application/json")
			.query(&[("access_token", token)])
			.send()
			.await
			.map_err(token_transport_error)?;

		let status = response.status();
		let body = response.text().await.map_err(token_transport_error)?;

		if let Some(err) = provider_error(&body) {
			tracing::debug!(error = %err.error, "token rejected");
			return Err(TokenError::Rejected {
				error: err.error,
				description: err.error_description,
			});
		}
		if status.is_server_error() {
			return Err(TokenError::Network(format!(
				"authentication server returned {status}"
			)));
		}
		if !status.is_success() {
			return Err(TokenError::Rejected {
				error: status_error(status),
				description: None,
			});
		}

		serde_json::from_str(&body)
			.map_err(|e| TokenError::Malformed(format!("failed to parse token claims: {e}")))
	}
}

#[async_trait]
impl CredentialExchange for OidcClient {
	#[tracing::instrument(skip(self, password), name = "OidcClient::exchange")]
	async fn exchange(
		&self,
		username: &str,
		password: &SecretString,
	) -> Result<SecretString, CredentialError> {
		let mut form = vec![
			("grant_type", "password"),
			("username", username),
			("password", password.expose().as_str()),
			("client_id", self.config.client_id.as_str()),
		];
		if let Some(secret) = &self.config.client_secret {
			form.push(("client_secret", secret.expose().as_str()));
		}

		let response = self
			.http_client
			.post(self.config.token_endpoint())
			.header("Accept", "application/json")
			.form(&form)
			.send()
			.await
			.map_err(credential_transport_error)?;

		let status = response.status();
		let body = response.text().await.map_err(credential_transport_error)?;

		if let Some(err) = provider_error(&body) {
			let message = err.error_description.unwrap_or(err.error);
			tracing::debug!(%message, "credentials rejected");
			return Err(CredentialError::Rejected(message));
		}
		if status.is_server_error() {
			return Err(CredentialError::Network(format!(
				"authentication server returned {status}"
			)));
		}
		if !status.is_success() {
			return Err(CredentialError::Rejected(status_error(status)));
		}

		let parsed: TokenResponse = serde_json::from_str(&body)
			.map_err(|e| CredentialError::Malformed(format!("failed to parse token response: {e}")))?;
		parsed
			.access_token
			.filter(|t| !t.is_empty())
			.ok_or_else(|| CredentialError::Malformed("response has no access_token".to_string()))
	}
}

fn status_error(status: StatusCode) -> String {
	format!("http_{}", status.as_u16())
}
