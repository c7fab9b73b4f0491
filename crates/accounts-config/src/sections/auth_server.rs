// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider (authorization server) configuration section.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::secret::SecretString;

fn default_url() -> String {
	"http://localhost:8080/auth".to_string()
}

fn default_realm() -> String {
	"hawkular".to_string()
}

fn default_client_id() -> String {
	"hawkular-accounts-backend".to_string()
}

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthServerConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub realm: Option<String>,
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub client_secret: Option<SecretString>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
}

impl AuthServerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.realm.is_some() {
			self.realm = other.realm;
		}
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> AuthServerConfig {
		AuthServerConfig {
			url: self
				.url
				.map(|u| u.trim_end_matches('/').to_string())
				.unwrap_or_else(default_url),
			realm: self.realm.unwrap_or_else(default_realm),
			client_id: self.client_id.unwrap_or_else(default_client_id),
			client_secret: self.client_secret.filter(|s| !s.is_empty()),
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
		}
	}
}

/// Where and how to reach the identity provider.
#[derive(Debug, Clone)]
pub struct AuthServerConfig {
	/// Base URL without a trailing slash, e.g. `https://sso.example.com/auth`.
	pub url: String,
	pub realm: String,
	pub client_id: String,
	pub client_secret: Option<SecretString>,
	pub request_timeout_secs: u64,
}

impl AuthServerConfig {
	/// `{url}/realms/{realm}/protocol/openid-connect`
	pub fn openid_connect_base(&self) -> String {
		format!("{}/realms/{}/protocol/openid-connect", self.url, self.realm)
	}

	pub fn token_endpoint(&self) -> String {
		format!("{}/token", self.openid_connect_base())
	}

	pub fn validate_endpoint(&self) -> String {
		format!("{}/validate", self.openid_connect_base())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.url.trim().is_empty() {
			return Err(ConfigError::Validation(
				"auth_server.url must not be empty".to_string(),
			));
		}
		if self.realm.trim().is_empty() {
			return Err(ConfigError::Validation(
				"auth_server.realm must not be empty".to_string(),
			));
		}
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::Validation(
				"auth_server.client_id must not be empty".to_string(),
			));
		}
		if self.request_timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"auth_server.request_timeout_secs must be greater than zero".to_string(),
			));
		}
		Ok(())
	}
}

impl Default for AuthServerConfig {
	fn default() -> Self {
		AuthServerConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = AuthServerConfig::default();
		assert_eq!(config.url, "http://localhost:8080/auth");
		assert_eq!(config.realm, "hawkular");
		assert_eq!(config.client_id, "hawkular-accounts-backend");
		assert!(config.client_secret.is_none());
		assert_eq!(config.request_timeout_secs, 10);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn endpoints_are_built_from_url_and_realm() {
		let config = AuthServerConfigLayer {
			url: Some("https://sso.example.com/auth/".to_string()),
			realm: Some("acme".to_string()),
			..Default::default()
		}
		.finalize();
		assert_eq!(
			config.token_endpoint(),
			"https://sso.example.com/auth/realms/acme/protocol/openid-connect/token"
		);
		assert_eq!(
			config.validate_endpoint(),
			"https://sso.example.com/auth/realms/acme/protocol/openid-connect/validate"
		);
	}

	#[test]
	fn merge_prefers_other() {
		let mut base = AuthServerConfigLayer {
			realm: Some("base".to_string()),
			request_timeout_secs: Some(5),
			..Default::default()
		};
		base.merge(AuthServerConfigLayer {
			realm: Some("override".to_string()),
			..Default::default()
		});
		let config = base.finalize();
		assert_eq!(config.realm, "override");
		assert_eq!(config.request_timeout_secs, 5);
	}

	#[test]
	fn empty_secret_is_treated_as_absent() {
		let config = AuthServerConfigLayer {
			client_secret: Some(SecretString::from("")),
			..Default::default()
		}
		.finalize();
		assert!(config.client_secret.is_none());
	}

	#[test]
	fn zero_timeout_fails_validation() {
		let config = AuthServerConfigLayer {
			request_timeout_secs: Some(0),
			..Default::default()
		}
		.finalize();
		assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn blank_realm_fails_validation() {
		let config = AuthServerConfigLayer {
			realm: Some("  ".to_string()),
			..Default::default()
		}
		.finalize();
		let err = config.validate().unwrap_err();
		assert!(err.to_string().contains("realm"));
	}
}
