// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Services the authenticator depends on, passed in explicitly at construction.

use accounts_config::SecretString;
use accounts_core::{Persona, PersonaId};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::{CredentialError, DirectoryError, TokenError};

/// Claims extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
	#[serde(rename = "sub", default)]
	pub subject: Option<String>,
	/// Expiry as seconds since the Unix epoch.
	#[serde(rename = "exp")]
	pub expires_at: i64,
	#[serde(default)]
	pub preferred_username: Option<String>,
}

impl TokenClaims {
	pub fn new(subject: impl Into<String>, expires_at: i64) -> Self {
		Self {
			subject: Some(subject.into()),
			expires_at,
			preferred_username: None,
		}
	}

	/// The subject, if present and non-empty.
	pub fn subject(&self) -> Option<&str> {
		self.subject.as_deref().filter(|s| !s.is_empty())
	}

	pub fn expires_at(&self) -> Option<DateTime<Utc>> {
		Utc.timestamp_opt(self.expires_at, 0).single()
	}
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
	async fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

#[async_trait]
pub trait CredentialExchange: Send + Sync {
	/// Trade a username and password for a bearer token.
	async fn exchange(
		&self,
		username: &str,
		password: &SecretString,
	) -> Result<SecretString, CredentialError>;
}

#[async_trait]
pub trait PersonaDirectory: Send + Sync {
	async fn get_persona(&self, id: &PersonaId) -> Result<Option<Persona>, DirectoryError>;

	/// Returns the persona for an external identity, creating it on first sight.
	async fn get_or_create_persona(&self, external_id: &str) -> Result<Persona, DirectoryError>;
}

#[async_trait]
pub trait ImpersonationPolicy: Send + Sync {
	async fn is_allowed_to_impersonate(
		&self,
		actor: &Persona,
		target: &Persona,
	) -> Result<bool, DirectoryError>;
}
