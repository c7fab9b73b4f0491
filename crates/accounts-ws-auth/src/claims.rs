// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity claims presented by a connection.
//!
//! Claims arrive in one of three shapes: a bearer token, a username and
//! password, or a JSON message carrying either of those:
//!
//! ```json
//! {"authentication": {"token": "abc123def", "persona": "acme"}, "payload": {}}
//! {"authentication": {"login": {"username": "jdoe", "password": "secret"}}}
//! ```

use std::fmt;

use accounts_config::SecretString;
use accounts_core::PersonaId;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use serde::Deserialize;

use crate::error::{Result, SessionAuthError};

/// Header naming the persona a connection wants to act as (`Hawkular-Persona`).
pub const PERSONA_HEADER: &str = "hawkular-persona";

/// Identifies one long-lived connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SessionId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginBlock {
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationBlock {
	#[serde(default)]
	pub token: Option<SecretString>,
	#[serde(default)]
	pub login: Option<LoginBlock>,
	#[serde(default)]
	pub persona: Option<String>,
}

/// The authentication part of an in-band message. Unrelated payload fields
/// are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthEnvelope {
	#[serde(default)]
	pub authentication: Option<AuthenticationBlock>,
	/// Accepted next to `authentication` as well as inside it.
	#[serde(default)]
	pub persona: Option<String>,
}

impl AuthEnvelope {
	pub fn parse(message: &str) -> Result<Self> {
		serde_json::from_str(message).map_err(|e| SessionAuthError::InvalidAuthMessage(e.to_string()))
	}

	pub fn requested_persona(&self) -> Option<PersonaId> {
		self.authentication
			.as_ref()
			.and_then(|a| a.persona.clone())
			.or_else(|| self.persona.clone())
			.filter(|p| !p.is_empty())
			.map(PersonaId::new)
	}

	/// The token or login nested in the envelope. A token wins over a login.
	pub fn claims(&self) -> Option<AuthClaims> {
		let auth = self.authentication.as_ref()?;
		if let Some(token) = &auth.token {
			return Some(AuthClaims::Token(token.clone()));
		}
		let login = auth.login.as_ref()?;
		Some(AuthClaims::Credentials {
			username: login.username.clone().unwrap_or_default(),
			password: login
				.password
				.clone()
				.unwrap_or_else(|| SecretString::from("")),
		})
	}
}

/// One claim mode per attempt.
#[derive(Debug, Clone)]
pub enum AuthClaims {
	Token(SecretString),
	Credentials {
		username: String,
		password: SecretString,
	},
	Message(AuthEnvelope),
}

impl AuthClaims {
	pub fn mode(&self) -> &'static str {
		match self {
			AuthClaims::Token(_) => "token",
			AuthClaims::Credentials { .. } => "credentials",
			AuthClaims::Message(_) => "message",
		}
	}
}

/// A single authentication attempt for a session.
#[derive(Debug, Clone)]
pub struct AuthRequest {
	pub session: SessionId,
	pub claims: Option<AuthClaims>,
	pub requested_persona: Option<PersonaId>,
}

impl AuthRequest {
	/// An attempt that relies on the session cache alone.
	pub fn cached(session: SessionId) -> Self {
		Self {
			session,
			claims: None,
			requested_persona: None,
		}
	}

	pub fn with_token(session: SessionId, token: impl Into<SecretString>) -> Self {
		Self {
			session,
			claims: Some(AuthClaims::Token(token.into())),
			requested_persona: None,
		}
	}

	pub fn with_credentials(
		session: SessionId,
		username: impl Into<String>,
		password: impl Into<SecretString>,
	) -> Self {
		Self {
			session,
			claims: Some(AuthClaims::Credentials {
				username: username.into(),
				password: password.into(),
			}),
			requested_persona: None,
		}
	}

	/// Parse an in-band message. The requested persona comes from the message.
	pub fn from_message(session: SessionId, message: &str) -> Result<Self> {
		let envelope = AuthEnvelope::parse(message)?;
		let requested_persona = envelope.requested_persona();
		Ok(Self {
			session,
			claims: Some(AuthClaims::Message(envelope)),
			requested_persona,
		})
	}

	/// Handshake headers: `Authorization: Bearer ...` and the persona header.
	pub fn from_headers(session: SessionId, headers: &HeaderMap) -> Self {
		Self {
			session,
			claims: extract_bearer_token(headers).map(AuthClaims::Token),
			requested_persona: extract_persona(headers),
		}
	}

	pub fn as_persona(mut self, persona: impl Into<PersonaId>) -> Self {
		self.requested_persona = Some(persona.into());
		self
	}
}

/// Extract a bearer token from the `Authorization` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<SecretString> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let (scheme, token) = value.split_once(' ')?;
	if !scheme.eq_ignore_ascii_case("bearer") {
		return None;
	}
	let token = token.trim();
	(!token.is_empty()).then(|| SecretString::from(token))
}

pub fn extract_persona(headers: &HeaderMap) -> Option<PersonaId> {
	headers
		.get(PERSONA_HEADER)?
		.to_str()
		.ok()
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(PersonaId::from)
}
