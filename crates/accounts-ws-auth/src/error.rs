// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session authentication error types.

use accounts_authz::AuthzError;
use accounts_core::{AccountsError, PersonaId};
use thiserror::Error;

/// Failure reported by a [`TokenVerifier`](crate::TokenVerifier).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
	/// The identity provider refused the token.
	#[error("token rejected by the authentication server: {error}{}", .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
	Rejected {
		error: String,
		description: Option<String>,
	},

	#[error("token has expired")]
	Expired,

	#[error("malformed verification response: {0}")]
	Malformed(String),

	#[error("authentication server timed out")]
	Timeout,

	#[error("authentication server unreachable: {0}")]
	Network(String),
}

/// Failure reported by a [`CredentialExchange`](crate::CredentialExchange).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
	#[error("credentials rejected by the authentication server: {0}")]
	Rejected(String),

	#[error("malformed token response: {0}")]
	Malformed(String),

	#[error("authentication server timed out")]
	Timeout,

	#[error("authentication server unreachable: {0}")]
	Network(String),
}

/// Failure looking up or materializing personas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("persona directory failure: {0}")]
pub struct DirectoryError(pub String);

impl From<AccountsError> for DirectoryError {
	fn from(err: AccountsError) -> Self {
		Self(err.to_string())
	}
}

impl From<AuthzError> for DirectoryError {
	fn from(err: AuthzError) -> Self {
		Self(err.to_string())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionAuthError {
	// =========================================================================
	// Missing or unusable claims
	// =========================================================================
	/// No usable claims and no valid cached session.
	#[error("no authentication data provided")]
	AuthenticationRequired,

	#[error("invalid authentication message: {0}")]
	InvalidAuthMessage(String),

	#[error("subject was not returned by the authentication server")]
	MissingSubject,

	/// Organizations are only ever acted as through impersonation.
	#[error("subject {0} is an organization and cannot authenticate directly")]
	OrganizationSubject(PersonaId),

	// =========================================================================
	// Identity provider
	// =========================================================================
	#[error(transparent)]
	Token(#[from] TokenError),

	#[error(transparent)]
	Credential(#[from] CredentialError),

	// =========================================================================
	// Impersonation
	// =========================================================================
	#[error("{actor} is not allowed to act as {target}")]
	ImpersonationDenied { actor: PersonaId, target: PersonaId },

	#[error("persona not found: {0}")]
	PersonaNotFound(PersonaId),

	#[error(transparent)]
	Directory(#[from] DirectoryError),
}

impl SessionAuthError {
	/// True when the identity provider could not be reached, as opposed to
	/// having given an answer.
	pub fn is_unavailable(&self) -> bool {
		matches!(
			self,
			SessionAuthError::Token(TokenError::Timeout | TokenError::Network(_))
				| SessionAuthError::Credential(CredentialError::Timeout | CredentialError::Network(_))
		)
	}
}

pub type Result<T> = std::result::Result<T, SessionAuthError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejected_token_message_includes_description() {
		let err = TokenError::Rejected {
			error: "invalid_token".to_string(),
			description: Some("Token expired".to_string()),
		};
		assert_eq!(
			err.to_string(),
			"token rejected by the authentication server: invalid_token (Token expired)"
		);

		let bare = TokenError::Rejected {
			error: "invalid_token".to_string(),
			description: None,
		};
		assert_eq!(
			bare.to_string(),
			"token rejected by the authentication server: invalid_token"
		);
	}

	#[test]
	fn collaborator_errors_surface_verbatim() {
		let err: SessionAuthError = CredentialError::Rejected("invalid_grant".to_string()).into();
		assert_eq!(
			err.to_string(),
			"credentials rejected by the authentication server: invalid_grant"
		);
	}

	#[test]
	fn unavailable_classification() {
		assert!(SessionAuthError::from(TokenError::Timeout).is_unavailable());
		assert!(SessionAuthError::from(CredentialError::Network("refused".into())).is_unavailable());
		assert!(!SessionAuthError::AuthenticationRequired.is_unavailable());
	}
}
