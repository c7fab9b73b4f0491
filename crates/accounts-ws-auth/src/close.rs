// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Websocket close codes for failed authentication.

use crate::error::{CredentialError, SessionAuthError, TokenError};

/// Application close codes, in the private 4000-4999 range.
pub mod close_codes {
	pub const AUTH_REQUIRED: u16 = 4001;
	pub const AUTH_INVALID: u16 = 4002;
	pub const IMPERSONATION_DENIED: u16 = 4003;
	pub const PERSONA_NOT_FOUND: u16 = 4004;
	pub const INVALID_MESSAGE: u16 = 4005;
	pub const AUTH_SERVER_UNAVAILABLE: u16 = 4006;
}

pub fn close_code_for_error(err: &SessionAuthError) -> u16 {
	match err {
		SessionAuthError::AuthenticationRequired => close_codes::AUTH_REQUIRED,
		SessionAuthError::MissingSubject
		| SessionAuthError::OrganizationSubject(_)
		| SessionAuthError::Token(TokenError::Rejected { .. } | TokenError::Expired)
		| SessionAuthError::Credential(CredentialError::Rejected(_)) => close_codes::AUTH_INVALID,
		SessionAuthError::ImpersonationDenied { .. } => close_codes::IMPERSONATION_DENIED,
		SessionAuthError::PersonaNotFound(_) => close_codes::PERSONA_NOT_FOUND,
		SessionAuthError::InvalidAuthMessage(_)
		| SessionAuthError::Token(TokenError::Malformed(_))
		| SessionAuthError::Credential(CredentialError::Malformed(_)) => close_codes::INVALID_MESSAGE,
		SessionAuthError::Token(TokenError::Timeout | TokenError::Network(_))
		| SessionAuthError::Credential(CredentialError::Timeout | CredentialError::Network(_))
		| SessionAuthError::Directory(_) => close_codes::AUTH_SERVER_UNAVAILABLE,
	}
}

/// Close reason sent with the code. Websocket reasons are capped at 123 bytes.
pub fn close_reason(err: &SessionAuthError) -> String {
	const MAX: usize = 123;
	let mut reason = err.to_string();
	if reason.len() > MAX {
		let mut end = MAX;
		while !reason.is_char_boundary(end) {
			end -= 1;
		}
		reason.truncate(end);
	}
	reason
}
