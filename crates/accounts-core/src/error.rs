// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity model error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountsError {
	/// A structural invariant would be violated. Always a caller bug; the
	/// operation has no effect.
	#[error("invalid state: {0}")]
	InvalidState(String),

	#[error("{kind} not found: {id}")]
	NotFound { kind: &'static str, id: String },

	#[error("{kind} already exists: {key}")]
	Conflict { kind: &'static str, key: String },

	#[error("internal error: {0}")]
	Internal(String),
}

impl AccountsError {
	pub fn invalid_state(message: impl Into<String>) -> Self {
		Self::InvalidState(message.into())
	}

	pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
		Self::NotFound {
			kind,
			id: id.to_string(),
		}
	}

	pub fn conflict(kind: &'static str, key: impl ToString) -> Self {
		Self::Conflict {
			kind,
			key: key.to_string(),
		}
	}

	pub fn is_invalid_state(&self) -> bool {
		matches!(self, Self::InvalidState(_))
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}

pub type Result<T> = std::result::Result<T, AccountsError>;
