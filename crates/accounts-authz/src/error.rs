// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use accounts_core::AccountsError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
	#[error("unknown operation: {0}")]
	UnknownOperation(String),

	#[error(transparent)]
	Store(#[from] AccountsError),
}

pub type Result<T> = std::result::Result<T, AuthzError>;
