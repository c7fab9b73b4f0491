// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization for the accounts services.
//!
//! The decision itself is the pure [`is_allowed`] function over a pre-loaded
//! [`AccessRequest`]. [`PermissionChecker`] builds requests from an
//! [`AccountsStore`](accounts_core::AccountsStore) and adds the
//! organization membership, ownership and impersonation rules.

pub mod checker;
pub mod engine;
pub mod error;
pub mod membership;
pub mod types;

pub use checker::PermissionChecker;
pub use engine::{evaluate, is_allowed};
pub use error::{AuthzError, Result};
pub use types::{AccessRequest, ChainLevel, Decision};
