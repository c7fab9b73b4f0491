// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persona directory and impersonation rule backed by the accounts store.

use std::sync::Arc;

use accounts_authz::PermissionChecker;
use accounts_core::{AccountsStore, Persona, PersonaId};
use async_trait::async_trait;

use crate::collaborators::{ImpersonationPolicy, PersonaDirectory};
use crate::error::DirectoryError;

/// Users are materialized on first sight, keyed by the token subject.
pub struct StoreDirectory {
	checker: PermissionChecker,
}

impl StoreDirectory {
	pub fn new(store: Arc<dyn AccountsStore>) -> Self {
		Self {
			checker: PermissionChecker::new(store),
		}
	}

	pub fn checker(&self) -> &PermissionChecker {
		&self.checker
	}
}

#[async_trait]
impl PersonaDirectory for StoreDirectory {
	async fn get_persona(&self, id: &PersonaId) -> Result<Option<Persona>, DirectoryError> {
		Ok(self.checker.store().get_persona(id).await?)
	}

	/// An existing organization is returned as-is; callers decide whether it
	/// may authenticate.
	async fn get_or_create_persona(&self, external_id: &str) -> Result<Persona, DirectoryError> {
		let id = PersonaId::from(external_id);
		if let Some(existing) = self.checker.store().get_persona(&id).await? {
			if existing.is_organization() {
				return Ok(existing);
			}
		}
		Ok(self.checker.store().get_or_create_user(&id, external_id).await?)
	}
}

#[async_trait]
impl ImpersonationPolicy for StoreDirectory {
	async fn is_allowed_to_impersonate(
		&self,
		actor: &Persona,
		target: &Persona,
	) -> Result<bool, DirectoryError> {
		Ok(self.checker.can_impersonate(actor.id(), target.id()).await?)
	}
}
