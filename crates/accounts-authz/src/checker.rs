// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store-backed permission checks.
//!
//! [`PermissionChecker`] loads an [`AccessRequest`] from an [`AccountsStore`]
//! and hands it to the pure engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use accounts_core::{AccountsStore, OperationId, PersonaId, ResourceId, RoleId};
use tracing::{info, instrument};

use crate::engine;
use crate::error::{AuthzError, Result};
use crate::membership;
use crate::types::{AccessRequest, ChainLevel, Decision};

#[derive(Clone)]
pub struct PermissionChecker {
	store: Arc<dyn AccountsStore>,
}

impl PermissionChecker {
	pub fn new(store: Arc<dyn AccountsStore>) -> Self {
		Self { store }
	}

	pub fn store(&self) -> &Arc<dyn AccountsStore> {
		&self.store
	}

	/// Gathers the root owner, the persona's roles on `resource` and each of
	/// its ancestors, and the roles permitted for `operation`.
	pub async fn access_request(
		&self,
		persona: &PersonaId,
		operation: &OperationId,
		resource: &ResourceId,
	) -> Result<AccessRequest> {
		let root_owner = self.store.resolve_root_owner(resource).await?;
		let mut request = AccessRequest::new(persona.clone(), operation.clone(), root_owner);

		for level in self.chain(resource).await? {
			let roles = self.roles_on(persona, &level).await?;
			request = request.with_level(ChainLevel {
				resource: level,
				roles,
			});
		}

		request.permitted_roles = self.store.permitted_roles(operation).await?;
		Ok(request)
	}

	#[instrument(skip(self), fields(persona = %persona, operation = %operation, resource = %resource))]
	pub async fn decide(
		&self,
		persona: &PersonaId,
		operation: &OperationId,
		resource: &ResourceId,
	) -> Result<Decision> {
		let request = self.access_request(persona, operation, resource).await?;
		Ok(engine::evaluate(&request))
	}

	pub async fn is_allowed(
		&self,
		persona: &PersonaId,
		operation: &OperationId,
		resource: &ResourceId,
	) -> Result<bool> {
		Ok(self.decide(persona, operation, resource).await?.is_allowed())
	}

	/// Like [`is_allowed`](Self::is_allowed) but looks the operation up by name.
	pub async fn is_allowed_by_name(
		&self,
		persona: &PersonaId,
		operation: &str,
		resource: &ResourceId,
	) -> Result<bool> {
		let op = self
			.store
			.operation_by_name(operation)
			.await?
			.ok_or_else(|| AuthzError::UnknownOperation(operation.to_string()))?;
		let allowed = self.is_allowed(persona, &op.id, resource).await?;
		if !allowed {
			info!(persona = %persona, operation, resource = %resource, "operation denied");
		}
		Ok(allowed)
	}

	/// Roles `persona` holds on `resource` or any of its ancestors.
	pub async fn effective_roles(
		&self,
		persona: &PersonaId,
		resource: &ResourceId,
	) -> Result<BTreeSet<RoleId>> {
		let mut roles = BTreeSet::new();
		for level in self.chain(resource).await? {
			roles.extend(self.roles_on(persona, &level).await?);
		}
		Ok(roles)
	}

	/// Ownership-based access: the persona is the root owner, or belongs to
	/// the organization that is.
	#[instrument(skip(self), fields(persona = %persona, resource = %resource))]
	pub async fn has_access_to(&self, persona: &PersonaId, resource: &ResourceId) -> Result<bool> {
		let owner = self.store.resolve_root_owner(resource).await?;
		if &owner == persona {
			return Ok(true);
		}
		membership::is_member_of(self.store.as_ref(), persona, &owner).await
	}

	pub async fn is_member_of(&self, member: &PersonaId, organization: &PersonaId) -> Result<bool> {
		membership::is_member_of(self.store.as_ref(), member, organization).await
	}

	pub async fn is_owner_of(&self, candidate: &PersonaId, organization: &PersonaId) -> Result<bool> {
		membership::is_owner_of(self.store.as_ref(), candidate, organization).await
	}

	pub async fn can_impersonate(&self, actor: &PersonaId, target: &PersonaId) -> Result<bool> {
		membership::can_impersonate(self.store.as_ref(), actor, target).await
	}

	async fn chain(&self, resource: &ResourceId) -> Result<Vec<ResourceId>> {
		let mut chain = vec![resource.clone()];
		chain.extend(self.store.ancestors_of(resource).await?);
		Ok(chain)
	}

	async fn roles_on(&self, persona: &PersonaId, resource: &ResourceId) -> Result<BTreeSet<RoleId>> {
		Ok(self
			.store
			.grants_for(persona, resource)
			.await?
			.into_iter()
			.map(|grant| grant.role)
			.collect())
	}
}
