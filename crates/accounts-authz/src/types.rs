// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pre-loaded attributes for a single access decision.
//!
//! Everything the engine needs is gathered into an [`AccessRequest`] before
//! evaluation, so [`is_allowed`](crate::is_allowed) never touches a store and
//! can be tested and logged in isolation.

use std::collections::BTreeSet;

use accounts_core::{OperationId, PersonaId, ResourceId, RoleId};
use serde::{Deserialize, Serialize};

/// The roles a persona holds on one resource of the ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLevel {
	pub resource: ResourceId,
	pub roles: BTreeSet<RoleId>,
}

impl ChainLevel {
	pub fn new(resource: ResourceId) -> Self {
		Self {
			resource,
			roles: BTreeSet::new(),
		}
	}

	pub fn with_role(mut self, role: RoleId) -> Self {
		self.roles.insert(role);
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
	pub persona: PersonaId,
	pub operation: OperationId,
	/// Owner found by walking the parent chain to the root.
	pub root_owner: PersonaId,
	/// The target resource first, then its parent, up to the root.
	pub chain: Vec<ChainLevel>,
	/// Roles that carry a permission for `operation`.
	pub permitted_roles: BTreeSet<RoleId>,
}

impl AccessRequest {
	pub fn new(persona: PersonaId, operation: OperationId, root_owner: PersonaId) -> Self {
		Self {
			persona,
			operation,
			root_owner,
			chain: Vec::new(),
			permitted_roles: BTreeSet::new(),
		}
	}

	/// Appends the next level going up the tree.
	pub fn with_level(mut self, level: ChainLevel) -> Self {
		self.chain.push(level);
		self
	}

	pub fn permitting(mut self, role: RoleId) -> Self {
		self.permitted_roles.insert(role);
		self
	}

	pub fn resource(&self) -> Option<&ResourceId> {
		self.chain.first().map(|level| &level.resource)
	}

	pub fn is_root_owner(&self) -> bool {
		self.persona == self.root_owner
	}
}

/// Why a request was allowed or denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
	/// The persona is the root owner of the resource.
	Owner,
	/// A role held on `resource` (the target or an ancestor) carries the permission.
	Role { resource: ResourceId, role: RoleId },
	Denied,
}

impl Decision {
	pub fn is_allowed(&self) -> bool {
		!matches!(self, Decision::Denied)
	}
}
