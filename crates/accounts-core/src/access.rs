// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Roles, operations, permissions and grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GrantId, OperationId, PermissionId, PersonaId, ResourceId, RoleId};

/// A named bundle of permitted operations, e.g. `SuperUser`. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	pub id: RoleId,
	pub name: String,
	pub description: String,
}

impl Role {
	pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			id: RoleId::generate(),
			name: name.into(),
			description: description.into(),
		}
	}

	pub fn with_id(mut self, id: RoleId) -> Self {
		self.id = id;
		self
	}
}

/// An independently authorized action, e.g. `metric-create`. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
	pub id: OperationId,
	pub name: String,
}

impl Operation {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: OperationId::generate(),
			name: name.into(),
		}
	}

	pub fn with_id(mut self, id: OperationId) -> Self {
		self.id = id;
		self
	}
}

/// "Holders of `role` may perform `operation`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
	pub id: PermissionId,
	pub operation: OperationId,
	pub role: RoleId,
}

impl Permission {
	pub fn new(operation: OperationId, role: RoleId) -> Self {
		Self {
			id: PermissionId::generate(),
			operation,
			role,
		}
	}
}

/// "`persona` holds `role` on `resource`." Identical tuples may coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
	pub id: GrantId,
	pub persona: PersonaId,
	pub role: RoleId,
	pub resource: ResourceId,
	pub created_at: DateTime<Utc>,
}

impl Grant {
	pub fn new(persona: PersonaId, role: RoleId, resource: ResourceId) -> Self {
		Self {
			id: GrantId::generate(),
			persona,
			role,
			resource,
			created_at: Utc::now(),
		}
	}

	pub fn matches(&self, persona: &PersonaId, role: &RoleId, resource: &ResourceId) -> bool {
		&self.persona == persona && &self.role == role && &self.resource == resource
	}
}
