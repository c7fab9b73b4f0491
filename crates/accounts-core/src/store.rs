// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity store.
//!
//! [`AccountsStore`] is the persistence seam for personas, the resource
//! hierarchy, roles, operations, permissions and grants. [`MemoryStore`] keeps
//! everything behind one `RwLock`; every mutating call does its validation and
//! its writes inside a single write-guard, so readers observe either the whole
//! change or none of it.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::access::{Grant, Operation, Permission, Role};
use crate::error::{AccountsError, Result};
use crate::hierarchy::Hierarchy;
use crate::persona::{Organization, Persona, User};
use crate::resource::Resource;
use crate::types::{GrantId, OperationId, PermissionId, PersonaId, ResourceId, RoleId};

/// Result of [`AccountsStore::transfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
	pub resource: Resource,
	pub previous_owner: PersonaId,
}

#[async_trait]
pub trait AccountsStore: Send + Sync {
	// Personas
	async fn create_persona(&self, persona: Persona) -> Result<Persona>;
	async fn get_persona(&self, id: &PersonaId) -> Result<Option<Persona>>;
	/// Returns the persona with `id`, creating a [`User`] named `name` if none exists.
	/// An organization with that id is a `Conflict`.
	async fn get_or_create_user(&self, id: &PersonaId, name: &str) -> Result<Persona>;
	/// Refused while the persona directly owns resources or organizations.
	/// Memberships are dropped; grants are left in place.
	async fn remove_persona(&self, id: &PersonaId) -> Result<Persona>;
	async fn add_member(&self, organization: &PersonaId, member: &PersonaId) -> Result<bool>;
	async fn remove_member(&self, organization: &PersonaId, member: &PersonaId) -> Result<bool>;
	/// Organizations that list `member` directly.
	async fn organizations_of(&self, member: &PersonaId) -> Result<Vec<Organization>>;

	// Resources
	async fn create_resource(&self, resource: Resource) -> Result<Resource>;
	async fn get_resource(&self, id: &ResourceId) -> Result<Option<Resource>>;
	/// Refused while sub-resources exist. Grants on the resource are kept.
	async fn remove_resource(&self, id: &ResourceId) -> Result<Resource>;
	async fn set_parent(
		&self,
		id: &ResourceId,
		parent: Option<&ResourceId>,
		owner: Option<&PersonaId>,
	) -> Result<Resource>;
	async fn set_owner(&self, id: &ResourceId, owner: Option<&PersonaId>) -> Result<Resource>;
	async fn sub_resources_of(&self, id: &ResourceId) -> Result<Vec<Resource>>;
	async fn resolve_root_owner(&self, id: &ResourceId) -> Result<PersonaId>;
	async fn ancestors_of(&self, id: &ResourceId) -> Result<Vec<ResourceId>>;
	async fn resources_owned_by(&self, owner: &PersonaId) -> Result<Vec<Resource>>;
	async fn transfer(&self, id: &ResourceId, new_owner: &PersonaId) -> Result<Transfer>;

	// Roles
	async fn create_role(&self, role: Role) -> Result<Role>;
	async fn get_role(&self, id: &RoleId) -> Result<Option<Role>>;
	async fn role_by_name(&self, name: &str) -> Result<Option<Role>>;
	async fn remove_role(&self, id: &RoleId) -> Result<Role>;

	// Operations
	async fn create_operation(&self, operation: Operation) -> Result<Operation>;
	async fn get_operation(&self, id: &OperationId) -> Result<Option<Operation>>;
	async fn operation_by_name(&self, name: &str) -> Result<Option<Operation>>;
	async fn remove_operation(&self, id: &OperationId) -> Result<Operation>;

	// Permissions
	/// Returns the existing permission when the pair is already present.
	async fn create_permission(&self, operation: &OperationId, role: &RoleId) -> Result<Permission>;
	async fn remove_permission(&self, id: &PermissionId) -> Result<Permission>;
	async fn permitted_roles(&self, operation: &OperationId) -> Result<BTreeSet<RoleId>>;
	async fn permissions_for_operation(&self, operation: &OperationId) -> Result<Vec<Permission>>;
	/// Makes `roles` the exact set of roles permitted for `operation`.
	async fn replace_permitted_roles(
		&self,
		operation: &OperationId,
		roles: &BTreeSet<RoleId>,
	) -> Result<Vec<Permission>>;

	// Grants
	async fn create_grant(
		&self,
		persona: &PersonaId,
		role: &RoleId,
		resource: &ResourceId,
	) -> Result<Grant>;
	/// Like [`create_grant`](Self::create_grant) but returns an identical
	/// existing grant instead of adding a duplicate.
	async fn ensure_grant(
		&self,
		persona: &PersonaId,
		role: &RoleId,
		resource: &ResourceId,
	) -> Result<Grant>;
	async fn remove_grant(&self, id: &GrantId) -> Result<Grant>;
	async fn grants_for(&self, persona: &PersonaId, resource: &ResourceId) -> Result<Vec<Grant>>;
	async fn grants_on_resource(&self, resource: &ResourceId) -> Result<Vec<Grant>>;
	async fn grants_for_persona(&self, persona: &PersonaId) -> Result<Vec<Grant>>;
	/// Removes every grant `persona` holds on `resource`; returns how many.
	async fn revoke_all(&self, persona: &PersonaId, resource: &ResourceId) -> Result<usize>;
}

#[derive(Debug, Default)]
struct State {
	personas: BTreeMap<PersonaId, Persona>,
	hierarchy: Hierarchy,
	roles: BTreeMap<RoleId, Role>,
	operations: BTreeMap<OperationId, Operation>,
	permissions: BTreeMap<PermissionId, Permission>,
	grants: BTreeMap<GrantId, Grant>,
}

impl State {
	fn require_persona(&self, id: &PersonaId) -> Result<&Persona> {
		self.personas
			.get(id)
			.ok_or_else(|| AccountsError::not_found("persona", id))
	}

	fn require_role(&self, id: &RoleId) -> Result<&Role> {
		self.roles
			.get(id)
			.ok_or_else(|| AccountsError::not_found("role", id))
	}

	fn require_operation(&self, id: &OperationId) -> Result<&Operation> {
		self.operations
			.get(id)
			.ok_or_else(|| AccountsError::not_found("operation", id))
	}

	fn require_resource(&self, id: &ResourceId) -> Result<&Resource> {
		self.hierarchy
			.get(id)
			.ok_or_else(|| AccountsError::not_found("resource", id))
	}

	fn organization_mut(&mut self, id: &PersonaId) -> Result<&mut Organization> {
		self.personas
			.get_mut(id)
			.ok_or_else(|| AccountsError::not_found("persona", id))?
			.as_organization_mut()
			.ok_or_else(|| AccountsError::invalid_state(format!("persona {id} is not an organization")))
	}

	fn find_permission(&self, operation: &OperationId, role: &RoleId) -> Option<&Permission> {
		self.permissions
			.values()
			.find(|p| &p.operation == operation && &p.role == role)
	}

	fn check_grant_refs(
		&self,
		persona: &PersonaId,
		role: &RoleId,
		resource: &ResourceId,
	) -> Result<()> {
		self.require_persona(persona)?;
		self.require_role(role)?;
		self.require_resource(resource)?;
		Ok(())
	}
}

/// In-memory [`AccountsStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
	state: RwLock<State>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl AccountsStore for MemoryStore {
	#[instrument(skip(self, persona), fields(persona_id = %persona.id()))]
	async fn create_persona(&self, persona: Persona) -> Result<Persona> {
		let mut state = self.state.write().await;
		if state.personas.contains_key(persona.id()) {
			return Err(AccountsError::conflict("persona", persona.id()));
		}
		if let Persona::Organization(org) = &persona {
			if org.owner == org.id {
				return Err(AccountsError::invalid_state(format!(
					"organization {} cannot own itself",
					org.id
				)));
			}
			state.require_persona(&org.owner)?;
			for member in org.members() {
				if member == &org.id {
					return Err(AccountsError::invalid_state(format!(
						"organization {} cannot be its own member",
						org.id
					)));
				}
				state.require_persona(member)?;
			}
		}
		state.personas.insert(persona.id().clone(), persona.clone());
		debug!("persona created");
		Ok(persona)
	}

	async fn get_persona(&self, id: &PersonaId) -> Result<Option<Persona>> {
		Ok(self.state.read().await.personas.get(id).cloned())
	}

	#[instrument(skip(self, name), fields(persona_id = %id))]
	async fn get_or_create_user(&self, id: &PersonaId, name: &str) -> Result<Persona> {
		let mut state = self.state.write().await;
		if let Some(existing) = state.personas.get(id) {
			if existing.is_organization() {
				return Err(AccountsError::conflict("user", id));
			}
			return Ok(existing.clone());
		}
		let persona = Persona::User(User::new(id.clone(), name));
		state.personas.insert(id.clone(), persona.clone());
		debug!("user materialized on first sight");
		Ok(persona)
	}

	#[instrument(skip(self), fields(persona_id = %id))]
	async fn remove_persona(&self, id: &PersonaId) -> Result<Persona> {
		let mut state = self.state.write().await;
		state.require_persona(id)?;
		if !state.hierarchy.owned_by(id).is_empty() {
			return Err(AccountsError::invalid_state(format!(
				"persona {id} still owns resources"
			)));
		}
		let owns_orgs = state
			.personas
			.values()
			.filter_map(Persona::as_organization)
			.any(|org| &org.owner == id);
		if owns_orgs {
			return Err(AccountsError::invalid_state(format!(
				"persona {id} still owns organizations"
			)));
		}

		let removed = state
			.personas
			.remove(id)
			.ok_or_else(|| AccountsError::not_found("persona", id))?;
		for persona in state.personas.values_mut() {
			if let Some(org) = persona.as_organization_mut() {
				org.remove_member(id);
			}
		}
		debug!("persona removed");
		Ok(removed)
	}

	#[instrument(skip(self), fields(organization = %organization, member = %member))]
	async fn add_member(&self, organization: &PersonaId, member: &PersonaId) -> Result<bool> {
		let mut state = self.state.write().await;
		if organization == member {
			return Err(AccountsError::invalid_state(format!(
				"organization {organization} cannot be its own member"
			)));
		}
		state.require_persona(member)?;
		let added = state.organization_mut(organization)?.add_member(member.clone());
		debug!(added, "membership updated");
		Ok(added)
	}

	#[instrument(skip(self), fields(organization = %organization, member = %member))]
	async fn remove_member(&self, organization: &PersonaId, member: &PersonaId) -> Result<bool> {
		let mut state = self.state.write().await;
		let removed = state.organization_mut(organization)?.remove_member(member);
		debug!(removed, "membership updated");
		Ok(removed)
	}

	async fn organizations_of(&self, member: &PersonaId) -> Result<Vec<Organization>> {
		let state = self.state.read().await;
		Ok(state
			.personas
			.values()
			.filter_map(Persona::as_organization)
			.filter(|org| org.has_member(member))
			.cloned()
			.collect())
	}

	#[instrument(skip(self, resource), fields(resource_id = %resource.id))]
	async fn create_resource(&self, resource: Resource) -> Result<Resource> {
		let mut state = self.state.write().await;
		if let Some(owner) = resource.owner() {
			state.require_persona(owner)?;
		}
		let created = state.hierarchy.insert(resource)?.clone();
		debug!("resource created");
		Ok(created)
	}

	async fn get_resource(&self, id: &ResourceId) -> Result<Option<Resource>> {
		Ok(self.state.read().await.hierarchy.get(id).cloned())
	}

	#[instrument(skip(self), fields(resource_id = %id))]
	async fn remove_resource(&self, id: &ResourceId) -> Result<Resource> {
		let removed = self.state.write().await.hierarchy.remove(id)?;
		debug!("resource removed");
		Ok(removed)
	}

	#[instrument(skip(self), fields(resource_id = %id))]
	async fn set_parent(
		&self,
		id: &ResourceId,
		parent: Option<&ResourceId>,
		owner: Option<&PersonaId>,
	) -> Result<Resource> {
		let mut state = self.state.write().await;
		if let Some(owner) = owner {
			state.require_persona(owner)?;
		}
		Ok(state.hierarchy.set_parent(id, parent, owner)?.clone())
	}

	#[instrument(skip(self), fields(resource_id = %id))]
	async fn set_owner(&self, id: &ResourceId, owner: Option<&PersonaId>) -> Result<Resource> {
		let mut state = self.state.write().await;
		if let Some(owner) = owner {
			state.require_persona(owner)?;
		}
		Ok(state.hierarchy.set_owner(id, owner)?.clone())
	}

	async fn sub_resources_of(&self, id: &ResourceId) -> Result<Vec<Resource>> {
		let state = self.state.read().await;
		Ok(state
			.hierarchy
			.sub_resources_of(id)?
			.into_iter()
			.cloned()
			.collect())
	}

	async fn resolve_root_owner(&self, id: &ResourceId) -> Result<PersonaId> {
		self.state.read().await.hierarchy.resolve_root_owner(id)
	}

	async fn ancestors_of(&self, id: &ResourceId) -> Result<Vec<ResourceId>> {
		self.state.read().await.hierarchy.ancestors_of(id)
	}

	async fn resources_owned_by(&self, owner: &PersonaId) -> Result<Vec<Resource>> {
		let state = self.state.read().await;
		Ok(state.hierarchy.owned_by(owner).into_iter().cloned().collect())
	}

	#[instrument(skip(self), fields(resource_id = %id, new_owner = %new_owner))]
	async fn transfer(&self, id: &ResourceId, new_owner: &PersonaId) -> Result<Transfer> {
		let mut state = self.state.write().await;
		state.require_persona(new_owner)?;
		let previous_owner = state.hierarchy.resolve_root_owner(id)?;
		let resource = state.hierarchy.set_owner(id, Some(new_owner))?.clone();
		debug!(previous_owner = %previous_owner, "resource transferred");
		Ok(Transfer {
			resource,
			previous_owner,
		})
	}

	#[instrument(skip(self, role), fields(role = %role.name))]
	async fn create_role(&self, role: Role) -> Result<Role> {
		let mut state = self.state.write().await;
		if state.roles.contains_key(&role.id) {
			return Err(AccountsError::conflict("role", &role.id));
		}
		if state.roles.values().any(|r| r.name == role.name) {
			return Err(AccountsError::conflict("role", &role.name));
		}
		state.roles.insert(role.id.clone(), role.clone());
		Ok(role)
	}

	async fn get_role(&self, id: &RoleId) -> Result<Option<Role>> {
		Ok(self.state.read().await.roles.get(id).cloned())
	}

	async fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
		let state = self.state.read().await;
		Ok(state.roles.values().find(|r| r.name == name).cloned())
	}

	#[instrument(skip(self), fields(role_id = %id))]
	async fn remove_role(&self, id: &RoleId) -> Result<Role> {
		let mut state = self.state.write().await;
		state.require_role(id)?;
		if state.permissions.values().any(|p| &p.role == id) {
			return Err(AccountsError::invalid_state(format!(
				"role {id} is still referenced by permissions"
			)));
		}
		if state.grants.values().any(|g| &g.role == id) {
			return Err(AccountsError::invalid_state(format!(
				"role {id} is still granted"
			)));
		}
		state
			.roles
			.remove(id)
			.ok_or_else(|| AccountsError::not_found("role", id))
	}

	#[instrument(skip(self, operation), fields(operation = %operation.name))]
	async fn create_operation(&self, operation: Operation) -> Result<Operation> {
		let mut state = self.state.write().await;
		if state.operations.contains_key(&operation.id) {
			return Err(AccountsError::conflict("operation", &operation.id));
		}
		if state.operations.values().any(|o| o.name == operation.name) {
			return Err(AccountsError::conflict("operation", &operation.name));
		}
		state
			.operations
			.insert(operation.id.clone(), operation.clone());
		Ok(operation)
	}

	async fn get_operation(&self, id: &OperationId) -> Result<Option<Operation>> {
		Ok(self.state.read().await.operations.get(id).cloned())
	}

	async fn operation_by_name(&self, name: &str) -> Result<Option<Operation>> {
		let state = self.state.read().await;
		Ok(state.operations.values().find(|o| o.name == name).cloned())
	}

	#[instrument(skip(self), fields(operation_id = %id))]
	async fn remove_operation(&self, id: &OperationId) -> Result<Operation> {
		let mut state = self.state.write().await;
		state.require_operation(id)?;
		if state.permissions.values().any(|p| &p.operation == id) {
			return Err(AccountsError::invalid_state(format!(
				"operation {id} is still referenced by permissions"
			)));
		}
		state
			.operations
			.remove(id)
			.ok_or_else(|| AccountsError::not_found("operation", id))
	}

	#[instrument(skip(self), fields(operation_id = %operation, role_id = %role))]
	async fn create_permission(&self, operation: &OperationId, role: &RoleId) -> Result<Permission> {
		let mut state = self.state.write().await;
		state.require_operation(operation)?;
		state.require_role(role)?;
		if let Some(existing) = state.find_permission(operation, role) {
			return Ok(existing.clone());
		}
		let permission = Permission::new(operation.clone(), role.clone());
		state
			.permissions
			.insert(permission.id.clone(), permission.clone());
		Ok(permission)
	}

	async fn remove_permission(&self, id: &PermissionId) -> Result<Permission> {
		self.state
			.write()
			.await
			.permissions
			.remove(id)
			.ok_or_else(|| AccountsError::not_found("permission", id))
	}

	async fn permitted_roles(&self, operation: &OperationId) -> Result<BTreeSet<RoleId>> {
		let state = self.state.read().await;
		state.require_operation(operation)?;
		Ok(state
			.permissions
			.values()
			.filter(|p| &p.operation == operation)
			.map(|p| p.role.clone())
			.collect())
	}

	async fn permissions_for_operation(&self, operation: &OperationId) -> Result<Vec<Permission>> {
		let state = self.state.read().await;
		state.require_operation(operation)?;
		Ok(state
			.permissions
			.values()
			.filter(|p| &p.operation == operation)
			.cloned()
			.collect())
	}

	#[instrument(skip(self, roles), fields(operation_id = %operation, roles = roles.len()))]
	async fn replace_permitted_roles(
		&self,
		operation: &OperationId,
		roles: &BTreeSet<RoleId>,
	) -> Result<Vec<Permission>> {
		let mut state = self.state.write().await;
		state.require_operation(operation)?;
		for role in roles {
			state.require_role(role)?;
		}

		state
			.permissions
			.retain(|_, p| &p.operation != operation || roles.contains(&p.role));
		for role in roles {
			if state.find_permission(operation, role).is_none() {
				let permission = Permission::new(operation.clone(), role.clone());
				state.permissions.insert(permission.id.clone(), permission);
			}
		}

		Ok(state
			.permissions
			.values()
			.filter(|p| &p.operation == operation)
			.cloned()
			.collect())
	}

	#[instrument(skip(self), fields(persona_id = %persona, role_id = %role, resource_id = %resource))]
	async fn create_grant(
		&self,
		persona: &PersonaId,
		role: &RoleId,
		resource: &ResourceId,
	) -> Result<Grant> {
		let mut state = self.state.write().await;
		state.check_grant_refs(persona, role, resource)?;
		let grant = Grant::new(persona.clone(), role.clone(), resource.clone());
		state.grants.insert(grant.id.clone(), grant.clone());
		debug!(grant_id = %grant.id, "role granted");
		Ok(grant)
	}

	#[instrument(skip(self), fields(persona_id = %persona, role_id = %role, resource_id = %resource))]
	async fn ensure_grant(
		&self,
		persona: &PersonaId,
		role: &RoleId,
		resource: &ResourceId,
	) -> Result<Grant> {
		let mut state = self.state.write().await;
		state.check_grant_refs(persona, role, resource)?;
		if let Some(existing) = state
			.grants
			.values()
			.find(|g| g.matches(persona, role, resource))
		{
			return Ok(existing.clone());
		}
		let grant = Grant::new(persona.clone(), role.clone(), resource.clone());
		state.grants.insert(grant.id.clone(), grant.clone());
		debug!(grant_id = %grant.id, "role granted");
		Ok(grant)
	}

	async fn remove_grant(&self, id: &GrantId) -> Result<Grant> {
		self.state
			.write()
			.await
			.grants
			.remove(id)
			.ok_or_else(|| AccountsError::not_found("grant", id))
	}

	async fn grants_for(&self, persona: &PersonaId, resource: &ResourceId) -> Result<Vec<Grant>> {
		let state = self.state.read().await;
		Ok(state
			.grants
			.values()
			.filter(|g| &g.persona == persona && &g.resource == resource)
			.cloned()
			.collect())
	}

	async fn grants_on_resource(&self, resource: &ResourceId) -> Result<Vec<Grant>> {
		let state = self.state.read().await;
		Ok(state
			.grants
			.values()
			.filter(|g| &g.resource == resource)
			.cloned()
			.collect())
	}

	async fn grants_for_persona(&self, persona: &PersonaId) -> Result<Vec<Grant>> {
		let state = self.state.read().await;
		Ok(state
			.grants
			.values()
			.filter(|g| &g.persona == persona)
			.cloned()
			.collect())
	}

	#[instrument(skip(self), fields(persona_id = %persona, resource_id = %resource))]
	async fn revoke_all(&self, persona: &PersonaId, resource: &ResourceId) -> Result<usize> {
		let mut state = self.state.write().await;
		let before = state.grants.len();
		state
			.grants
			.retain(|_, g| !(&g.persona == persona && &g.resource == resource));
		let revoked = before - state.grants.len();
		debug!(revoked, "grants revoked");
		Ok(revoked)
	}
}
