// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fluent configuration of which roles may perform an operation.
//!
//! ```ignore
//! OperationSetup::new(&store, "metric-create")
//!     .add(&super_user)
//!     .add(&maintainer)
//!     .persist()
//!     .await?;
//! ```

use std::collections::BTreeSet;

use tracing::info;

use crate::access::{Operation, Permission, Role};
use crate::error::Result;
use crate::store::AccountsStore;
use crate::types::RoleId;

/// Collects roles and replaces the operation's permitted-role set on
/// [`persist`](Self::persist). The operation is created on first use.
pub struct OperationSetup<'a, S: AccountsStore + ?Sized> {
	store: &'a S,
	operation: String,
	roles: BTreeSet<RoleId>,
}

impl<'a, S: AccountsStore + ?Sized> OperationSetup<'a, S> {
	pub fn new(store: &'a S, operation: impl Into<String>) -> Self {
		Self {
			store,
			operation: operation.into(),
			roles: BTreeSet::new(),
		}
	}

	pub fn add(mut self, role: &Role) -> Self {
		self.roles.insert(role.id.clone());
		self
	}

	pub fn add_id(mut self, role: RoleId) -> Self {
		self.roles.insert(role);
		self
	}

	/// Drops every role collected so far. Persisting right after `clear`
	/// leaves the operation with no permitted roles.
	pub fn clear(mut self) -> Self {
		self.roles.clear();
		self
	}

	pub async fn persist(self) -> Result<(Operation, Vec<Permission>)> {
		let operation = match self.store.operation_by_name(&self.operation).await? {
			Some(existing) => existing,
			None => {
				self.store
					.create_operation(Operation::new(self.operation.clone()))
					.await?
			}
		};
		let permissions = self
			.store
			.replace_permitted_roles(&operation.id, &self.roles)
			.await?;
		info!(
			operation = %operation.name,
			roles = permissions.len(),
			"operation permissions configured"
		);
		Ok((operation, permissions))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;

	#[tokio::test]
	async fn persist_creates_operation_and_permissions() {
		let store = MemoryStore::new();
		let super_user = store.create_role(Role::new("SuperUser", "")).await.unwrap();
		let auditor = store.create_role(Role::new("Auditor", "")).await.unwrap();

		let (op, permissions) = OperationSetup::new(&store, "metric-read")
			.add(&super_user)
			.add(&auditor)
			.add(&auditor)
			.persist()
			.await
			.unwrap();
		assert_eq!(op.name, "metric-read");
		assert_eq!(permissions.len(), 2);

		let roles = store.permitted_roles(&op.id).await.unwrap();
		assert!(roles.contains(&super_user.id));
		assert!(roles.contains(&auditor.id));
	}

	#[tokio::test]
	async fn persist_replaces_previous_roles() {
		let store = MemoryStore::new();
		let super_user = store.create_role(Role::new("SuperUser", "")).await.unwrap();
		let auditor = store.create_role(Role::new("Auditor", "")).await.unwrap();

		OperationSetup::new(&store, "metric-delete")
			.add(&super_user)
			.add(&auditor)
			.persist()
			.await
			.unwrap();
		let (op, _) = OperationSetup::new(&store, "metric-delete")
			.add(&auditor)
			.clear()
			.add(&super_user)
			.persist()
			.await
			.unwrap();

		let roles = store.permitted_roles(&op.id).await.unwrap();
		assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec![super_user.id]);
	}

	#[tokio::test]
	async fn unknown_role_fails_without_partial_update() {
		let store = MemoryStore::new();
		let super_user = store.create_role(Role::new("SuperUser", "")).await.unwrap();
		let (op, _) = OperationSetup::new(&store, "metric-create")
			.add(&super_user)
			.persist()
			.await
			.unwrap();

		let err = OperationSetup::new(&store, "metric-create")
			.add_id(RoleId::new("ghost"))
			.persist()
			.await
			.unwrap_err();
		assert!(err.is_not_found());
		assert_eq!(store.permitted_roles(&op.id).await.unwrap().len(), 1);
	}
}
