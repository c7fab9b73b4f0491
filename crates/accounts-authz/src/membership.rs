// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization membership, ownership and impersonation rules.
//!
//! Organizations can own and contain other organizations, so membership is
//! resolved transitively. Each walk tracks visited organizations and stops on
//! repeats; membership graphs are not required to be acyclic.

use std::collections::{BTreeSet, VecDeque};

use accounts_core::{AccountsError, AccountsStore, Organization, Persona, PersonaId};
use tracing::{debug, instrument};

use crate::error::Result;

async fn organization(
	store: &dyn AccountsStore,
	id: &PersonaId,
) -> Result<Option<Organization>> {
	Ok(store
		.get_persona(id)
		.await?
		.and_then(|p| p.as_organization().cloned()))
}

/// Whether `candidate` is `organization` itself or sits anywhere on its
/// owner chain.
#[instrument(level = "debug", skip(store), fields(candidate = %candidate, organization = %organization))]
pub async fn is_owner_of(
	store: &dyn AccountsStore,
	candidate: &PersonaId,
	organization: &PersonaId,
) -> Result<bool> {
	let mut current = organization.clone();
	let mut visited = BTreeSet::new();

	loop {
		if &current == candidate {
			return Ok(true);
		}
		if !visited.insert(current.clone()) {
			return Ok(false);
		}
		match self::organization(store, &current).await? {
			Some(org) => current = org.owner,
			None => return Ok(false),
		}
	}
}

/// Whether `member` belongs to `organization`.
///
/// A persona belongs to an organization if it is a direct member, if it owns
/// the organization (directly or through an owning organization), if it
/// belongs to an organization that owns it, or if it belongs to an
/// organization that is one of its members.
#[instrument(level = "debug", skip(store), fields(member = %member, organization = %organization))]
pub async fn is_member_of(
	store: &dyn AccountsStore,
	member: &PersonaId,
	organization: &PersonaId,
) -> Result<bool> {
	let root = self::organization(store, organization).await?;
	let Some(root) = root else {
		return Ok(false);
	};

	let mut queue = VecDeque::from([root]);
	let mut visited = BTreeSet::new();

	while let Some(org) = queue.pop_front() {
		if !visited.insert(org.id.clone()) {
			continue;
		}
		if &org.owner == member || org.has_member(member) {
			debug!(via = %org.id, "membership found");
			return Ok(true);
		}

		if let Some(owner) = self::organization(store, &org.owner).await? {
			queue.push_back(owner);
		}
		for id in org.members() {
			if let Some(nested) = self::organization(store, id).await? {
				queue.push_back(nested);
			}
		}
	}

	Ok(false)
}

/// Whether `actor` may act as `target`.
///
/// Anyone may act as themselves. Acting as an organization requires belonging
/// to it. Acting as another user is never allowed.
#[instrument(level = "debug", skip(store), fields(actor = %actor, target = %target))]
pub async fn can_impersonate(
	store: &dyn AccountsStore,
	actor: &PersonaId,
	target: &PersonaId,
) -> Result<bool> {
	if actor == target {
		return Ok(true);
	}
	match store.get_persona(target).await? {
		Some(Persona::Organization(_)) => is_member_of(store, actor, target).await,
		Some(Persona::User(_)) => Ok(false),
		None => Err(AccountsError::not_found("persona", target).into()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use accounts_core::{MemoryStore, User};

	async fn user(store: &MemoryStore, id: &str) {
		store
			.create_persona(User::new(id.into(), id).into())
			.await
			.unwrap();
	}

	async fn org(store: &MemoryStore, id: &str, owner: &str) {
		store
			.create_persona(Organization::new(id.into(), id, owner.into()).into())
			.await
			.unwrap();
	}

	/// alice owns acme; acme owns acme-eu; bob is a member of acme;
	/// the ops org is a member of acme-eu and carol belongs to ops.
	async fn fixture() -> MemoryStore {
		let store = MemoryStore::new();
		for id in ["alice", "bob", "carol", "dave"] {
			user(&store, id).await;
		}
		org(&store, "acme", "alice").await;
		org(&store, "acme-eu", "acme").await;
		org(&store, "ops", "dave").await;
		store.add_member(&"acme".into(), &"bob".into()).await.unwrap();
		store.add_member(&"acme-eu".into(), &"ops".into()).await.unwrap();
		store.add_member(&"ops".into(), &"carol".into()).await.unwrap();
		store
	}

	#[tokio::test]
	async fn ownership_follows_owner_chain() {
		let store = fixture().await;
		assert!(is_owner_of(&store, &"alice".into(), &"acme-eu".into()).await.unwrap());
		assert!(is_owner_of(&store, &"acme".into(), &"acme-eu".into()).await.unwrap());
		assert!(is_owner_of(&store, &"acme-eu".into(), &"acme-eu".into()).await.unwrap());
		assert!(!is_owner_of(&store, &"bob".into(), &"acme-eu".into()).await.unwrap());
	}

	#[tokio::test]
	async fn membership_rules() {
		let store = fixture().await;
		// direct member
		assert!(is_member_of(&store, &"bob".into(), &"acme".into()).await.unwrap());
		// owner
		assert!(is_member_of(&store, &"alice".into(), &"acme".into()).await.unwrap());
		// owner of the owning organization
		assert!(is_member_of(&store, &"alice".into(), &"acme-eu".into()).await.unwrap());
		// member of the owning organization
		assert!(is_member_of(&store, &"bob".into(), &"acme-eu".into()).await.unwrap());
		// member of a member organization
		assert!(is_member_of(&store, &"carol".into(), &"acme-eu".into()).await.unwrap());
		// membership does not flow upwards
		assert!(!is_member_of(&store, &"carol".into(), &"acme".into()).await.unwrap());
		// a user has no members
		assert!(!is_member_of(&store, &"bob".into(), &"alice".into()).await.unwrap());
	}

	#[tokio::test]
	async fn membership_cycles_terminate() {
		let store = fixture().await;
		store.add_member(&"ops".into(), &"acme-eu".into()).await.unwrap();
		assert!(!is_member_of(&store, &"nobody".into(), &"acme-eu".into()).await.unwrap());
		assert!(is_member_of(&store, &"carol".into(), &"acme-eu".into()).await.unwrap());
	}

	#[tokio::test]
	async fn impersonation_rules() {
		let store = fixture().await;
		assert!(can_impersonate(&store, &"bob".into(), &"bob".into()).await.unwrap());
		assert!(can_impersonate(&store, &"bob".into(), &"acme".into()).await.unwrap());
		assert!(can_impersonate(&store, &"alice".into(), &"acme-eu".into()).await.unwrap());
		assert!(!can_impersonate(&store, &"bob".into(), &"ops".into()).await.unwrap());
		assert!(!can_impersonate(&store, &"bob".into(), &"alice".into()).await.unwrap());

		let err = can_impersonate(&store, &"bob".into(), &"ghost".into())
			.await
			.unwrap_err();
		assert!(matches!(err, crate::AuthzError::Store(e) if e.is_not_found()));
	}
}
