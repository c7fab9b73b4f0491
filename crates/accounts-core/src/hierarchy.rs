// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource ownership tree.
//!
//! [`Hierarchy`] owns every resource together with a child index keyed by
//! parent id. Each mutation updates the resource link and the child index in
//! the same `&mut self` call, so a caller holding the hierarchy behind a lock
//! never exposes a half-applied re-parent.
//!
//! Persona existence is not checked here; that is the store's job.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{AccountsError, Result};
use crate::resource::{Resource, ResourceLink};
use crate::types::{PersonaId, ResourceId};

#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
	resources: BTreeMap<ResourceId, Resource>,
	children: BTreeMap<ResourceId, BTreeSet<ResourceId>>,
}

impl Hierarchy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.resources.len()
	}

	pub fn is_empty(&self) -> bool {
		self.resources.is_empty()
	}

	pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
		self.resources.get(id)
	}

	pub fn contains(&self, id: &ResourceId) -> bool {
		self.resources.contains_key(id)
	}

	fn require(&self, id: &ResourceId) -> Result<&Resource> {
		self.resources
			.get(id)
			.ok_or_else(|| AccountsError::not_found("resource", id))
	}

	pub fn insert(&mut self, resource: Resource) -> Result<&Resource> {
		if self.resources.contains_key(&resource.id) {
			return Err(AccountsError::conflict("resource", &resource.id));
		}
		if let Some(parent) = resource.parent() {
			self.require(parent)?;
			self.children
				.entry(parent.clone())
				.or_default()
				.insert(resource.id.clone());
		}
		let id = resource.id.clone();
		Ok(&*self.resources.entry(id).or_insert(resource))
	}

	/// Removes a leaf resource. Resources with children are refused.
	pub fn remove(&mut self, id: &ResourceId) -> Result<Resource> {
		self.require(id)?;
		if self.children.get(id).is_some_and(|c| !c.is_empty()) {
			return Err(AccountsError::invalid_state(format!(
				"resource {id} still has sub-resources"
			)));
		}
		let resource = self
			.resources
			.remove(id)
			.ok_or_else(|| AccountsError::not_found("resource", id))?;
		if let Some(parent) = resource.parent() {
			self.detach_child(parent, id);
		}
		self.children.remove(id);
		Ok(resource)
	}

	/// Re-link `id` under `parent`, or re-root it under `owner`.
	///
	/// Exactly one of `parent` and `owner` must be given. Clearing the parent
	/// without an owner would leave the resource without a root owner.
	pub fn set_parent(
		&mut self,
		id: &ResourceId,
		parent: Option<&ResourceId>,
		owner: Option<&PersonaId>,
	) -> Result<&Resource> {
		match (parent, owner) {
			(Some(parent), None) => self.attach(id, parent),
			(None, Some(owner)) => self.set_owner(id, Some(owner)),
			(None, None) => Err(AccountsError::invalid_state(format!(
				"clearing the parent of resource {id} requires an owner"
			))),
			(Some(_), Some(_)) => Err(AccountsError::invalid_state(format!(
				"resource {id} cannot have both an owner and a parent"
			))),
		}
	}

	/// Make `owner` the direct owner of `id`, detaching it from any parent.
	pub fn set_owner(&mut self, id: &ResourceId, owner: Option<&PersonaId>) -> Result<&Resource> {
		let owner = owner.ok_or_else(|| {
			AccountsError::invalid_state(format!("resource {id} cannot be given an empty owner"))
		})?;
		self.require(id)?;
		self.relink(id, ResourceLink::Owner(owner.clone()))
	}

	fn attach(&mut self, id: &ResourceId, parent: &ResourceId) -> Result<&Resource> {
		self.require(id)?;
		self.require(parent)?;
		if parent == id {
			return Err(AccountsError::invalid_state(format!(
				"resource {id} cannot be its own parent"
			)));
		}
		if self.ancestors_of(parent)?.contains(id) {
			return Err(AccountsError::invalid_state(format!(
				"resource {parent} is a descendant of {id}"
			)));
		}
		self.relink(id, ResourceLink::Parent(parent.clone()))
	}

	fn relink(&mut self, id: &ResourceId, link: ResourceLink) -> Result<&Resource> {
		let resource = self
			.resources
			.get_mut(id)
			.ok_or_else(|| AccountsError::not_found("resource", id))?;
		let previous = resource.relink(link.clone());

		if let ResourceLink::Parent(old_parent) = &previous {
			self.detach_child(old_parent, id);
		}
		if let ResourceLink::Parent(new_parent) = &link {
			self.children
				.entry(new_parent.clone())
				.or_default()
				.insert(id.clone());
		}

		debug!(resource = %id, from = ?previous, to = ?link, "resource relinked");
		self.require(id)
	}

	fn detach_child(&mut self, parent: &ResourceId, child: &ResourceId) {
		if let Some(set) = self.children.get_mut(parent) {
			set.remove(child);
			if set.is_empty() {
				self.children.remove(parent);
			}
		}
	}

	/// Direct children of `id`.
	pub fn sub_resources_of(&self, id: &ResourceId) -> Result<Vec<&Resource>> {
		self.require(id)?;
		Ok(self
			.children
			.get(id)
			.into_iter()
			.flatten()
			.filter_map(|child| self.resources.get(child))
			.collect())
	}

	/// Parent, grandparent, ... up to the root. Excludes `id` itself.
	pub fn ancestors_of(&self, id: &ResourceId) -> Result<Vec<ResourceId>> {
		let mut current = self.require(id)?;
		let mut chain = Vec::new();
		while let Some(parent) = current.parent() {
			if chain.len() > self.resources.len() {
				return Err(AccountsError::Internal(format!(
					"parent chain of resource {id} does not terminate"
				)));
			}
			chain.push(parent.clone());
			current = self.require(parent)?;
		}
		Ok(chain)
	}

	/// The owner found by walking parent links from `id`.
	pub fn resolve_root_owner(&self, id: &ResourceId) -> Result<PersonaId> {
		let root = match self.ancestors_of(id)?.last() {
			Some(root) => self.require(root)?,
			None => self.require(id)?,
		};
		root.owner().cloned().ok_or_else(|| {
			AccountsError::Internal(format!("root of resource {id} has no owner"))
		})
	}

	/// Resources whose direct owner is `owner`.
	pub fn owned_by(&self, owner: &PersonaId) -> Vec<&Resource> {
		self.resources
			.values()
			.filter(|r| r.owner() == Some(owner))
			.collect()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Resource> {
		self.resources.values()
	}

	/// Every child index entry points at a resource whose parent is that key,
	/// and every non-root resource appears under its parent.
	#[cfg(test)]
	fn is_consistent(&self) -> bool {
		let indexed = self.children.iter().all(|(parent, set)| {
			!set.is_empty()
				&& set.iter().all(|child| {
					self.resources
						.get(child)
						.is_some_and(|r| r.parent() == Some(parent))
				})
		});
		let covered = self.resources.values().all(|r| match r.parent() {
			Some(parent) => self
				.children
				.get(parent)
				.is_some_and(|set| set.contains(&r.id)),
			None => true,
		});
		indexed && covered
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn alice() -> PersonaId {
		PersonaId::new("alice")
	}

	fn rid(id: &str) -> ResourceId {
		ResourceId::new(id)
	}

	fn child_ids(h: &Hierarchy, id: &str) -> Vec<String> {
		h.sub_resources_of(&rid(id))
			.unwrap()
			.into_iter()
			.map(|r| r.id.to_string())
			.collect()
	}

	mod structure {
		use super::*;

		#[test]
		fn moving_a_child_updates_both_parents() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("host1"), alice())).unwrap();
			h.insert(Resource::owned_by(rid("host2"), alice())).unwrap();
			h.insert(Resource::child_of(rid("child"), rid("host1")))
				.unwrap();
			assert_eq!(child_ids(&h, "host1"), vec!["child"]);
			assert!(child_ids(&h, "host2").is_empty());

			h.set_parent(&rid("child"), Some(&rid("host2")), None)
				.unwrap();
			assert!(child_ids(&h, "host1").is_empty());
			assert_eq!(child_ids(&h, "host2"), vec!["child"]);
			assert!(h.is_consistent());
		}

		#[test]
		fn clearing_parent_without_owner_fails_and_changes_nothing() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("host"), alice())).unwrap();
			h.insert(Resource::child_of(rid("child"), rid("host")))
				.unwrap();

			let err = h.set_parent(&rid("child"), None, None).unwrap_err();
			assert!(err.is_invalid_state());
			assert_eq!(h.get(&rid("child")).unwrap().parent(), Some(&rid("host")));
			assert_eq!(child_ids(&h, "host"), vec!["child"]);
		}

		#[test]
		fn clearing_parent_with_owner_re_roots() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("host"), alice())).unwrap();
			h.insert(Resource::child_of(rid("child"), rid("host")))
				.unwrap();

			let bob = PersonaId::new("bob");
			let child = h.set_parent(&rid("child"), None, Some(&bob)).unwrap();
			assert!(child.parent().is_none());
			assert_eq!(child.owner(), Some(&bob));
			assert!(child_ids(&h, "host").is_empty());
		}

		#[test]
		fn parent_and_owner_together_are_rejected() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("a"), alice())).unwrap();
			h.insert(Resource::owned_by(rid("b"), alice())).unwrap();
			let err = h
				.set_parent(&rid("b"), Some(&rid("a")), Some(&alice()))
				.unwrap_err();
			assert!(err.is_invalid_state());
		}

		#[test]
		fn empty_owner_is_rejected() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("a"), alice())).unwrap();
			assert!(h.set_owner(&rid("a"), None).unwrap_err().is_invalid_state());
		}

		#[test]
		fn cycles_are_rejected() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("a"), alice())).unwrap();
			h.insert(Resource::child_of(rid("b"), rid("a"))).unwrap();
			h.insert(Resource::child_of(rid("c"), rid("b"))).unwrap();

			assert!(h
				.set_parent(&rid("a"), Some(&rid("c")), None)
				.unwrap_err()
				.is_invalid_state());
			assert!(h
				.set_parent(&rid("a"), Some(&rid("a")), None)
				.unwrap_err()
				.is_invalid_state());
			assert!(h.is_consistent());
		}

		#[test]
		fn unknown_parent_is_not_found() {
			let mut h = Hierarchy::new();
			let err = h
				.insert(Resource::child_of(rid("orphan"), rid("missing")))
				.unwrap_err();
			assert!(err.is_not_found());
			assert!(h.is_empty());
		}

		#[test]
		fn duplicate_id_conflicts() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("a"), alice())).unwrap();
			assert!(matches!(
				h.insert(Resource::owned_by(rid("a"), alice())),
				Err(AccountsError::Conflict { .. })
			));
		}

		#[test]
		fn remove_refuses_while_children_exist() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("a"), alice())).unwrap();
			h.insert(Resource::child_of(rid("b"), rid("a"))).unwrap();

			assert!(h.remove(&rid("a")).unwrap_err().is_invalid_state());
			h.remove(&rid("b")).unwrap();
			assert!(child_ids(&h, "a").is_empty());
			h.remove(&rid("a")).unwrap();
			assert!(h.is_empty());
		}
	}

	mod resolution {
		use super::*;

		#[test]
		fn root_owner_walks_parent_links() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("a"), alice())).unwrap();
			h.insert(Resource::child_of(rid("b"), rid("a"))).unwrap();
			h.insert(Resource::child_of(rid("c"), rid("b"))).unwrap();

			assert_eq!(h.resolve_root_owner(&rid("c")).unwrap(), alice());
			assert_eq!(h.resolve_root_owner(&rid("a")).unwrap(), alice());
			assert_eq!(h.ancestors_of(&rid("c")).unwrap(), vec![rid("b"), rid("a")]);
			assert!(h.ancestors_of(&rid("a")).unwrap().is_empty());
		}

		#[test]
		fn owned_by_lists_direct_roots_only() {
			let mut h = Hierarchy::new();
			h.insert(Resource::owned_by(rid("a"), alice())).unwrap();
			h.insert(Resource::child_of(rid("b"), rid("a"))).unwrap();
			let owned: Vec<_> = h.owned_by(&alice()).into_iter().map(|r| r.id.clone()).collect();
			assert_eq!(owned, vec![rid("a")]);
		}
	}

	mod proptests {
		use super::*;
		use proptest::prelude::*;

		#[derive(Debug, Clone)]
		enum Op {
			Create { parent: Option<usize> },
			SetParent { target: usize, parent: Option<usize>, owner: bool },
			SetOwner { target: usize },
			Remove { target: usize },
		}

		fn op_strategy() -> impl Strategy<Value = Op> {
			prop_oneof![
				proptest::option::of(0usize..12).prop_map(|parent| Op::Create { parent }),
				(0usize..12, proptest::option::of(0usize..12), any::<bool>()).prop_map(
					|(target, parent, owner)| Op::SetParent {
						target,
						parent,
						owner
					}
				),
				(0usize..12).prop_map(|target| Op::SetOwner { target }),
				(0usize..12).prop_map(|target| Op::Remove { target }),
			]
		}

		proptest! {
			#[test]
			fn arbitrary_mutations_preserve_structure(ops in proptest::collection::vec(op_strategy(), 1..60)) {
				let mut h = Hierarchy::new();
				let mut created = 0usize;
				let id = |n: usize| ResourceId::new(format!("r{n}"));

				for op in ops {
					match op {
						Op::Create { parent } => {
							let resource = match parent {
								Some(p) => Resource::child_of(id(created), id(p)),
								None => Resource::owned_by(id(created), alice()),
							};
							if h.insert(resource).is_ok() {
								created += 1;
							}
						}
						Op::SetParent { target, parent, owner } => {
							let owner_id = alice();
							let owner = owner.then_some(&owner_id);
							let parent = parent.map(id);
							let _ = h.set_parent(&id(target), parent.as_ref(), owner);
						}
						Op::SetOwner { target } => {
							let _ = h.set_owner(&id(target), Some(&alice()));
						}
						Op::Remove { target } => {
							let _ = h.remove(&id(target));
						}
					}

					prop_assert!(h.is_consistent());
					for resource in h.iter() {
						prop_assert!(resource.owner().is_some() != resource.parent().is_some());
						prop_assert_eq!(h.resolve_root_owner(&resource.id).unwrap(), alice());
					}
				}
			}

			#[test]
			fn reparent_moves_exactly_one_child(extra in 0usize..5) {
				let mut h = Hierarchy::new();
				h.insert(Resource::owned_by(rid("host1"), alice())).unwrap();
				h.insert(Resource::owned_by(rid("host2"), alice())).unwrap();
				for n in 0..extra {
					h.insert(Resource::child_of(ResourceId::new(format!("x{n}")), rid("host1"))).unwrap();
				}
				h.insert(Resource::child_of(rid("child"), rid("host1"))).unwrap();

				let before = h.sub_resources_of(&rid("host1")).unwrap().len()
					+ h.sub_resources_of(&rid("host2")).unwrap().len();
				h.set_parent(&rid("child"), Some(&rid("host2")), None).unwrap();
				let host1 = h.sub_resources_of(&rid("host1")).unwrap().len();
				let host2 = h.sub_resources_of(&rid("host2")).unwrap().len();

				prop_assert_eq!(host1, extra);
				prop_assert_eq!(host2, 1);
				prop_assert_eq!(host1 + host2, before);
			}
		}
	}
}
