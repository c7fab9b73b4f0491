// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Protectable resources.
//!
//! A resource is linked either directly to an owning persona or to a parent
//! resource, never both and never neither. [`ResourceLink`] makes the
//! "exactly one" rule structural; [`Resource::new`] rejects the two invalid
//! combinations callers can still express with optional arguments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AccountsError, Result};
use crate::types::{PersonaId, ResourceId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLink {
	Owner(PersonaId),
	Parent(ResourceId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
	pub id: ResourceId,
	link: ResourceLink,
	pub created_at: DateTime<Utc>,
}

impl Resource {
	/// Build a resource from an optional owner and an optional parent.
	///
	/// Exactly one of the two must be supplied.
	pub fn new(
		id: ResourceId,
		owner: Option<PersonaId>,
		parent: Option<ResourceId>,
	) -> Result<Self> {
		let link = match (owner, parent) {
			(Some(owner), None) => ResourceLink::Owner(owner),
			(None, Some(parent)) => ResourceLink::Parent(parent),
			(None, None) => {
				return Err(AccountsError::invalid_state(format!(
					"resource {id} needs either an owner or a parent"
				)))
			}
			(Some(_), Some(_)) => {
				return Err(AccountsError::invalid_state(format!(
					"resource {id} cannot have both an owner and a parent"
				)))
			}
		};
		Ok(Self::with_link(id, link))
	}

	pub fn owned_by(id: ResourceId, owner: PersonaId) -> Self {
		Self::with_link(id, ResourceLink::Owner(owner))
	}

	pub fn child_of(id: ResourceId, parent: ResourceId) -> Self {
		Self::with_link(id, ResourceLink::Parent(parent))
	}

	fn with_link(id: ResourceId, link: ResourceLink) -> Self {
		Self {
			id,
			link,
			created_at: Utc::now(),
		}
	}

	pub fn link(&self) -> &ResourceLink {
		&self.link
	}

	/// The direct owner, if this resource is a root.
	pub fn owner(&self) -> Option<&PersonaId> {
		match &self.link {
			ResourceLink::Owner(owner) => Some(owner),
			ResourceLink::Parent(_) => None,
		}
	}

	pub fn parent(&self) -> Option<&ResourceId> {
		match &self.link {
			ResourceLink::Parent(parent) => Some(parent),
			ResourceLink::Owner(_) => None,
		}
	}

	pub fn is_root(&self) -> bool {
		self.owner().is_some()
	}

	/// Replaces the link wholesale; the previous owner or parent is dropped.
	pub(crate) fn relink(&mut self, link: ResourceLink) -> ResourceLink {
		std::mem::replace(&mut self.link, link)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn requires_exactly_one_link() {
		let id = ResourceId::new("r1");
		assert!(Resource::new(id.clone(), None, None)
			.unwrap_err()
			.is_invalid_state());
		assert!(
			Resource::new(id.clone(), Some("alice".into()), Some("r0".into()))
				.unwrap_err()
				.is_invalid_state()
		);

		let owned = Resource::new(id.clone(), Some("alice".into()), None).unwrap();
		assert_eq!(owned.owner(), Some(&PersonaId::new("alice")));
		assert!(owned.parent().is_none());
		assert!(owned.is_root());

		let child = Resource::new(id, None, Some("r0".into())).unwrap();
		assert_eq!(child.parent(), Some(&ResourceId::new("r0")));
		assert!(child.owner().is_none());
	}

	#[test]
	fn relink_replaces_previous_link() {
		let mut resource = Resource::child_of("r1".into(), "r0".into());
		let previous = resource.relink(ResourceLink::Owner("alice".into()));
		assert_eq!(previous, ResourceLink::Parent("r0".into()));
		assert!(resource.parent().is_none());
	}
}
