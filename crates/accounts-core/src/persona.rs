// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Personas: individual users and organizations.
//!
//! Both kinds can own resources, hold roles and be members of an
//! organization. Only users ever authenticate; an organization is acted as
//! through impersonation by one of its members.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::PersonaId;

/// An individual identity, usually materialized from an identity-provider
/// subject the first time it is seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: PersonaId,
	pub name: String,
	pub created_at: DateTime<Utc>,
}

impl User {
	pub fn new(id: PersonaId, name: impl Into<String>) -> Self {
		Self {
			id,
			name: name.into(),
			created_at: Utc::now(),
		}
	}
}

/// A non-user owner. It is itself owned by another persona and holds a
/// duplicate-free set of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
	pub id: PersonaId,
	pub name: String,
	pub description: Option<String>,
	pub owner: PersonaId,
	members: BTreeSet<PersonaId>,
	pub created_at: DateTime<Utc>,
}

impl Organization {
	pub fn new(id: PersonaId, name: impl Into<String>, owner: PersonaId) -> Self {
		Self {
			id,
			name: name.into(),
			description: None,
			owner,
			members: BTreeSet::new(),
			created_at: Utc::now(),
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Returns false if `member` was already present.
	pub fn add_member(&mut self, member: PersonaId) -> bool {
		self.members.insert(member)
	}

	/// Returns false if `member` was not present.
	pub fn remove_member(&mut self, member: &PersonaId) -> bool {
		self.members.remove(member)
	}

	pub fn has_member(&self, member: &PersonaId) -> bool {
		self.members.contains(member)
	}

	pub fn members(&self) -> impl Iterator<Item = &PersonaId> {
		self.members.iter()
	}

	pub fn member_count(&self) -> usize {
		self.members.len()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Persona {
	User(User),
	Organization(Organization),
}

impl Persona {
	pub fn id(&self) -> &PersonaId {
		match self {
			Persona::User(u) => &u.id,
			Persona::Organization(o) => &o.id,
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Persona::User(u) => &u.name,
			Persona::Organization(o) => &o.name,
		}
	}

	pub fn is_organization(&self) -> bool {
		matches!(self, Persona::Organization(_))
	}

	pub fn as_organization(&self) -> Option<&Organization> {
		match self {
			Persona::Organization(o) => Some(o),
			Persona::User(_) => None,
		}
	}

	pub(crate) fn as_organization_mut(&mut self) -> Option<&mut Organization> {
		match self {
			Persona::Organization(o) => Some(o),
			Persona::User(_) => None,
		}
	}
}

impl From<User> for Persona {
	fn from(user: User) -> Self {
		Persona::User(user)
	}
}

impl From<Organization> for Persona {
	fn from(org: Organization) -> Self {
		Persona::Organization(org)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn membership_is_idempotent() {
		let mut org = Organization::new("acme".into(), "Acme", "alice".into());
		assert!(org.add_member("bob".into()));
		assert!(!org.add_member("bob".into()));
		assert_eq!(org.member_count(), 1);

		assert!(org.remove_member(&"bob".into()));
		assert!(!org.remove_member(&"bob".into()));
		assert_eq!(org.member_count(), 0);
	}

	#[test]
	fn persona_accessors() {
		let user: Persona = User::new("alice".into(), "Alice").into();
		assert_eq!(user.id().as_str(), "alice");
		assert!(!user.is_organization());
		assert!(user.as_organization().is_none());

		let org: Persona = Organization::new("acme".into(), "Acme", "alice".into())
			.with_description("widgets")
			.into();
		assert_eq!(org.name(), "Acme");
		assert_eq!(
			org.as_organization().and_then(|o| o.description.as_deref()),
			Some("widgets")
		);
	}

	#[test]
	fn serializes_with_kind_tag() {
		let user: Persona = User::new("alice".into(), "Alice").into();
		let json = serde_json::to_value(&user).unwrap();
		assert_eq!(json["kind"], "user");
		assert_eq!(json["id"], "alice");
	}
}
