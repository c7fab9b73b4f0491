// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission evaluation.
//!
//! Evaluation order:
//!
//! 1. **Ownership**: the root owner of a resource may do anything on it and
//!    on everything below it.
//! 2. **Role walk**: starting at the resource and moving up through its
//!    ancestors, any role the persona holds that is permitted for the
//!    operation allows it. A role on an ancestor therefore covers all
//!    descendants, never the other way round.
//!
//! Operations are independent; holding a permission for one never implies
//! another.

use tracing::{debug, instrument};

use crate::types::{AccessRequest, Decision};

/// Decide `request`, recording which rule matched.
#[instrument(
	level = "debug",
	skip(request),
	fields(
		persona = %request.persona,
		operation = %request.operation,
		resource = ?request.resource(),
	)
)]
pub fn evaluate(request: &AccessRequest) -> Decision {
	if request.is_root_owner() {
		debug!("allowed as root owner");
		return Decision::Owner;
	}

	for (depth, level) in request.chain.iter().enumerate() {
		if let Some(role) = level
			.roles
			.iter()
			.find(|role| request.permitted_roles.contains(*role))
		{
			debug!(depth, granted_on = %level.resource, role = %role, "allowed by role");
			return Decision::Role {
				resource: level.resource.clone(),
				role: role.clone(),
			};
		}
	}

	debug!(levels = request.chain.len(), "denied");
	Decision::Denied
}

/// Returns true if the persona in `request` may perform its operation.
pub fn is_allowed(request: &AccessRequest) -> bool {
	evaluate(request).is_allowed()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::ChainLevel;
	use accounts_core::{OperationId, PersonaId, ResourceId, RoleId};

	fn request(persona: &str, root_owner: &str) -> AccessRequest {
		AccessRequest::new(
			PersonaId::new(persona),
			OperationId::new("metric-create"),
			PersonaId::new(root_owner),
		)
	}

	mod ownership {
		use super::*;

		#[test]
		fn root_owner_is_allowed_without_grants() {
			let req = request("jdoe", "jdoe").with_level(ChainLevel::new("r1".into()));
			assert_eq!(evaluate(&req), Decision::Owner);
		}

		#[test]
		fn stranger_without_grants_is_denied() {
			let req = request("other", "jdoe")
				.with_level(ChainLevel::new("r1".into()))
				.permitting("SuperUser".into());
			assert_eq!(evaluate(&req), Decision::Denied);
		}
	}

	mod roles {
		use super::*;

		#[test]
		fn direct_role_allows() {
			let req = request("bob", "jdoe")
				.with_level(ChainLevel::new("r1".into()).with_role("SuperUser".into()))
				.permitting("SuperUser".into());
			assert_eq!(
				evaluate(&req),
				Decision::Role {
					resource: "r1".into(),
					role: "SuperUser".into()
				}
			);
		}

		#[test]
		fn ancestor_role_allows() {
			let req = request("bob", "jdoe")
				.with_level(ChainLevel::new("r2".into()))
				.with_level(ChainLevel::new("r1".into()).with_role("SuperUser".into()))
				.permitting("SuperUser".into());
			assert!(matches!(
				evaluate(&req),
				Decision::Role { ref resource, .. } if resource == &ResourceId::new("r1")
			));
		}

		#[test]
		fn role_without_permission_denies() {
			let req = request("bob", "jdoe")
				.with_level(ChainLevel::new("r1".into()).with_role("Auditor".into()))
				.permitting("SuperUser".into());
			assert!(!is_allowed(&req));
		}

		#[test]
		fn either_of_two_roles_is_enough() {
			let level = ChainLevel::new("r1".into())
				.with_role("SuperUser".into())
				.with_role("Auditor".into());

			let read = request("bob", "jdoe")
				.with_level(level.clone())
				.permitting("Auditor".into());
			let delete = request("bob", "jdoe")
				.with_level(level)
				.permitting("SuperUser".into());
			assert!(is_allowed(&read));
			assert!(is_allowed(&delete));
		}
	}

	mod proptests {
		use super::*;
		use proptest::prelude::*;
		use std::collections::BTreeSet;

		fn role_set() -> impl Strategy<Value = BTreeSet<RoleId>> {
			proptest::collection::btree_set(
				prop_oneof![
					Just(RoleId::new("SuperUser")),
					Just(RoleId::new("Auditor")),
					Just(RoleId::new("Maintainer")),
				],
				0..3,
			)
		}

		fn chain(levels: &[BTreeSet<RoleId>]) -> Vec<ChainLevel> {
			levels
				.iter()
				.enumerate()
				.map(|(n, roles)| ChainLevel {
					resource: ResourceId::new(format!("r{n}")),
					roles: roles.clone(),
				})
				.collect()
		}

		proptest! {
			#[test]
			fn grants_propagate_to_descendants(
				levels in proptest::collection::vec(role_set(), 1..6),
				descendant_roles in role_set(),
				permitted in role_set(),
				is_owner in any::<bool>(),
			) {
				let root_owner = if is_owner { "bob" } else { "jdoe" };
				let mut req = request("bob", root_owner);
				req.chain = chain(&levels);
				req.permitted_roles = permitted;

				let mut descendant = req.clone();
				descendant.chain.insert(0, ChainLevel {
					resource: ResourceId::new("descendant"),
					roles: descendant_roles,
				});

				if is_allowed(&req) {
					prop_assert!(is_allowed(&descendant));
				}
			}

			#[test]
			fn union_of_roles(
				first in role_set(),
				second in role_set(),
				permitted in role_set(),
			) {
				let decide = |roles: &BTreeSet<RoleId>| {
					let mut req = request("bob", "jdoe");
					req.chain = chain(std::slice::from_ref(roles));
					req.permitted_roles = permitted.clone();
					is_allowed(&req)
				};
				let union: BTreeSet<RoleId> = first.union(&second).cloned().collect();
				prop_assert_eq!(decide(&union), decide(&first) || decide(&second));
			}

			#[test]
			fn no_permitted_roles_means_only_owner(levels in proptest::collection::vec(role_set(), 1..6)) {
				let mut req = request("bob", "jdoe");
				req.chain = chain(&levels);
				prop_assert!(!is_allowed(&req));
			}
		}
	}
}
