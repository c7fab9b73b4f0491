// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity model for the accounts services.
//!
//! - [`Persona`]: a [`User`] or an [`Organization`], either of which can own
//!   resources and hold roles
//! - [`Resource`]: a node in the ownership tree, linked to exactly one owner
//!   or parent ([`Hierarchy`] keeps the child index consistent)
//! - [`Role`], [`Operation`], [`Permission`] and [`Grant`]
//! - [`AccountsStore`]: the persistence seam, with [`MemoryStore`] as the
//!   in-process implementation

pub mod access;
pub mod error;
pub mod hierarchy;
pub mod persona;
pub mod resource;
pub mod setup;
pub mod store;
pub mod types;

pub use access::{Grant, Operation, Permission, Role};
pub use error::{AccountsError, Result};
pub use hierarchy::Hierarchy;
pub use persona::{Organization, Persona, User};
pub use resource::{Resource, ResourceLink};
pub use setup::OperationSetup;
pub use store::{AccountsStore, MemoryStore, Transfer};
pub use types::{GrantId, OperationId, PermissionId, PersonaId, ResourceId, RoleId};
