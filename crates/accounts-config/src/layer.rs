// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{AuthServerConfigLayer, LoggingConfigLayer, SessionConfigLayer};

/// Accounts configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountsConfigLayer {
	#[serde(default)]
	pub auth_server: Option<AuthServerConfigLayer>,
	#[serde(default)]
	pub session: Option<SessionConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl AccountsConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: AccountsConfigLayer) {
		merge_option(
			&mut self.auth_server,
			other.auth_server,
			AuthServerConfigLayer::merge,
		);
		merge_option(&mut self.session, other.session, SessionConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T>(target: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (target.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *target = Some(incoming),
		(_, None) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_fills_missing_sections() {
		let mut base = AccountsConfigLayer::default();
		base.merge(AccountsConfigLayer {
			session: Some(SessionConfigLayer {
				reaper_interval_secs: Some(15),
			}),
			..Default::default()
		});
		assert_eq!(base.session.unwrap().reaper_interval_secs, Some(15));
	}

	#[test]
	fn merge_keeps_fields_absent_from_other() {
		let mut base: AccountsConfigLayer = toml::from_str(
			r#"
			[auth_server]
			realm = "file-realm"
			client_id = "file-client"
			"#,
		)
		.unwrap();
		base.merge(AccountsConfigLayer {
			auth_server: Some(AuthServerConfigLayer {
				realm: Some("env-realm".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		let auth = base.auth_server.unwrap().finalize();
		assert_eq!(auth.realm, "env-realm");
		assert_eq!(auth.client_id, "file-client");
	}
}
