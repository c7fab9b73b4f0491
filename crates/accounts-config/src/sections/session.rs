// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session cache configuration section.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SessionConfigLayer {
	#[serde(default)]
	pub reaper_interval_secs: Option<u64>,
}

impl SessionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.reaper_interval_secs.is_some() {
			self.reaper_interval_secs = other.reaper_interval_secs;
		}
	}

	pub fn finalize(self) -> SessionConfig {
		SessionConfig {
			reaper_interval_secs: self.reaper_interval_secs.filter(|secs| *secs > 0),
		}
	}
}

/// Session cache settings. With no reaper interval, stale entries are only
/// dropped when their session next authenticates or is invalidated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
	pub reaper_interval_secs: Option<u64>,
}
