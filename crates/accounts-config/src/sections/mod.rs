// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod auth_server;
mod logging;
mod session;

pub use auth_server::{AuthServerConfig, AuthServerConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use session::{SessionConfig, SessionConfigLayer};
