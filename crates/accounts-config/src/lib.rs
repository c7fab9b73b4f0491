// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the accounts services.
//!
//! This crate provides:
//! - [`Secret`] for values that must never be logged
//! - `VAR` / `VAR_FILE` secret loading from the environment
//! - Layered configuration from defaults, a TOML file and `ACCOUNTS_*` variables
//! - Global `tracing` subscriber setup
//!
//! # Usage
//!
//! ```ignore
//! use accounts_config::load_config;
//!
//! let config = load_config()?;
//! accounts_config::logging::init(&config.logging)?;
//! println!("identity provider at {}", config.auth_server.token_endpoint());
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod logging;
pub mod secret;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::AccountsConfigLayer;
pub use secret::{Secret, SecretString, REDACTED};
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct AccountsConfig {
	pub auth_server: AuthServerConfig,
	pub session: SessionConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`ACCOUNTS_*`)
/// 2. Config file (`/etc/accounts/accounts.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<AccountsConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<AccountsConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<AccountsConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<AccountsConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AccountsConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: AccountsConfigLayer) -> Result<AccountsConfig, ConfigError> {
	let auth_server = layer.auth_server.unwrap_or_default().finalize();
	let session = layer.session.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	auth_server.validate()?;

	info!(
		auth_server = %auth_server.url,
		realm = %auth_server.realm,
		client_id = %auth_server.client_id,
		client_secret_configured = auth_server.client_secret.is_some(),
		reaper_interval_secs = ?session.reaper_interval_secs,
		log_format = %logging.format,
		"accounts configuration loaded"
	);

	Ok(AccountsConfig {
		auth_server,
		session,
		logging,
	})
}
