// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session-scoped authentication for long-lived connections.
//!
//! A connection presents a bearer token, a username and password, or an
//! in-band JSON message carrying either. The [`Authenticator`] verifies the
//! claims once, resolves the persona (optionally one the caller may
//! impersonate) and caches the result per session until the token expires.
//!
//! The identity provider and persona directory are injected as traits:
//! [`OidcClient`] talks to an OpenID Connect server and [`StoreDirectory`]
//! adapts an [`AccountsStore`](accounts_core::AccountsStore).

pub mod authenticator;
pub mod cache;
pub mod claims;
pub mod close;
pub mod collaborators;
pub mod directory;
pub mod error;
pub mod oidc;

pub use authenticator::Authenticator;
pub use cache::{system_clock, token_fingerprint, CachedSession, Clock, SessionCache};
pub use claims::{
	extract_bearer_token, extract_persona, AuthClaims, AuthEnvelope, AuthRequest, SessionId,
	PERSONA_HEADER,
};
pub use close::{close_code_for_error, close_codes, close_reason};
pub use collaborators::{
	CredentialExchange, ImpersonationPolicy, PersonaDirectory, TokenClaims, TokenVerifier,
};
pub use directory::StoreDirectory;
pub use error::{CredentialError, DirectoryError, Result, SessionAuthError, TokenError};
pub use oidc::OidcClient;
