// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session-scoped authentication for long-lived connections.
//!
//! [`Authenticator::authenticate`] runs under the session's lock from cache
//! lookup to cache write, so two messages racing on one connection never
//! verify the same session twice: the second attempt finds the entry the
//! first one stored.

use std::sync::Arc;
use std::time::Duration;

use accounts_config::{SecretString, SessionConfig};
use accounts_core::{Persona, PersonaId};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cache::{system_clock, token_fingerprint, CachedSession, Clock, SessionCache};
use crate::claims::{AuthClaims, AuthRequest, SessionId};
use crate::collaborators::{CredentialExchange, ImpersonationPolicy, PersonaDirectory, TokenVerifier};
use crate::error::{Result, SessionAuthError, TokenError};

pub struct Authenticator {
	cache: Arc<SessionCache>,
	verifier: Arc<dyn TokenVerifier>,
	exchange: Arc<dyn CredentialExchange>,
	directory: Arc<dyn PersonaDirectory>,
	policy: Arc<dyn ImpersonationPolicy>,
	clock: Clock,
}

impl Authenticator {
	pub fn new(
		verifier: Arc<dyn TokenVerifier>,
		exchange: Arc<dyn CredentialExchange>,
		directory: Arc<dyn PersonaDirectory>,
		policy: Arc<dyn ImpersonationPolicy>,
	) -> Self {
		Self {
			cache: Arc::new(SessionCache::new()),
			verifier,
			exchange,
			directory,
			policy,
			clock: system_clock(),
		}
	}

	pub fn with_clock(mut self, clock: Clock) -> Self {
		self.clock = clock;
		self
	}

	/// Share a cache between authenticators.
	pub fn with_cache(mut self, cache: Arc<SessionCache>) -> Self {
		self.cache = cache;
		self
	}

	pub fn cache(&self) -> &Arc<SessionCache> {
		&self.cache
	}

	/// Resolve the persona for one attempt on a session.
	///
	/// A valid cached session wins over any claims in the request. Otherwise
	/// the claims are turned into a token, verified, mapped to a persona and,
	/// when another persona is requested, checked for impersonation. Only a
	/// successful attempt touches the cache, apart from dropping an entry
	/// found expired.
	#[instrument(
		skip(self, request),
		fields(
			session = %request.session,
			mode = request.claims.as_ref().map(AuthClaims::mode).unwrap_or("cached"),
		)
	)]
	pub async fn authenticate(&self, request: &AuthRequest) -> Result<Persona> {
		let requested = self.requested_persona(request);
		let result = {
			let lock = self.cache.session_lock(&request.session).await;
			let _guard = lock.lock().await;
			self.authenticate_locked(request, requested.as_ref()).await
		};
		if result.is_err() {
			self.cache.release_idle_locks().await;
		}
		result
	}

	async fn authenticate_locked(
		&self,
		request: &AuthRequest,
		requested: Option<&PersonaId>,
	) -> Result<Persona> {
		let now = (self.clock)();
		if let Some(cached) = self.cache.get(&request.session).await {
			if cached.is_valid_for(requested, now) {
				debug!(persona = %cached.persona().id(), "session cache hit");
				return Ok(cached.persona().clone());
			}
			if cached.is_expired(now) {
				debug!(fingerprint = %cached.fingerprint(), "cached session expired");
				self.cache.remove(&request.session).await;
			} else {
				debug!(
					cached = %cached.persona().id(),
					requested = ?requested,
					"cached session is for another persona"
				);
			}
		}

		let result = self.authenticate_uncached(request, requested).await;
		match result {
			Ok(entry) => {
				info!(
					persona = %entry.persona().id(),
					fingerprint = %entry.fingerprint(),
					expires_at = %entry.expires_at(),
					"session authenticated"
				);
				let persona = entry.persona().clone();
				self.cache.insert(request.session.clone(), entry).await;
				Ok(persona)
			}
			Err(err) => {
				warn!(error = %err, "session authentication failed");
				Err(err)
			}
		}
	}

	pub async fn authenticate_with_token(
		&self,
		session: SessionId,
		token: impl Into<SecretString>,
		persona: Option<PersonaId>,
	) -> Result<Persona> {
		let mut request = AuthRequest::with_token(session, token);
		request.requested_persona = persona;
		self.authenticate(&request).await
	}

	pub async fn authenticate_with_credentials(
		&self,
		session: SessionId,
		username: &str,
		password: impl Into<SecretString>,
		persona: Option<PersonaId>,
	) -> Result<Persona> {
		let mut request = AuthRequest::with_credentials(session, username, password);
		request.requested_persona = persona;
		self.authenticate(&request).await
	}

	/// Authenticate from an in-band JSON message.
	pub async fn authenticate_with_message(
		&self,
		session: SessionId,
		message: &str,
	) -> Result<Persona> {
		let request = AuthRequest::from_message(session, message)?;
		self.authenticate(&request).await
	}

	pub async fn invalidate(&self, session: &SessionId) -> bool {
		self.cache.invalidate(session).await
	}

	pub async fn purge_expired(&self) -> usize {
		self.cache.purge_expired((self.clock)()).await
	}

	/// Start the background reaper if the configuration asks for one.
	pub fn spawn_reaper(&self, config: &SessionConfig) -> Option<JoinHandle<()>> {
		let interval = Duration::from_secs(config.reaper_interval_secs?);
		info!(interval_secs = interval.as_secs(), "starting session reaper");
		Some(self.cache.spawn_reaper(interval, self.clock.clone()))
	}

	fn requested_persona(&self, request: &AuthRequest) -> Option<PersonaId> {
		request.requested_persona.clone().or_else(|| match &request.claims {
			Some(AuthClaims::Message(envelope)) => envelope.requested_persona(),
			_ => None,
		})
	}

	async fn authenticate_uncached(
		&self,
		request: &AuthRequest,
		requested: Option<&PersonaId>,
	) -> Result<CachedSession> {
		let claims = match &request.claims {
			Some(AuthClaims::Message(envelope)) => envelope.claims(),
			other => other.clone(),
		};
		let token = match claims {
			None | Some(AuthClaims::Message(_)) => return Err(SessionAuthError::AuthenticationRequired),
			Some(AuthClaims::Token(token)) => {
				if token.is_empty() {
					return Err(SessionAuthError::AuthenticationRequired);
				}
				token
			}
			Some(AuthClaims::Credentials { username, password }) => {
				if username.is_empty() || password.is_empty() {
					return Err(SessionAuthError::AuthenticationRequired);
				}
				debug!(username = %username, "exchanging credentials for a token");
				self.exchange.exchange(&username, &password).await?
			}
		};

		let claims = self.verifier.verify(token.expose()).await?;
		let subject = claims.subject().ok_or(SessionAuthError::MissingSubject)?;
		let expires_at = claims.expires_at().ok_or_else(|| {
			TokenError::Malformed(format!("expiry out of range: {}", claims.expires_at))
		})?;
		if expires_at <= (self.clock)() {
			return Err(TokenError::Expired.into());
		}

		let actor = self.directory.get_or_create_persona(subject).await?;
		if actor.is_organization() {
			return Err(SessionAuthError::OrganizationSubject(actor.id().clone()));
		}
		let persona = match requested {
			Some(target) if target != actor.id() => self.impersonate(&actor, target).await?,
			_ => actor,
		};

		debug!(
			subject,
			fingerprint = %token_fingerprint(token.expose()),
			"token verified"
		);
		Ok(CachedSession::new(token, persona, expires_at))
	}

	async fn impersonate(&self, actor: &Persona, target: &PersonaId) -> Result<Persona> {
		let target_persona = self
			.directory
			.get_persona(target)
			.await?
			.ok_or_else(|| SessionAuthError::PersonaNotFound(target.clone()))?;

		if !self
			.policy
			.is_allowed_to_impersonate(actor, &target_persona)
			.await?
		{
			return Err(SessionAuthError::ImpersonationDenied {
				actor: actor.id().clone(),
				target: target.clone(),
			});
		}

		info!(actor = %actor.id(), target = %target, "impersonation accepted");
		Ok(target_persona)
	}
}
