// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-session cache of authenticated personas.
//!
//! Entries are checked lazily: an entry is usable only while `now` is before
//! its expiry and the requested persona, if any, matches the cached one.
//! [`SessionCache::spawn_reaper`] optionally drops expired entries in the
//! background; nothing depends on it running.
//!
//! Each session also gets its own async mutex so that concurrent attempts for
//! the same session run one at a time while different sessions proceed
//! independently.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use accounts_config::SecretString;
use accounts_core::{Persona, PersonaId};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::claims::SessionId;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
	Arc::new(Utc::now)
}

/// SHA-256 of a token, hex encoded. Safe to log.
pub fn token_fingerprint(token: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(token.as_bytes());
	hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct CachedSession {
	token: SecretString,
	fingerprint: String,
	persona: Persona,
	expires_at: DateTime<Utc>,
}

impl CachedSession {
	pub fn new(token: SecretString, persona: Persona, expires_at: DateTime<Utc>) -> Self {
		let fingerprint = token_fingerprint(token.expose());
		Self {
			token,
			fingerprint,
			persona,
			expires_at,
		}
	}

	pub fn token(&self) -> &SecretString {
		&self.token
	}

	pub fn fingerprint(&self) -> &str {
		&self.fingerprint
	}

	pub fn persona(&self) -> &Persona {
		&self.persona
	}

	pub fn expires_at(&self) -> DateTime<Utc> {
		self.expires_at
	}

	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		now >= self.expires_at
	}

	/// Usable for a request asking for `requested` at `now`.
	pub fn is_valid_for(&self, requested: Option<&PersonaId>, now: DateTime<Utc>) -> bool {
		if let Some(requested) = requested {
			if requested != self.persona.id() {
				return false;
			}
		}
		!self.is_expired(now)
	}
}

#[derive(Default)]
pub struct SessionCache {
	entries: RwLock<HashMap<SessionId, CachedSession>>,
	locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// The mutex serializing attempts for `session`.
	pub async fn session_lock(&self, session: &SessionId) -> Arc<Mutex<()>> {
		let mut locks = self.locks.lock().await;
		locks
			.entry(session.clone())
			.or_insert_with(|| Arc::new(Mutex::new(())))
			.clone()
	}

	pub async fn get(&self, session: &SessionId) -> Option<CachedSession> {
		self.entries.read().await.get(session).cloned()
	}

	/// Store or overwrite the entry for `session`. Callers hold the session lock.
	pub(crate) async fn insert(
		&self,
		session: SessionId,
		entry: CachedSession,
	) -> Option<CachedSession> {
		self.entries.write().await.insert(session, entry)
	}

	pub(crate) async fn remove(&self, session: &SessionId) -> Option<CachedSession> {
		self.entries.write().await.remove(session)
	}

	/// Forget `session`, e.g. when its connection closes. Returns true if an
	/// entry was present.
	pub async fn invalidate(&self, session: &SessionId) -> bool {
		let lock = self.session_lock(session).await;
		let removed = {
			let _guard = lock.lock().await;
			self.remove(session).await.is_some()
		};
		drop(lock);
		self.release_idle_locks().await;
		debug!(session = %session, removed, "session invalidated");
		removed
	}

	/// Drop every entry expired at `now`. Returns how many were dropped.
	pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
		let purged = {
			let mut entries = self.entries.write().await;
			let before = entries.len();
			entries.retain(|_, entry| !entry.is_expired(now));
			before - entries.len()
		};
		self.release_idle_locks().await;
		if purged > 0 {
			info!(purged, "expired sessions purged");
		}
		purged
	}

	/// Drop locks nobody holds or waits on and whose session has no entry.
	pub(crate) async fn release_idle_locks(&self) {
		let entries = self.entries.read().await;
		let mut locks = self.locks.lock().await;
		locks.retain(|session, lock| Arc::strong_count(lock) > 1 || entries.contains_key(session));
	}

	#[cfg(test)]
	pub(crate) async fn lock_count(&self) -> usize {
		self.locks.lock().await.len()
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}

	/// Purge expired entries every `interval` until the cache is dropped.
	pub fn spawn_reaper(self: &Arc<Self>, interval: Duration, clock: Clock) -> JoinHandle<()> {
		let cache: Weak<Self> = Arc::downgrade(self);
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.tick().await;
			loop {
				ticker.tick().await;
				let Some(cache) = cache.upgrade() else {
					debug!("session cache dropped, reaper exiting");
					break;
				};
				cache.purge_expired(clock()).await;
			}
		})
	}
}
