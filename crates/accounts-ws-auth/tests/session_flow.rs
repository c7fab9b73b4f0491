// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use accounts_config::SecretString;
use accounts_core::{AccountsStore, MemoryStore, Organization, PersonaId, User};
use accounts_ws_auth::{
	close_code_for_error, close_codes, AuthRequest, Authenticator, CredentialError,
	CredentialExchange, SessionAuthError, SessionId, StoreDirectory, TokenClaims, TokenError,
	TokenVerifier,
};
use async_trait::async_trait;
use chrono::Utc;

struct SlowVerifier {
	calls: AtomicUsize,
	tokens: HashMap<String, String>,
}

#[async_trait]
impl TokenVerifier for SlowVerifier {
	async fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		tokio::time::sleep(Duration::from_millis(50)).await;
		let subject = self.tokens.get(token).ok_or(TokenError::Rejected {
			error: "invalid_token".to_string(),
			description: None,
		})?;
		Ok(TokenClaims::new(
			subject.clone(),
			Utc::now().timestamp() + 300,
		))
	}
}

struct NoExchange;

#[async_trait]
impl CredentialExchange for NoExchange {
	async fn exchange(&self, _: &str, _: &SecretString) -> Result<SecretString, CredentialError> {
		Err(CredentialError::Rejected("password grant disabled".to_string()))
	}
}

async fn setup() -> (Arc<SlowVerifier>, Authenticator, Arc<dyn AccountsStore>) {
	let store: Arc<dyn AccountsStore> = Arc::new(MemoryStore::new());
	store
		.create_persona(User::new("alice".into(), "alice").into())
		.await
		.unwrap();
	store
		.create_persona(User::new("bob".into(), "bob").into())
		.await
		.unwrap();
	store
		.create_persona(Organization::new("acme".into(), "Acme", "alice".into()).into())
		.await
		.unwrap();

	let tokens = HashMap::from([
		("alice-token".to_string(), "alice".to_string()),
		("bob-token".to_string(), "bob".to_string()),
		("carol-token".to_string(), "carol".to_string()),
		("acme-token".to_string(), "acme".to_string()),
	]);
	let verifier = Arc::new(SlowVerifier {
		calls: AtomicUsize::new(0),
		tokens,
	});
	let directory = Arc::new(StoreDirectory::new(store.clone()));
	let auth = Authenticator::new(
		verifier.clone(),
		Arc::new(NoExchange),
		directory.clone(),
		directory,
	);
	(verifier, auth, store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_attempts_on_one_session_verify_once() {
	let (verifier, auth, _) = setup().await;
	let auth = Arc::new(auth);

	let mut handles = Vec::new();
	for _ in 0..8 {
		let auth = auth.clone();
		handles.push(tokio::spawn(async move {
			auth.authenticate(&AuthRequest::with_token(SessionId::from("conn-1"), "alice-token"))
				.await
		}));
	}
	for handle in handles {
		let persona = handle.await.unwrap().unwrap();
		assert_eq!(persona.id().as_str(), "alice");
	}

	assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
	assert_eq!(auth.cache().len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn separate_sessions_verify_separately() {
	let (verifier, auth, _) = setup().await;
	let auth = Arc::new(auth);

	let mut handles = Vec::new();
	for i in 0..4 {
		let auth = auth.clone();
		handles.push(tokio::spawn(async move {
			auth.authenticate(&AuthRequest::with_token(
				SessionId::new(format!("conn-{i}")),
				"bob-token",
			))
			.await
		}));
	}
	for handle in handles {
		handle.await.unwrap().unwrap();
	}

	assert_eq!(verifier.calls.load(Ordering::SeqCst), 4);
	assert_eq!(auth.cache().len().await, 4);
}

#[tokio::test]
async fn unknown_subject_becomes_a_user() {
	let (_, auth, store) = setup().await;
	let persona = auth
		.authenticate_with_token("conn-1".into(), "carol-token", None)
		.await
		.unwrap();
	assert_eq!(persona.id().as_str(), "carol");
	assert!(store.get_persona(&"carol".into()).await.unwrap().is_some());
}

#[tokio::test]
async fn owner_impersonates_organization_through_message() {
	let (verifier, auth, _) = setup().await;
	let persona = auth
		.authenticate_with_message(
			"conn-1".into(),
			r#"{"authentication": {"token": "alice-token", "persona": "acme"}, "payload": {"n": 1}}"#,
		)
		.await
		.unwrap();
	assert_eq!(persona.id().as_str(), "acme");

	// Same session and persona: served from the cache.
	let again = auth
		.authenticate(&AuthRequest::cached("conn-1".into()).as_persona("acme"))
		.await
		.unwrap();
	assert_eq!(again.id().as_str(), "acme");
	assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn outsider_is_denied_with_close_code() {
	let (_, auth, _) = setup().await;
	let err = auth
		.authenticate_with_token("conn-1".into(), "bob-token", Some("acme".into()))
		.await
		.unwrap_err();
	assert!(matches!(err, SessionAuthError::ImpersonationDenied { .. }));
	assert_eq!(close_code_for_error(&err), close_codes::IMPERSONATION_DENIED);
}

#[tokio::test]
async fn rejected_token_closes_as_invalid() {
	let (_, auth, _) = setup().await;
	let err = auth
		.authenticate_with_token("conn-1".into(), "forged", None)
		.await
		.unwrap_err();
	assert_eq!(close_code_for_error(&err), close_codes::AUTH_INVALID);

	let err = auth
		.authenticate_with_credentials("conn-1".into(), "alice", "pw", None)
		.await
		.unwrap_err();
	assert_eq!(
		err,
		SessionAuthError::Credential(CredentialError::Rejected(
			"password grant disabled".to_string()
		))
	);
}

#[tokio::test]
async fn organization_subject_is_refused() {
	let (_, auth, store) = setup().await;
	store
		.create_persona(Organization::new("acme-eu".into(), "Acme EU", "acme".into()).into())
		.await
		.unwrap();

	for requested in [None, Some(PersonaId::from("acme-eu"))] {
		let err = auth
			.authenticate_with_token("conn-1".into(), "acme-token", requested)
			.await
			.unwrap_err();
		assert_eq!(err, SessionAuthError::OrganizationSubject("acme".into()));
		assert_eq!(close_code_for_error(&err), close_codes::AUTH_INVALID);
	}
	assert!(auth.cache().is_empty().await);
	assert!(store.get_persona(&"acme".into()).await.unwrap().unwrap().is_organization());
}
