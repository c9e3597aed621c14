//! Login, logout and session snapshots across both login policies.

#![allow(clippy::unwrap_used)]

use tokio::task::JoinSet;

use trails_api::db::UserDirectory;
use trails_api::db::memory::InMemoryStore;
use trails_api::error::AppError;
use trails_api::services::auth::verifier::StubVerifier;
use trails_api::services::auth::{
    AuthError, AuthService, Credentials, LoginPolicy, current_session, logout,
};
use trails_core::{Role, UserId};
use trails_integration_tests::{email, fresh_session};

fn creds(raw: &str) -> Credentials {
    Credentials::from_parts(Some(raw), Some("correct horse")).unwrap()
}

// =============================================================================
// Scenario A
// =============================================================================

#[tokio::test]
async fn test_strict_policy_unknown_user_is_not_registered() {
    let store = InMemoryStore::new();
    let verifier = StubVerifier::accepting();
    let service = AuthService::new(&store, &verifier, LoginPolicy::Strict);
    let session = fresh_session();

    let err = service.login(&session, creds("new@moor.org")).await.unwrap_err();
    assert!(matches!(err, AuthError::UserNotRegistered));
    assert_eq!(AppError::from(err).status().as_u16(), 404);

    assert_eq!(store.user_count(), 0);
    assert!(current_session(&session).await.is_none());
}

#[tokio::test]
async fn test_auto_provision_creates_user_and_session() {
    let store = InMemoryStore::new();
    let verifier = StubVerifier::accepting();
    let service = AuthService::new(&store, &verifier, LoginPolicy::AutoProvision);
    let session = fresh_session();

    let snapshot = service.login(&session, creds("New@Moor.org")).await.unwrap();
    assert_eq!(snapshot.role, Role::User);
    assert_eq!(snapshot.email, email("new@moor.org"));

    let identity = store.find_by_email(&email("new@moor.org")).await.unwrap().unwrap();
    assert_eq!(identity.role, Role::User);
    assert_eq!(current_session(&session).await, Some(snapshot));
}

// =============================================================================
// Failed logins
// =============================================================================

#[tokio::test]
async fn test_failed_login_keeps_previous_session() {
    let store = InMemoryStore::new();
    store.insert_user(UserId::new(1), &email("walker@moor.org"), Role::User);
    let session = fresh_session();

    let accepting = StubVerifier::accepting();
    let established = AuthService::new(&store, &accepting, LoginPolicy::Strict)
        .login(&session, creds("walker@moor.org"))
        .await
        .unwrap();

    let rejecting = StubVerifier::rejecting();
    let err = AuthService::new(&store, &rejecting, LoginPolicy::AutoProvision)
        .login(&session, creds("intruder@moor.org"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let down = StubVerifier::unavailable();
    let err = AuthService::new(&store, &down, LoginPolicy::AutoProvision)
        .login(&session, creds("intruder@moor.org"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AuthServiceUnavailable(_)));
    assert_eq!(AppError::from(err).status().as_u16(), 503);

    assert_eq!(current_session(&session).await, Some(established));
    assert_eq!(store.user_count(), 1);
}

#[tokio::test]
async fn test_missing_credentials_never_reach_the_verifier() {
    let err = Credentials::from_parts(Some("walker@moor.org"), Some("")).unwrap_err();
    assert!(matches!(err, AuthError::MissingCredentials));

    let err = Credentials::from_parts(None, Some("pw")).unwrap_err();
    assert_eq!(AppError::from(err).status().as_u16(), 400);
}

// =============================================================================
// Session replacement and logout
// =============================================================================

#[tokio::test]
async fn test_second_login_replaces_first() {
    let store = InMemoryStore::new();
    store.insert_user(UserId::new(1), &email("walker@moor.org"), Role::User);
    store.insert_user(UserId::new(2), &email("ranger@moor.org"), Role::Admin);
    let verifier = StubVerifier::accepting();
    let service = AuthService::new(&store, &verifier, LoginPolicy::Strict);
    let session = fresh_session();

    service.login(&session, creds("walker@moor.org")).await.unwrap();
    service.login(&session, creds("ranger@moor.org")).await.unwrap();

    let current = current_session(&session).await.unwrap();
    assert_eq!(current.email, email("ranger@moor.org"));
    assert_eq!(current.role, Role::Admin);
    assert_eq!(verifier.calls(), 2);
}

#[tokio::test]
async fn test_logout_clears_and_is_idempotent() {
    let store = InMemoryStore::new();
    store.insert_user(UserId::new(1), &email("walker@moor.org"), Role::User);
    let verifier = StubVerifier::accepting();
    let session = fresh_session();

    AuthService::new(&store, &verifier, LoginPolicy::Strict)
        .login(&session, creds("walker@moor.org"))
        .await
        .unwrap();

    logout(&session).await.unwrap();
    assert!(current_session(&session).await.is_none());
    logout(&session).await.unwrap();
    assert!(current_session(&session).await.is_none());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_logins_provision_one_identity() {
    let store = InMemoryStore::new();
    let mut tasks = JoinSet::new();

    for _ in 0..16 {
        let store = store.clone();
        tasks.spawn(async move {
            let verifier = StubVerifier::accepting();
            AuthService::new(&store, &verifier, LoginPolicy::AutoProvision)
                .login(&fresh_session(), creds("crowd@moor.org"))
                .await
                .unwrap()
        });
    }

    let mut established = Vec::new();
    while let Some(result) = tasks.join_next().await {
        established.push(result.unwrap());
    }

    assert_eq!(established.len(), 16);
    assert!(established.iter().all(|s| s.role == Role::User));
    assert_eq!(store.user_count(), 1);
}
