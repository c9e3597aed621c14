//! Integration tests for the Trails API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p trails-integration-tests
//! ```
//!
//! Service-level tests run against [`InMemoryStore`]; HTTP tests drive the
//! real router with a lazily connected pool and only reach endpoints that
//! never touch it. `postgres_repositories` needs `DATABASE_URL` and builds a
//! fresh database per test through `#[sqlx::test]`.
//!
//! # Test Categories
//!
//! - `access_policy` - Decision procedure properties
//! - `session_lifecycle` - Login policies, snapshots, concurrent provisioning
//! - `catalog_scenarios` - Trail and comment operations end to end
//! - `http_surface` - Status codes and bodies through the router
//! - `postgres_repositories` - Upsert and archive guards on real SQL

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use chrono::Utc;
use tower_sessions::{MemoryStore, Session};

use trails_api::db::memory::InMemoryStore;
use trails_api::models::{AuthSession, Identity};
use trails_core::{Email, Role, UserId};

/// A standalone session handle backed by its own memory store.
#[must_use]
pub fn fresh_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

/// Parse an email that is known to be valid.
///
/// # Panics
///
/// Panics if `raw` is not a valid email.
#[must_use]
#[allow(clippy::expect_used)]
pub fn email(raw: &str) -> Email {
    Email::parse(raw).expect("test email must be valid")
}

/// Register `raw` in `store` and return a session snapshot of it.
#[must_use]
pub fn signed_in(store: &InMemoryStore, id: i32, raw: &str, role: Role) -> AuthSession {
    let identity: Identity = store.insert_user(UserId::new(id), &email(raw), role);
    AuthSession::snapshot(&identity, Utc::now())
}

/// A session for an identity that is not in any directory.
#[must_use]
pub fn detached_session(raw: &str, role: Role) -> AuthSession {
    AuthSession {
        email: email(raw),
        role,
        established_at: Utc::now(),
    }
}
