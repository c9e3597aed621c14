//! Session middleware configuration.
//!
//! Sessions live in process memory and end on restart, on logout, or after
//! the configured inactivity window. The cookie only carries a signed,
//! opaque session id.
//!
//! Records are held in a bounded `moka` cache whose time-to-idle matches the
//! inactivity window. Abandoned sessions are evicted without a logout.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use moka::future::Cache;
use secrecy::ExposeSecret;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::cookie::{Key, KeyError, SameSite};
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::ApiConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "trails_session";

/// Upper bound on live sessions.
const MAX_SESSIONS: u64 = 100_000;

/// In-memory session store that forgets records idle for longer than the
/// session window.
#[derive(Clone)]
pub struct SessionCache {
    records: Cache<Id, Record>,
}

impl SessionCache {
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self::with_capacity(idle, MAX_SESSIONS)
    }

    #[must_use]
    pub fn with_capacity(idle: Duration, max_sessions: u64) -> Self {
        let records = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .build();
        Self { records }
    }

    /// Approximate number of stored records.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.records.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply pending evictions now.
    pub async fn sweep(&self) {
        self.records.run_pending_tasks().await;
    }
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("entries", &self.records.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for SessionCache {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            let entry = self.records.entry(record.id).or_insert(record.clone()).await;
            if entry.is_fresh() {
                return Ok(());
            }
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .records
            .get(session_id)
            .await
            .filter(|record| record.expiry_date > now))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.invalidate(session_id).await;
        Ok(())
    }
}

/// Wrap `router` in the session layer.
///
/// # Errors
///
/// Returns `KeyError` if the session secret is too short to derive a
/// signing key.
pub fn with_sessions<S>(router: Router<S>, config: &ApiConfig) -> Result<Router<S>, KeyError>
where
    S: Clone + Send + Sync + 'static,
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())?;
    let idle_seconds = i64::try_from(config.session_idle.as_secs()).unwrap_or(i64::MAX);

    let layer = SessionManagerLayer::new(SessionCache::new(config.session_idle))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(idle_seconds),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key);

    Ok(router.layer(layer))
}
