//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::auth::{HttpIdentityVerifier, VerifierError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds no per-user data: authentication state
/// lives in the session and reaches handlers through
/// [`RequestContext`](crate::middleware::RequestContext).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    verifier: HttpIdentityVerifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity verifier HTTP client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, VerifierError> {
        let verifier = HttpIdentityVerifier::new(
            config.identity_verifier.endpoint.clone(),
            config.identity_verifier.timeout,
        )?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                verifier,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn verifier(&self) -> &HttpIdentityVerifier {
        &self.inner.verifier
    }
}
