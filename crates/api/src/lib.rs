//! Trails API library.
//!
//! A catalog of trails, locations and comments behind session-based access
//! control. Credentials are checked by an external identity verifier, roles
//! come from the local user directory, and every operation is gated by an
//! explicit [`access::Policy`].
//!
//! # Modules
//!
//! - [`access`] - Authorization engine (`authorize(policy, session, lookup)`)
//! - [`services`] - Session lifecycle and catalog operations
//! - [`db`] - Store traits with `PostgreSQL` and in-memory implementations
//! - [`routes`] - Axum handlers
//! - [`middleware`] - Sessions, request context, request ids, rate limiting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::KeyError;

use state::AppState;

/// Build the complete application router.
///
/// # Errors
///
/// Returns `KeyError` if the session secret cannot be turned into a cookie
/// signing key.
pub fn app(state: AppState) -> Result<Router, KeyError> {
    let router = routes::routes().layer(axum::middleware::from_fn(
        middleware::session_context_middleware,
    ));
    let router = middleware::with_sessions(router, state.config())?;

    Ok(router
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

/// Request span with empty fields filled in by later middleware.
fn make_request_span(request: &axum::extract::Request) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
        user_email = tracing::field::Empty,
    )
}
