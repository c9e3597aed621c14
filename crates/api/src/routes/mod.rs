//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//! GET    /health/ready            - Database readiness
//! GET    /openapi.yml             - API description
//!
//! # Auth
//! POST   /auth/login              - Login (rate limited)
//! POST   /auth/logout             - Logout
//! GET    /auth/session            - Current session
//!
//! # Trails
//! GET    /trails                  - List trails
//! POST   /trails                  - Create trail (Admin)
//! GET    /trails/{id}             - Trail detail
//! PUT    /trails/{id}             - Update trail (Admin)
//! DELETE /trails/{id}             - Delete trail (Admin)
//! GET    /trails/{id}/log         - Creation log (Admin)
//! GET    /trails/{id}/comments    - Comments on a trail
//! POST   /trails/{id}/comments    - Post a comment (logged in)
//!
//! # Comments
//! GET    /comments                - List comments
//! GET    /comments/{id}           - Comment detail
//! PUT    /comments/{id}           - Edit comment (author or Admin)
//! DELETE /comments/{id}           - Archive comment (Admin)
//!
//! # Locations
//! GET    /locations               - List locations
//! POST   /locations               - Create location (Admin)
//! GET    /locations/{id}          - Location detail
//! ```

pub mod auth;
pub mod comments;
pub mod docs;
pub mod locations;
pub mod trails;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};

use crate::error::{AppError, Result};
use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(auth::login))
        .layer(login_rate_limiter());

    Router::new()
        .merge(login)
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
}

/// Create the trail routes router.
pub fn trail_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(trails::list).post(trails::create))
        .route(
            "/{id}",
            get(trails::show).put(trails::update).delete(trails::delete),
        )
        .route("/{id}/log", get(trails::log))
        .route(
            "/{id}/comments",
            get(comments::list_for_trail).post(comments::create),
        )
}

/// Create the comment routes router.
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(comments::list))
        .route(
            "/{id}",
            get(comments::show)
                .put(comments::update)
                .delete(comments::archive),
        )
}

/// Create the location routes router.
pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(locations::list).post(locations::create))
        .route("/{id}", get(locations::show))
}

/// Create the full API router (without session and outer layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/openapi.yml", get(docs::openapi))
        .nest("/auth", auth_routes())
        .nest("/trails", trail_routes())
        .nest("/comments", comment_routes())
        .nest("/locations", location_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Unwrap a JSON body, reporting shape errors as `400`.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}
