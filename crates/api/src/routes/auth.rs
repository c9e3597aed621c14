//! Authentication route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use crate::access::Denial;
use crate::db::UserRepository;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::RequestContext;
use crate::services::auth::{self, AuthError, AuthService, Credentials, LoginResponse};
use crate::state::AppState;

/// Raw login body. Fields are optional so that absent and empty values both
/// report `MissingCredentials`.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

/// Handle `POST /auth/login`.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!(reason = %rejection.body_text(), "Login body is not valid JSON");
        AuthError::MalformedRequest(rejection.body_text())
    })?;

    let credentials = Credentials::from_parts(body.email.as_deref(), body.password.as_deref())?;

    let directory = UserRepository::new(state.pool());
    let service = AuthService::new(&directory, state.verifier(), state.config().login_policy);
    let snapshot = service.login(&session, credentials).await?;

    set_sentry_user(snapshot.email.as_str());

    Ok(Json(LoginResponse::from(&snapshot)))
}

/// Handle `POST /auth/logout`.
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    auth::logout(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "message": "Logged out successfully." })))
}

/// Handle `GET /auth/session`.
pub async fn session(ctx: RequestContext) -> Result<impl IntoResponse> {
    let current = ctx.session.ok_or(Denial::Unauthorized)?;
    Ok(Json(json!({
        "username": current.email,
        "role": current.role,
        "established_at": current.established_at,
    })))
}
