//! Per-request session context.
//!
//! [`session_context_middleware`] reads the session snapshot once per request
//! and stores it in the request extensions. Handlers receive it through the
//! [`RequestContext`] extractor and pass it explicitly to the services.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;
use tracing::Span;

use crate::models::AuthSession;
use crate::services::auth::current_session;

/// Immutable view of the caller's authentication state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session: Option<AuthSession>,
}

impl RequestContext {
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }
}

/// Populate [`RequestContext`] from the session layer.
pub async fn session_context_middleware(mut request: Request, next: Next) -> Response {
    let session = match request.extensions().get::<Session>() {
        Some(session) => current_session(session).await,
        None => None,
    };

    if let Some(auth) = &session {
        Span::current().record("user_email", auth.email.as_str());
    }

    request.extensions_mut().insert(RequestContext { session });
    next.run(request).await
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_default())
    }
}
