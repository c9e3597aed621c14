//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, signed cookie, moka-backed store)
//! 5. Session context (snapshot the authenticated session for handlers)
//! 6. Rate limiting on `/auth/login` only (governor)

pub mod context;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use context::{RequestContext, session_context_middleware};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::{SessionCache, with_sessions};
