//! Session lifecycle: login, logout and the current session.
//!
//! Credentials are checked by an external [`IdentityVerifier`]. A verified
//! email is then matched against the local [`UserDirectory`], which is the
//! only source of roles. The resulting [`AuthSession`] is a snapshot: later
//! role changes reach a user only at their next login.
//!
//! A failed login leaves both the session and the directory untouched.

mod error;
pub mod verifier;

use std::str::FromStr;

use chrono::Utc;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;

use trails_core::{Email, Role};

pub use error::AuthError;
pub use verifier::{HttpIdentityVerifier, IdentityVerifier, VerifierError, VerifierOutcome};

use crate::db::UserDirectory;
use crate::models::{AuthSession, session_keys};

/// What to do with a verified email that has no local identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginPolicy {
    /// Refuse the login with `UserNotRegistered`.
    #[default]
    Strict,
    /// Create the identity with [`Role::User`].
    AutoProvision,
}

impl FromStr for LoginPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "auto_provision" | "auto-provision" => Ok(Self::AutoProvision),
            other => Err(format!(
                "unknown login policy {other:?} (expected strict or auto_provision)"
            )),
        }
    }
}

/// Login input after shape checks.
#[derive(Debug)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials from raw body fields.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if either field is absent or
    /// empty, and `AuthError::MalformedRequest` if the email is not an
    /// address.
    pub fn from_parts(email: Option<&str>, password: Option<&str>) -> Result<Self, AuthError> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        let password = password.filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthError::MissingCredentials);
        };

        let email =
            Email::parse(email).map_err(|e| AuthError::MalformedRequest(e.to_string()))?;

        Ok(Self {
            email,
            password: SecretString::from(password.to_owned()),
        })
    }
}

/// Authentication service.
pub struct AuthService<'a, D, V> {
    directory: &'a D,
    verifier: &'a V,
    policy: LoginPolicy,
}

impl<'a, D, V> AuthService<'a, D, V>
where
    D: UserDirectory,
    V: IdentityVerifier,
{
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(directory: &'a D, verifier: &'a V, policy: LoginPolicy) -> Self {
        Self {
            directory,
            verifier,
            policy,
        }
    }

    /// Verify credentials and establish a session.
    ///
    /// On success the session id is rotated and any earlier login on this
    /// session is replaced.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` if the verifier rejects the credentials
    /// - `AuthServiceUnavailable` if the verifier cannot answer
    /// - `UserNotRegistered` under the strict policy when the email is unknown
    /// - `Repository` / `Session` on storage failures
    pub async fn login(
        &self,
        session: &Session,
        credentials: Credentials,
    ) -> Result<AuthSession, AuthError> {
        let outcome = self.verifier.verify(&credentials).await?;
        if outcome == VerifierOutcome::Rejected {
            tracing::warn!(email = %credentials.email, "Login rejected by identity verifier");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = match self.policy {
            LoginPolicy::Strict => self
                .directory
                .find_by_email(&credentials.email)
                .await?
                .ok_or(AuthError::UserNotRegistered)
                .inspect_err(|_| {
                    tracing::warn!(
                        email = %credentials.email,
                        "Verified user is not registered in the directory"
                    );
                })?,
            LoginPolicy::AutoProvision => self.directory.find_or_create(&credentials.email).await?,
        };

        let snapshot = AuthSession::snapshot(&identity, Utc::now());

        session.cycle_id().await?;
        session
            .insert(session_keys::AUTH_SESSION, &snapshot)
            .await?;

        tracing::info!(
            email = %identity.email,
            user_id = %identity.id,
            role = %identity.role,
            "User authenticated"
        );

        Ok(snapshot)
    }
}

/// Clear the session. Succeeds whether or not anyone was logged in.
///
/// # Errors
///
/// Returns `AuthError::Session` if the session store fails.
pub async fn logout(session: &Session) -> Result<(), AuthError> {
    let previous = current_session(session).await;
    session.flush().await?;
    if let Some(previous) = previous {
        tracing::info!(email = %previous.email, "User logged out");
    }
    Ok(())
}

/// Read the session snapshot, if any.
///
/// An unreadable snapshot is treated as no session.
pub async fn current_session(session: &Session) -> Option<AuthSession> {
    match session.get::<AuthSession>(session_keys::AUTH_SESSION).await {
        Ok(current) => current,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable session data");
            None
        }
    }
}

/// Response body for a successful login.
#[derive(Debug, serde::Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub username: Email,
    pub role: Role,
}

impl From<&AuthSession> for LoginResponse {
    fn from(session: &AuthSession) -> Self {
        Self {
            message: "Login successful",
            username: session.email.clone(),
            role: session.role,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;
    use trails_core::UserId;

    use super::verifier::StubVerifier;
    use super::*;
    use crate::db::memory::InMemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn creds(email: &str) -> Credentials {
        Credentials::from_parts(Some(email), Some("pw")).unwrap()
    }

    #[test]
    fn test_credentials_shape_checks() {
        assert!(matches!(
            Credentials::from_parts(None, Some("pw")),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            Credentials::from_parts(Some("  "), Some("pw")),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            Credentials::from_parts(Some("a@x.com"), Some("")),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            Credentials::from_parts(Some("not-an-email"), Some("pw")),
            Err(AuthError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_login_policy_from_str() {
        assert_eq!("strict".parse::<LoginPolicy>().unwrap(), LoginPolicy::Strict);
        assert_eq!(
            "AUTO_PROVISION".parse::<LoginPolicy>().unwrap(),
            LoginPolicy::AutoProvision
        );
        assert!("open".parse::<LoginPolicy>().is_err());
    }

    #[tokio::test]
    async fn test_login_snapshots_directory_role() {
        let store = InMemoryStore::new();
        let email = Email::parse("admin@x.com").unwrap();
        store.insert_user(UserId::new(1), &email, Role::Admin);
        let verifier = StubVerifier::accepting();
        let service = AuthService::new(&store, &verifier, LoginPolicy::Strict);
        let session = session();

        let snapshot = service.login(&session, creds("Admin@X.com")).await.unwrap();
        assert_eq!(snapshot.email, email);
        assert_eq!(snapshot.role, Role::Admin);

        let current = current_session(&session).await;
        assert_eq!(current, Some(snapshot));
    }

    #[tokio::test]
    async fn test_role_change_does_not_touch_active_session() {
        let store = InMemoryStore::new();
        let email = Email::parse("walker@x.com").unwrap();
        store.insert_user(UserId::new(1), &email, Role::User);
        let verifier = StubVerifier::accepting();
        let service = AuthService::new(&store, &verifier, LoginPolicy::Strict);
        let session = session();

        service.login(&session, creds("walker@x.com")).await.unwrap();
        store.set_role(&email, Role::Admin).await.unwrap();

        let current = current_session(&session).await.unwrap();
        assert_eq!(current.role, Role::User);

        let relogin = service.login(&session, creds("walker@x.com")).await.unwrap();
        assert_eq!(relogin.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_unknown_user_without_side_effects() {
        let store = InMemoryStore::new();
        let verifier = StubVerifier::accepting();
        let service = AuthService::new(&store, &verifier, LoginPolicy::Strict);
        let session = session();

        let err = service.login(&session, creds("new@x.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotRegistered));
        assert_eq!(store.user_count(), 0);
        assert!(current_session(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_auto_provision_creates_user_role() {
        let store = InMemoryStore::new();
        let verifier = StubVerifier::accepting();
        let service = AuthService::new(&store, &verifier, LoginPolicy::AutoProvision);

        let snapshot = service.login(&session(), creds("new@x.com")).await.unwrap();
        assert_eq!(snapshot.role, Role::User);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_rejection_and_outage_leave_state_untouched() {
        let store = InMemoryStore::new();
        let session = session();

        let rejecting = StubVerifier::rejecting();
        let service = AuthService::new(&store, &rejecting, LoginPolicy::AutoProvision);
        assert!(matches!(
            service.login(&session, creds("a@x.com")).await,
            Err(AuthError::InvalidCredentials)
        ));

        let down = StubVerifier::unavailable();
        let service = AuthService::new(&store, &down, LoginPolicy::AutoProvision);
        assert!(matches!(
            service.login(&session, creds("a@x.com")).await,
            Err(AuthError::AuthServiceUnavailable(_))
        ));

        assert_eq!(store.user_count(), 0);
        assert!(current_session(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let store = InMemoryStore::new();
        store.insert_user(UserId::new(1), &Email::parse("a@x.com").unwrap(), Role::User);
        let verifier = StubVerifier::accepting();
        let service = AuthService::new(&store, &verifier, LoginPolicy::Strict);
        let session = session();

        service.login(&session, creds("a@x.com")).await.unwrap();
        logout(&session).await.unwrap();
        logout(&session).await.unwrap();
        assert!(current_session(&session).await.is_none());
    }
}
