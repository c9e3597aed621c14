//! Client for the external identity verifier.
//!
//! The verifier is a single endpoint taking `{"email", "password"}`. A `200`
//! carries a JSON array of string tokens, and `401` is an explicit rejection.
//! Only `["Verified", "True"]` (in any order, among other tokens) counts as
//! verified. `"Verified"` with `"False"` counts as a rejection. Anything else
//! is a verifier fault, never a decision.

use std::future::Future;
#[cfg(any(test, feature = "test-support"))]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::Credentials;

/// Errors that can occur when calling the identity verifier.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// Connection failure, timeout, or unreadable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Status other than 200 or 401.
    #[error("verifier returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A 200 whose body is not a recognized token list.
    #[error("unexpected verifier response: {0}")]
    UnexpectedBody(String),
}

/// Definitive answer from the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierOutcome {
    Verified,
    Rejected,
}

/// Confirms credentials with an authority outside this service.
pub trait IdentityVerifier: Send + Sync {
    fn verify(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<VerifierOutcome, VerifierError>> + Send;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Identity verifier reached over HTTP.
#[derive(Clone)]
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpIdentityVerifier {
    /// Create a verifier client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, VerifierError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<VerifierOutcome, VerifierError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&VerifyRequest {
                email: credentials.email.as_str(),
                password: credentials.password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(VerifierOutcome::Rejected);
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VerifierError::UnexpectedBody(e.to_string()))?;
        interpret(&body)
    }
}

/// Map a `200` body onto an outcome.
///
/// # Errors
///
/// Returns `UnexpectedBody` unless the body is an array containing
/// `"Verified"` together with exactly one of `"True"` or `"False"`.
pub fn interpret(body: &Value) -> Result<VerifierOutcome, VerifierError> {
    let Some(items) = body.as_array() else {
        return Err(VerifierError::UnexpectedBody(format!(
            "expected a JSON array, got {body}"
        )));
    };

    let has = |token: &str| items.iter().any(|item| item.as_str() == Some(token));

    match (has("Verified"), has("True"), has("False")) {
        (true, true, false) => Ok(VerifierOutcome::Verified),
        (true, false, true) => Ok(VerifierOutcome::Rejected),
        _ => Err(VerifierError::UnexpectedBody(body.to_string())),
    }
}

/// Scripted verifier for tests. Counts how often it is called.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct StubVerifier {
    outcome: Option<VerifierOutcome>,
    calls: AtomicUsize,
}

#[cfg(any(test, feature = "test-support"))]
impl StubVerifier {
    #[must_use]
    pub fn accepting() -> Self {
        Self {
            outcome: Some(VerifierOutcome::Verified),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            outcome: Some(VerifierOutcome::Rejected),
            ..Self::default()
        }
    }

    /// Every call fails as if the verifier answered `503`.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, _credentials: &Credentials) -> Result<VerifierOutcome, VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.ok_or_else(|| VerifierError::Status {
            status: 503,
            body: "stub verifier unavailable".to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials::from_parts(Some("walker@example.com"), Some("hunter22")).unwrap()
    }

    async fn verifier_for(server: &MockServer) -> HttpIdentityVerifier {
        let endpoint = Url::parse(&format!("{}/auth/api/users", server.uri())).unwrap();
        HttpIdentityVerifier::new(endpoint, Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn test_interpret_contract() {
        assert_eq!(
            interpret(&json!(["Verified", "True"])).unwrap(),
            VerifierOutcome::Verified
        );
        assert_eq!(
            interpret(&json!(["True", "Verified"])).unwrap(),
            VerifierOutcome::Verified
        );
        assert_eq!(
            interpret(&json!(["Verified", "False"])).unwrap(),
            VerifierOutcome::Rejected
        );
        assert!(interpret(&json!(["Verified"])).is_err());
        assert!(interpret(&json!(["True"])).is_err());
        assert!(interpret(&json!({"Verified": true})).is_err());
        assert!(interpret(&json!("Verified True")).is_err());
    }

    #[tokio::test]
    async fn test_verified_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/api/users"))
            .and(body_json(json!({
                "email": "walker@example.com",
                "password": "hunter22"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Verified", "True"])))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = verifier_for(&server).await.verify(&credentials()).await.unwrap();
        assert_eq!(outcome, VerifierOutcome::Verified);
    }

    #[tokio::test]
    async fn test_unauthorized_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let outcome = verifier_for(&server).await.verify(&credentials()).await.unwrap();
        assert_eq!(outcome, VerifierOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_server_error_is_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = verifier_for(&server)
            .await
            .verify(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let err = verifier_for(&server)
            .await
            .verify(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::UnexpectedBody(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!(["Verified", "True"]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = verifier_for(&server)
            .await
            .verify(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::Http(_)));
    }
}
