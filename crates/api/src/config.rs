//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TRAILS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `TRAILS_BASE_URL` - Public URL of the API; `https://` enables secure cookies
//! - `TRAILS_SESSION_SECRET` - Session cookie signing secret (min 64 chars, high entropy)
//!
//! ## Optional
//! - `TRAILS_HOST` - Bind address (default: 127.0.0.1)
//! - `TRAILS_PORT` - Listen port (default: 5000)
//! - `TRAILS_SESSION_IDLE_MINUTES` - Inactivity expiry of a session (default: 1440, max: 525600)
//! - `TRAILS_LOGIN_POLICY` - `strict` or `auto_provision` (default: strict)
//! - `AUTH_API_URL` - Identity verifier endpoint
//! - `AUTH_API_TIMEOUT_SECS` - Identity verifier timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::services::auth::LoginPolicy;

/// Signed cookies need a 512-bit key.
const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// One year.
const MAX_SESSION_IDLE_MINUTES: u64 = 525_600;

const DEFAULT_AUTH_API_URL: &str = "https://web.socem.plymouth.ac.uk/COMP2001/auth/api/users";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Sessions expire after this much inactivity
    pub session_idle: Duration,
    /// Handling of verified emails without a local identity
    pub login_policy: LoginPolicy,
    /// External identity verifier
    pub identity_verifier: VerifierConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Identity verifier endpoint configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub endpoint: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ApiConfig::from_env`].
    pub fn from_source<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(source);

        let database_url = env.database_url("TRAILS_DATABASE_URL")?;
        let host = env.parsed::<IpAddr>("TRAILS_HOST", "127.0.0.1")?;
        let port = env.parsed::<u16>("TRAILS_PORT", "5000")?;
        let base_url = env.required("TRAILS_BASE_URL")?;
        let session_secret = env.validated_secret("TRAILS_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "TRAILS_SESSION_SECRET")?;

        let idle_minutes = env.parsed::<u64>("TRAILS_SESSION_IDLE_MINUTES", "1440")?;
        if idle_minutes == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "TRAILS_SESSION_IDLE_MINUTES".to_owned(),
                "must be greater than zero".to_owned(),
            ));
        }
        if idle_minutes > MAX_SESSION_IDLE_MINUTES {
            return Err(ConfigError::InvalidEnvVar(
                "TRAILS_SESSION_IDLE_MINUTES".to_owned(),
                format!("must be at most {MAX_SESSION_IDLE_MINUTES}"),
            ));
        }

        let login_policy = env.parsed::<LoginPolicy>("TRAILS_LOGIN_POLICY", "strict")?;

        let identity_verifier = VerifierConfig {
            endpoint: env.parsed::<Url>("AUTH_API_URL", DEFAULT_AUTH_API_URL)?,
            timeout: Duration::from_secs(env.parsed::<u64>("AUTH_API_TIMEOUT_SECS", "10")?),
        };

        let sentry_dsn = env.optional("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            session_idle: Duration::from_secs(idle_minutes * 60),
            login_policy,
            identity_verifier,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
    }

    /// Get a variable with a default and parse it.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .as_deref()
            .unwrap_or(default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_owned()))
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_SECRET: &str =
        "k7Qp2Zx9LmN4vB8wR1tY6uI3oE5aS0dF7gH2jK9lZ4xC8vB1nM6qW3eR5tY0uIoP";

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TRAILS_DATABASE_URL", "postgres://localhost/trails"),
            ("TRAILS_BASE_URL", "http://localhost:5000"),
            ("TRAILS_SESSION_SECRET", STRONG_SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_source(source(&minimal())).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.session_idle, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.login_policy, LoginPolicy::Strict);
        assert_eq!(config.identity_verifier.endpoint.as_str(), DEFAULT_AUTH_API_URL);
        assert_eq!(config.identity_verifier.timeout, Duration::from_secs(10));
        assert!(!config.secure_cookies());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = minimal();
        pairs.extend([
            ("TRAILS_PORT", "8080"),
            ("TRAILS_BASE_URL", "https://trails.example.org"),
            ("TRAILS_LOGIN_POLICY", "auto_provision"),
            ("TRAILS_SESSION_IDLE_MINUTES", "30"),
            ("AUTH_API_URL", "http://127.0.0.1:9000/verify"),
            ("AUTH_API_TIMEOUT_SECS", "3"),
        ]);
        let config = ApiConfig::from_source(source(&pairs)).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.secure_cookies());
        assert_eq!(config.login_policy, LoginPolicy::AutoProvision);
        assert_eq!(config.session_idle, Duration::from_secs(30 * 60));
        assert_eq!(config.identity_verifier.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_database_url_fallback() {
        let mut pairs = minimal();
        pairs.retain(|(k, _)| *k != "TRAILS_DATABASE_URL");
        assert!(matches!(
            ApiConfig::from_source(source(&pairs)),
            Err(ConfigError::MissingEnvVar(_))
        ));

        pairs.push(("DATABASE_URL", "postgres://fallback/trails"));
        let config = ApiConfig::from_source(source(&pairs)).unwrap();
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://fallback/trails"
        );
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("TRAILS_LOGIN_POLICY", "open"),
            ("TRAILS_PORT", "not-a-port"),
            ("AUTH_API_URL", "not a url"),
            ("TRAILS_SESSION_IDLE_MINUTES", "0"),
            ("TRAILS_SESSION_IDLE_MINUTES", "525601"),
            ("TRAILS_SESSION_IDLE_MINUTES", "18446744073709551615"),
        ] {
            let mut pairs = minimal();
            pairs.push((key, value));
            assert!(
                matches!(
                    ApiConfig::from_source(source(&pairs)),
                    Err(ConfigError::InvalidEnvVar(..))
                ),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_session_idle_upper_bound() {
        let mut pairs = minimal();
        pairs.push(("TRAILS_SESSION_IDLE_MINUTES", "525600"));
        let config = ApiConfig::from_source(source(&pairs)).unwrap();
        assert_eq!(config.session_idle, Duration::from_secs(365 * 24 * 60 * 60));

        pairs.push(("TRAILS_SESSION_IDLE_MINUTES", "600000"));
        match ApiConfig::from_source(source(&pairs)).unwrap_err() {
            ConfigError::InvalidEnvVar(key, _) => assert_eq!(key, "TRAILS_SESSION_IDLE_MINUTES"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(STRONG_SECRET) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-session-key-here", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength(&"a".repeat(64), "TEST_VAR").is_err());
        assert!(validate_secret_strength(STRONG_SECRET, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_session_secret_length() {
        let mut pairs = minimal();
        pairs.retain(|(k, _)| *k != "TRAILS_SESSION_SECRET");
        pairs.push(("TRAILS_SESSION_SECRET", "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"));
        assert!(matches!(
            ApiConfig::from_source(source(&pairs)),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ApiConfig::from_source(source(&minimal())).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains(STRONG_SECRET));
        assert!(!debug_output.contains("postgres://localhost/trails"));
    }
}
