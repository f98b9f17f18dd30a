//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::fmt;
use std::time::Duration;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Key-value session TTL
    pub session_ttl: Duration,
    /// Refresh token lifetime (durable session row)
    pub refresh_token_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Consecutive failures per IP before sign-in is locked
    pub max_login_failures: u32,
    /// How long a locked IP stays locked after its last failure
    pub login_lockout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(15 * 60),
            session_ttl: Duration::from_secs(7 * 24 * 3600),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            password_pepper: None,
            max_login_failures: 5,
            login_lockout: Duration::from_secs(15 * 60),
        }
    }
}

impl AuthConfig {
    /// Create config with a random token secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Development defaults: random secret, relaxed lockout
    pub fn development() -> Self {
        Self {
            max_login_failures: 20,
            login_lockout: Duration::from_secs(60),
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("session_ttl", &self.session_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("max_login_failures", &self.max_login_failures)
            .field("login_lockout", &self.login_lockout)
            .finish()
    }
}
