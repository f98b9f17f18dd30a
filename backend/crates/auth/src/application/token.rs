//! Access tokens
//!
//! Short-lived HS256 JWTs naming the user and the key-value session they
//! belong to. Expiry is checked against the injected clock, not system time.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::actor::Role;
use kernel::id::{SessionId, UserId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::entity::Session;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,
    pub sid: SessionId,
    pub role: Role,
    /// Token id, the blacklist key
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    /// Remaining lifetime at `now`, zero once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        u64::try_from(self.exp - now.timestamp())
            .map(Duration::from_secs)
            .unwrap_or(Duration::ZERO)
    }
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, session: &Session, now: DateTime<Utc>) -> AuthResult<(String, AccessClaims)> {
        let ttl_secs = i64::try_from(self.ttl.as_secs())
            .map_err(|_| AuthError::Internal("Access token TTL out of range".to_string()))?;

        let claims = AccessClaims {
            sub: session.user_id,
            sid: session.session_id,
            role: session.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + ttl_secs,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {e}")))?;

        Ok((token, claims))
    }

    /// Signature and expiry check
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> AuthResult<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<AccessClaims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AuthError::SessionInvalid
            })?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::SessionInvalid);
        }

        Ok(claims)
    }
}
