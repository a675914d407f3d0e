//! Session tokens (HS256 JWT).

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys for session tokens
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::from_secs(config.session_ttl_secs),
        )
    }

    /// Issue a token for `user_id`
    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Unauthorized(format!("Failed to sign session: {}", e)))
    }

    /// Validate a token and return its user id. Only HS256 is accepted.
    pub fn validate(&self, token: &str) -> Result<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "Session token rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => Error::Unauthorized("Session expired".to_string()),
                _ => Error::Unauthorized("Invalid session".to_string()),
            }
        })?;

        data.claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| Error::Unauthorized("Invalid session".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_then_validate() {
        let keys = SessionKeys::new(SECRET, Duration::from_secs(60));
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();
        assert_eq!(keys.validate(&token).unwrap(), user_id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = SessionKeys::new(SECRET, Duration::from_secs(60))
            .issue(Uuid::new_v4())
            .unwrap();
        let other = SessionKeys::new(b"another-secret-another-secret-!!", Duration::from_secs(60));
        assert!(matches!(other.validate(&token), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let keys = SessionKeys::new(SECRET, Duration::from_secs(60));
        let mut token = keys.issue(Uuid::new_v4()).unwrap();
        token.push('x');
        assert!(keys.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = SessionKeys::new(SECRET, Duration::from_secs(60));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let err = keys.validate(&token).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Session expired");
    }
}
