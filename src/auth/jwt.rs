//! JWT Token Handler
//! Mission: Issue and validate bearer tokens securely

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Signs and verifies access tokens. The secret is injected at construction
/// and never read from globals.
pub struct JwtAuth {
    secret: String,
    ttl_minutes: i64,
}

impl JwtAuth {
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl_minutes,
        }
    }

    /// Issue a signed token for `username`, expiring `ttl_minutes` from now.
    pub fn issue(&self, username: &str) -> Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(chrono::Duration::minutes(self.ttl_minutes))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let claims = Claims {
            sub: username.to_string(),
            exp: expiration,
        };

        debug!(
            "Issuing token for {}, expires in {}min",
            username, self.ttl_minutes
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    /// Validate a token and extract its claims. Bad signature, garbage
    /// payload and expiry all surface as the same error.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .context("Invalid or expired token")?;

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let auth = JwtAuth::new("test-secret-key-12345".to_string(), DEFAULT_TTL_MINUTES);

        let token = auth.issue("admin").unwrap();
        assert!(!token.is_empty());

        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let auth = JwtAuth::new("test-secret-key-12345".to_string(), DEFAULT_TTL_MINUTES);

        let result = auth.verify("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_different_secrets_reject() {
        let auth1 = JwtAuth::new("secret1".to_string(), DEFAULT_TTL_MINUTES);
        let auth2 = JwtAuth::new("secret2".to_string(), DEFAULT_TTL_MINUTES);

        let token = auth1.issue("admin").unwrap();

        let result = auth2.verify(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative TTL puts the expiry well past the default validation leeway.
        let auth = JwtAuth::new("test-secret-key-12345".to_string(), -DEFAULT_TTL_MINUTES);

        let token = auth.issue("admin").unwrap();
        let result = auth.verify(&token);
        assert!(result.is_err());
    }
}
