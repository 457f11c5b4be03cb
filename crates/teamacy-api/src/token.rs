use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use teamacy_types::api::Claims;
use teamacy_types::models::Role;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

/// Longest accepted token lifetime, a hundred years.
pub const MAX_EXPIRATION_HOURS: i64 = 100 * 366 * 24;

/// Signing material for access tokens, built once at startup.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenKeys {
    /// Only HMAC algorithms are accepted: the key is a shared secret.
    pub fn new(secret: &str, algorithm: Algorithm, expiration_hours: i64) -> Result<Self> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!("unsupported JWT algorithm {:?}, expected HS256, HS384 or HS512", algorithm);
        }
        if secret.is_empty() {
            bail!("JWT secret must not be empty");
        }
        if !(1..=MAX_EXPIRATION_HOURS).contains(&expiration_hours) {
            bail!(
                "JWT expiration must be between 1 and {} hours, got {}",
                MAX_EXPIRATION_HOURS,
                expiration_hours
            );
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl: Duration::hours(expiration_hours),
        })
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String> {
        self.issue_at(user_id, role, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, role: Role, issued_at: DateTime<Utc>) -> Result<String> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .context("token expiry out of range")?;
        let claims = Claims {
            sub: user_id,
            role,
            iat: issued_at.timestamp().max(0) as usize,
            exp: expires_at.timestamp().max(0) as usize,
        };

        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding)?)
    }

    /// Checks signature, algorithm and expiry. Every failure looks the same
    /// to the caller.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                ApiError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new("test-secret", Algorithm::HS256, 24).unwrap()
    }

    #[test]
    fn issued_token_carries_subject_and_role() {
        let keys = keys();
        let id = Uuid::new_v4();

        let claims = keys.verify(&keys.issue(id, Role::Admin).unwrap()).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let long_ago = Utc::now() - Duration::hours(25);

        let token = keys.issue_at(Uuid::new_v4(), Role::User, long_ago).unwrap();
        assert!(matches!(keys.verify(&token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn token_just_inside_expiry_is_accepted() {
        let keys = keys();
        let almost = Utc::now() - Duration::hours(23);

        let token = keys.issue_at(Uuid::new_v4(), Role::User, almost).unwrap();
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenKeys::new("other-secret", Algorithm::HS256, 24).unwrap();
        let token = other.issue(Uuid::new_v4(), Role::Admin).unwrap();

        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn algorithm_mismatch_is_rejected() {
        let hs512 = TokenKeys::new("test-secret", Algorithm::HS512, 24).unwrap();
        let token = hs512.issue(Uuid::new_v4(), Role::User).unwrap();

        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(keys().verify("not.a.token").is_err());
        assert!(keys().verify("").is_err());
    }

    #[test]
    fn rejects_asymmetric_algorithms_and_bad_settings() {
        assert!(TokenKeys::new("s", Algorithm::RS256, 24).is_err());
        assert!(TokenKeys::new("", Algorithm::HS256, 24).is_err());
        assert!(TokenKeys::new("s", Algorithm::HS256, 0).is_err());
    }

    #[test]
    fn oversized_expiry_is_refused_up_front() {
        assert!(TokenKeys::new("s", Algorithm::HS256, 3_000_000_000).is_err());
        assert!(TokenKeys::new("s", Algorithm::HS256, i64::MAX).is_err());

        let longest = TokenKeys::new("s", Algorithm::HS256, MAX_EXPIRATION_HOURS).unwrap();
        let token = longest.issue(Uuid::new_v4(), Role::User).unwrap();
        assert!(longest.verify(&token).is_ok());
    }

    #[test]
    fn expiry_past_the_calendar_is_an_error() {
        let keys = keys();
        let token = keys.issue_at(Uuid::new_v4(), Role::User, DateTime::<Utc>::MAX_UTC);
        assert!(token.is_err());
    }
}
