use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Signs and verifies HS256 bearer tokens. Tokens are stateless; there is no
/// revocation list.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub const MAX_TTL_DAYS: i64 = 365;

    /// `ttl_days` is clamped to `1..=MAX_TTL_DAYS`.
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days.clamp(1, Self::MAX_TTL_DAYS)),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: (issued_at + self.ttl).timestamp(),
            iat: issued_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Token signing failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => Error::Unauthorized("Invalid token".to_string()),
            })
    }
}
