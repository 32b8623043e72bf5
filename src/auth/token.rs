use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Session lifetimes accepted from configuration, in hours (up to a year).
pub const SESSION_TTL_RANGE: RangeInclusive<i64> = 1..=24 * 365;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Id of the logged-in user.
    pub sub: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Issue timestamp (seconds since epoch).
    pub iat: usize,
}

/// Signs a session token for `user_id` that stays valid for `ttl_hours`.
///
/// # Returns
/// The encoded token, or `AppError::InternalServerError` if the expiry is not
/// representable or signing fails.
pub fn generate_token(user_id: i64, secret: &str, ttl_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = Duration::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            AppError::InternalServerError(format!("Session lifetime out of range: {}h", ttl_hours))
        })?;
    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a session token's signature and expiry and returns its claims.
///
/// Returns `AppError::Unauthorized` if the token is malformed, signed with
/// another secret, or expired.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}
