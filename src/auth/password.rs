//! Password hashing with bcrypt.

use bcrypt::BcryptError;
use std::ops::RangeInclusive;

use crate::error::AppError;

/// Work factors bcrypt accepts.
pub const COST_RANGE: RangeInclusive<u32> = 4..=31;

/// Hashes `password` with the given work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a stored hash.
///
/// A stored value that is not a bcrypt hash (an account whose password was
/// never set) matches nothing.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    match bcrypt::verify(password, stored_hash) {
        Ok(matches) => Ok(matches),
        Err(BcryptError::InvalidHash(_))
        | Err(BcryptError::InvalidPrefix(_))
        | Err(BcryptError::InvalidCost(_))
        | Err(BcryptError::InvalidBase64(_)) => {
            log::warn!("stored password is not a bcrypt hash");
            Ok(false)
        }
        Err(e) => Err(AppError::InternalServerError(format!(
            "Failed to verify password: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hashed = hash_password("qwer1234", 4).unwrap();

        assert_ne!(hashed, "qwer1234");
        assert!(hashed.starts_with("$2"));
        assert!(verify_password("qwer1234", &hashed).unwrap());
        assert!(!verify_password("qwer4321", &hashed).unwrap());
    }

    #[test]
    fn test_unset_password_never_matches() {
        assert!(!verify_password("anything", "").unwrap());
        assert!(!verify_password("anything", "hash").unwrap());
    }

    #[test]
    fn test_cost_outside_range_is_an_error() {
        assert!(!COST_RANGE.contains(&3));
        assert!(hash_password("qwer1234", 3).is_err());
    }
}
