use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::error::{ServiceError, ServiceResult};

pub const MIN_PASSWORD_LENGTH: usize = 6;
const TEMPORARY_PASSWORD_LENGTH: usize = 10;

/// Argon2 PHC string for `password` with a fresh random salt.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::PasswordHash(e.to_string()))
}

/// A stored hash that does not parse never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn check_policy(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}

/// Random alphanumeric password handed out on account creation or reset.
pub fn temporary_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}
