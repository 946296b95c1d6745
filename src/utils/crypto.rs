use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::{Error, Result};

/// One-way credential hashing used by registration and login.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String>;
    fn verify(&self, plain: &str, hashed: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();
        Ok(hashed)
    }

    fn verify(&self, plain: &str, hashed: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hashed)
            .map_err(|e| Error::Internal(format!("Stored password hash is malformed: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon2_round_trip() {
        let hasher = Argon2Hasher;
        let hashed = hasher.hash("hunter22").unwrap();
        assert_ne!(hashed, "hunter22");
        assert!(hasher.verify("hunter22", &hashed).unwrap());
        assert!(!hasher.verify("hunter23", &hashed).unwrap());
    }

    #[test]
    fn malformed_hash_is_internal() {
        let err = Argon2Hasher.verify("x", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
