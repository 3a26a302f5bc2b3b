//! Password hashing for staff credentials.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::DomainError;

/// Well-formed Argon2id hash with the default cost parameters that no password
/// produces. Login verifies against it when the username is unknown.
pub(crate) const UNKNOWN_USER_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$Ymxvb2QtYmFuay1sb2dpbg$oYDMNv2ixbjoJ6JLtJw+H9KSsiTCBKkA9sI5ggf+lcA";

/// Hashes and verifies staff passwords.
pub trait PasswordService: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String, DomainError>;

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, DomainError>;
}

/// Argon2-based implementation of [`PasswordService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordService;

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::PasswordHashing(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        let parsed_hash = argon2::PasswordHash::new(hash)
            .map_err(|e| DomainError::PasswordHashing(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_phc_string_with_fresh_salt() {
        let service = Argon2PasswordService::new();
        let first = service.hash_password("s3cret").unwrap();
        let second = service.hash_password("s3cret").unwrap();

        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);
    }

    #[test]
    fn verify_accepts_only_the_right_password() {
        let service = Argon2PasswordService::new();
        let hash = service.hash_password("correct horse").unwrap();

        assert!(service.verify_password("correct horse", &hash).unwrap());
        assert!(!service.verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn unknown_user_hash_parses_and_never_matches() {
        let service = Argon2PasswordService::new();
        assert!(!service.verify_password("", UNKNOWN_USER_HASH).unwrap());
        assert!(!service.verify_password("hunter22", UNKNOWN_USER_HASH).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let service = Argon2PasswordService::new();
        assert!(matches!(
            service.verify_password("anything", "not-a-hash"),
            Err(DomainError::PasswordHashing(_))
        ));
    }
}
