use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use crate::error::AppError;

/// Hash checked when no account matches, so a miss costs as much as a hit.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("decoy-password-never-matches").ok());

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);

    match result {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Burns one verification against the decoy hash. Always returns `false`.
pub fn verify_against_decoy(password: &str) -> bool {
    if let Some(decoy) = DECOY_HASH.as_deref() {
        let _ = verify_password(password, decoy);
    }
    false
}

/// Admin identity: an email plus a salted hash, built from configuration at
/// startup. Never persisted.
#[derive(Debug, Clone)]
pub struct AdminCredential {
    email: String,
    password_hash: String,
}

impl AdminCredential {
    pub fn new(email: &str, password: &str) -> Result<Self, AppError> {
        Ok(Self {
            email: email.trim().to_lowercase(),
            password_hash: hash_password(password)?,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Email compared case-insensitively, password through argon2.
    pub fn verify(&self, email: &str, password: &str) -> Result<bool, AppError> {
        if !email.trim().eq_ignore_ascii_case(&self.email) {
            return Ok(verify_against_decoy(password));
        }
        verify_password(password, &self.password_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("secret1", &first).unwrap());
        assert!(!verify_password("secret2", &first).unwrap());
    }

    #[test]
    fn admin_credential_checks_email_and_password() {
        let admin = AdminCredential::new("Admin@School.org", "hunter22").unwrap();
        assert_eq!(admin.email(), "admin@school.org");
        assert!(admin.verify("ADMIN@school.org", "hunter22").unwrap());
        assert!(!admin.verify("admin@school.org", "wrong").unwrap());
        assert!(!admin.verify("someone@school.org", "hunter22").unwrap());
    }
}
