use bcrypt::{hash, verify, DEFAULT_COST};

use crate::utils::AppError;

pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        Self::hash_with_cost(password, DEFAULT_COST)
    }

    pub fn hash_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
        hash(password, cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// A malformed stored hash counts as a mismatch, not a server fault.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        match verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be verified");
                false
            }
        }
    }

    /// bcrypt is CPU bound; request handlers hash on the blocking pool.
    pub async fn hash_blocking(password: String) -> Result<String, AppError> {
        tokio::task::spawn_blocking(move || Self::hash_password(&password)).await?
    }

    pub async fn verify_blocking(password: String, hash: String) -> Result<bool, AppError> {
        Ok(tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash)).await?)
    }

    pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
        if password.chars().count() < 8 {
            return Err(AppError::ValidationError(
                "Password must be at least 8 characters long".to_string(),
            ));
        }

        let has_letter = password.chars().any(|c| c.is_alphabetic());
        let has_digit = password.chars().any(|c| c.is_numeric());

        if !has_letter || !has_digit {
            return Err(AppError::ValidationError(
                "Password must contain at least one letter and one number".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash_with_cost("hunter2hunter2", 4).unwrap();
        assert!(PasswordService::verify_password("hunter2hunter2", &hash));
        assert!(!PasswordService::verify_password("wrong-password1", &hash));
    }

    #[test]
    fn test_garbage_hash_does_not_verify() {
        assert!(!PasswordService::verify_password("anything1", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_password_strength() {
        assert!(PasswordService::validate_password_strength("short1").is_err());
        assert!(PasswordService::validate_password_strength("onlyletters").is_err());
        assert!(PasswordService::validate_password_strength("12345678").is_err());
        assert!(PasswordService::validate_password_strength("admin1234").is_ok());
    }
}
