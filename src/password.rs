use argon2::{self, Config as ArgonConfig};
use rand::Rng;

use crate::errors::ApiError;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();

    argon2::hash_encoded(password.as_bytes(), &salt, &config).map_err(|e| {
        log::error!("Password hashing failed: {}", e);
        ApiError::Internal("password hashing failed".to_string())
    })
}

/// A stored hash that cannot be parsed is treated as a mismatch.
pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let first = hash_password("pw").unwrap();
        let second = hash_password("pw").unwrap();

        assert_ne!(first, "pw");
        assert_ne!(first, second);
        assert!(verify_password(&first, "pw"));
        assert!(verify_password(&second, "pw"));
        assert!(!verify_password(&first, "wrong"));
    }

    #[test]
    fn corrupt_hash_never_matches() {
        assert!(!verify_password("not-a-hash", "pw"));
    }
}
