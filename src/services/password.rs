//! Password hashing with argon2id.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::config::Argon2Params;

fn hasher(params: Argon2Params) -> Result<Argon2<'static>, String> {
    let params = Params::new(params.memory_kib, params.time_cost, params.parallelism, None)
        .map_err(|e| e.to_string())?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plain password with argon2id using the configured cost parameters.
pub fn hash_password(password: &str, params: Argon2Params) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher(params)?
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| e.to_string())
}

/// Verify a password against a stored argon2id hash.
///
/// The cost parameters are taken from the hash string itself, so hashes
/// produced under older settings keep verifying.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small costs; production parameters come from config.
    fn test_params() -> Argon2Params {
        Argon2Params {
            memory_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("hunter2hunter2", test_params()).unwrap();
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password", test_params()).unwrap();
        let b = hash_password("same-password", test_params()).unwrap();
        assert_ne!(a, b);
    }
}
