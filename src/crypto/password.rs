//! Salted password hashing using Argon2id
//!
//! Hashes are stored as PHC strings, which carry their own salt and
//! parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{ExpenseError, ExpenseResult};

/// Hash checked when a login names nobody, so both paths cost one Argon2 run
///
/// Random salt and output under the default Argon2id parameters; no
/// password maps to it.
const DECOY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$gZLdnU8DLpHnCQvaTPN8cw$0YnS06OyJlzny6o9NdRCnTnv1Rb1UA4Dd9WmQdfZpWw";

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> ExpenseResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ExpenseError::Crypto(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash
///
/// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> ExpenseResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ExpenseError::Crypto(format!("Invalid stored password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Spend one full verification without any account behind it
///
/// Always `false`.
pub fn verify_decoy(password: &str) -> bool {
    let _ = verify_password(password, DECOY_HASH);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Password123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Password123", &hash).unwrap());
        assert!(!verify_password("password123", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("Password123").unwrap();
        let b = hash_password("Password123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_decoy_never_verifies() {
        assert!(!verify_decoy(""));
        assert!(!verify_decoy("Password123"));
    }

    #[test]
    fn test_decoy_costs_the_same_as_a_real_hash() {
        // Same algorithm, version and cost parameters as freshly stored hashes
        let real = hash_password("Password123").unwrap();
        let params = |phc: &str| phc.split('$').take(4).collect::<Vec<_>>().join("$");
        assert_eq!(params(DECOY_HASH), params(&real));

        // A well-formed hash, so verification runs to completion
        assert!(matches!(verify_password("Password123", DECOY_HASH), Ok(false)));
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("Password123", "not-a-hash").is_err());
    }
}
