//! Password strength policy

use crate::error::{ExpenseError, ExpenseResult};

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Require at least 8 characters, an ASCII uppercase letter and a digit
pub fn validate_password(password: &str) -> ExpenseResult<()> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_upper && has_digit {
        Ok(())
    } else {
        Err(ExpenseError::Validation(
            "Password must be at least 8 characters long, contain an uppercase letter, and a digit."
                .into(),
        ))
    }
}

/// Check a new password and its confirmation
pub fn validate_new_password(password: &str, confirm: &str) -> ExpenseResult<()> {
    if password != confirm {
        return Err(ExpenseError::Validation("Passwords do not match.".into()));
    }
    validate_password(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_strong_password() {
        assert!(validate_password("Password123").is_ok());
        assert!(validate_password("Abcdefg1!").is_ok());
    }

    #[test]
    fn test_rejects_weak_passwords() {
        assert!(validate_password("Pass1").is_err());
        assert!(validate_password("password123").is_err());
        assert!(validate_password("PASSWORDxx").is_err());
    }

    #[test]
    fn test_confirmation_must_match() {
        let err = validate_new_password("Password123", "Password124").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Passwords do not match.");
    }
}
