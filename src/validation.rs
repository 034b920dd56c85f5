// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Input validation for registration and profile updates. Validators collect every failure
//! instead of stopping at the first, so callers can report the full list at once.

use regex::Regex;
use std::sync::LazyLock;

/// Deliberately loose: anything of the form `something@something.something`, no whitespace.
/// Real deliverability is the mail server's problem.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("failed to compile email regex")
});

const USERNAME_MIN_LENGTH: usize = 3;
const PASSWORD_MIN_LENGTH: usize = 6;
const BIO_MAX_LENGTH: usize = 500;
const LOCATION_MAX_LENGTH: usize = 100;
const FAVORITE_HERO_MAX_LENGTH: usize = 100;

/// Validate a registration attempt. Returns every problem found; empty means valid.
pub fn validate_registration(username: &str, email: &str, password: &str, confirm_password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if username.is_empty() || email.is_empty() || password.is_empty() {
        errors.push("All fields are required".to_string());
    }
    if !username.is_empty() && username.chars().count() < USERNAME_MIN_LENGTH {
        errors.push(format!("Username must be at least {USERNAME_MIN_LENGTH} characters long"));
    }
    if !email.is_empty() && !EMAIL_REGEX.is_match(email) {
        errors.push("Please provide a valid email address".to_string());
    }
    if !password.is_empty() && password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(format!("Password must be at least {PASSWORD_MIN_LENGTH} characters long"));
    }
    if password != confirm_password {
        errors.push("Passwords do not match".to_string());
    }
    errors
}

/// Validate a profile update. Returns every problem found; empty means valid.
pub fn validate_profile(bio: &str, location: &str, favorite_hero: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if bio.chars().count() > BIO_MAX_LENGTH {
        errors.push(format!("Bio must be {BIO_MAX_LENGTH} characters or less"));
    }
    if location.chars().count() > LOCATION_MAX_LENGTH {
        errors.push(format!("Location must be {LOCATION_MAX_LENGTH} characters or less"));
    }
    if favorite_hero.chars().count() > FAVORITE_HERO_MAX_LENGTH {
        errors.push(format!("Favorite hero must be {FAVORITE_HERO_MAX_LENGTH} characters or less"));
    }
    errors
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_valid_registration() {
        let errors = validate_registration("alice", "alice@example.com", "hunter22", "hunter22");
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn test_missing_fields() {
        let errors = validate_registration("", "", "", "");
        assert_eq!(errors, vec!["All fields are required".to_string()]);
    }

    #[test]
    fn test_short_username() {
        let errors = validate_registration("al", "alice@example.com", "hunter22", "hunter22");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Username"));
    }

    #[test]
    fn test_bad_email() {
        for email in ["no-at-sign", "two@@example.com.", "spaces in@example.com", "no-tld@example"] {
            let errors = validate_registration("alice", email, "hunter22", "hunter22");
            assert!(
                errors.iter().any(|e| e.contains("email")),
                "expected email error for {email:?}, got {errors:?}"
            );
        }
    }

    #[test]
    fn test_short_password() {
        let errors = validate_registration("alice", "alice@example.com", "pw", "pw");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Password"));
    }

    #[test]
    fn test_password_mismatch() {
        let errors = validate_registration("alice", "alice@example.com", "hunter22", "hunter23");
        assert_eq!(errors, vec!["Passwords do not match".to_string()]);
    }

    #[test]
    fn test_multiple_errors_collected() {
        let errors = validate_registration("al", "bogus", "pw", "other");
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_profile_limits() {
        assert!(validate_profile("a", "b", "c").is_empty());
        assert_eq!(validate_profile(&"x".repeat(501), "", "").len(), 1);
        assert_eq!(validate_profile("", &"x".repeat(101), "").len(), 1);
        assert_eq!(validate_profile("", "", &"x".repeat(101)).len(), 1);
        assert!(validate_profile(&"x".repeat(500), &"x".repeat(100), &"x".repeat(100)).is_empty());
    }
}
