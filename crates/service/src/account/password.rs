//! Password hashing (argon2, PHC strings) and the password policy applied
//! to new passwords.

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;

use super::errors::AccountError;

/// Hash a plaintext password into a self-describing PHC string.
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AccountError::HashError(e.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AccountError::HashError(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AccountError::HashError(e.to_string())),
    }
}

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "passw0rd", "12345678", "123456789",
    "1234567890", "qwerty123", "qwertyuiop", "iloveyou", "sunshine", "princess",
    "football", "baseball", "welcome1", "welcome123", "letmein1", "trustno1",
    "superman", "starwars", "whatever", "computer", "michelle", "jennifer",
    "1q2w3e4r", "abc12345", "abcd1234", "11111111", "00000000", "aa123456",
    "changeme", "dragon123", "monkey123", "master123", "shadow123", "zaq12wsx",
];

/// Attributes a password must not resemble.
#[derive(Debug, Clone, Default)]
pub struct UserAttributes<'a> {
    pub username: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self { Self { min_length: 8 } }
}

impl PasswordPolicy {
    /// All violations, in a stable order; empty when the password is acceptable.
    pub fn check(&self, password: &str, attrs: &UserAttributes<'_>) -> Vec<String> {
        let mut problems = Vec::new();
        let lower = password.to_lowercase();

        for (label, value) in [
            ("username", attrs.username),
            ("first name", attrs.first_name),
            ("last name", attrs.last_name),
            ("email address", attrs.email.map(|e| e.split('@').next().unwrap_or(e))),
        ] {
            if let Some(value) = value {
                if too_similar(&lower, &value.to_lowercase()) {
                    problems.push(format!("The password is too similar to the {}.", label));
                    break;
                }
            }
        }

        if password.chars().count() < self.min_length {
            problems.push(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ));
        }
        if COMMON_PASSWORDS.contains(&lower.trim()) {
            problems.push("This password is too common.".to_string());
        }
        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            problems.push("This password is entirely numeric.".to_string());
        }
        problems
    }
}

// Attribute parts shorter than 3 chars are ignored.
fn too_similar(password: &str, attribute: &str) -> bool {
    attribute
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| part.chars().count() >= 3)
        .any(|part| password.contains(part) || part.contains(password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Secret123", &hash).unwrap());
        assert!(!verify_password("secret123", &hash).unwrap());
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        assert!(matches!(verify_password("x", "not-a-phc-string"), Err(AccountError::HashError(_))));
    }

    #[test]
    fn policy_accepts_reasonable_password() {
        let attrs = UserAttributes { username: Some("alice"), email: Some("a@x.com"), ..Default::default() };
        assert!(PasswordPolicy::default().check("Secret123", &attrs).is_empty());
    }

    #[test]
    fn policy_reports_each_violation() {
        let policy = PasswordPolicy::default();
        let none = UserAttributes::default();

        let short = policy.check("Ab1", &none);
        assert_eq!(short, vec!["This password is too short. It must contain at least 8 characters.".to_string()]);

        let numeric = policy.check("12345678", &none);
        assert!(numeric.contains(&"This password is too common.".to_string()));
        assert!(numeric.contains(&"This password is entirely numeric.".to_string()));

        let attrs = UserAttributes { username: Some("margarethe"), ..Default::default() };
        let similar = policy.check("Margarethe2024", &attrs);
        assert_eq!(similar, vec!["The password is too similar to the username.".to_string()]);
    }

    #[test]
    fn email_domain_is_not_compared() {
        let attrs = UserAttributes { email: Some("jo@company.com"), ..Default::default() };
        assert!(PasswordPolicy::default().check("Computer-Lab-7", &attrs).is_empty());
    }
}
