//! Identity validation: email shape and password policy.
//! Every rule reports its own message so callers can list them all at once.

use crate::config;

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl PasswordPolicy {
    pub fn from_config() -> Self {
        let identity = &config::config().identity;
        Self {
            min_length: identity.password_min_length,
            require_digit: identity.password_require_digit,
            require_lowercase: identity.password_require_lowercase,
            require_uppercase: identity.password_require_uppercase,
            require_non_alphanumeric: identity.password_require_non_alphanumeric,
        }
    }

    /// Messages for every rule the password breaks; empty when it passes
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if password.chars().count() < self.min_length {
            errors.push(format!("Passwords must be at least {} characters.", self.min_length));
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Passwords must have at least one digit ('0'-'9').".to_string());
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push("Passwords must have at least one lowercase ('a'-'z').".to_string());
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push("Passwords must have at least one uppercase ('A'-'Z').".to_string());
        }
        if self.require_non_alphanumeric && password.chars().all(|c| c.is_alphanumeric()) {
            errors.push("Passwords must have at least one non alphanumeric character.".to_string());
        }
        errors
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: false,
        }
    }
}

/// Basic email shape check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
