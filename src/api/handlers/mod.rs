//! Route handlers and shared request validation helpers.

pub mod auth;
pub mod health;
pub mod root;

use regex::Regex;

/// Lightweight email sanity check used before persisting anything.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::valid_email;

    #[test]
    fn email_validation() {
        assert!(valid_email("user@example.com"));
        assert!(valid_email("a.b+c@sub.example.org"));
        assert!(!valid_email("user@example"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("two@@example.com"));
        assert!(!valid_email("spaced user@example.com"));
    }
}
