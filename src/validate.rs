use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+@([\w-]+\.)+[\w-]{2,4}$").unwrap());

const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 10;

const MIN_NAME_LEN: usize = 3;

const MIN_COMMENT_LEN: usize = 20;
const MAX_COMMENT_LEN: usize = 250;

pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Password rule: 6-10 characters, at least one uppercase letter, one digit
/// and one symbol from a fixed punctuation set. This is the single canonical
/// rule for both registration and login.
pub fn validate_password(password: &str) -> bool {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return false;
    }
    password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// Checks login credentials before any database access. Returns the first
/// violated rule, it does not aggregate errors.
pub fn validate_login(email: &str, password: &str) -> Result<()> {
    if !validate_email(email) {
        bail!("invalid email format");
    }
    if !validate_password(password) {
        bail!(
            "password must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters long, \
             include at least one uppercase letter, one number, and one special character"
        );
    }
    Ok(())
}

pub fn validate_registration(name: &str, email: &str, password: &str) -> Result<()> {
    if name.chars().count() < MIN_NAME_LEN {
        bail!("full name must be at least {MIN_NAME_LEN} characters");
    }
    validate_login(email, password)
}

/// Profile updates reuse the registration rules, except the password is
/// optional: a missing password means "keep the current one".
pub fn validate_profile(name: &str, email: &str, password: Option<&str>) -> Result<()> {
    if name.chars().count() < MIN_NAME_LEN {
        bail!("full name must be at least {MIN_NAME_LEN} characters");
    }
    if !validate_email(email) {
        bail!("invalid email format");
    }
    if let Some(password) = password {
        if !validate_password(password) {
            bail!(
                "password must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters long, \
                 include at least one uppercase letter, one number, and one special character"
            );
        }
    }
    Ok(())
}

pub fn validate_comment(content: &str) -> Result<()> {
    if content.is_empty() {
        bail!("comment content cannot be empty");
    }
    let len = content.chars().count();
    if !(MIN_COMMENT_LEN..=MAX_COMMENT_LEN).contains(&len) {
        bail!("comment must be between {MIN_COMMENT_LEN} and {MAX_COMMENT_LEN} characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("a@b.com"));
        assert!(validate_email("john.doe@example.co"));
        assert!(validate_email("user_1@mail.example.org"));

        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("missing@tld"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_password() {
        // Samples from the login rule documentation.
        for ok in ["Abc1!d", "Xyz9#Q", "Qwert7*", "Java8@A", "Code1$X", "Train9%T"] {
            assert!(validate_password(ok), "{ok} should pass");
        }

        assert!(!validate_password("short"));
        assert!(!validate_password("Ab1!")); // too short
        assert!(!validate_password("Abcdefg1234!")); // too long
        assert!(!validate_password("abc1!def")); // no uppercase
        assert!(!validate_password("Abc!defg")); // no digit
        assert!(!validate_password("Abc1defg")); // no symbol
    }

    #[test]
    fn test_login() {
        assert!(validate_login("a@b.com", "Abc1!d").is_ok());

        let err = validate_login("not-an-email", "Abc1!d").unwrap_err();
        assert!(err.to_string().contains("email"));

        let err = validate_login("a@b.com", "short").unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_registration() {
        assert!(validate_registration("Alice", "a@b.com", "Abc1!d").is_ok());

        let err = validate_registration("al", "a@b.com", "Abc1!d").unwrap_err();
        assert!(err.to_string().contains("name"));

        assert!(validate_registration("Alice", "bad", "Abc1!d").is_err());
        assert!(validate_registration("Alice", "a@b.com", "weak").is_err());
    }

    #[test]
    fn test_profile() {
        assert!(validate_profile("Alice", "a@b.com", None).is_ok());
        assert!(validate_profile("Alice", "a@b.com", Some("Abc1!d")).is_ok());

        // Names are counted in characters, not bytes.
        assert!(validate_profile("Ål", "a@b.com", None).is_err());
        assert!(validate_profile("Åse", "a@b.com", None).is_ok());

        assert!(validate_profile("Alice", "bad", None).is_err());
        assert!(validate_profile("Alice", "a@b.com", Some("weak")).is_err());
    }

    #[test]
    fn test_comment() {
        assert!(validate_comment(&"x".repeat(20)).is_ok());
        assert!(validate_comment(&"x".repeat(250)).is_ok());
        assert!(validate_comment("").is_err());
        assert!(validate_comment("too short").is_err());
        assert!(validate_comment(&"x".repeat(251)).is_err());
    }
}
