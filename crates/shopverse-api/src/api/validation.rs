// Input validation for member APIs
//
// Field limits for signup. Violations are reported with the first failing
// field's message and the VALIDATION_ERROR code.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ApiError;

// =============================================================================
// Field Limits
// =============================================================================

pub const LOGIN_ID_MIN_CHARS: usize = 3;
pub const LOGIN_ID_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 100;
pub const NAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const PHONE_MAX_CHARS: usize = 20;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[0-9-]+$").expect("valid phone regex"))
}

// =============================================================================
// Validation Functions
// =============================================================================

pub fn validate_login_id(login_id: &str) -> Result<(), ApiError> {
    let len = login_id.chars().count();
    if login_id.trim().is_empty() || !(LOGIN_ID_MIN_CHARS..=LOGIN_ID_MAX_CHARS).contains(&len) {
        return Err(ApiError::validation(format!(
            "Login id must be {} to {} characters",
            LOGIN_ID_MIN_CHARS, LOGIN_ID_MAX_CHARS
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
        return Err(ApiError::validation(format!(
            "Password must be {} to {} characters",
            PASSWORD_MIN_CHARS, PASSWORD_MAX_CHARS
        )));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ApiError::validation(format!(
            "Name must be at most {} characters",
            NAME_MAX_CHARS
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.chars().count() > EMAIL_MAX_CHARS || !email_regex().is_match(email) {
        return Err(ApiError::validation("Email address is not valid"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ApiError> {
    if phone.chars().count() > PHONE_MAX_CHARS || !phone_regex().is_match(phone) {
        return Err(ApiError::validation("Phone number is not valid"));
    }
    Ok(())
}
