//! Field-level validation rules shared by clinic records.
//!
//! Storage constraints remain the final authority; these checks only turn
//! obvious bad input into typed errors before any SQL runs.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-]{5,19}$").expect("valid phone regex"));
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("valid date regex")
});
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

/// Record validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field `{0}` must not be blank")]
    BlankField(&'static str),
    #[error("invalid email address `{0}`")]
    InvalidEmail(String),
    #[error("invalid phone number `{0}`")]
    InvalidPhone(String),
    #[error("invalid calendar date `{0}`; expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid currency code `{0}`; expected ISO 4217 like `USD`")]
    InvalidCurrency(String),
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: i64 },
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },
    #[error("`{later}` must not be earlier than `{earlier}`")]
    OutOfOrder {
        earlier: &'static str,
        later: &'static str,
    },
}

pub type ValidationResult = Result<(), ValidationError>;

pub(crate) fn require_text(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

/// Surrounding whitespace is ignored; repositories store the trimmed value.
pub(crate) fn check_email(value: Option<&str>) -> ValidationResult {
    match value {
        Some(email) if !EMAIL_RE.is_match(email.trim()) => {
            Err(ValidationError::InvalidEmail(email.to_string()))
        }
        _ => Ok(()),
    }
}

pub(crate) fn check_phone(value: Option<&str>) -> ValidationResult {
    match value {
        Some(phone) if !PHONE_RE.is_match(phone.trim()) => {
            Err(ValidationError::InvalidPhone(phone.to_string()))
        }
        _ => Ok(()),
    }
}

/// Accepts zero-padded `YYYY-MM-DD` naming a day that exists.
pub(crate) fn check_date(value: Option<&str>) -> ValidationResult {
    match value {
        Some(date)
            if !DATE_RE.is_match(date) || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() =>
        {
            Err(ValidationError::InvalidDate(date.to_string()))
        }
        _ => Ok(()),
    }
}

pub(crate) fn check_currency(value: &str) -> ValidationResult {
    if !CURRENCY_RE.is_match(value) {
        return Err(ValidationError::InvalidCurrency(value.to_string()));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: i64) -> ValidationResult {
    if value <= 0 {
        return Err(ValidationError::NonPositive { field, value });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: i64) -> ValidationResult {
    if value < 0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}
