//! Input validation utilities
//!
//! Required-field checks live at the input layer; the store accepts whatever
//! it is given.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}

/// Plausible `local@domain.tld` address
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

/// Trimmed value, or an error naming the missing field
pub fn require_field<'a>(field: &str, value: &'a str) -> Result<&'a str, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(trimmed)
    }
}

/// Empty or whitespace-only input becomes `None`
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Reduce an RFC 3339 timestamp or a plain date to `YYYY-MM-DD` (UTC)
pub fn to_iso_date(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(
            timestamp
                .with_timezone(&Utc)
                .date_naive()
                .format("%Y-%m-%d")
                .to_string(),
        );
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("canal1@tudominio.com"));
        assert!(is_valid_email("  a.b@c.io "));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_require_field() {
        assert_eq!(require_field("Name", "  Chan "), Ok("Chan"));
        assert_eq!(require_field("Name", "   "), Err("Name is required".to_string()));
    }

    #[test]
    fn test_to_iso_date() {
        assert_eq!(
            to_iso_date("2020-01-02T23:30:00-05:00"),
            Some("2020-01-03".to_string())
        );
        assert_eq!(to_iso_date("2023-01-01"), Some("2023-01-01".to_string()));
        assert_eq!(to_iso_date("01/02/2023"), None);
        assert_eq!(to_iso_date(""), None);
    }
}
