use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

use crate::indicators::dto::Indicator;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

/// `DD-MM-YYYY`, the format the provider expects in its URLs.
pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[day]-[month]-[year]");

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date `{0}`, expected DD-MM-YYYY")]
pub struct InvalidDateFormat(pub String);

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return false;
    }
    password.chars().any(|c| c.is_ascii_alphabetic()) && password.chars().any(|c| c.is_ascii_digit())
}

pub fn is_valid_indicator(name: &str) -> bool {
    name.parse::<Indicator>().is_ok()
}

/// Parses a `DD-MM-YYYY` date. Blank input means today.
pub fn parse_date(input: &str) -> Result<Date, InvalidDateFormat> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(today());
    }
    if !DATE_RE.is_match(input) {
        return Err(InvalidDateFormat(input.to_string()));
    }
    Date::parse(input, DATE_FORMAT).map_err(|_| InvalidDateFormat(input.to_string()))
}

pub fn format_date(date: Date) -> String {
    // DATE_FORMAT only has numeric components, formatting a Date cannot fail
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Local calendar date, or the UTC one when the local offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn username_accepts_allowed_charset_and_bounds() {
        assert!(is_valid_username("abc"));
        assert!(is_valid_username("john.doe-99_x"));
        assert!(is_valid_username(&"a".repeat(32)));
    }

    #[test]
    fn username_rejects_bad_length_or_chars() {
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username(&"a".repeat(33)));
        assert!(!is_valid_username("john doe"));
        assert!(!is_valid_username("john@doe"));
        assert!(!is_valid_username("jöhn"));
        assert!(!is_valid_username("abc\n"));
    }

    #[test]
    fn password_requires_letter_digit_and_length() {
        assert!(is_valid_password("abcdefg1"));
        assert!(is_valid_password(&format!("{}1", "a".repeat(127))));
        assert!(!is_valid_password("abc1"));
        assert!(!is_valid_password("abcdefgh"));
        assert!(!is_valid_password("12345678"));
        assert!(!is_valid_password(&format!("{}1", "a".repeat(128))));
    }

    #[test]
    fn indicator_membership() {
        for name in ["uf", "dolar", "euro", "utm", "ipc", "ivp"] {
            assert!(is_valid_indicator(name), "{name}");
        }
        assert!(!is_valid_indicator("bitcoin"));
        assert!(!is_valid_indicator("UF"));
        assert!(!is_valid_indicator(""));
    }

    #[test]
    fn parse_date_accepts_dd_mm_yyyy() {
        assert_eq!(parse_date("01-02-2025").unwrap(), date!(2025 - 02 - 01));
        assert_eq!(parse_date(" 31-12-2024 ").unwrap(), date!(2024 - 12 - 31));
    }

    #[test]
    fn parse_date_blank_means_today() {
        assert_eq!(parse_date("").unwrap(), today());
        assert_eq!(parse_date("   ").unwrap(), today());
    }

    #[test]
    fn parse_date_rejects_other_shapes() {
        for bad in ["2025-02-01", "1-2-2025", "31-02-2025", "00-01-2025", "today", "01/02/2025"] {
            let err = parse_date(bad).unwrap_err();
            assert_eq!(err, InvalidDateFormat(bad.to_string()));
        }
    }

    #[test]
    fn format_date_zero_pads() {
        assert_eq!(format_date(date!(2025 - 03 - 04)), "04-03-2025");
    }
}
