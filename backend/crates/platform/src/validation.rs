//! Input Validation
//!
//! One total function per field class. Each returns the normalized value or a
//! [`FieldError`] describing why the input was rejected; none of them panic.

use std::ops::RangeInclusive;

use chrono::{Local, NaiveDate, NaiveTime};
use thiserror::Error;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;
const EMAIL_LOCAL_MAX_LENGTH: usize = 64;
const DOMAIN_LABEL_MAX_LENGTH: usize = 63;

pub const AGE_RANGE: RangeInclusive<i64> = 0..=150;
pub const HEIGHT_CM_RANGE: RangeInclusive<i64> = 50..=250;
pub const WEIGHT_KG_RANGE: RangeInclusive<i64> = 20..=300;

/// Accepted date layouts
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

/// Why a field was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Pflichtfeld fehlt.")]
    Required,

    #[error("Maximal {max} Zeichen erlaubt.")]
    TooLong { max: usize },

    #[error("Ungültige E-Mail-Adresse.")]
    InvalidEmail,

    #[error("Ungültige Telefonnummer. Bitte verwende ein gültiges Format.")]
    InvalidPhone,

    #[error("Ungültige Zahl.")]
    NotANumber,

    #[error("Wert muss zwischen {min} und {max} liegen.")]
    OutOfRange { min: i64, max: i64 },

    #[error("Ungültiges Datum.")]
    InvalidDate,

    #[error("Ungültiges Datum. Das Datum muss in der Zukunft liegen.")]
    DateNotInFuture,

    #[error("Ungültiges Uhrzeitformat. Bitte verwende HH:MM Format.")]
    InvalidTime,
}

pub type FieldResult<T> = Result<T, FieldError>;

// ============================================================================
// Presence
// ============================================================================

/// Present, non-blank value
pub fn required(raw: Option<&str>) -> FieldResult<&str> {
    match raw {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(FieldError::Required),
    }
}

/// Apply `validate` only when a non-blank value was submitted
///
/// Missing and blank inputs short-circuit to `None` without running any rule.
pub fn optional<T>(
    raw: Option<&str>,
    validate: impl FnOnce(&str) -> FieldResult<T>,
) -> FieldResult<Option<T>> {
    match raw {
        Some(value) if !value.trim().is_empty() => validate(value).map(Some),
        _ => Ok(None),
    }
}

// ============================================================================
// Text
// ============================================================================

/// Trim, bound the length (in characters) and HTML-escape
pub fn validate_text(raw: &str, max_chars: usize) -> FieldResult<String> {
    let text = raw.trim();
    if text.chars().count() > max_chars {
        return Err(FieldError::TooLong { max: max_chars });
    }
    Ok(escape_html(text))
}

/// Escape `& < > " '` for embedding in HTML or mail bodies
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Email
// ============================================================================

/// Strip stray characters, then check the address grammar
pub fn validate_email(raw: &str) -> FieldResult<String> {
    let email: String = raw.chars().filter(|&c| is_email_char(c)).collect();

    if is_valid_email(&email) {
        Ok(email)
    } else {
        Err(FieldError::InvalidEmail)
    }
}

fn is_email_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(c)
}

fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~".contains(c)
}

fn is_valid_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LENGTH {
        return false;
    }

    // Must contain exactly one @
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') {
        return false;
    }

    // Local part: dot-separated atoms
    if local.is_empty() || local.len() > EMAIL_LOCAL_MAX_LENGTH {
        return false;
    }
    if !local
        .split('.')
        .all(|atom| !atom.is_empty() && atom.chars().all(is_atom_char))
    {
        return false;
    }

    // Domain: at least two labels of alphanumerics and inner hyphens
    if !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= DOMAIN_LABEL_MAX_LENGTH
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}

// ============================================================================
// Phone
// ============================================================================

/// Keep digits and `+ - ( )` and spaces, then bound the length
pub fn validate_phone(raw: &str, min: usize, max: usize) -> FieldResult<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || "+-() ".contains(*c))
        .collect();

    if (min..=max).contains(&cleaned.len()) {
        Ok(cleaned)
    } else {
        Err(FieldError::InvalidPhone)
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Finite decimal number within `range`
pub fn validate_number(raw: &str, range: RangeInclusive<f64>) -> FieldResult<f64> {
    let value = parse_number(raw)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(FieldError::OutOfRange {
            min: *range.start() as i64,
            max: *range.end() as i64,
        })
    }
}

/// Number truncated toward zero, then checked against `range`
pub fn validate_integer(raw: &str, range: RangeInclusive<i64>) -> FieldResult<i64> {
    let value = parse_number(raw)?.trunc() as i64;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(FieldError::OutOfRange {
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Age in years (0-150)
pub fn validate_age(raw: &str) -> FieldResult<u8> {
    validate_integer(raw, AGE_RANGE).map(|age| age as u8)
}

/// Body height in cm (50-250)
pub fn validate_height(raw: &str) -> FieldResult<u16> {
    validate_integer(raw, HEIGHT_CM_RANGE).map(|cm| cm as u16)
}

/// Body weight in kg (20-300)
pub fn validate_weight(raw: &str) -> FieldResult<u16> {
    validate_integer(raw, WEIGHT_KG_RANGE).map(|kg| kg as u16)
}

fn parse_number(raw: &str) -> FieldResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(FieldError::NotANumber)
}

// ============================================================================
// Date / Time
// ============================================================================

/// Calendar date, relative to the local current day
pub fn validate_date(raw: &str, future_only: bool) -> FieldResult<NaiveDate> {
    validate_date_on(raw, future_only, Local::now().date_naive())
}

/// Calendar date relative to `today`
///
/// With `future_only`, the date must be strictly after `today`.
pub fn validate_date_on(raw: &str, future_only: bool, today: NaiveDate) -> FieldResult<NaiveDate> {
    let raw = raw.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or(FieldError::InvalidDate)?;

    if future_only && date <= today {
        return Err(FieldError::DateNotInFuture);
    }
    Ok(date)
}

/// `H:MM` or `HH:MM`, hour 0-23, minute 00-59
pub fn validate_time(raw: &str) -> FieldResult<NaiveTime> {
    let (hour, minute) = raw.split_once(':').ok_or(FieldError::InvalidTime)?;

    let digits = |s: &str, lengths: RangeInclusive<usize>| {
        lengths.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(hour, 1..=2) || !digits(minute, 2..=2) {
        return Err(FieldError::InvalidTime);
    }

    let hour: u32 = hour.parse().map_err(|_| FieldError::InvalidTime)?;
    let minute: u32 = minute.parse().map_err(|_| FieldError::InvalidTime)?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(FieldError::InvalidTime)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_text_trim_and_escape() {
        assert_eq!(validate_text(" hi ", 10).unwrap(), "hi");
        assert_eq!(
            validate_text("<b>\"Tom\" & 'Jerry'</b>", 100).unwrap(),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_text_length_in_chars() {
        assert_eq!(
            validate_text(&"x".repeat(11), 10),
            Err(FieldError::TooLong { max: 10 })
        );
        assert!(validate_text(&"x".repeat(10), 10).is_ok());
        // Multi-byte characters count once
        assert_eq!(validate_text("Größe", 5).unwrap(), "Größe");
    }

    #[test]
    fn test_email_valid() {
        assert_eq!(validate_email("a@b.de").unwrap(), "a@b.de");
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());
        assert_eq!(validate_email(" Max@Praxis.de ").unwrap(), "Max@Praxis.de");
    }

    #[test]
    fn test_email_invalid() {
        for bad in [
            "not-an-email",
            "",
            "@example.com",
            "user@",
            "user@@example.com",
            "user@example",
            "user..name@example.com",
            ".user@example.com",
            "user@-example.com",
            "user@example..com",
        ] {
            assert_eq!(validate_email(bad), Err(FieldError::InvalidEmail), "{bad}");
        }
    }

    #[test]
    fn test_email_sanitizes_stray_characters() {
        assert_eq!(validate_email("a b@c.de").unwrap(), "ab@c.de");
        assert_eq!(validate_email("mäx@c.de").unwrap(), "mx@c.de");
    }

    #[test]
    fn test_phone() {
        assert_eq!(
            validate_phone("+49 (30) 123-456", 6, 20).unwrap(),
            "+49 (30) 123-456"
        );
        assert_eq!(validate_phone("tel: 0301234", 6, 20).unwrap(), " 0301234");
        assert_eq!(validate_phone("12345", 6, 20), Err(FieldError::InvalidPhone));
        assert_eq!(
            validate_phone(&"1".repeat(21), 6, 20),
            Err(FieldError::InvalidPhone)
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(validate_number("12.5", 0.0..=20.0).unwrap(), 12.5);
        assert_eq!(validate_number("abc", 0.0..=20.0), Err(FieldError::NotANumber));
        assert_eq!(validate_number("NaN", 0.0..=20.0), Err(FieldError::NotANumber));
        assert_eq!(
            validate_number("21", 0.0..=20.0),
            Err(FieldError::OutOfRange { min: 0, max: 20 })
        );
    }

    #[test]
    fn test_body_measures() {
        assert_eq!(validate_age("42").unwrap(), 42);
        assert_eq!(validate_age("0").unwrap(), 0);
        assert_eq!(validate_age("150.7").unwrap(), 150);
        assert!(validate_age("151").is_err());
        assert!(validate_age("-1").is_err());
        assert!(validate_age("zwanzig").is_err());

        assert_eq!(validate_height("175.5").unwrap(), 175);
        assert!(validate_height("49").is_err());
        assert_eq!(validate_weight("300").unwrap(), 300);
        assert!(validate_weight("19").is_err());
    }

    #[test]
    fn test_date_future_only() {
        let today = day(2025, 6, 15);
        assert_eq!(
            validate_date_on("2025-06-16", true, today).unwrap(),
            day(2025, 6, 16)
        );
        assert_eq!(
            validate_date_on("2025-06-15", true, today),
            Err(FieldError::DateNotInFuture)
        );
        assert_eq!(
            validate_date_on("2025-06-15", false, today).unwrap(),
            day(2025, 6, 15)
        );
    }

    #[test]
    fn test_date_formats() {
        let today = day(2025, 1, 1);
        assert_eq!(
            validate_date_on("24.12.2025", true, today).unwrap(),
            day(2025, 12, 24)
        );
        assert_eq!(
            validate_date_on("2025-02-30", true, today),
            Err(FieldError::InvalidDate)
        );
        assert_eq!(validate_date_on("morgen", true, today), Err(FieldError::InvalidDate));
    }

    #[test]
    fn test_date_against_clock() {
        let tomorrow = Local::now().date_naive().succ_opt().unwrap();
        let today = Local::now().date_naive();
        assert!(validate_date(&tomorrow.format("%Y-%m-%d").to_string(), true).is_ok());
        assert!(validate_date(&today.format("%Y-%m-%d").to_string(), true).is_err());
    }

    #[test]
    fn test_time() {
        assert_eq!(
            validate_time("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            validate_time("9:05").unwrap(),
            NaiveTime::from_hms_opt(9, 5, 0).unwrap()
        );
        assert!(validate_time("23:59").is_ok());
        assert!(validate_time("00:00").is_ok());

        for bad in ["24:00", "12:60", "12:5", "123:00", "12-30", "", "ab:cd", "12:30:00"] {
            assert_eq!(validate_time(bad), Err(FieldError::InvalidTime), "{bad}");
        }
    }

    #[test]
    fn test_required_and_optional() {
        assert_eq!(required(Some("x")).unwrap(), "x");
        assert_eq!(required(Some("  ")), Err(FieldError::Required));
        assert_eq!(required(None), Err(FieldError::Required));

        // Blank optional input never reaches the rule
        let never = |_: &str| -> FieldResult<u8> { Err(FieldError::NotANumber) };
        assert_eq!(optional(None, never), Ok(None));
        assert_eq!(optional(Some(""), never), Ok(None));
        assert_eq!(optional(Some("42"), validate_age), Ok(Some(42)));
        assert_eq!(optional(Some("999"), validate_age).unwrap_err(), FieldError::OutOfRange { min: 0, max: 150 });
    }
}
