//! Calendar dates are stored as `YYYY-MM-DD` text so they sort and compare as strings.

use std::borrow::Cow;
use validator::ValidationError;

/// True for a real calendar date written as `YYYY-MM-DD`.
pub fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let number = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = &s[range];
        part.bytes()
            .all(|b| b.is_ascii_digit())
            .then(|| part.parse().ok())
            .flatten()
    };
    let (Some(year), Some(month), Some(day)) = (number(0..4), number(5..7), number(8..10)) else {
        return false;
    };

    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days_in_month).contains(&day)
}

/// `validator` hook for optional date fields.
pub fn validate_date(value: &str) -> Result<(), ValidationError> {
    if is_iso_date(value) {
        Ok(())
    } else {
        Err(ValidationError::new("date").with_message(Cow::Borrowed("must be a date (YYYY-MM-DD)")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_iso_date() {
        assert!(is_iso_date("2026-02-28"));
        assert!(is_iso_date("2024-02-29"));
        assert!(!is_iso_date("2026-02-29"));
        assert!(!is_iso_date("1900-02-29"));
        assert!(is_iso_date("2000-02-29"));
        assert!(!is_iso_date("2026-13-01"));
        assert!(!is_iso_date("2026-04-31"));
        assert!(!is_iso_date("2026-4-01"));
        assert!(!is_iso_date("2026/04/01"));
        assert!(!is_iso_date("+026-04-01"));
        assert!(!is_iso_date("2026-04-01T00:00"));
        assert!(!is_iso_date(""));
    }
}
