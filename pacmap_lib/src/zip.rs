//! ZIP code decomposition.
//!
//! FEC bulk files carry ZIP codes as free text: 5 digits, 9 digits, ZIP+4 with a
//! hyphen, numbers that lost their leading zero, or nothing at all. This module
//! reduces all of that to an optional 5-digit primary and 4-digit secondary code.

use serde::{Deserialize, Serialize};

/// A ZIP code split into its base code and optional add-on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipCode {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl ZipCode {
    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }
}

/// Split a raw ZIP value into primary (5-digit) and secondary (4-digit) parts.
///
/// Only the first maximal run of ASCII digits is considered, so `"19201-1234"`
/// yields primary `19201` and no secondary (the hyphen ends the run).
/// Runs shorter than 5 digits are treated as invalid and produce an empty
/// `ZipCode`; the caller keeps the row.
pub fn split_zip(raw: &str) -> ZipCode {
    let digits = first_digit_run(raw);

    if digits.len() < 5 {
        if !raw.trim().is_empty() {
            tracing::debug!("invalid zip {:?}: fewer than 5 digits", raw);
        }
        return ZipCode::default();
    }

    let primary = digits[..5].to_string();
    let secondary = if digits.len() > 5 {
        if digits.len() < 9 {
            tracing::debug!("zip {:?} has a short add-on, taking trailing 4 digits", raw);
        }
        Some(digits[digits.len() - 4..].to_string())
    } else {
        None
    };

    ZipCode {
        primary: Some(primary),
        secondary,
    }
}

fn first_digit_run(raw: &str) -> &str {
    let start = match raw.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => idx,
        None => return "",
    };
    let rest = &raw[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    &rest[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_digits() {
        let zip = split_zip("192011234");
        assert_eq!(zip.primary.as_deref(), Some("19201"));
        assert_eq!(zip.secondary.as_deref(), Some("1234"));
    }

    #[test]
    fn test_five_digits() {
        let zip = split_zip("19201");
        assert_eq!(zip.primary.as_deref(), Some("19201"));
        assert_eq!(zip.secondary, None);
    }

    #[test]
    fn test_short_run_is_invalid() {
        assert!(split_zip("2134").is_empty());
        assert_eq!(split_zip("2134").secondary, None);
    }

    #[test]
    fn test_empty_and_garbage() {
        assert!(split_zip("").is_empty());
        assert!(split_zip("N/A").is_empty());
    }

    #[test]
    fn test_first_run_only() {
        let zip = split_zip("19201-1234");
        assert_eq!(zip.primary.as_deref(), Some("19201"));
        assert_eq!(zip.secondary, None);
    }

    #[test]
    fn test_leading_text() {
        let zip = split_zip("ZIP 100171234");
        assert_eq!(zip.primary.as_deref(), Some("10017"));
        assert_eq!(zip.secondary.as_deref(), Some("1234"));
    }

    #[test]
    fn test_primary_always_first_five() {
        for raw in ["123456789", "12345", "1234567890", "123456"] {
            let zip = split_zip(raw);
            assert_eq!(zip.primary.as_deref(), Some(&raw[..5]));
            if raw.len() > 5 {
                assert_eq!(zip.secondary.as_ref().map(|s| s.len()), Some(4));
            }
        }
    }
}
