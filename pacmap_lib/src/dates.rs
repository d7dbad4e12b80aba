//! Transaction date parsing.
//!
//! FEC itemized files store dates as `MMDDYYYY` digit strings, but values that
//! passed through numeric columns upstream lose their leading zeros, leaving
//! 6- and 7-digit strings. The 7-digit case is ambiguous (is `1122020`
//! January 12 or November 2?); [`parse_fec_date`] resolves it with a fixed
//! heuristic that is deterministic but can misread some days.

use chrono::NaiveDate;

/// Values that upstream exports use for a missing date.
const NULL_SENTINELS: &[&str] = &["", "nan", "NaN", "NaT", "None", "null"];

/// Parse an FEC transaction date.
///
/// Accepts:
/// - 8 digits: `MMDDYYYY`
/// - 7 digits: one of month/day lost its leading zero (see [`split_seven`])
/// - 6 digits: both month and day are single digits
/// - `MM/DD/YYYY` with separators (operating expenditure files)
///
/// Returns `None` for null sentinels, other lengths, non-digit input, and
/// impossible calendar dates.
pub fn parse_fec_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if NULL_SENTINELS.contains(&trimmed) {
        return None;
    }

    if trimmed.contains('/') {
        let parsed = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y").ok();
        if parsed.is_none() {
            tracing::debug!("unparseable date {:?}", raw);
        }
        return parsed;
    }

    // Numeric columns sometimes arrive as floats ("1012020.0").
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        tracing::debug!("unparseable date {:?}", raw);
        return None;
    }

    let (month, day, year) = match digits.len() {
        8 => (&digits[0..2], &digits[2..4], &digits[4..8]),
        7 => split_seven(digits),
        6 => (&digits[0..1], &digits[1..2], &digits[2..6]),
        _ => {
            tracing::debug!("date {:?} has unsupported length {}", raw, digits.len());
            return None;
        }
    };

    let date = build_date(month, day, year);
    if date.is_none() {
        tracing::debug!("date {:?} is not a calendar date", raw);
    }
    date
}

/// Split a 7-digit date into (month, day, year) slices.
///
/// The month is the first digit alone when the first digit is `2` or `3`,
/// the second digit is `3`, the third digit is `0`, or the first two digits
/// exceed 12. Otherwise the first two digits are the month and the third is
/// a single-digit day.
fn split_seven(digits: &str) -> (&str, &str, &str) {
    let bytes = digits.as_bytes();
    let two_digit_month: u32 = digits[0..2].parse().unwrap_or(0);

    let single_digit_month = bytes[0] == b'2'
        || bytes[0] == b'3'
        || bytes[1] == b'3'
        || bytes[2] == b'0'
        || two_digit_month > 12;

    if single_digit_month {
        (&digits[0..1], &digits[1..3], &digits[3..7])
    } else {
        (&digits[0..2], &digits[2..3], &digits[3..7])
    }
}

fn build_date(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_eight_digits() {
        assert_eq!(parse_fec_date("01152020"), ymd(2020, 1, 15));
        assert_eq!(parse_fec_date("12312019"), ymd(2019, 12, 31));
    }

    #[test]
    fn test_eight_digits_every_day_of_leap_year() {
        let days = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .iter_days()
            .take_while(|d| d.year() == 2020);
        let mut count = 0;
        for date in days {
            let raw = format!("{:02}{:02}2020", date.month(), date.day());
            assert_eq!(parse_fec_date(&raw), Some(date), "{}", raw);
            count += 1;
        }
        assert_eq!(count, 366);
    }

    #[test]
    fn test_eight_digits_month_ends() {
        assert_eq!(parse_fec_date("02292020"), ymd(2020, 2, 29));
        assert_eq!(parse_fec_date("02292019"), None);
        assert_eq!(parse_fec_date("04302020"), ymd(2020, 4, 30));
        assert_eq!(parse_fec_date("04312020"), None);
        assert_eq!(parse_fec_date("01312020"), ymd(2020, 1, 31));
    }

    #[test]
    fn test_seven_digits_two_digit_month() {
        // 1,0,1: no single-digit trigger -> month 10, day 1
        assert_eq!(parse_fec_date("1012020"), ymd(2020, 10, 1));
        assert_eq!(parse_fec_date("1152020"), ymd(2020, 11, 5));
    }

    #[test]
    fn test_seven_digits_first_digit_two_or_three() {
        assert_eq!(parse_fec_date("2152020"), ymd(2020, 2, 15));
        assert_eq!(parse_fec_date("3112020"), ymd(2020, 3, 11));
    }

    #[test]
    fn test_seven_digits_second_digit_three() {
        assert_eq!(parse_fec_date("1312020"), ymd(2020, 1, 31));
        assert_eq!(parse_fec_date("1302019"), ymd(2019, 1, 30));
    }

    #[test]
    fn test_seven_digits_late_month_days() {
        // First digit 2: February, so day 30 is impossible.
        assert_eq!(parse_fec_date("2292020"), ymd(2020, 2, 29));
        assert_eq!(parse_fec_date("2292019"), None);
        assert_eq!(parse_fec_date("2302020"), None);
        // First digit 3.
        assert_eq!(parse_fec_date("3312020"), ymd(2020, 3, 31));
        assert_eq!(parse_fec_date("3302020"), ymd(2020, 3, 30));
        // First two digits over 12.
        assert_eq!(parse_fec_date("7312020"), ymd(2020, 7, 31));
        assert_eq!(parse_fec_date("6312020"), None);
        assert_eq!(parse_fec_date("9302020"), ymd(2020, 9, 30));
    }

    #[test]
    fn test_seven_digits_single_digit_day() {
        assert_eq!(parse_fec_date("1112020"), ymd(2020, 11, 1));
        assert_eq!(parse_fec_date("1292020"), ymd(2020, 12, 9));
    }

    #[test]
    fn test_seven_digits_third_digit_zero() {
        assert_eq!(parse_fec_date("1102020"), ymd(2020, 1, 10));
    }

    #[test]
    fn test_seven_digits_month_over_twelve() {
        assert_eq!(parse_fec_date("5212020"), ymd(2020, 5, 21));
        assert_eq!(parse_fec_date("9292019"), ymd(2019, 9, 29));
    }

    #[test]
    fn test_seven_digits_known_misread() {
        // Could be January 23; the heuristic always reads December 3.
        assert_eq!(parse_fec_date("1232020"), ymd(2020, 12, 3));
        assert_eq!(parse_fec_date("1202020"), ymd(2020, 1, 20));
        assert_eq!(parse_fec_date("1302020"), ymd(2020, 1, 30));
    }

    #[test]
    fn test_six_digits() {
        assert_eq!(parse_fec_date("152020"), ymd(2020, 1, 5));
        assert_eq!(parse_fec_date("912019"), ymd(2019, 9, 1));
    }

    #[test]
    fn test_null_sentinels() {
        assert_eq!(parse_fec_date(""), None);
        assert_eq!(parse_fec_date("nan"), None);
        assert_eq!(parse_fec_date("NaT"), None);
        assert_eq!(parse_fec_date("   "), None);
    }

    #[test]
    fn test_slash_format() {
        assert_eq!(parse_fec_date("03/15/2020"), ymd(2020, 3, 15));
        assert_eq!(parse_fec_date("13/15/2020"), None);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(parse_fec_date("12345"), None);
        assert_eq!(parse_fec_date("123456789"), None);
        assert_eq!(parse_fec_date("13012020"), None);
        assert_eq!(parse_fec_date("02302020"), None);
        assert_eq!(parse_fec_date("0115202a"), None);
    }

    #[test]
    fn test_float_suffix() {
        assert_eq!(parse_fec_date("1012020.0"), ymd(2020, 10, 1));
    }
}
