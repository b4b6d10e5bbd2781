//! Conversions between the two date encodings used by the tracker.
//!
//! Storage keys and record dates use the day-first `DD-MM-YYYY` form; command
//! arguments and the GitHub API use ISO `YYYY-MM-DD`. Everything that compares
//! or orders dates goes through [`NaiveDate`], never through the raw text.

use crate::error::{Result, TrackerError};
use chrono::{Datelike, NaiveDate, Weekday};

const ISO_FORMAT: &str = "%Y-%m-%d";
const CANONICAL_FORMAT: &str = "%d-%m-%Y";

fn split_three(input: &str) -> Result<(&str, &str, &str)> {
    let parts: Vec<&str> = input.split('-').collect();
    match parts.as_slice() {
        [a, b, c] => Ok((*a, *b, *c)),
        _ => Err(TrackerError::InvalidDate(format!(
            "'{input}' must contain exactly two '-' separators"
        ))),
    }
}

/// `YYYY-MM-DD` -> `DD-MM-YYYY`. Purely textual, no calendar validation.
pub fn to_canonical(iso: &str) -> Result<String> {
    let (year, month, day) = split_three(iso)?;
    Ok(format!("{day:0>2}-{month:0>2}-{year}"))
}

/// `DD-MM-YYYY` -> `YYYY-MM-DD`. Purely textual, no calendar validation.
pub fn to_iso(canonical: &str) -> Result<String> {
    let (day, month, year) = split_three(canonical)?;
    Ok(format!("{year}-{month:0>2}-{day:0>2}"))
}

pub fn parse_iso(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), ISO_FORMAT)
        .map_err(|e| TrackerError::InvalidDate(format!("'{input}' is not YYYY-MM-DD: {e}")))
}

pub fn parse_canonical(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), CANONICAL_FORMAT)
        .map_err(|e| TrackerError::InvalidDate(format!("'{input}' is not DD-MM-YYYY: {e}")))
}

/// Accepts either encoding; a four-digit leading component means ISO.
pub fn parse_any(input: &str) -> Result<NaiveDate> {
    let (first, _, _) = split_three(input.trim())?;
    if first.len() == 4 {
        parse_iso(input)
    } else {
        parse_canonical(input)
    }
}

pub fn format_canonical(date: NaiveDate) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Every calendar day in `[start, end]`; empty when `start > end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Every day in `[start_iso, end_iso]` in canonical form.
pub fn enumerate_dates(start_iso: &str, end_iso: &str) -> Result<Vec<String>> {
    let start = parse_iso(start_iso)?;
    let end = parse_iso(end_iso)?;
    Ok(days_between(start, end)
        .into_iter()
        .map(format_canonical)
        .collect())
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

pub fn current_month(today: NaiveDate) -> String {
    month_key(today)
}

fn parse_month_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", key.trim()), ISO_FORMAT)
        .map_err(|e| TrackerError::InvalidDate(format!("'{key}' is not YYYY-MM: {e}")))
}

/// "2024-01" -> "January 2024"
pub fn month_label(key: &str) -> Result<String> {
    Ok(parse_month_key(key)?.format("%B %Y").to_string())
}

/// First and last day of the month named by `YYYY-MM`.
pub fn month_range(key: &str) -> Result<(NaiveDate, NaiveDate)> {
    let first = parse_month_key(key)?;
    let next_month = first
        .checked_add_months(chrono::Months::new(1))
        .ok_or_else(|| TrackerError::InvalidDate(format!("month out of range: {key}")))?;
    let last = next_month
        .pred_opt()
        .ok_or_else(|| TrackerError::InvalidDate(format!("month out of range: {key}")))?;
    Ok((first, last))
}

/// Serde adapter storing a [`NaiveDate`] as `DD-MM-YYYY`.
pub mod canonical {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_canonical(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_canonical(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn canonical_and_iso_are_inverse() {
        for iso in ["2024-02-29", "1999-12-31", "2025-01-01"] {
            let canonical = to_canonical(iso).unwrap();
            assert_eq!(to_iso(&canonical).unwrap(), iso);
        }
        assert_eq!(to_canonical("2024-03-07").unwrap(), "07-03-2024");
    }

    #[test]
    fn single_digit_parts_are_padded() {
        assert_eq!(to_canonical("2024-3-7").unwrap(), "07-03-2024");
        assert_eq!(to_iso("7-3-2024").unwrap(), "2024-03-07");
    }

    #[test]
    fn separator_count_is_checked() {
        assert!(to_canonical("2024-03").is_err());
        assert!(to_iso("01-02-03-04").is_err());
        assert!(to_canonical("20240307").is_err());
    }

    #[test]
    fn enumerate_single_day() {
        assert_eq!(enumerate_dates("2024-05-10", "2024-05-10").unwrap(), vec!["10-05-2024"]);
    }

    #[test]
    fn enumerate_reversed_range_is_empty() {
        assert!(enumerate_dates("2024-05-11", "2024-05-10").unwrap().is_empty());
    }

    #[test]
    fn enumerate_crosses_leap_day() {
        assert_eq!(
            enumerate_dates("2024-02-28", "2024-03-01").unwrap(),
            vec!["28-02-2024", "29-02-2024", "01-03-2024"]
        );
    }

    #[test]
    fn enumerate_crosses_year_boundary() {
        let days = enumerate_dates("2023-12-30", "2024-01-02").unwrap();
        assert_eq!(days, vec!["30-12-2023", "31-12-2023", "01-01-2024", "02-01-2024"]);
    }

    #[test]
    fn weekend_detection() {
        assert!(is_weekend(ymd(2024, 6, 1))); // Saturday
        assert!(is_weekend(ymd(2024, 6, 2)));
        assert!(!is_weekend(ymd(2024, 6, 3)));
    }

    #[test]
    fn month_helpers() {
        assert_eq!(month_key(ymd(2024, 1, 15)), "2024-01");
        assert_eq!(current_month(ymd(2024, 9, 30)), "2024-09");
        assert_eq!(month_label("2024-01").unwrap(), "January 2024");
        assert_eq!(month_range("2024-02").unwrap(), (ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(month_range("2023-12").unwrap(), (ymd(2023, 12, 1), ymd(2023, 12, 31)));
        assert!(month_range("2024-13").is_err());
    }

    #[test]
    fn parse_any_accepts_both_encodings() {
        assert_eq!(parse_any("2024-06-03").unwrap(), ymd(2024, 6, 3));
        assert_eq!(parse_any("03-06-2024").unwrap(), ymd(2024, 6, 3));
        assert!(parse_any("June 3").is_err());
    }
}
