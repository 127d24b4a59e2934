//! Lenient date parsing for dates written by people or produced by the model

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Explicit formats tried after ISO 8601
const DATE_FORMATS: &[&str] = &[
    "%a, %d %b, %Y",
    "%a, %d %b %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

/// "Fri, 28 Nov, 2025" / "Fri, 28 Nov 2025"
static WEEKDAY_DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+),\s*(\d{1,2})\s+(\w+)[,\s]+(\d{4})").unwrap());

/// "28 Nov 2025"
static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\s+(\w+)\s+(\d{4})").unwrap());

/// "Nov 28, 2025"
static MONTH_DAY_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s+(\d{1,2})(?:st|nd|rd|th)?[,\s]+(\d{4})").unwrap());

/// Parse a date string in any of the common formats
///
/// Returns `None` for empty input, the literal `null`, or anything unrecognized.
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    if date_str.is_empty() || date_str.eq_ignore_ascii_case("null") {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return Some(date);
        }
    }

    if let Some(caps) = WEEKDAY_DAY_MONTH_YEAR.captures(date_str) {
        if let Some(date) = build_date(&caps[4], &caps[3], &caps[2]) {
            return Some(date);
        }
    }

    if let Some(caps) = DAY_MONTH_YEAR.captures(date_str) {
        if let Some(date) = build_date(&caps[3], &caps[2], &caps[1]) {
            return Some(date);
        }
    }

    if let Some(caps) = MONTH_DAY_YEAR.captures(date_str) {
        if let Some(date) = build_date(&caps[3], &caps[1], &caps[2]) {
            return Some(date);
        }
    }

    None
}

/// Normalize a date string to `YYYY-MM-DD`
pub fn normalize_date(date_str: &str) -> Option<String> {
    parse_date(date_str).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Accept `HH:MM` or `HH:MM:SS`, normalized to `HH:MM`
pub fn normalize_time(time_str: &str) -> Option<String> {
    let time_str = time_str.trim();
    chrono::NaiveTime::parse_from_str(time_str, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(time_str, "%H:%M:%S"))
        .ok()
        .map(|t| t.format("%H:%M").to_string())
}

fn build_date(year: &str, month_name: &str, day: &str) -> Option<NaiveDate> {
    let month = month_number(month_name)?;
    let year = year.parse::<i32>().ok()?;
    let day = day.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
