//! Text pattern library: regex extractors for timestamps, version
//! strings, numeric values with units, and test codes embedded in
//! free text.
//!
//! All extractors are pure functions over text and fail by returning
//! `None` rather than erroring.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Report timestamps are only accepted when the owning-system marker
/// ("ACQUA") follows later in the same text; a bare date/time substring
/// is ignored so unrelated timestamps are never picked up.
static REPORT_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}\s+(?:AM|PM)).*?ACQUA").unwrap()
});

static DATE_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})").unwrap());

static PRODUCT_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ACQUA\s+(\d{1,3}\.\d{1,3}\.\d{1,3})").unwrap());

static DATABASE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Database\s+Version:\s*([^\n\r]+)").unwrap());

static NUMERIC_WITH_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([+-]?[\d.]+)\s*(dB|db|DB|%|ms|Hz|s)?").unwrap());

/// Leading test code such as `P02A` or `Di07A`. Applied
/// case-insensitively because callers compare normalized (lower-cased)
/// descriptor text.
static LEADING_TEST_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([A-Z]{1,3}\d{1,3}[A-Z]?)").unwrap());

/// Test code inside a title paragraph, used to stamp equalization
/// records with the test they belong to.
static TITLE_TEST_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(P\d{2}[AR]|Di\d{2}A|Op[A-Z]\d{2}[AR]?)\b").unwrap());

/// Timestamp layout used by date-styled report paragraphs.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M %p";

/// Parse a report timestamp out of `text`, requiring the ACQUA marker.
pub fn extract_timestamp(text: &str) -> Option<NaiveDateTime> {
    let caps = REPORT_TIMESTAMP.captures(text)?;
    NaiveDateTime::parse_from_str(caps[1].trim(), TIMESTAMP_FORMAT).ok()
}

/// First `M/D/YYYY` date in `text`, without a time component.
pub fn extract_date_only(text: &str) -> Option<String> {
    DATE_ONLY
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Render a timestamp the way the reports print them: no zero padding
/// on month, day, or hour.
pub fn format_report_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%-m/%-d/%Y %-I:%M %p").to_string()
}

/// Product version string, e.g. "ACQUA 6.0.200".
pub fn extract_product_version(text: &str) -> Option<String> {
    PRODUCT_VERSION
        .captures(text)
        .map(|caps| format!("ACQUA {}", &caps[1]))
}

/// Database version, e.g. "51_MS_Teams_Rev05_SP2".
pub fn extract_database_version(text: &str) -> Option<String> {
    DATABASE_VERSION
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// A signed decimal value with an optional unit token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericValue {
    pub value: String,
    pub unit: Option<String>,
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} {}", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

/// First signed decimal number in `text`, with its unit when one of the
/// recognized unit tokens directly follows.
pub fn extract_numeric_with_unit(text: &str) -> Option<NumericValue> {
    let caps = NUMERIC_WITH_UNIT.captures(text)?;
    Some(NumericValue {
        value: caps[1].to_string(),
        unit: caps.get(2).map(|m| m.as_str().to_string()),
    })
}

/// Leading test code of a (possibly normalized) descriptor or title.
pub fn extract_leading_test_code(text: &str) -> Option<String> {
    LEADING_TEST_CODE
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Test code mentioned anywhere in a title paragraph.
pub fn extract_title_test_code(text: &str) -> Option<String> {
    TITLE_TEST_CODE
        .captures(text)
        .map(|caps| caps[1].to_string())
}
