//! Maps a free-text test title to a canonical code and category.
//!
//! Priority order matters: known codes are substring-checked before any
//! fallback regex runs, so a generic pattern can never shadow a real
//! code embedded in surrounding text.

use std::sync::LazyLock;

use regex::Regex;

use crate::codes::{code_tables, Category};

/// Fallback tiers, tried in fixed order once no known code matched.
static FALLBACK_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // Alphanumeric-dash code, e.g. BGN-01, TEST01A
        Regex::new(r"(?i)\b([A-Z]{2,4}[-_]?\d{1,3}[A-Z]?)\b").unwrap(),
        // Digit-prefixed code, e.g. 01-BGN
        Regex::new(r"(?i)\b(\d{1,3}[-_]?[A-Z]{2,4})\b").unwrap(),
        // Word-dash-word code, e.g. BGN-Reverb-1
        Regex::new(r"(?i)\b([A-Z]+[-_][A-Z]+[-_]?\d*)\b").unwrap(),
    ]
});

const SYNTHETIC_CODE_MAX_LEN: usize = 30;
const UNKNOWN_CODE: &str = "Unknown";

/// Classify a title into `(code_id, category)`. Total: every input,
/// including the empty string, yields a non-empty pair.
pub fn classify(title: &str) -> (String, Category) {
    if title.is_empty() {
        return (UNKNOWN_CODE.to_string(), Category::Custom);
    }

    for (category, codes) in code_tables() {
        for code in codes {
            if title.contains(code) {
                return (code.to_string(), category);
            }
        }
    }

    for pattern in FALLBACK_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(title) {
            return (caps[1].to_string(), Category::Custom);
        }
    }

    let code = synthetic_code(title);
    if code.is_empty() {
        (UNKNOWN_CODE.to_string(), Category::Custom)
    } else {
        (code, Category::Custom)
    }
}

/// Derive a code from the title text itself: take what precedes the
/// first " - " or ": " separator and cap the length.
fn synthetic_code(title: &str) -> String {
    let short = match title.split_once(" - ") {
        Some((head, _)) => head,
        None => title,
    };
    let short = match short.split_once(": ") {
        Some((head, _)) => head,
        None => short,
    };
    short
        .chars()
        .take(SYNTHETIC_CODE_MAX_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}
