//! Fuzzy reconciliation between status-row device descriptors and the
//! test titles that own harvested limits.
//!
//! Scores are tiered, not continuous: exact and containment matches
//! outrank code-anchored remainder matches, which outrank plain word
//! overlap. A score below the threshold never resolves a limit.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::patterns;
use crate::status::limits::LimitsMap;

/// Minimum score for a limits match.
pub const MATCH_THRESHOLD: u32 = 70;

/// Run-index suffix appended to repeated measurements.
static INDEX_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),?\s*Index:\s*\d+").unwrap());

/// Noise-suppression suffixes stripped before remainder comparison.
const NS_SUFFIXES: &[&str] = &[" ns on", " ns off", " ns_on", " ns_off"];

/// Strip the run-index suffix and surrounding whitespace.
pub fn normalize_descriptor(text: &str) -> String {
    INDEX_SUFFIX.replace_all(text, "").trim().to_string()
}

/// Score how well a device descriptor matches a limits title.
pub fn match_score(device: &str, title: &str) -> u32 {
    let device = normalize_descriptor(device).to_lowercase();
    let title = normalize_descriptor(title).to_lowercase();
    if device.is_empty() || title.is_empty() {
        return 0;
    }
    if device == title {
        return 100;
    }
    if title.contains(&device) {
        return 90;
    }
    if device.contains(&title) {
        return 85;
    }

    let (Some(d_code), Some(t_code)) = (
        patterns::extract_leading_test_code(&device),
        patterns::extract_leading_test_code(&title),
    ) else {
        return 0;
    };
    if d_code != t_code {
        return 0;
    }

    let d_rest = strip_code_and_suffixes(&device, d_code.len());
    let t_rest = strip_code_and_suffixes(&title, t_code.len());
    if d_rest == t_rest {
        return 95;
    }
    if t_rest.contains(&d_rest) || d_rest.contains(&t_rest) {
        return 80;
    }

    let d_words: HashSet<&str> = d_rest.split_whitespace().collect();
    let t_words: HashSet<&str> = t_rest.split_whitespace().collect();
    let total = d_words.union(&t_words).count();
    if total == 0 {
        return 0;
    }
    let overlap = d_words.intersection(&t_words).count();
    (70 * overlap / total) as u32
}

/// Remainder after the leading code: trimmed, NS suffixes removed.
/// The code is ASCII so slicing by its byte length is safe.
fn strip_code_and_suffixes(text: &str, code_len: usize) -> String {
    let mut rest = text[code_len..].trim().to_string();
    for suffix in NS_SUFFIXES {
        rest = rest.replace(suffix, "");
    }
    rest.trim().to_string()
}

/// Best-scoring limits entry for a device descriptor, joined with
/// " | " when the title carries several bounds.
pub fn resolve_limit(device: &str, limits: &LimitsMap) -> Option<String> {
    let mut best_score = 0;
    let mut best: Option<&Vec<String>> = None;
    for (title, entries) in limits {
        let score = match_score(device, title);
        if score > best_score && score >= MATCH_THRESHOLD {
            best_score = score;
            best = Some(entries);
        }
    }
    if let Some(entries) = best {
        debug!(device, score = best_score, "resolved limits match");
        Some(entries.join(" | "))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_after_normalization() {
        assert_eq!(match_score("P02A Echo, Index: 3", "p02a echo"), 100);
    }

    #[test]
    fn containment_is_asymmetric() {
        // Device inside title scores higher than title inside device.
        assert_eq!(match_score("P02A Echo", "P02A Echo while talking"), 90);
        assert_eq!(match_score("P02A Echo while talking", "P02A Echo"), 85);
    }

    #[test]
    fn ns_variants_of_the_same_test_score_95() {
        assert_eq!(
            match_score("P10R Double Talk NS ON", "P10R Double Talk NS OFF"),
            95
        );
        assert_eq!(
            match_score("P10R Double Talk NS_ON", "P10R Double Talk NS_OFF"),
            95
        );
    }

    #[test]
    fn ns_suffix_against_bare_title_is_plain_containment() {
        // The containment tier fires before suffix stripping.
        assert_eq!(match_score("P10R Double Talk NS ON", "P10R Double Talk"), 85);
    }

    #[test]
    fn same_code_remainder_containment_scores_80() {
        // Full strings differ right after the code, so neither earlier
        // containment tier fires, but the remainders nest.
        assert_eq!(
            match_score("P10R Talk attenuation", "P10R Double Talk attenuation"),
            80
        );
    }

    #[test]
    fn different_codes_never_match() {
        assert_eq!(match_score("P02A Echo", "P03A Echo"), 0);
    }

    #[test]
    fn word_overlap_tier_is_proportional() {
        // Remainders "echo during speech" vs "echo measurement": one
        // shared word out of four unique gives 70/4 = 17.
        assert_eq!(
            match_score("P02A echo during speech", "P02A echo measurement"),
            17
        );
    }

    #[test]
    fn unrelated_text_without_codes_scores_zero() {
        assert_eq!(match_score("background hum", "room tone"), 0);
        assert_eq!(match_score("", "P02A Echo"), 0);
    }

    #[test]
    fn resolve_requires_threshold() {
        let mut limits = LimitsMap::new();
        limits.insert(
            "P02A echo measurement".to_string(),
            vec!["Upper: 5 dB".to_string()],
        );
        // Word-overlap score of 17 is below the threshold.
        assert_eq!(resolve_limit("P02A echo during speech", &limits), None);
        // Containment score of 90 resolves.
        assert_eq!(
            resolve_limit("P02A echo", &limits),
            Some("Upper: 5 dB".to_string())
        );
    }

    #[test]
    fn resolve_joins_multiple_bounds() {
        let mut limits = LimitsMap::new();
        limits.insert(
            "P02A Echo".to_string(),
            vec!["Upper: 5 dB".to_string(), "Lower: -10 dB".to_string()],
        );
        assert_eq!(
            resolve_limit("P02A Echo", &limits),
            Some("Upper: 5 dB | Lower: -10 dB".to_string())
        );
    }

    #[test]
    fn resolve_picks_highest_scoring_title() {
        let mut limits = LimitsMap::new();
        limits.insert(
            "P02A Echo while talking".to_string(),
            vec!["Upper: 3 dB".to_string()],
        );
        limits.insert("P02A Echo".to_string(), vec!["Upper: 5 dB".to_string()]);
        // Exact match (100) beats containment (90).
        assert_eq!(
            resolve_limit("P02A Echo", &limits),
            Some("Upper: 5 dB".to_string())
        );
    }
}
