//! Title/date pairing engine.
//!
//! Walks the ordered paragraph stream of one document and builds two
//! sequences: title-styled texts and parsed measurement timestamps.
//! The two are then paired positionally; documents are expected to
//! alternate title/date blocks 1:1, and a document that violates this
//! silently produces misaligned records rather than an error. Callers
//! should treat a high count of empty-date records as a data-quality
//! signal.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::document::{Paragraph, StyleTag};
use crate::patterns;

/// Marker paragraph that labels the *previous* paragraph as the date
/// for the current title. Some documents mislabel the date line's
/// style, and this marker is the only reliable signal.
pub const MEASUREMENT_MARKER: &str = "Unmodified HEAD acoustics Measurement Descriptor";

/// Output of one document scan.
#[derive(Debug, Default)]
pub struct PairedStream {
    pub titles: Vec<String>,
    pub dates: Vec<NaiveDateTime>,
    /// Raised when any paragraph mentions "Shared" or "Speakerphone".
    pub shared_speakerphone: bool,
}

/// One positionally paired entry. A missing title is the empty string;
/// a missing date is `None`.
#[derive(Debug, Clone)]
pub struct PairedEntry {
    pub title: String,
    pub timestamp: Option<NaiveDateTime>,
}

/// Scan the paragraph stream of one document.
pub fn scan_paragraphs<'a, I>(paragraphs: I) -> PairedStream
where
    I: IntoIterator<Item = &'a Paragraph>,
{
    let paragraphs: Vec<&Paragraph> = paragraphs.into_iter().collect();
    let mut out = PairedStream::default();

    for (i, para) in paragraphs.iter().enumerate() {
        let text = para.text.trim();

        if !out.shared_speakerphone
            && (text.contains("Shared") || text.contains("Speakerphone"))
        {
            out.shared_speakerphone = true;
        }

        if para.tag() == StyleTag::Title {
            out.titles.push(text.to_string());
            continue;
        }

        if text.contains(MEASUREMENT_MARKER) {
            // A date-styled previous paragraph was already consumed in
            // the previous iteration; otherwise parse it now.
            if i > 0 {
                let prev = paragraphs[i - 1];
                if prev.tag() != StyleTag::Date {
                    if let Some(ts) = patterns::extract_timestamp(&prev.text) {
                        out.dates.push(ts);
                    }
                }
            }
            // The marker paragraph itself is never a date, even when it
            // carries the date style.
            continue;
        }

        if para.tag() == StyleTag::Date {
            if let Some(ts) = patterns::extract_timestamp(text) {
                out.dates.push(ts);
            }
        }
    }

    debug!(
        titles = out.titles.len(),
        dates = out.dates.len(),
        "scanned paragraph stream"
    );
    out
}

/// Pair titles and dates by index up to the longer of the two.
pub fn pair_entries(stream: &PairedStream) -> Vec<PairedEntry> {
    let len = stream.titles.len().max(stream.dates.len());
    (0..len)
        .map(|i| PairedEntry {
            title: stream.titles.get(i).cloned().unwrap_or_default(),
            timestamp: stream.dates.get(i).copied(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Paragraph;
    use chrono::NaiveDate;

    fn title(text: &str) -> Paragraph {
        Paragraph::new("SmdTitle", text)
    }

    fn date(text: &str) -> Paragraph {
        Paragraph::new("SmdDate", text)
    }

    fn plain(text: &str) -> Paragraph {
        Paragraph::new("Normal", text)
    }

    fn dt(h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn alternating_titles_and_dates_pair_one_to_one() {
        let paras = vec![
            title("P01A Test"),
            date("6/1/2025 9:00 AM ACQUA"),
            title("P02A Echo"),
            date("6/1/2025 9:30 AM ACQUA"),
        ];
        let stream = scan_paragraphs(&paras);
        let entries = pair_entries(&stream);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "P01A Test");
        assert_eq!(entries[0].timestamp, Some(dt(9, 0)));
        assert_eq!(entries[1].title, "P02A Echo");
        assert_eq!(entries[1].timestamp, Some(dt(9, 30)));
    }

    #[test]
    fn record_count_is_max_of_titles_and_dates() {
        let paras = vec![
            title("P01A"),
            title("P02A"),
            date("6/1/2025 9:00 AM ACQUA"),
        ];
        let stream = scan_paragraphs(&paras);
        let entries = pair_entries(&stream);
        assert_eq!(entries.len(), 2);
        // Positional pairing: the single date lands on the first title.
        assert_eq!(entries[0].timestamp, Some(dt(9, 0)));
        assert_eq!(entries[1].title, "P02A");
        assert_eq!(entries[1].timestamp, None);
    }

    #[test]
    fn more_dates_than_titles_yields_empty_titles() {
        let paras = vec![
            date("6/1/2025 9:00 AM ACQUA"),
            date("6/1/2025 9:30 AM ACQUA"),
            title("P01A"),
        ];
        let stream = scan_paragraphs(&paras);
        let entries = pair_entries(&stream);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "P01A");
        assert_eq!(entries[1].title, "");
        assert_eq!(entries[1].timestamp, Some(dt(9, 30)));
    }

    #[test]
    fn date_without_marker_token_is_ignored() {
        let paras = vec![title("P01A"), date("6/1/2025 9:00 AM")];
        let stream = scan_paragraphs(&paras);
        assert!(stream.dates.is_empty());
    }

    #[test]
    fn marker_recovers_mislabeled_date_from_previous_paragraph() {
        let paras = vec![
            title("P01A"),
            plain("6/1/2025 9:00 AM ACQUA export"),
            plain("Unmodified HEAD acoustics Measurement Descriptor"),
        ];
        let stream = scan_paragraphs(&paras);
        assert_eq!(stream.dates, vec![dt(9, 0)]);
    }

    #[test]
    fn marker_after_date_styled_paragraph_does_not_double_count() {
        let paras = vec![
            title("P01A"),
            date("6/1/2025 9:00 AM ACQUA"),
            plain("Unmodified HEAD acoustics Measurement Descriptor"),
        ];
        let stream = scan_paragraphs(&paras);
        assert_eq!(stream.dates, vec![dt(9, 0)]);
    }

    #[test]
    fn marker_paragraph_with_date_style_is_not_a_date() {
        let paras = vec![
            title("P01A"),
            date("Unmodified HEAD acoustics Measurement Descriptor 6/1/2025 9:00 AM ACQUA"),
        ];
        let stream = scan_paragraphs(&paras);
        assert!(stream.dates.is_empty());
    }

    #[test]
    fn marker_as_first_paragraph_is_harmless() {
        let paras = vec![plain("Unmodified HEAD acoustics Measurement Descriptor")];
        let stream = scan_paragraphs(&paras);
        assert!(stream.titles.is_empty());
        assert!(stream.dates.is_empty());
    }

    #[test]
    fn shared_speakerphone_flag_from_any_paragraph() {
        let stream = scan_paragraphs(&[plain("Shared Space profile")]);
        assert!(stream.shared_speakerphone);
        let stream = scan_paragraphs(&[plain("Speakerphone validation run")]);
        assert!(stream.shared_speakerphone);
        let stream = scan_paragraphs(&[plain("handset only")]);
        assert!(!stream.shared_speakerphone);
    }

    #[test]
    fn empty_stream_pairs_to_nothing() {
        let stream = scan_paragraphs(&[]);
        assert!(pair_entries(&stream).is_empty());
    }
}
