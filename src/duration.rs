//! Temporal aggregation of test records.
//!
//! Durations are computed per calendar day so an overnight pause never
//! counts as test time: when a category (or the whole batch) spans two
//! or more days, its duration is the sum of the daily spans, not
//! latest minus earliest.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::codes::Category;
use crate::report::TestRecord;

/// Earliest-to-latest window of one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub count: usize,
}

impl DayWindow {
    pub fn span_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Duration summary for one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDuration {
    pub category: Category,
    pub earliest: NaiveDateTime,
    pub latest: NaiveDateTime,
    pub count: usize,
    pub per_day: Vec<DayWindow>,
}

impl CategoryDuration {
    /// True when the category's records span more than one day.
    pub fn is_overnight(&self) -> bool {
        self.per_day.len() > 1
    }

    /// Elapsed test seconds. Multi-day categories sum the daily spans
    /// so the overnight gap is excluded.
    pub fn total_seconds(&self) -> i64 {
        if self.is_overnight() {
            self.per_day.iter().map(DayWindow::span_seconds).sum()
        } else {
            (self.latest - self.earliest).num_seconds()
        }
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.total_seconds())
    }
}

/// Duration summary across every category.
#[derive(Debug, Clone, Serialize)]
pub struct OverallDuration {
    pub earliest: NaiveDateTime,
    pub latest: NaiveDateTime,
    pub count: usize,
    pub per_day: Vec<DayWindow>,
}

impl OverallDuration {
    pub fn num_days(&self) -> usize {
        self.per_day.len()
    }

    /// Sum of daily spans; for a single day this equals latest minus
    /// earliest.
    pub fn total_seconds(&self) -> i64 {
        self.per_day.iter().map(DayWindow::span_seconds).sum()
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.total_seconds())
    }
}

/// Render elapsed seconds as integer hours/minutes/seconds.
pub fn format_duration(total_seconds: i64) -> String {
    let (hours, remainder) = (total_seconds / 3600, total_seconds % 3600);
    let (minutes, seconds) = (remainder / 60, remainder % 60);
    format!("{hours}h {minutes}m {seconds}s")
}

fn day_windows<I>(timestamps: I) -> Vec<DayWindow>
where
    I: IntoIterator<Item = NaiveDateTime>,
{
    let mut days: BTreeMap<NaiveDate, DayWindow> = BTreeMap::new();
    for ts in timestamps {
        days.entry(ts.date())
            .and_modify(|w| {
                w.start = w.start.min(ts);
                w.end = w.end.max(ts);
                w.count += 1;
            })
            .or_insert(DayWindow {
                date: ts.date(),
                start: ts,
                end: ts,
                count: 1,
            });
    }
    days.into_values().collect()
}

/// Per-category duration summaries, in display order. Records without
/// a parsed timestamp are excluded, not zero-filled.
pub fn category_durations(records: &[TestRecord]) -> Vec<CategoryDuration> {
    Category::DISPLAY_ORDER
        .iter()
        .filter_map(|&category| {
            let timestamps: Vec<NaiveDateTime> = records
                .iter()
                .filter(|r| r.category == category)
                .filter_map(|r| r.timestamp)
                .collect();
            let earliest = *timestamps.iter().min()?;
            let latest = *timestamps.iter().max()?;
            Some(CategoryDuration {
                category,
                earliest,
                latest,
                count: timestamps.len(),
                per_day: day_windows(timestamps),
            })
        })
        .collect()
}

/// Overall duration across all categories, grouped only by calendar
/// date. `None` when no record carries a timestamp.
pub fn overall_duration(records: &[TestRecord]) -> Option<OverallDuration> {
    let timestamps: Vec<NaiveDateTime> = records.iter().filter_map(|r| r.timestamp).collect();
    let earliest = *timestamps.iter().min()?;
    let latest = *timestamps.iter().max()?;
    Some(OverallDuration {
        earliest,
        latest,
        count: timestamps.len(),
        per_day: day_windows(timestamps),
    })
}
