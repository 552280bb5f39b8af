//! Limits harvesting.
//!
//! Limits tables follow their owning test title in the body stream, so
//! harvesting walks paragraphs and tables in physical order and tags
//! each recognized limits table with the most recent title seen.

use std::collections::BTreeMap;

use tracing::debug;

use crate::document::{BodyElement, ReportDocument, StyleTag, Table};
use crate::patterns;

/// Header styles that mark a limits table. The last entry is a known
/// typo in the report templates and must stay misspelled.
const LIMITS_HEADER_STYLES: &[&str] = &[
    "SmdLimitsHeader",
    "SmdLimitsTableHeader",
    "SmdLimtsTableHeader",
];

/// Data styles that carry the limit value.
const LIMITS_DATA_STYLES: &[&str] = &[
    "SmdLimitsTableData",
    "SmdLimitsTableText",
    "SmdLimitsText",
];

/// Data cells starting with this prefix are run labels, not values.
const RESERVED_DATA_PREFIX: &str = "run";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundType {
    Upper,
    Lower,
}

impl BoundType {
    pub fn label(self) -> &'static str {
        match self {
            BoundType::Upper => "Upper",
            BoundType::Lower => "Lower",
        }
    }
}

/// Limit strings ("Upper: 5 dB") keyed by the owning test title.
pub type LimitsMap = BTreeMap<String, Vec<String>>;

/// Collect every limit in the document, keyed by title.
pub fn harvest_limits(doc: &ReportDocument) -> LimitsMap {
    let mut limits = LimitsMap::new();
    let mut current_title: Option<String> = None;

    for element in &doc.body {
        match element {
            BodyElement::Paragraph(p) => {
                if p.tag() == StyleTag::Title {
                    let text = p.text.trim();
                    if !text.is_empty() {
                        current_title = Some(text.to_string());
                    }
                }
            }
            BodyElement::Table(table) => {
                let Some(title) = &current_title else { continue };
                if let Some((bound, value)) = read_limits_table(table) {
                    let entry = format!("{}: {}", bound.label(), value);
                    let stored = limits.entry(title.clone()).or_default();
                    if !stored.contains(&entry) {
                        stored.push(entry);
                    }
                }
            }
        }
    }

    debug!(titles = limits.len(), "harvested limits tables");
    limits
}

/// Read one table as a limits table: `Some((bound, value))` when it
/// carries a recognizable bound and value, `None` otherwise.
fn read_limits_table(table: &Table) -> Option<(BoundType, String)> {
    let mut is_limits = false;
    let mut bound: Option<BoundType> = None;
    let mut value = String::new();

    for row in &table.rows {
        for cell in row {
            for para in &cell.paragraphs {
                let text = para.text.trim();
                if text.is_empty() {
                    continue;
                }
                let lower = text.to_lowercase();

                if LIMITS_HEADER_STYLES.contains(&para.style.as_str()) {
                    is_limits = true;
                    if lower.contains("upper") {
                        bound = Some(BoundType::Upper);
                    } else if lower.contains("lower") {
                        bound = Some(BoundType::Lower);
                    }
                } else if LIMITS_DATA_STYLES.contains(&para.style.as_str())
                    && !lower.starts_with(RESERVED_DATA_PREFIX)
                {
                    if let Some(numeric) = patterns::extract_numeric_with_unit(text) {
                        // Last value wins; later rows restate the
                        // effective limit.
                        value = numeric.to_string();
                    }
                }
            }
        }
    }

    // Templates without the dedicated styles still announce a limits
    // table in the first row's text.
    if !is_limits && table.rows.len() >= 2 {
        let first_row = table.row_texts(0).join(" ").to_lowercase();
        if first_row.contains("limits") {
            is_limits = true;
            if first_row.contains("upper") {
                bound = Some(BoundType::Upper);
            } else if first_row.contains("lower") {
                bound = Some(BoundType::Lower);
            }
            'rows: for index in 1..table.rows.len() {
                for cell in table.row_texts(index) {
                    let lower = cell.to_lowercase();
                    if lower.starts_with(RESERVED_DATA_PREFIX) {
                        continue;
                    }
                    if let Some(numeric) = patterns::extract_numeric_with_unit(&cell) {
                        value = numeric.to_string();
                        break 'rows;
                    }
                }
            }
        }
    }

    if is_limits && !value.is_empty() {
        bound.map(|b| (b, value))
    } else {
        None
    }
}
