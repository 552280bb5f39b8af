//! Measurement status extraction and limits reconciliation.
//!
//! Status tables hold one row per measurement with a pass/fail verdict.
//! Extraction resolves the column layout per table, reads each data
//! row through the merged-cell dedup, and attaches the best-matching
//! harvested limit to every row.

pub mod limits;
pub mod matching;
pub mod roles;

use serde::Serialize;
use tracing::debug;

use crate::document::ReportDocument;
use self::roles::ColumnRoles;

/// One measurement status row, with its resolved limit when one
/// matched above the threshold.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRow {
    pub file: String,
    pub device_descriptor: String,
    pub status: String,
    pub description: String,
    pub measured_value: String,
    pub resolved_limit: Option<String>,
}

/// True for failing verdicts. "Not OK (forced)" and similar variants
/// all contain the phrase.
pub fn is_not_ok(status: &str) -> bool {
    status.to_lowercase().contains("not ok")
}

/// Extract every status row of the document, limits attached.
pub fn extract_status_rows(doc: &ReportDocument, file_name: &str) -> Vec<StatusRow> {
    let limits = limits::harvest_limits(doc);
    let mut out = Vec::new();

    for table in doc.tables() {
        let header = table.row_texts(0);
        if !roles::is_status_table(&header.join(" ").to_lowercase()) {
            continue;
        }
        let unique = roles::unique_headers(&header);
        let Some(columns) = roles::resolve_roles(&unique) else {
            continue;
        };

        for index in 1..table.rows.len() {
            let raw = table.row_texts(index);
            if let Some(row) = read_status_row(&raw, columns) {
                let resolved_limit = matching::resolve_limit(&row.0, &limits);
                out.push(StatusRow {
                    file: file_name.to_string(),
                    device_descriptor: row.0,
                    status: row.1,
                    description: row.2,
                    measured_value: row.3,
                    resolved_limit,
                });
            }
        }
    }

    debug!(file = file_name, rows = out.len(), "extracted status rows");
    out
}

/// Read one data row as (device, status, description, value). Rows
/// with neither a device nor a status are layout artifacts.
fn read_status_row(raw: &[String], columns: ColumnRoles) -> Option<(String, String, String, String)> {
    let cell = |index: usize| raw.get(index).cloned().unwrap_or_default();

    let device = cell(columns.device);
    let status = cell(columns.status);
    // No description column means an empty description, never text
    // borrowed from another column.
    let description = columns.description.map(|i| cell(i)).unwrap_or_default();
    let mut value = columns.value.map(|i| cell(i)).unwrap_or_default();

    // Merged rows can leave the value column empty; fall back to the
    // fourth distinct cell.
    if value.is_empty() {
        let unique = roles::dedup_consecutive(raw);
        if let Some(fourth) = unique.get(3) {
            if *fourth != description {
                value = fourth.clone();
            }
        }
    }

    if device.is_empty() && status.is_empty() {
        return None;
    }
    Some((device, status, description, value))
}
