//! Double-talk attenuation rows.
//!
//! A focused slice of the status tables: only rows whose description
//! names the double-talk attenuation measurement.

use serde::Serialize;
use tracing::debug;

use crate::document::ReportDocument;
use crate::status;

const DOUBLE_TALK_MARKER: &str = "attenuation during double talk";

#[derive(Debug, Clone, Serialize)]
pub struct DoubleTalkRow {
    pub file: String,
    pub device_descriptor: String,
    pub status: String,
    pub description: String,
    pub measured_value: String,
}

/// Filter the document's status rows down to double-talk attenuation
/// measurements.
pub fn extract_double_talk_rows(doc: &ReportDocument, file_name: &str) -> Vec<DoubleTalkRow> {
    let rows: Vec<DoubleTalkRow> = status::extract_status_rows(doc, file_name)
        .into_iter()
        .filter(|row| row.description.to_lowercase().contains(DOUBLE_TALK_MARKER))
        .map(|row| DoubleTalkRow {
            file: row.file,
            device_descriptor: row.device_descriptor,
            status: row.status,
            description: row.description,
            measured_value: row.measured_value,
        })
        .collect();
    debug!(file = file_name, rows = rows.len(), "extracted double-talk rows");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BodyElement, Table};

    #[test]
    fn only_double_talk_descriptions_survive() {
        let doc = ReportDocument {
            body: vec![BodyElement::Table(Table::from_rows(vec![
                vec!["SMD", "Status", "Description", "Single Value"],
                vec![
                    "P10R DT NS ON",
                    "OK",
                    "Attenuation during double talk",
                    "28 dB",
                ],
                vec!["P02A Echo", "Not OK", "Echo while talking", "7.1 dB"],
            ]))],
            ..Default::default()
        };
        let rows = extract_double_talk_rows(&doc, "phone.docx");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].device_descriptor, "P10R DT NS ON");
        assert_eq!(rows[0].measured_value, "28 dB");
        assert_eq!(rows[0].file, "phone.docx");
    }

    #[test]
    fn document_without_status_tables_yields_nothing() {
        let doc = ReportDocument::default();
        assert!(extract_double_talk_rows(&doc, "f").is_empty());
    }
}
