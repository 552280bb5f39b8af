//! Product and database version extraction.
//!
//! Both strings usually sit in the opening paragraphs; some templates
//! tuck them into an info table instead, so table cells are scanned as
//! a second pass.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::document::ReportDocument;
use crate::patterns;

pub const NOT_FOUND: &str = "Not Found";

/// Version banner of one source file.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub file: String,
    pub path: PathBuf,
    pub product_version: String,
    pub database_version: String,
}

/// Extract `(product_version, database_version)`, defaulting each to
/// `NOT_FOUND`.
pub fn extract_version_pair(doc: &ReportDocument) -> (String, String) {
    let mut product = None;
    let mut database = None;

    for para in doc.paragraphs() {
        if product.is_none() {
            product = patterns::extract_product_version(&para.text);
        }
        if database.is_none() {
            database = patterns::extract_database_version(&para.text);
        }
        if product.is_some() && database.is_some() {
            break;
        }
    }

    if product.is_none() || database.is_none() {
        'tables: for table in doc.tables() {
            for row in &table.rows {
                for cell in row {
                    let text = cell.text();
                    if product.is_none() {
                        product = patterns::extract_product_version(&text);
                    }
                    if database.is_none() {
                        database = patterns::extract_database_version(&text);
                    }
                    if product.is_some() && database.is_some() {
                        break 'tables;
                    }
                }
            }
        }
    }

    (
        product.unwrap_or_else(|| NOT_FOUND.to_string()),
        database.unwrap_or_else(|| NOT_FOUND.to_string()),
    )
}

/// Version entry for a file that failed to load: both fields carry the
/// error text so the batch output still lists the file.
pub fn error_entry(file: &str, path: &Path, err: &impl std::fmt::Display) -> VersionInfo {
    let message = format!("Error: {err}");
    VersionInfo {
        file: file.to_string(),
        path: path.to_path_buf(),
        product_version: message.clone(),
        database_version: message,
    }
}
