//! Document model adapter.
//!
//! Abstracts a source report into a sequence of styled paragraphs, a
//! set of tables (grids of cells with merges expanded), and section
//! header/footer text, preserving the interleaved body order that the
//! limits harvester depends on. The `DocumentSource` trait is the seam
//! between the engine and a concrete file format; `docx` is the
//! production backend, tests inject in-memory documents.

pub mod docx;

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Paragraph style tagging test titles.
pub const TITLE_STYLE: &str = "SmdTitle";
/// Paragraph style tagging measurement timestamps.
pub const DATE_STYLE: &str = "SmdDate";
/// Paragraph style tagging equipment-settings lines.
pub const SETTING_STYLE: &str = "SmdSetting";

/// Closed classification of a paragraph style identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Title,
    Date,
    Setting,
    Other,
}

/// Map a style name to its tag. Unknown styles are `Other`.
pub fn classify_style(name: &str) -> StyleTag {
    match name {
        TITLE_STYLE => StyleTag::Title,
        DATE_STYLE => StyleTag::Date,
        SETTING_STYLE => StyleTag::Setting,
        _ => StyleTag::Other,
    }
}

/// A styled paragraph.
#[derive(Debug, Clone, Serialize)]
pub struct Paragraph {
    pub style: String,
    pub text: String,
}

impl Paragraph {
    pub fn new(style: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            text: text.into(),
        }
    }

    pub fn tag(&self) -> StyleTag {
        classify_style(&self.style)
    }
}

/// A table cell: one or more styled paragraphs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
}

impl TableCell {
    /// Cell with a single unstyled paragraph.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            paragraphs: vec![Paragraph::new("Normal", text)],
        }
    }

    /// Full cell text: paragraph texts joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table as a grid of cells. Horizontally merged cells appear once
/// per spanned grid column with repeated text, which is what the
/// header-dedup heuristics expect.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Table {
    pub rows: Vec<Vec<TableCell>>,
}

impl Table {
    /// Table built from plain text cells, one row per inner vec.
    pub fn from_rows(rows: Vec<Vec<&str>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(TableCell::from_text).collect())
                .collect(),
        }
    }

    /// Trimmed text of every cell in row `index`; empty when the row
    /// does not exist.
    pub fn row_texts(&self, index: usize) -> Vec<String> {
        self.rows
            .get(index)
            .map(|row| row.iter().map(|c| c.text().trim().to_string()).collect())
            .unwrap_or_default()
    }
}

/// One element of the document body, in physical order.
#[derive(Debug, Clone, Serialize)]
pub enum BodyElement {
    Paragraph(Paragraph),
    Table(Table),
}

/// A fully loaded report document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportDocument {
    /// Paragraphs and tables interleaved in physical order.
    pub body: Vec<BodyElement>,
    /// Section header text, one entry per header part.
    pub header_text: Vec<String>,
    /// Section footer text, one entry per footer part.
    pub footer_text: Vec<String>,
}

impl ReportDocument {
    /// Body paragraphs in order (table cell paragraphs excluded).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            BodyElement::Table(_) => None,
        })
    }

    /// Body tables in order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            BodyElement::Paragraph(_) => None,
        })
    }
}

/// Source of report documents; the engine never opens files itself.
pub trait DocumentSource {
    fn load(&self, path: &Path) -> Result<ReportDocument, DocumentError>;
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document container error: {0}")]
    Container(#[from] zip::result::ZipError),

    #[error("Document XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Missing document part: {0}")]
    MissingPart(String),
}
