//! Heuristic review engine for ACQUA acoustic-test reports.
//!
//! Reports are exported as docx files with semantic paragraph styles;
//! the engine extracts the test titles, timestamps, verdicts, limits,
//! noise scenarios, and equipment settings from a batch of them and
//! writes one merged review sheet.

pub mod classify;
pub mod codes;
pub mod document;
pub mod duration;
pub mod export;
pub mod extractors;
pub mod pairing;
pub mod patterns;
pub mod report;
pub mod status;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boxed banner printed by `--version`.
pub fn version_banner() -> String {
    let line = format!("ACQUA Report Reviewer v{VERSION}");
    let border = "=".repeat(line.len() + 4);
    format!("{border}\n| {line} |\n{border}")
}
