//! Batch pipeline: load every report, run the extractors, and merge
//! the per-file results into one `BatchReport`.
//!
//! A file that fails to load never aborts the batch; it is recorded as
//! a `FileError` and as an error-tagged version entry so the output
//! still accounts for it.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info};

use crate::classify;
use crate::codes::{self, Category};
use crate::document::DocumentSource;
use crate::duration::{self, CategoryDuration, OverallDuration};
use crate::extractors::{double_talk, noise, settings, version};
use crate::pairing;
use crate::status::{self, StatusRow};

/// One classified, timestamped test occurrence.
#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    pub code_id: String,
    pub category: Category,
    /// 1-based occurrence number of this title within its source file.
    pub sequence_index: u32,
    pub title: String,
    pub timestamp: Option<NaiveDateTime>,
    pub source_file: PathBuf,
}

/// A file the batch could not read.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub file: String,
    pub message: String,
}

/// Missing codes for one required shared-speakerphone bucket.
#[derive(Debug, Clone, Serialize)]
pub struct BucketCheck {
    pub bucket: &'static str,
    pub missing: Vec<String>,
}

/// Shared-speakerphone completeness check, one entry per bucket.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub buckets: Vec<BucketCheck>,
}

impl ValidationReport {
    pub fn all_present(&self) -> bool {
        self.buckets.iter().all(|b| b.missing.is_empty())
    }
}

/// Merged output of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub records: Vec<TestRecord>,
    pub shared_speakerphone: bool,
    pub category_durations: Vec<CategoryDuration>,
    pub overall_duration: Option<OverallDuration>,
    pub status_rows: Vec<StatusRow>,
    pub not_ok_rows: Vec<StatusRow>,
    pub double_talk_rows: Vec<double_talk::DoubleTalkRow>,
    pub noise_scenarios: Vec<noise::NoiseScenarioResult>,
    pub equipment: settings::EquipmentSettings,
    pub versions: Vec<version::VersionInfo>,
    pub validation: Option<ValidationReport>,
    pub file_errors: Vec<FileError>,
}

struct PendingRecord {
    code_id: String,
    category: Category,
    title: String,
    timestamp: Option<NaiveDateTime>,
    source_file: PathBuf,
}

/// Run the full pipeline over `paths`. Each document is loaded once
/// and shared by every extractor.
pub fn process_reports(source: &dyn DocumentSource, paths: &[PathBuf]) -> BatchReport {
    let mut report = BatchReport::default();
    let mut pending: Vec<PendingRecord> = Vec::new();

    for path in paths {
        let file_name = display_name(path);
        info!(file = %file_name, "processing report");

        let doc = match source.load(path) {
            Ok(doc) => doc,
            Err(err) => {
                error!(file = %file_name, %err, "failed to load report");
                report.file_errors.push(FileError {
                    file: file_name.clone(),
                    message: err.to_string(),
                });
                report.versions.push(version::error_entry(&file_name, path, &err));
                continue;
            }
        };

        let stream = pairing::scan_paragraphs(doc.paragraphs());
        report.shared_speakerphone |= stream.shared_speakerphone;
        for entry in pairing::pair_entries(&stream) {
            let (code_id, category) = classify::classify(&entry.title);
            pending.push(PendingRecord {
                code_id,
                category,
                title: entry.title,
                timestamp: entry.timestamp,
                source_file: path.clone(),
            });
        }

        report
            .status_rows
            .extend(status::extract_status_rows(&doc, &file_name));
        report
            .double_talk_rows
            .extend(double_talk::extract_double_talk_rows(&doc, &file_name));
        report
            .noise_scenarios
            .extend(noise::extract_noise_scenarios(&doc, &file_name));
        report.equipment.merge(settings::extract_settings(&doc, &file_name));

        let (product_version, database_version) = version::extract_version_pair(&doc);
        report.versions.push(version::VersionInfo {
            file: file_name,
            path: path.clone(),
            product_version,
            database_version,
        });
    }

    report.records = number_records(pending);
    report.category_durations = duration::category_durations(&report.records);
    report.overall_duration = duration::overall_duration(&report.records);
    report.not_ok_rows = report
        .status_rows
        .iter()
        .filter(|row| status::is_not_ok(&row.status))
        .cloned()
        .collect();
    if report.shared_speakerphone {
        report.validation = Some(validate_required(&report.records));
    }

    info!(
        records = report.records.len(),
        files = paths.len(),
        errors = report.file_errors.len(),
        "batch complete"
    );
    report
}

/// Sort records and assign per-file occurrence numbers: equal titles
/// within one file are numbered in timestamp order.
fn number_records(mut pending: Vec<PendingRecord>) -> Vec<TestRecord> {
    pending.sort_by(|a, b| {
        let a_ts = a.timestamp.unwrap_or(NaiveDateTime::MIN);
        let b_ts = b.timestamp.unwrap_or(NaiveDateTime::MIN);
        (&a.title, a_ts).cmp(&(&b.title, b_ts))
    });

    let mut seen: HashMap<(PathBuf, String), u32> = HashMap::new();
    pending
        .into_iter()
        .map(|p| {
            let count = seen
                .entry((p.source_file.clone(), p.title.clone()))
                .or_insert(0);
            *count += 1;
            TestRecord {
                code_id: p.code_id,
                category: p.category,
                sequence_index: *count,
                title: p.title,
                timestamp: p.timestamp,
                source_file: p.source_file,
            }
        })
        .collect()
}

fn validate_required(records: &[TestRecord]) -> ValidationReport {
    let found: HashSet<&str> = records.iter().map(|r| r.code_id.as_str()).collect();
    let buckets = codes::required_shared_speakerphone()
        .into_iter()
        .map(|(bucket, required)| BucketCheck {
            bucket,
            missing: required
                .iter()
                .filter(|code| !found.contains(**code))
                .map(|code| code.to_string())
                .collect(),
        })
        .collect();
    ValidationReport { buckets }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
