//! CSV and JSON export of a batch report.
//!
//! The CSV is a sectioned review sheet, not a single table: each block
//! has its own header row and the blocks are separated by blank lines,
//! so the writer runs in flexible mode.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::duration::{CategoryDuration, DayWindow};
use crate::patterns;
use crate::report::BatchReport;

/// Default name of the review sheet, written next to the input files.
pub const DEFAULT_OUTPUT_NAME: &str = "Smd_Report_Output.csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot write {path} (is the file open in another program?)")]
    DestinationLocked { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Create the output file, mapping a permission error to the friendlier
/// locked-destination variant. Spreadsheet programs hold CSVs open
/// with exclusive access.
fn create_output(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|err| {
        if err.kind() == io::ErrorKind::PermissionDenied {
            ExportError::DestinationLocked {
                path: path.to_path_buf(),
            }
        } else {
            ExportError::Io(err)
        }
    })
}

/// Write the sectioned review CSV.
pub fn write_csv(report: &BatchReport, path: &Path) -> Result<(), ExportError> {
    let file = create_output(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);

    write_duration_section(&mut wtr, report)?;
    if report.validation.is_some() {
        write_validation_section(&mut wtr, report)?;
    }
    write_noise_section(&mut wtr, report)?;
    write_status_section(&mut wtr, report)?;
    write_double_talk_section(&mut wtr, report)?;
    write_error_section(&mut wtr, report)?;
    write_record_section(&mut wtr, report)?;

    wtr.flush()?;
    info!(path = %path.display(), records = report.records.len(), "wrote review sheet");
    Ok(())
}

/// Write the full report as pretty JSON.
pub fn write_json(report: &BatchReport, path: &Path) -> Result<(), ExportError> {
    let file = create_output(path)?;
    serde_json::to_writer_pretty(file, report)?;
    info!(path = %path.display(), "wrote JSON report");
    Ok(())
}

type Writer = csv::Writer<File>;

fn blank(wtr: &mut Writer) -> Result<(), ExportError> {
    wtr.write_record([""])?;
    Ok(())
}

fn format_day(window: &DayWindow) -> String {
    window.date.format("%-m/%-d/%Y").to_string()
}

fn daily_breakdown(duration: &CategoryDuration) -> String {
    duration
        .per_day
        .iter()
        .map(|w| {
            format!(
                "{}: {} ({} tests)",
                format_day(w),
                crate::duration::format_duration(w.span_seconds()),
                w.count
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn write_duration_section(wtr: &mut Writer, report: &BatchReport) -> Result<(), ExportError> {
    wtr.write_record(["Test Duration Summary"])?;
    wtr.write_record([
        "Category",
        "Earliest",
        "Latest",
        "Tests",
        "Duration",
        "Daily Breakdown",
    ])?;
    for duration in &report.category_durations {
        wtr.write_record([
            duration.category.display_name().to_string(),
            patterns::format_report_timestamp(duration.earliest),
            patterns::format_report_timestamp(duration.latest),
            duration.count.to_string(),
            duration.duration_label(),
            daily_breakdown(duration),
        ])?;
    }
    if let Some(overall) = &report.overall_duration {
        wtr.write_record([
            "TOTAL".to_string(),
            patterns::format_report_timestamp(overall.earliest),
            patterns::format_report_timestamp(overall.latest),
            overall.count.to_string(),
            overall.duration_label(),
            format!("{} day(s)", overall.num_days()),
        ])?;
    }
    blank(wtr)
}

fn write_validation_section(wtr: &mut Writer, report: &BatchReport) -> Result<(), ExportError> {
    let Some(validation) = &report.validation else {
        return Ok(());
    };

    wtr.write_record(["Shared Speakerphone Validation"])?;
    for check in &validation.buckets {
        if check.missing.is_empty() {
            wtr.write_record([check.bucket, "All required tests present"])?;
        } else {
            wtr.write_record([
                check.bucket.to_string(),
                format!("Missing: {}", check.missing.join(" ")),
            ])?;
        }
    }
    wtr.write_record([
        "Minimal subset".to_string(),
        crate::codes::MINIMAL_SUBSET.join(" "),
    ])?;
    blank(wtr)?;

    if !report.equipment.core_units.is_empty() {
        wtr.write_record(["labCORE Units"])?;
        wtr.write_record(["File", "Serial", "Firmware", "Nickname"])?;
        for core in &report.equipment.core_units {
            wtr.write_record([
                core.file.as_str(),
                core.serial.as_deref().unwrap_or(""),
                core.firmware.as_deref().unwrap_or(""),
                core.nickname.as_deref().unwrap_or(""),
            ])?;
        }
        blank(wtr)?;
    }

    if !report.equipment.head_simulators.is_empty() {
        wtr.write_record(["HATS Units"])?;
        wtr.write_record(["File", "Serial", "Pinna", "Equalization"])?;
        for head in &report.equipment.head_simulators {
            wtr.write_record([
                head.file.as_str(),
                head.serial.as_deref().unwrap_or(""),
                head.pinna.as_deref().unwrap_or(""),
                head.equalization.as_deref().unwrap_or(""),
            ])?;
        }
        blank(wtr)?;
    }

    if !report.equipment.equalization.is_empty() {
        wtr.write_record(["BEQ Equalization"])?;
        wtr.write_record([
            "File",
            "Equalization",
            "Test Code",
            "HATS Serial",
            "Pinna",
            "Diffuse Field",
        ])?;
        for eq in &report.equipment.equalization {
            wtr.write_record([
                eq.file.as_str(),
                eq.equalization.as_str(),
                eq.test_code.as_deref().unwrap_or(""),
                eq.head_serial.as_deref().unwrap_or(""),
                eq.pinna.as_deref().unwrap_or(""),
                if eq.diffuse_field { "DF" } else { "" },
            ])?;
        }
        blank(wtr)?;
    }

    if !report.versions.is_empty() {
        wtr.write_record(["Version Info"])?;
        wtr.write_record(["File", "Product Version", "Database Version"])?;
        for version in &report.versions {
            wtr.write_record([
                version.file.as_str(),
                version.product_version.as_str(),
                version.database_version.as_str(),
            ])?;
        }
        blank(wtr)?;
    }
    Ok(())
}

fn write_noise_section(wtr: &mut Writer, report: &BatchReport) -> Result<(), ExportError> {
    if report.noise_scenarios.is_empty() {
        return Ok(());
    }
    wtr.write_record(["Background Noise Scenarios (54 dB(A))"])?;
    wtr.write_record([
        "File",
        "Device",
        "Lab",
        "Report Date",
        "NS Setting",
        "S-MOS 2nd Talker",
        "N-MOS 2nd Talker",
        "G-MOS 2nd Talker",
        "S-MOS BGN",
        "N-MOS BGN",
        "G-MOS BGN",
    ])?;
    for row in &report.noise_scenarios {
        wtr.write_record([
            row.file.as_str(),
            row.device.as_str(),
            row.lab.as_deref().unwrap_or(""),
            row.report_time.as_deref().unwrap_or(""),
            row.ns_setting.as_str(),
            row.smos_second_talker.as_deref().unwrap_or(""),
            row.nmos_second_talker.as_deref().unwrap_or(""),
            row.gmos_second_talker.as_deref().unwrap_or(""),
            row.smos_bgn.as_deref().unwrap_or(""),
            row.nmos_bgn.as_deref().unwrap_or(""),
            row.gmos_bgn.as_deref().unwrap_or(""),
        ])?;
    }
    blank(wtr)
}

fn write_status_section(wtr: &mut Writer, report: &BatchReport) -> Result<(), ExportError> {
    if report.status_rows.is_empty() {
        return Ok(());
    }
    if report.not_ok_rows.is_empty() {
        wtr.write_record(["All measurements OK"])?;
        return blank(wtr);
    }
    wtr.write_record(["Not OK Measurements"])?;
    wtr.write_record(["File", "SMD", "Status", "Description", "Single Value", "Limits"])?;
    for row in &report.not_ok_rows {
        wtr.write_record([
            row.file.as_str(),
            row.device_descriptor.as_str(),
            row.status.as_str(),
            row.description.as_str(),
            row.measured_value.as_str(),
            row.resolved_limit.as_deref().unwrap_or(""),
        ])?;
    }
    blank(wtr)
}

fn write_double_talk_section(wtr: &mut Writer, report: &BatchReport) -> Result<(), ExportError> {
    if report.double_talk_rows.is_empty() {
        return Ok(());
    }
    wtr.write_record(["Attenuation During Double Talk"])?;
    wtr.write_record(["File", "SMD", "Status", "Description", "Single Value"])?;
    for row in &report.double_talk_rows {
        wtr.write_record([
            row.file.as_str(),
            row.device_descriptor.as_str(),
            row.status.as_str(),
            row.description.as_str(),
            row.measured_value.as_str(),
        ])?;
    }
    blank(wtr)
}

fn write_error_section(wtr: &mut Writer, report: &BatchReport) -> Result<(), ExportError> {
    if report.file_errors.is_empty() {
        return Ok(());
    }
    wtr.write_record(["File Errors"])?;
    wtr.write_record(["File", "Error"])?;
    for err in &report.file_errors {
        wtr.write_record([err.file.as_str(), err.message.as_str()])?;
    }
    blank(wtr)
}

fn write_record_section(wtr: &mut Writer, report: &BatchReport) -> Result<(), ExportError> {
    wtr.write_record([
        "CodeID",
        "Category",
        "TitleOccurrence",
        "Title",
        "Timestamp",
        "FilePath",
    ])?;
    for record in &report.records {
        wtr.write_record([
            record.code_id.clone(),
            record.category.short_code().to_string(),
            record.sequence_index.to_string(),
            record.title.clone(),
            record
                .timestamp
                .map(patterns::format_report_timestamp)
                .unwrap_or_default(),
            record.source_file.display().to_string(),
        ])?;
    }
    Ok(())
}
