use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use acqua_review::document::docx::DocxSource;
use acqua_review::export::{self, DEFAULT_OUTPUT_NAME};
use acqua_review::{report, version_banner};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("{}", version_banner());
        return ExitCode::SUCCESS;
    }

    let paths: Vec<PathBuf> = args
        .iter()
        .filter(|a| !a.starts_with('-'))
        .map(PathBuf::from)
        .collect();
    if paths.is_empty() {
        eprintln!("Usage: acqua-review [--version] <report.docx>...");
        eprintln!("Writes {DEFAULT_OUTPUT_NAME} next to the first report.");
        return ExitCode::FAILURE;
    }

    let batch = report::process_reports(&DocxSource, &paths);

    let output_dir = paths[0].parent().unwrap_or_else(|| std::path::Path::new("."));
    let output = output_dir.join(DEFAULT_OUTPUT_NAME);
    if let Err(err) = export::write_csv(&batch, &output) {
        error!(%err, "failed to write review sheet");
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    println!(
        "Processed {} file(s), {} record(s) -> {}",
        paths.len(),
        batch.records.len(),
        output.display()
    );
    if !batch.file_errors.is_empty() {
        eprintln!("{} file(s) could not be read; see the error section.", batch.file_errors.len());
    }
    ExitCode::SUCCESS
}
