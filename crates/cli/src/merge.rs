//! `kesher merge` and `kesher inspect`.

use std::path::{Path, PathBuf};

use kesher_io::ExportFormat;
use kesher_recon::classify::{ColumnReport, MatchReason};
use kesher_recon::report::{FileReport, FileStatus};
use kesher_recon::{MergeOutcome, SourceFile};

use crate::exit_codes::{EXIT_AWAITING_INPUT, EXIT_PARTIAL, EXIT_WRITE};
use crate::{settings, CliError, OutputFormat};

const SUPPORTED: &str = ".csv .tsv .xlsx .xlsm .xls .xlsb .ods .docx .vcf";

/// Parse every supported file. Unsupported extensions are reported and
/// left out; read and parse errors stay inside the returned `SourceFile`s.
fn load_inputs(paths: &[PathBuf]) -> Vec<SourceFile> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match kesher_io::load_file(path) {
            Some(file) => files.push(file),
            None => eprintln!("skipped {}: unsupported file type", path.display()),
        }
    }
    files
}

/// Resolve the export format and path from `--format` and `--output`.
fn resolve_output(
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<(ExportFormat, PathBuf), CliError> {
    let format = match (format, output.as_deref()) {
        (Some(f), _) => ExportFormat::from(f),
        (None, Some(path)) => ExportFormat::from_path(path).ok_or_else(|| {
            CliError::args(format!("cannot infer output format from {}", path.display()))
                .with_hint("use --format xlsx|csv|json")
        })?,
        (None, None) => ExportFormat::default(),
    };
    let path = output.unwrap_or_else(|| PathBuf::from(format!("contacts.{}", extension(format))));
    Ok((format, path))
}

fn extension(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Xlsx => "xlsx",
        ExportFormat::Csv => "csv",
        ExportFormat::Json => "json",
    }
}

pub fn cmd_merge(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    config_path: Option<PathBuf>,
    report_path: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = settings::resolve(config_path.as_deref())?;
    let (format, output_path) = resolve_output(output, format)?;

    let files = load_inputs(&inputs);
    let outcome = kesher_recon::run(&config, files);

    for failure in outcome.failures() {
        eprintln!("failed {}", failure);
    }

    let result = match outcome {
        MergeOutcome::AwaitingInput { .. } => {
            return Err(CliError::new(
                EXIT_AWAITING_INPUT,
                "awaiting input: no file produced a usable table",
            )
            .with_hint(format!("supported file types: {SUPPORTED}")));
        }
        MergeOutcome::Merged(result) => result,
    };

    kesher_io::export(&result.contacts, &config.output, format, &output_path).map_err(|e| {
        CliError::new(EXIT_WRITE, format!("cannot write {}: {e}", output_path.display()))
    })?;

    if let Some(ref path) = report_path {
        write_report(path, &result)?;
    }

    let s = &result.summary;
    eprintln!(
        "merged {} file(s) ({} failed): {} row(s), {} duplicate(s) dropped, {} contact(s)",
        s.files_loaded, s.files_failed, s.rows_merged, s.duplicates_dropped, s.contacts,
    );
    eprintln!("wrote {}", output_path.display());

    if strict && s.files_failed > 0 {
        return Err(CliError::new(
            EXIT_PARTIAL,
            format!("{} file(s) failed to parse (--strict)", s.files_failed),
        ));
    }
    Ok(())
}

fn write_report(path: &Path, result: &kesher_recon::MergeResult) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| CliError::new(EXIT_WRITE, format!("cannot write report: {e}")))?;
    eprintln!("wrote report {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Inspect
// ---------------------------------------------------------------------------

pub fn cmd_inspect(
    inputs: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = settings::resolve(config_path.as_deref())?;
    let reports: Vec<FileReport> = load_inputs(&inputs)
        .into_iter()
        .map(|file| kesher_recon::inspect(&config, file))
        .collect();

    if json_output {
        let json = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }
    Ok(())
}

fn print_report(report: &FileReport) {
    match &report.status {
        FileStatus::Failed { message } => println!("{}: failed: {}", report.name, message),
        FileStatus::Loaded { rows, labels, dropped_noise, columns } => {
            println!("{}: {} row(s), {} column(s)", report.name, rows, labels.len());
            for label in dropped_noise {
                println!("  {:<24} dropped (noise)", quoted(label));
            }
            for column in columns {
                println!("  {}", describe(column));
            }
        }
    }
}

fn describe(column: &ColumnReport) -> String {
    let label = quoted(&column.label);
    match (column.field, column.reason) {
        (Some(field), MatchReason::Content) => format!("{label:<24} -> {field} (content)"),
        (Some(field), MatchReason::Canonical) => format!("{label:<24} -> {field} (canonical)"),
        (Some(field), _) => format!("{label:<24} -> {field}"),
        (None, MatchReason::TargetFull) => format!("{label:<24} unmapped (target full)"),
        (None, _) => format!("{label:<24} unmapped"),
    }
}

fn quoted(label: &str) -> String {
    format!("\"{}\"", label)
}
