// File I/O: contact source parsers and contact set exporters

pub mod csv;
pub mod docx;
pub mod error;
pub mod json;
pub mod vcard;
pub mod xlsx;

use std::path::Path;

use kesher_recon::config::OutputConfig;
use kesher_recon::{ContactSet, ParsedSource, SourceFile};

pub use error::IoError;

/// Input formats, detected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    /// xlsx, xlsm, xls, xlsb, ods
    Spreadsheet,
    Docx,
    VCard,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            "docx" => Some(Self::Docx),
            "vcf" => Some(Self::VCard),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Run the parser for `format` over the raw file bytes.
pub fn parse(bytes: &[u8], format: SourceFormat) -> Result<ParsedSource, IoError> {
    match format {
        SourceFormat::Csv => csv::parse(bytes, None),
        SourceFormat::Tsv => csv::parse(bytes, Some(b'\t')),
        SourceFormat::Spreadsheet => xlsx::parse(bytes),
        SourceFormat::Docx => docx::parse(bytes),
        SourceFormat::VCard => vcard::parse(bytes),
    }
}

/// Parse file bytes, picking the parser from `filename`'s extension.
pub fn parse_named(bytes: &[u8], filename: &str) -> Result<ParsedSource, IoError> {
    let format = SourceFormat::from_path(Path::new(filename))
        .ok_or_else(|| IoError::UnsupportedFormat(filename.to_string()))?;
    parse(bytes, format)
}

/// Read and parse one file from disk.
///
/// Returns `None` for extensions no parser handles. Read and parse errors
/// are captured in the returned `SourceFile` so one bad file never stops
/// the others.
pub fn load_file(path: &Path) -> Option<SourceFile> {
    let format = SourceFormat::from_path(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let parsed = std::fs::read(path)
        .map_err(|e| IoError::Read(format!("{}: {}", path.display(), e)))
        .and_then(|bytes| parse(&bytes, format));

    Some(match parsed {
        Ok(source) => {
            log::debug!("{}: parsed {} raw row(s) as {:?}", name, source.raw.len(), format);
            SourceFile::parsed(name, source)
        }
        Err(e) => SourceFile::failed(name, e),
    })
}

/// Output formats for the merged contact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Write the contact set to `path` in the requested format.
pub fn export(
    contacts: &ContactSet,
    output: &OutputConfig,
    format: ExportFormat,
    path: &Path,
) -> Result<(), IoError> {
    match format {
        ExportFormat::Xlsx => xlsx::export(contacts, output, path),
        ExportFormat::Csv => csv::export(contacts, output.header_labels(), path),
        ExportFormat::Json => json::export(contacts, output.header_labels(), path),
    }
}
