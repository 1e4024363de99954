use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// File could not be read from disk.
    Read(String),
    /// Bytes are not valid text in the expected encoding.
    Decode(String),
    Csv(String),
    /// Excel / ODS workbook error.
    Spreadsheet(String),
    Docx(String),
    VCard { line: usize, message: String },
    Export(String),
    /// Extension not handled by any parser.
    UnsupportedFormat(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "read error: {msg}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Spreadsheet(msg) => write!(f, "spreadsheet error: {msg}"),
            Self::Docx(msg) => write!(f, "DOCX error: {msg}"),
            Self::VCard { line, message } => write!(f, "vCard error at line {line}: {message}"),
            Self::Export(msg) => write!(f, "export error: {msg}"),
            Self::UnsupportedFormat(name) => write!(f, "unsupported file type: {name}"),
        }
    }
}

impl std::error::Error for IoError {}
