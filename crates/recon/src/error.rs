use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad sheet name, empty marker, etc.).
    ConfigValidation(String),
    /// A raw table row whose width differs from the first row.
    RaggedRow { row: usize, expected: usize, found: usize },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::RaggedRow { row, expected, found } => {
                write!(f, "row {row} has {found} cell(s), expected {expected}")
            }
        }
    }
}

impl std::error::Error for ReconError {}

/// A single source file that could not be decoded into a table.
///
/// Never fatal: the run driver records it and moves on to the next file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ParseFailure {
    pub file: String,
    pub message: String,
}

impl ParseFailure {
    pub fn new(file: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            file: file.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

impl std::error::Error for ParseFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_row_message() {
        let err = ReconError::RaggedRow { row: 3, expected: 4, found: 2 };
        assert_eq!(err.to_string(), "row 3 has 2 cell(s), expected 4");
    }

    #[test]
    fn parse_failure_names_file() {
        let failure = ParseFailure::new("contacts.docx", "invalid zip header");
        assert_eq!(failure.to_string(), "contacts.docx: invalid zip header");
    }
}
