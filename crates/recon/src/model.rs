use serde::Serialize;

use crate::error::{ParseFailure, ReconError};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Rows of string cells as produced by a format parser.
///
/// Every row has the same width; ragged input is rejected at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Result<Self, ReconError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(ReconError::RaggedRow {
                    row: idx,
                    expected: width,
                    found: row.len(),
                });
            }
        }
        Ok(Self { rows, width })
    }

    /// Pad short rows with empty cells up to the widest row.
    pub fn padded(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows, width }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How column labels are derived for a raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    /// First row holds the labels (CSV, spreadsheets).
    FirstRow,
    /// No header; labels are column positions `"0"`, `"1"`, ... (word tables).
    Positional,
    /// First row holds canonical field labels (vCard).
    Canonical,
}

/// A raw table plus the header convention of the format that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    pub raw: RawTable,
    pub header: HeaderMode,
}

/// One input file after the format parser ran (or failed).
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub parsed: Result<ParsedSource, ParseFailure>,
}

impl SourceFile {
    pub fn parsed(name: impl Into<String>, source: ParsedSource) -> Self {
        Self { name: name.into(), parsed: Ok(source) }
    }

    pub fn failed(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        let name = name.into();
        let failure = ParseFailure::new(name.clone(), message);
        Self { name, parsed: Err(failure) }
    }
}

// ---------------------------------------------------------------------------
// Column-labeled tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumn {
    pub label: String,
    pub values: Vec<String>,
}

impl SourceColumn {
    pub fn new(label: impl Into<String>, values: Vec<String>) -> Self {
        Self { label: label.into(), values }
    }
}

/// A column-labeled table ready for classification.
///
/// `row_count` is tracked separately so a table whose every column was
/// filtered away still contributes its rows to the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTable {
    columns: Vec<SourceColumn>,
    row_count: usize,
    canonical_labels: bool,
}

impl SourceTable {
    pub fn new(columns: Vec<SourceColumn>, row_count: usize) -> Result<Self, ReconError> {
        for col in &columns {
            if col.values.len() != row_count {
                return Err(ReconError::RaggedRow {
                    row: col.values.len().min(row_count),
                    expected: row_count,
                    found: col.values.len(),
                });
            }
        }
        Ok(Self { columns, row_count, canonical_labels: false })
    }

    pub(crate) fn with_canonical_labels(mut self) -> Self {
        self.canonical_labels = true;
        self
    }

    pub fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// True when labels are canonical field labels (vCard input).
    pub fn has_canonical_labels(&self) -> bool {
        self.canonical_labels
    }

    /// Keep only the columns for which `keep` returns true, preserving order.
    pub fn retain_columns(mut self, mut keep: impl FnMut(&SourceColumn) -> bool) -> Self {
        self.columns.retain(|c| keep(c));
        self
    }
}

// ---------------------------------------------------------------------------
// Canonical schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    HebrewName,
    EnglishName,
    Phone,
    PhoneAlt,
    Email,
}

impl CanonicalField {
    /// All fields in export column order.
    pub const ALL: [CanonicalField; 5] = [
        Self::HebrewName,
        Self::EnglishName,
        Self::Phone,
        Self::PhoneAlt,
        Self::Email,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::HebrewName => 0,
            Self::EnglishName => 1,
            Self::Phone => 2,
            Self::PhoneAlt => 3,
            Self::Email => 4,
        }
    }

    pub fn hebrew_label(self) -> &'static str {
        match self {
            Self::HebrewName => "שם בעברית",
            Self::EnglishName => "שם באנגלית",
            Self::Phone => "טלפון",
            Self::PhoneAlt => "טלפון נוסף",
            Self::Email => "מייל",
        }
    }

    pub fn english_label(self) -> &'static str {
        match self {
            Self::HebrewName => "Hebrew Name",
            Self::EnglishName => "English Name",
            Self::Phone => "Phone",
            Self::PhoneAlt => "Phone (Alt)",
            Self::Email => "Email",
        }
    }

    /// Exact lookup by either canonical label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.hebrew_label() == label || f.english_label() == label)
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HebrewName => write!(f, "hebrew_name"),
            Self::EnglishName => write!(f, "english_name"),
            Self::Phone => write!(f, "phone"),
            Self::PhoneAlt => write!(f, "phone_alt"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// Canonical field → source column index, for one table.
///
/// A field is written at most once; a column backs at most one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnClassification {
    slots: [Option<usize>; 5],
}

impl ColumnClassification {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.slots[field.index()]
    }

    pub fn is_assigned(&self, field: CanonicalField) -> bool {
        self.get(field).is_some()
    }

    /// Assign `column` to `field` unless the field or the column is taken.
    pub fn assign(&mut self, field: CanonicalField, column: usize) -> bool {
        if self.is_assigned(field) || self.field_for(column).is_some() {
            return false;
        }
        self.slots[field.index()] = Some(column);
        true
    }

    pub fn field_for(&self, column: usize) -> Option<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .find(|f| self.slots[f.index()] == Some(column))
    }

    pub fn mapped_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalRow {
    pub hebrew_name: String,
    pub english_name: String,
    pub phone: String,
    pub phone_alt: String,
    pub email: String,
}

impl CanonicalRow {
    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::HebrewName => &self.hebrew_name,
            CanonicalField::EnglishName => &self.english_name,
            CanonicalField::Phone => &self.phone,
            CanonicalField::PhoneAlt => &self.phone_alt,
            CanonicalField::Email => &self.email,
        }
    }

    pub fn set(&mut self, field: CanonicalField, value: String) {
        let slot = match field {
            CanonicalField::HebrewName => &mut self.hebrew_name,
            CanonicalField::EnglishName => &mut self.english_name,
            CanonicalField::Phone => &mut self.phone,
            CanonicalField::PhoneAlt => &mut self.phone_alt,
            CanonicalField::Email => &mut self.email,
        };
        *slot = value;
    }

    /// Identity key used by deduplication: (phone, email), verbatim.
    pub fn identity_key(&self) -> (&str, &str) {
        (&self.phone, &self.email)
    }

    /// Values in export column order.
    pub fn values(&self) -> [&str; 5] {
        CanonicalField::ALL.map(|f| self.get(f))
    }
}

/// Final deduplicated contact list for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContactSet {
    rows: Vec<CanonicalRow>,
}

impl ContactSet {
    pub fn new(rows: Vec<CanonicalRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row-major table: one header row of `labels`, then one row per contact.
    pub fn to_table(&self, labels: [&str; 5]) -> Vec<Vec<String>> {
        let mut table = Vec::with_capacity(self.rows.len() + 1);
        table.push(labels.iter().map(|l| l.to_string()).collect());
        for row in &self.rows {
            table.push(row.values().iter().map(|v| v.to_string()).collect());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(row: &[&str]) -> Vec<String> {
        row.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn raw_table_rejects_ragged_rows() {
        let err = RawTable::new(vec![cells(&["a", "b"]), cells(&["c"])]).unwrap_err();
        assert_eq!(err, ReconError::RaggedRow { row: 1, expected: 2, found: 1 });
    }

    #[test]
    fn raw_table_padded_fills_short_rows() {
        let raw = RawTable::padded(vec![cells(&["a"]), cells(&["b", "c", "d"])]);
        assert_eq!(raw.width(), 3);
        assert_eq!(raw.rows()[0], cells(&["a", "", ""]));
    }

    #[test]
    fn source_table_rejects_unequal_columns() {
        let cols = vec![
            SourceColumn::new("a", cells(&["1", "2"])),
            SourceColumn::new("b", cells(&["1"])),
        ];
        assert!(SourceTable::new(cols, 2).is_err());
    }

    #[test]
    fn classification_never_double_books_a_column() {
        let mut c = ColumnClassification::default();
        assert!(c.assign(CanonicalField::Phone, 0));
        assert!(!c.assign(CanonicalField::PhoneAlt, 0));
        assert!(!c.assign(CanonicalField::Phone, 1));
        assert_eq!(c.field_for(0), Some(CanonicalField::Phone));
        assert_eq!(c.mapped_count(), 1);
    }

    #[test]
    fn canonical_label_lookup() {
        assert_eq!(CanonicalField::from_label("טלפון נוסף"), Some(CanonicalField::PhoneAlt));
        assert_eq!(CanonicalField::from_label("Email"), Some(CanonicalField::Email));
        assert_eq!(CanonicalField::from_label("email"), None);
    }

    #[test]
    fn contact_set_table_is_row_major() {
        let set = ContactSet::new(vec![CanonicalRow {
            hebrew_name: "דנה".into(),
            phone: "050-1".into(),
            ..Default::default()
        }]);
        let table = set.to_table(CanonicalField::ALL.map(|f| f.english_label()));
        assert_eq!(table.len(), 2);
        assert_eq!(table[0][4], "Email");
        assert_eq!(table[1], cells(&["דנה", "", "050-1", "", ""]));
    }
}
