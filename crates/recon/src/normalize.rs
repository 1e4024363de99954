//! Raw table → column-labeled table.

use crate::error::ReconError;
use crate::model::{HeaderMode, ParsedSource, SourceColumn, SourceTable};

/// Transpose a parsed source into labeled columns.
///
/// `FirstRow` and `Canonical` consume the first row as labels; `Positional`
/// labels columns by index and keeps every row as data.
pub fn normalize(source: ParsedSource) -> Result<SourceTable, ReconError> {
    let ParsedSource { raw, header } = source;
    let width = raw.width();
    let mut rows = raw.into_rows().into_iter();

    let labels: Vec<String> = match header {
        HeaderMode::FirstRow | HeaderMode::Canonical => match rows.next() {
            Some(first) => first,
            None => return SourceTable::new(Vec::new(), 0),
        },
        HeaderMode::Positional => (0..width).map(|i| i.to_string()).collect(),
    };

    let mut columns: Vec<SourceColumn> = labels
        .into_iter()
        .map(|label| SourceColumn::new(label, Vec::new()))
        .collect();

    let mut row_count = 0;
    for (idx, row) in rows.enumerate() {
        if row.len() != columns.len() {
            return Err(ReconError::RaggedRow {
                row: idx,
                expected: columns.len(),
                found: row.len(),
            });
        }
        for (col, cell) in columns.iter_mut().zip(row) {
            col.values.push(cell);
        }
        row_count += 1;
    }

    let table = SourceTable::new(columns, row_count)?;
    Ok(match header {
        HeaderMode::Canonical => table.with_canonical_labels(),
        _ => table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawTable;

    fn raw(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn first_row_becomes_labels() {
        let table = normalize(ParsedSource {
            raw: raw(&[&["Name", "Phone"], &["Dana", "050-1"], &["Ron", "052-2"]]),
            header: HeaderMode::FirstRow,
        })
        .unwrap();
        assert_eq!(table.labels(), vec!["Name", "Phone"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.columns()[1].values, vec!["050-1", "052-2"]);
        assert!(!table.has_canonical_labels());
    }

    #[test]
    fn positional_labels_keep_every_row() {
        let table = normalize(ParsedSource {
            raw: raw(&[&["Dana", "050-1"], &["Ron", "052-2"]]),
            header: HeaderMode::Positional,
        })
        .unwrap();
        assert_eq!(table.labels(), vec!["0", "1"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let table = normalize(ParsedSource {
            raw: raw(&[&["Name", "Email"]]),
            header: HeaderMode::FirstRow,
        })
        .unwrap();
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn empty_raw_table_is_empty_source() {
        let table = normalize(ParsedSource {
            raw: RawTable::default(),
            header: HeaderMode::FirstRow,
        })
        .unwrap();
        assert!(table.columns().is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn canonical_header_is_flagged() {
        let table = normalize(ParsedSource {
            raw: raw(&[&["טלפון", "מייל"], &["050-1", "a@b.com"]]),
            header: HeaderMode::Canonical,
        })
        .unwrap();
        assert!(table.has_canonical_labels());
    }

    #[test]
    fn duplicate_and_empty_labels_survive() {
        let table = normalize(ParsedSource {
            raw: raw(&[&["", "Phone", "Phone"], &["x", "1", "2"]]),
            header: HeaderMode::FirstRow,
        })
        .unwrap();
        assert_eq!(table.labels(), vec!["", "Phone", "Phone"]);
    }
}
