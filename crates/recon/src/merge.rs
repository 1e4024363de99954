//! Projection of classified tables onto the canonical schema.

use crate::model::{CanonicalField, CanonicalRow, ColumnClassification, SourceTable};

/// Project one table into canonical rows, aligned by row index.
///
/// Unmapped fields are empty strings. Always returns `table.row_count()` rows,
/// even when the table has no columns left.
pub fn project(table: &SourceTable, classification: &ColumnClassification) -> Vec<CanonicalRow> {
    let mut rows = vec![CanonicalRow::default(); table.row_count()];
    for field in CanonicalField::ALL {
        let Some(col_idx) = classification.get(field) else {
            continue;
        };
        let Some(column) = table.columns().get(col_idx) else {
            continue;
        };
        for (row, value) in rows.iter_mut().zip(&column.values) {
            row.set(field, value.clone());
        }
    }
    rows
}

/// Concatenate tables in order: every row of table 1, then table 2, ...
pub fn merge_tables<'a, I>(tables: I) -> Vec<CanonicalRow>
where
    I: IntoIterator<Item = (&'a SourceTable, &'a ColumnClassification)>,
{
    tables
        .into_iter()
        .fold(Vec::new(), |mut merged, (table, classification)| {
            merged.extend(project(table, classification));
            merged
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceColumn;

    fn table(cols: &[(&str, &[&str])], rows: usize) -> SourceTable {
        SourceTable::new(
            cols.iter()
                .map(|(l, v)| SourceColumn::new(*l, v.iter().map(|s| s.to_string()).collect()))
                .collect(),
            rows,
        )
        .unwrap()
    }

    #[test]
    fn projects_mapped_fields_and_blanks_the_rest() {
        let t = table(&[("Name", &["Dana", "Ron"]), ("City", &["TLV", "Haifa"])], 2);
        let mut c = ColumnClassification::default();
        c.assign(CanonicalField::HebrewName, 0);

        let rows = project(&t, &c);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].hebrew_name, "Ron");
        assert_eq!(rows[1].phone, "");
        assert!(rows.iter().all(|r| !r.values().contains(&"TLV")));
    }

    #[test]
    fn columnless_table_yields_empty_rows() {
        let t = table(&[], 3);
        let rows = project(&t, &ColumnClassification::default());
        assert_eq!(rows, vec![CanonicalRow::default(); 3]);
    }

    #[test]
    fn merge_keeps_table_then_row_order() {
        let a = table(&[("Phone", &["1", "2"])], 2);
        let b = table(&[("Phone", &["3"])], 1);
        let mut c = ColumnClassification::default();
        c.assign(CanonicalField::Phone, 0);

        let merged = merge_tables([(&a, &c), (&b, &c)]);
        let phones: Vec<&str> = merged.iter().map(|r| r.phone.as_str()).collect();
        assert_eq!(phones, vec!["1", "2", "3"]);
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        assert!(merge_tables(std::iter::empty::<(&SourceTable, &ColumnClassification)>()).is_empty());
    }
}
