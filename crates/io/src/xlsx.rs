// Excel file import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import: first worksheet only, every cell rendered as a string.
// Export: one sheet, header row plus one row per contact, all cells text.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use kesher_recon::config::{HeaderLanguage, OutputConfig};
use kesher_recon::{ContactSet, HeaderMode, ParsedSource, RawTable};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use crate::error::IoError;

/// Parse the first worksheet of a workbook. The first row holds the labels.
pub fn parse(bytes: &[u8]) -> Result<ParsedSource, IoError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IoError::Spreadsheet(format!("Failed to open workbook: {}", e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(IoError::Spreadsheet("Workbook contains no sheets".to_string()));
    };
    if sheet_names.len() > 1 {
        log::debug!("reading sheet '{}', ignoring {} other sheet(s)", first, sheet_names.len() - 1);
    }

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| IoError::Spreadsheet(format!("Failed to read sheet '{}': {}", first, e)))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(ParsedSource {
        raw: RawTable::padded(rows),
        header: HeaderMode::FirstRow,
    })
}

/// Render a cell as text. Integral floats drop the trailing `.0` so phone
/// numbers stored as numbers come back as digits.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        other => other.to_string(),
    }
}

/// Export the contact set to an xlsx file.
pub fn export(contacts: &ContactSet, output: &OutputConfig, path: &Path) -> Result<(), IoError> {
    let mut workbook = build_workbook(contacts, output)?;
    workbook
        .save(path)
        .map_err(|e| IoError::Export(format!("Failed to save XLSX file: {}", e)))
}

/// Export the contact set to an in-memory xlsx file.
pub fn export_to_buffer(contacts: &ContactSet, output: &OutputConfig) -> Result<Vec<u8>, IoError> {
    let mut workbook = build_workbook(contacts, output)?;
    workbook
        .save_to_buffer()
        .map_err(|e| IoError::Export(format!("Failed to write XLSX buffer: {}", e)))
}

fn build_workbook(contacts: &ContactSet, output: &OutputConfig) -> Result<XlsxWorkbook, IoError> {
    let mut workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook
        .add_worksheet()
        .set_name(&output.sheet_name)
        .map_err(|e| IoError::Export(format!("Failed to create sheet '{}': {}", output.sheet_name, e)))?;

    if output.header_language == HeaderLanguage::Hebrew {
        worksheet.set_right_to_left(true);
    }

    for (row_idx, record) in contacts.to_table(output.header_labels()).iter().enumerate() {
        let row32 = row_idx as u32;
        for (col_idx, value) in record.iter().enumerate() {
            let col16 = col_idx as u16;
            if row_idx == 0 {
                worksheet
                    .write_string_with_format(row32, col16, value, &header_format)
                    .map_err(|e| IoError::Export(format!("Failed to write header: {}", e)))?;
            } else if !value.is_empty() {
                worksheet
                    .write_string(row32, col16, value)
                    .map_err(|e| IoError::Export(format!("Failed to write cell: {}", e)))?;
            }
        }
    }

    worksheet.autofit();
    Ok(workbook)
}
