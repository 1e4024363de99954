// Word document table import
//
// Reads word/document.xml out of the .docx archive and collects the rows
// of every top-level table, in document order. No header row is assumed.

use std::io::{Cursor, Read};

use kesher_recon::{HeaderMode, ParsedSource, RawTable};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::IoError;

const DOCUMENT_XML: &str = "word/document.xml";

pub fn parse(bytes: &[u8]) -> Result<ParsedSource, IoError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IoError::Docx(format!("not a DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| IoError::Docx(format!("missing {}: {}", DOCUMENT_XML, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| IoError::Docx(format!("cannot read {}: {}", DOCUMENT_XML, e)))?;

    let rows = extract_table_rows(&xml)?;
    Ok(ParsedSource {
        raw: RawTable::padded(rows),
        header: HeaderMode::Positional,
    })
}

/// Cell under construction: its paragraphs and horizontal span.
struct CellText {
    paragraphs: Vec<String>,
    span: usize,
}

impl CellText {
    fn new() -> Self {
        Self { paragraphs: Vec::new(), span: 1 }
    }

    fn push_str(&mut self, s: &str) {
        if self.paragraphs.is_empty() {
            self.paragraphs.push(String::new());
        }
        if let Some(last) = self.paragraphs.last_mut() {
            last.push_str(s);
        }
    }

    fn finish(self) -> String {
        self.paragraphs.join("\n").trim().to_string()
    }
}

/// Walk document.xml and return one row per non-empty `<w:tr>` of every
/// top-level `<w:tbl>`. Nested tables are ignored; their text does not leak
/// into the enclosing cell.
fn extract_table_rows(xml: &str) -> Result<Vec<Vec<String>>, IoError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut table_depth = 0usize;
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<CellText> = None;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| IoError::Docx(format!("malformed document.xml: {}", e)))?;
        let top = table_depth == 1;

        match event {
            Event::Start(ref e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:tr" if top => row = Some(Vec::new()),
                b"w:tc" if top => cell = Some(CellText::new()),
                b"w:p" if top => {
                    if let Some(c) = cell.as_mut() {
                        c.paragraphs.push(String::new());
                    }
                }
                b"w:t" if top => in_text = true,
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"w:gridSpan" if top => {
                    if let (Some(c), Some(span)) = (cell.as_mut(), grid_span(e)) {
                        c.span = span;
                    }
                }
                b"w:tab" if top => push_text(&mut cell, "\t"),
                b"w:br" | b"w:cr" if top => push_text(&mut cell, "\n"),
                _ => {}
            },
            Event::Text(ref e) if in_text => {
                push_text(&mut cell, &String::from_utf8_lossy(e));
            }
            Event::GeneralRef(ref e) if in_text => {
                let name = String::from_utf8_lossy(e).to_string();
                if let Some(c) = resolve_entity(&name) {
                    push_text(&mut cell, c.encode_utf8(&mut [0u8; 4]));
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:tc" if top => {
                    if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                        let span = c.span;
                        let text = c.finish();
                        for _ in 0..span {
                            r.push(text.clone());
                        }
                    }
                }
                b"w:tr" if top => {
                    if let Some(r) = row.take() {
                        if r.iter().any(|c| !c.is_empty()) {
                            rows.push(r);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn push_text(cell: &mut Option<CellText>, s: &str) {
    if let Some(c) = cell.as_mut() {
        c.push_str(s);
    }
}

fn grid_span(e: &BytesStart<'_>) -> Option<usize> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"w:val")
        .and_then(|a| String::from_utf8_lossy(&a.value).parse().ok())
        .filter(|&n: &usize| n > 0)
}

/// Predefined XML entities and numeric character references.
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn docx(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_XML, SimpleFileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn cell(text: &str) -> String {
        format!("<w:tc><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:tc>")
    }

    fn row(cells: &[&str]) -> String {
        let inner: String = cells.iter().map(|c| cell(c)).collect();
        format!("<w:tr>{inner}</w:tr>")
    }

    fn table(rows: &[&[&str]]) -> String {
        let inner: String = rows.iter().map(|r| row(r)).collect();
        format!("<w:tbl>{inner}</w:tbl>")
    }

    #[test]
    fn test_rows_from_all_tables() {
        let body = format!(
            "{}<w:p><w:r><w:t>between</w:t></w:r></w:p>{}",
            table(&[&["Dana", "050-1"], &["Ron", "052-2"]]),
            table(&[&["Avi", "053-3", "a@x.com"]]),
        );
        let source = parse(&docx(&body)).unwrap();

        assert_eq!(source.header, HeaderMode::Positional);
        assert_eq!(
            source.raw.rows(),
            &[
                vec!["Dana".to_string(), "050-1".into(), "".into()],
                vec!["Ron".into(), "052-2".into(), "".into()],
                vec!["Avi".into(), "053-3".into(), "a@x.com".into()],
            ]
        );
    }

    #[test]
    fn test_empty_rows_skipped_and_text_trimmed() {
        let body = table(&[&["  Dana ", "050-1"], &["", "  "], &["Ron", ""]]);
        let source = parse(&docx(&body)).unwrap();
        assert_eq!(source.raw.len(), 2);
        assert_eq!(source.raw.rows()[0][0], "Dana");
    }

    #[test]
    fn test_paragraphs_joined_and_entities_resolved() {
        let body = "<w:tbl><w:tr><w:tc>\
            <w:p><w:r><w:t>Levi &amp; Sons</w:t></w:r></w:p>\
            <w:p><w:r><w:t>Haifa</w:t></w:r></w:p>\
            </w:tc></w:tr></w:tbl>";
        let source = parse(&docx(body)).unwrap();
        assert_eq!(source.raw.rows()[0][0], "Levi & Sons\nHaifa");
    }

    #[test]
    fn test_grid_span_repeats_cell() {
        let body = "<w:tbl><w:tr>\
            <w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr><w:p><w:r><w:t>Dana</w:t></w:r></w:p></w:tc>\
            <w:tc><w:p><w:r><w:t>050-1</w:t></w:r></w:p></w:tc>\
            </w:tr></w:tbl>";
        let source = parse(&docx(body)).unwrap();
        assert_eq!(source.raw.rows()[0], vec!["Dana", "Dana", "050-1"]);
    }

    #[test]
    fn test_nested_table_text_ignored() {
        let nested = table(&[&["inner"]]);
        let body = format!(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>outer</w:t></w:r></w:p>{nested}</w:tc></w:tr></w:tbl>"
        );
        let source = parse(&docx(&body)).unwrap();
        assert_eq!(source.raw.rows(), &[vec!["outer".to_string()]]);
    }

    #[test]
    fn test_document_without_tables_is_empty() {
        let source = parse(&docx("<w:p><w:r><w:t>just text</w:t></w:r></w:p>")).unwrap();
        assert!(source.raw.is_empty());
    }

    #[test]
    fn test_not_a_zip() {
        let err = parse(b"plain text").unwrap_err();
        assert!(err.to_string().contains("not a DOCX archive"));
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some('&'));
        assert_eq!(resolve_entity("#x5D0"), Some('א'));
        assert_eq!(resolve_entity("#65"), Some('A'));
        assert_eq!(resolve_entity("nbsp"), None);
    }
}
