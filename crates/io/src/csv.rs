// CSV/TSV import and export

use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1252, WINDOWS_1255};
use kesher_recon::{ContactSet, HeaderMode, ParsedSource, RawTable};

use crate::error::IoError;

const UTF8_BOM: &str = "\u{feff}";

/// Parse CSV bytes. The first row holds the column labels.
///
/// `delimiter = None` sniffs the delimiter from the first lines.
pub fn parse(bytes: &[u8], delimiter: Option<u8>) -> Result<ParsedSource, IoError> {
    let content = decode_text(bytes)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::Csv(e.to_string()))?;
        // Blank line
        if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(ParsedSource {
        raw: RawTable::padded(rows),
        header: HeaderMode::FirstRow,
    })
}

/// Decode CSV text.
///
/// UTF-8 (BOM stripped) and BOM-marked UTF-16 are taken as is. Anything
/// else is tried as Windows-1255 (Hebrew Excel) and Windows-1252, in the
/// order `looks_like_hebrew` suggests. A candidate that leaves unmapped
/// bytes or C1 control characters is rejected.
pub fn decode_text(bytes: &[u8]) -> Result<String, IoError> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.strip_prefix(UTF8_BOM).unwrap_or(s).to_string());
    }

    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return encoding
            .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            .map(|s| s.into_owned())
            .ok_or_else(|| IoError::Decode(format!("invalid {} text", encoding.name())));
    }

    let candidates = if looks_like_hebrew(bytes) {
        [WINDOWS_1255, WINDOWS_1252]
    } else {
        [WINDOWS_1252, WINDOWS_1255]
    };
    for encoding in candidates {
        let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) else {
            continue;
        };
        if text.chars().any(|c| ('\u{80}'..='\u{9f}').contains(&c)) {
            continue;
        }
        log::debug!("input is not UTF-8, decoded as {}", encoding.name());
        return Ok(text.into_owned());
    }

    Err(IoError::Decode(
        "text is not UTF-8, UTF-16, Windows-1255 or Windows-1252".to_string(),
    ))
}

/// True when the non-ASCII bytes read as Hebrew words under Windows-1255.
///
/// Letters live at 0xE0..=0xFA there. In Windows-1252 the same bytes are
/// accented Latin letters, which sit next to ASCII letters (`Caf\xe9`);
/// Hebrew words do not.
fn looks_like_hebrew(bytes: &[u8]) -> bool {
    let mut letters = 0usize;
    let mut beside_latin = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        if !(0xE0..=0xFA).contains(&b) {
            continue;
        }
        letters += 1;
        let prev = i.checked_sub(1).and_then(|j| bytes.get(j));
        let next = bytes.get(i + 1);
        if prev.is_some_and(u8::is_ascii_alphabetic) || next.is_some_and(u8::is_ascii_alphabetic) {
            beside_latin += 1;
        }
    }
    letters > 0 && beside_latin * 4 < letters
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Higher field count breaks ties
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Write the contact set as CSV: one header row, then one row per contact.
///
/// A UTF-8 BOM is written first so spreadsheet apps detect Hebrew text.
pub fn export(contacts: &ContactSet, labels: [&str; 5], path: &Path) -> Result<(), IoError> {
    let mut bytes = UTF8_BOM.as_bytes().to_vec();
    {
        let mut writer = csv::WriterBuilder::new().from_writer(&mut bytes);
        for record in contacts.to_table(labels) {
            writer
                .write_record(&record)
                .map_err(|e| IoError::Export(e.to_string()))?;
        }
        writer.flush().map_err(|e| IoError::Export(e.to_string()))?;
    }
    std::fs::write(path, bytes).map_err(|e| IoError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kesher_recon::CanonicalRow;
    use std::fs;
    use tempfile::tempdir;

    fn rows(source: &ParsedSource) -> Vec<Vec<&str>> {
        source
            .raw
            .rows()
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Name;Address;City\n\"Doe, Jane\";\"123 Main St, Apt 4\";Paris\nBob;\"456 Elm\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_parse_hebrew_with_bom() {
        let bytes = "\u{feff}שם,טלפון\nדנה,050-1\n".as_bytes();
        let source = parse(bytes, None).unwrap();
        assert_eq!(source.header, HeaderMode::FirstRow);
        assert_eq!(rows(&source), vec![vec!["שם", "טלפון"], vec!["דנה", "050-1"]]);
    }

    #[test]
    fn test_parse_pads_short_rows_and_skips_blank_lines() {
        let bytes = b"Name,Phone,Email\nDana,050-1\n\nRon,052-2,r@x.com\n";
        let source = parse(bytes, None).unwrap();
        assert_eq!(
            rows(&source),
            vec![
                vec!["Name", "Phone", "Email"],
                vec!["Dana", "050-1", ""],
                vec!["Ron", "052-2", "r@x.com"],
            ]
        );
    }

    #[test]
    fn test_parse_windows_1252_fallback() {
        // "Café" in Windows-1252
        let bytes = b"Name,Phone\nCaf\xe9,1\n";
        let source = parse(bytes, Some(b',')).unwrap();
        assert_eq!(source.raw.rows()[1][0], "Café");
    }

    #[test]
    fn test_parse_windows_1255_hebrew() {
        let (bytes, _, _) = WINDOWS_1255.encode("שם,טלפון\nדנה כהן,050-1\n");
        let source = parse(&bytes, None).unwrap();
        assert_eq!(source.raw.rows()[0], vec!["שם", "טלפון"]);
        assert_eq!(source.raw.rows()[1], vec!["דנה כהן", "050-1"]);
    }

    #[test]
    fn test_parse_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "שם\tPhone\nדנה\t050-1\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let source = parse(&bytes, None).unwrap();
        assert_eq!(source.raw.rows()[1], vec!["דנה", "050-1"]);
    }

    #[test]
    fn test_undecodable_bytes_are_decode_error() {
        let err = parse(b"Name\n\x81\x8d\n", None).unwrap_err();
        assert!(matches!(err, IoError::Decode(_)), "got {err}");
    }

    #[test]
    fn test_looks_like_hebrew() {
        assert!(looks_like_hebrew(b"\xf9\xed,\xe8\xec\xf4\xe5\xef"));
        assert!(!looks_like_hebrew(b"Caf\xe9"));
        assert!(!looks_like_hebrew(b"plain"));
    }

    #[test]
    fn test_parse_empty_input() {
        let source = parse(b"", None).unwrap();
        assert!(source.raw.is_empty());
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.csv");
        let set = ContactSet::new(vec![CanonicalRow {
            hebrew_name: "דנה".into(),
            phone: "050-1".into(),
            email: "d@x.com".into(),
            ..Default::default()
        }]);

        export(&set, ["A", "B", "C", "D", "E"], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(UTF8_BOM));
        let source = parse(content.as_bytes(), None).unwrap();
        assert_eq!(
            rows(&source),
            vec![vec!["A", "B", "C", "D", "E"], vec!["דנה", "", "050-1", "", "d@x.com"]]
        );
    }
}
