// vCard (.vcf) import
//
// Each BEGIN:VCARD..END:VCARD component becomes one row in canonical
// column order. The header row carries the canonical labels, so the
// engine maps columns by label without running the classifier.
//
// vCard 2.1 quoted-printable values are decoded using their CHARSET.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use kesher_recon::{CanonicalField, CanonicalRow, HeaderMode, ParsedSource, RawTable};

use crate::error::IoError;

/// One unfolded content line: `[group.]NAME[;params]:value`.
struct ContentLine<'a> {
    /// 1-based line number of the first physical line.
    line: usize,
    name: String,
    /// `ENCODING=QUOTED-PRINTABLE` (or the bare 2.1 form) was given.
    quoted_printable: bool,
    charset: Option<&'a str>,
    value: &'a str,
}

impl<'a> ContentLine<'a> {
    /// The value with any quoted-printable transfer encoding removed.
    fn text(&self) -> Cow<'a, str> {
        if !self.quoted_printable {
            return Cow::Borrowed(self.value);
        }
        let bytes = decode_quoted_printable(self.value);
        let encoding = self
            .charset
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&bytes);
        Cow::Owned(text.into_owned())
    }
}

pub fn parse(bytes: &[u8]) -> Result<ParsedSource, IoError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| IoError::Decode(format!("vCard is not valid UTF-8: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rows = vec![CanonicalField::ALL
        .iter()
        .map(|f| f.hebrew_label().to_string())
        .collect::<Vec<_>>()];

    let mut card: Option<CardBuilder> = None;
    let mut depth = 0usize;

    for (line_no, line) in unfold(text) {
        let content = split_content_line(line_no, &line)?;

        match content.name.as_str() {
            "BEGIN" if content.value.eq_ignore_ascii_case("VCARD") => {
                depth += 1;
                if depth == 1 {
                    card = Some(CardBuilder::default());
                }
            }
            "END" if content.value.eq_ignore_ascii_case("VCARD") => {
                if depth == 0 {
                    return Err(IoError::VCard {
                        line: content.line,
                        message: "END:VCARD without BEGIN:VCARD".to_string(),
                    });
                }
                depth -= 1;
                if depth == 0 {
                    if let Some(done) = card.take() {
                        rows.push(done.finish().values().map(str::to_string).to_vec());
                    }
                }
            }
            // Properties of nested cards (AGENT etc.) are not ours.
            _ if depth == 1 => {
                if let Some(builder) = card.as_mut() {
                    builder.add(&content);
                }
            }
            _ if depth == 0 => {
                return Err(IoError::VCard {
                    line: content.line,
                    message: format!("property {} outside BEGIN:VCARD", content.name),
                });
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Err(IoError::VCard {
            line: text.lines().count(),
            message: "missing END:VCARD".to_string(),
        });
    }

    Ok(ParsedSource {
        raw: RawTable::padded(rows),
        header: HeaderMode::Canonical,
    })
}

/// Join folded lines (continuations start with a space or tab) and
/// quoted-printable soft line breaks (a trailing `=`), and drop blank
/// lines. Yields the line number where each logical line starts.
fn unfold(text: &str) -> Vec<(usize, String)> {
    let mut out: Vec<(usize, String)> = Vec::new();
    let mut soft_break = false;
    for (idx, raw) in text.lines().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let folded = raw.strip_prefix([' ', '\t']);
        match out.last_mut() {
            Some((_, last)) if soft_break => {
                last.pop();
                last.push_str(raw);
            }
            Some((_, last)) if folded.is_some() => last.push_str(folded.unwrap_or_default()),
            _ => {
                if raw.trim().is_empty() {
                    continue;
                }
                out.push((idx + 1, raw.to_string()));
            }
        }
        soft_break = out.last().is_some_and(|(_, last)| ends_with_soft_break(last));
    }
    out
}

fn ends_with_soft_break(line: &str) -> bool {
    line.ends_with('=')
        && line
            .split_once(':')
            .is_some_and(|(head, _)| head.to_ascii_uppercase().contains("QUOTED-PRINTABLE"))
}

/// Decode `=XX` escapes. A `=` not followed by two hex digits is kept.
fn decode_quoted_printable(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            let escaped = bytes
                .get(i + 1..i + 3)
                .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = escaped {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn split_content_line(line: usize, text: &str) -> Result<ContentLine<'_>, IoError> {
    let Some((head, value)) = text.split_once(':') else {
        return Err(IoError::VCard {
            line,
            message: format!("missing ':' in \"{}\"", text),
        });
    };
    let mut parts = head.split(';');
    let name = parts.next().unwrap_or(head);
    let name = name.rsplit('.').next().unwrap_or(name);
    if name.is_empty() {
        return Err(IoError::VCard { line, message: "empty property name".to_string() });
    }

    let mut quoted_printable = false;
    let mut charset = None;
    for param in parts {
        match param.split_once('=') {
            Some((key, val)) if key.trim().eq_ignore_ascii_case("ENCODING") => {
                quoted_printable = val.trim().eq_ignore_ascii_case("QUOTED-PRINTABLE");
            }
            Some((key, val)) if key.trim().eq_ignore_ascii_case("CHARSET") => {
                charset = Some(val.trim());
            }
            None if param.trim().eq_ignore_ascii_case("QUOTED-PRINTABLE") => quoted_printable = true,
            _ => {}
        }
    }

    Ok(ContentLine {
        line,
        name: name.to_ascii_uppercase(),
        quoted_printable,
        charset,
        value,
    })
}

/// Split a structured value on unescaped `;`, then unescape each part.
fn split_structured(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' => parts.push(unescape(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    parts.push(unescape(&current));
    parts
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Default)]
struct CardBuilder {
    full_name: Option<String>,
    /// (family, given) from N.
    structured_name: Option<(String, String)>,
    phones: Vec<String>,
    email: Option<String>,
}

impl CardBuilder {
    fn add(&mut self, line: &ContentLine<'_>) {
        let value = line.text();
        match line.name.as_str() {
            "FN" if self.full_name.is_none() => self.full_name = Some(unescape(&value)),
            "N" if self.structured_name.is_none() => {
                let mut parts = split_structured(&value).into_iter();
                let family = parts.next().unwrap_or_default();
                let given = parts.next().unwrap_or_default();
                self.structured_name = Some((family, given));
            }
            "TEL" if self.phones.len() < 2 => self.phones.push(unescape(&value)),
            "EMAIL" if self.email.is_none() => self.email = Some(unescape(&value)),
            _ => {}
        }
    }

    fn finish(self) -> CanonicalRow {
        let mut phones = self.phones.into_iter();
        CanonicalRow {
            hebrew_name: self.full_name.unwrap_or_default(),
            english_name: self
                .structured_name
                .map(|(family, given)| format!("{} {}", given, family))
                .unwrap_or_default(),
            phone: phones.next().unwrap_or_default(),
            phone_alt: phones.next().unwrap_or_default(),
            email: self.email.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_rows(source: &ParsedSource) -> Vec<Vec<&str>> {
        source.raw.rows()[1..]
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_two_phones_and_email() {
        let vcf = "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:דנה כהן\r\nN:Cohen;Dana;;;\r\n\
                   TEL;TYPE=CELL:050-1\r\nTEL;TYPE=HOME:050-2\r\nTEL:050-3\r\n\
                   EMAIL:a@b.com\r\nEND:VCARD\r\n";
        let source = parse(vcf.as_bytes()).unwrap();

        assert_eq!(source.header, HeaderMode::Canonical);
        assert_eq!(source.raw.rows()[0][0], "שם בעברית");
        assert_eq!(
            data_rows(&source),
            vec![vec!["דנה כהן", "Dana Cohen", "050-1", "050-2", "a@b.com"]]
        );
    }

    #[test]
    fn test_missing_properties_are_empty() {
        let vcf = "BEGIN:VCARD\nVERSION:3.0\nFN:Ron\nEND:VCARD\n\
                   BEGIN:VCARD\nVERSION:3.0\nTEL:052-2\nEND:VCARD\n";
        let source = parse(vcf.as_bytes()).unwrap();
        assert_eq!(
            data_rows(&source),
            vec![vec!["Ron", "", "", "", ""], vec!["", "", "052-2", "", ""]]
        );
    }

    #[test]
    fn test_n_with_empty_parts_keeps_space() {
        let vcf = "BEGIN:VCARD\nN:;Dana\nEND:VCARD\n";
        let source = parse(vcf.as_bytes()).unwrap();
        assert_eq!(source.raw.rows()[1][1], "Dana ");
    }

    #[test]
    fn test_folding_groups_and_escapes() {
        let vcf = "BEGIN:VCARD\n\
                   item1.EMAIL;type=INTERNET:very.long.address\n @example.com\n\
                   FN:Levi\\, Avi\n\
                   N:Levi\\;Ben;Avi\n\
                   END:VCARD\n";
        let source = parse(vcf.as_bytes()).unwrap();
        let row = &source.raw.rows()[1];
        assert_eq!(row[0], "Levi, Avi");
        assert_eq!(row[1], "Avi Levi;Ben");
        assert_eq!(row[4], "very.long.address@example.com");
    }

    #[test]
    fn test_lowercase_property_names() {
        let vcf = "begin:vcard\nfn:Dana\ntel:050-1\nend:vcard\n";
        let source = parse(vcf.as_bytes()).unwrap();
        assert_eq!(data_rows(&source), vec![vec!["Dana", "", "050-1", "", ""]]);
    }

    #[test]
    fn test_empty_file_has_header_only() {
        let source = parse(b"").unwrap();
        assert_eq!(source.raw.len(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let err = parse(b"BEGIN:VCARD\nFN:\xff\nEND:VCARD\n").unwrap_err();
        assert!(matches!(err, IoError::Decode(_)));
    }

    #[test]
    fn test_missing_end_is_error() {
        let err = parse(b"BEGIN:VCARD\nFN:Dana\n").unwrap_err();
        assert!(matches!(err, IoError::VCard { .. }));
    }

    #[test]
    fn test_line_without_colon_reports_line_number() {
        let err = parse(b"BEGIN:VCARD\nFN Dana\nEND:VCARD\n").unwrap_err();
        let IoError::VCard { line, .. } = err else {
            panic!("expected VCard error");
        };
        assert_eq!(line, 2);
    }

    #[test]
    fn test_quoted_printable_utf8() {
        let vcf = "BEGIN:VCARD\r\nVERSION:2.1\r\n\
                   FN;CHARSET=UTF-8;ENCODING=QUOTED-PRINTABLE:=D7=93=D7=A0=D7=94\r\n\
                   TEL;CELL:050-1\r\nEND:VCARD\r\n";
        let source = parse(vcf.as_bytes()).unwrap();
        assert_eq!(data_rows(&source), vec![vec!["דנה", "", "050-1", "", ""]]);
    }

    #[test]
    fn test_quoted_printable_soft_break_in_structured_name() {
        let vcf = "BEGIN:VCARD\nVERSION:2.1\n\
                   N;CHARSET=UTF-8;ENCODING=QUOTED-PRINTABLE:=D7=9B=D7=94=D7=9F;=D7=93=\n\
                   =D7=A0=D7=94;;;\n\
                   TEL:050-1\nEND:VCARD\n";
        let source = parse(vcf.as_bytes()).unwrap();
        assert_eq!(data_rows(&source), vec![vec!["", "דנה כהן", "050-1", "", ""]]);
    }

    #[test]
    fn test_quoted_printable_bare_param_and_charset() {
        let vcf = "BEGIN:VCARD\nFN;CHARSET=windows-1255;QUOTED-PRINTABLE:=E3=F0=E4\nEND:VCARD\n";
        let source = parse(vcf.as_bytes()).unwrap();
        assert_eq!(source.raw.rows()[1][0], "דנה");
    }

    #[test]
    fn test_plain_value_ending_in_equals_is_not_joined() {
        let vcf = "BEGIN:VCARD\nFN:a=\nTEL:050-1\nEND:VCARD\n";
        let source = parse(vcf.as_bytes()).unwrap();
        assert_eq!(data_rows(&source), vec![vec!["a=", "", "050-1", "", ""]]);
    }

    #[test]
    fn test_decode_quoted_printable() {
        assert_eq!(decode_quoted_printable("a=3Db"), b"a=b");
        assert_eq!(decode_quoted_printable("=ZZ="), b"=ZZ=");
        assert_eq!(decode_quoted_printable("=d7=93"), vec![0xD7, 0x93]);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\,b\;c\nd\\e"), "a,b;c\nd\\e");
        assert_eq!(split_structured(r"Doe;John\;Jr;;"), vec!["Doe", "John;Jr", "", ""]);
    }
}
