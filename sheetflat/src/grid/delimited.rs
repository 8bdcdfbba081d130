//! Delimited text loader with encoding and delimiter auto-detection.
//!
//! Reads the same three-row header layout as the workbook loader from a
//! CSV/TSV export of the sheet.

use log::debug;
use serde_json::Value;
use std::path::Path;

use super::{assemble, number_value};
use crate::error::{SourceError, SourceResult};
use crate::models::{SourceGrid, HEADER_DEPTH};

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "windows-1251" | "cp1251" => "windows-1251".to_string(),
        "koi8-r" => "koi8-r".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> SourceResult<String> {
    let decoder = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| SourceError::Encoding(format!("{}: {}", encoding, e)))?;
            return Ok(text.trim_start_matches('\u{feff}').to_string());
        }
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15,
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252,
        "windows-1251" | "cp1251" => encoding_rs::WINDOWS_1251,
        "koi8-r" => encoding_rs::KOI8_R,
        other => encoding_rs::Encoding::for_label(other.as_bytes())
            .ok_or_else(|| SourceError::Encoding(format!("unknown encoding '{}'", other)))?,
    };

    let (text, _, had_errors) = decoder.decode(bytes);
    if had_errors {
        return Err(SourceError::Encoding(format!(
            "invalid {} byte sequence",
            decoder.name()
        )));
    }
    Ok(text.into_owned())
}

/// Candidate separators, in tie-break order.
const SEPARATORS: [char; 4] = [';', ',', '\t', '|'];

/// Pick the separator occurring most often across the stacked header lines.
///
/// Counting the whole header block keeps a stray comma in a top-level label
/// from outvoting the sparse separator-only lines below it.
pub fn detect_delimiter(content: &str) -> char {
    let header: Vec<&str> = content.lines().take(HEADER_DEPTH).collect();

    SEPARATORS
        .iter()
        .map(|&sep| {
            let count: usize = header.iter().map(|line| line.matches(sep).count()).sum();
            (sep, count)
        })
        .fold((SEPARATORS[0], 0), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        })
        .0
}

/// Load a delimited file from disk.
pub fn load_delimited_file(path: &Path) -> SourceResult<SourceGrid> {
    let bytes = std::fs::read(path)?;
    load_delimited_bytes(&bytes)
}

/// Load delimited bytes with auto-detection of encoding and delimiter.
pub fn load_delimited_bytes(bytes: &[u8]) -> SourceResult<SourceGrid> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    debug!("Detected encoding {}, delimiter {:?}", encoding, delimiter);

    load_delimited_str(&content, delimiter)
}

/// Load delimited text with an explicit delimiter.
pub fn load_delimited_str(content: &str, delimiter: char) -> SourceResult<SourceGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut header_cells = Vec::with_capacity(HEADER_DEPTH);
    let mut data = Vec::new();

    for result in reader.records() {
        let record = result?;
        if header_cells.len() < HEADER_DEPTH {
            header_cells.push(record.iter().map(|s| s.trim().to_string()).collect());
        } else {
            data.push(record.iter().map(parse_cell).collect());
        }
    }

    assemble(header_cells, data)
}

/// Typed value of a text cell: empty, integer, float, boolean or text.
fn parse_cell(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return number_value(f);
        }
    }
    match s {
        "True" | "TRUE" | "true" => Value::Bool(true),
        "False" | "FALSE" | "false" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawHeader;
    use serde_json::json;

    const SAMPLE: &str = "\
id;company;fact;;;
;;Qliq;;Qoil;
;;data1;data2;data1;data2
1;company1;10;15;20.5;25
;;;;;
2;company2;11;;21;26
";

    #[test]
    fn test_load_delimited_headers() {
        let grid = load_delimited_str(SAMPLE, ';').unwrap();

        assert_eq!(grid.column_count(), 6);
        assert_eq!(
            grid.headers[1],
            RawHeader::levels(["company", "Unnamed: 1_level_1", "Unnamed: 1_level_2"])
        );
        assert_eq!(grid.headers[4], RawHeader::levels(["fact", "Qoil", "data1"]));
    }

    #[test]
    fn test_load_delimited_rows() {
        let grid = load_delimited_str(SAMPLE, ';').unwrap();

        assert_eq!(grid.row_count(), 2);
        assert_eq!(
            grid.rows[0],
            vec![json!(1), json!("company1"), json!(10), json!(15), json!(20.5), json!(25)]
        );
        assert_eq!(grid.rows[1][3], Value::Null);
    }

    #[test]
    fn test_missing_header_rows() {
        let err = load_delimited_str("a;b\n;c\n", ';').unwrap_err();
        assert!(matches!(err, SourceError::MissingHeaderRows { found: 2, .. }));
    }

    #[test]
    fn test_auto_detection() {
        let text = SAMPLE.replace(';', ",");
        let grid = load_delimited_bytes(text.as_bytes()).unwrap();
        assert_eq!(grid.row_count(), 2);
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell(" 42 "), json!(42));
        assert_eq!(parse_cell("2.0"), json!(2));
        assert_eq!(parse_cell("0.25"), json!(0.25));
        assert_eq!(parse_cell("TRUE"), json!(true));
        assert_eq!(parse_cell("n/a"), json!("n/a"));
        assert_eq!(parse_cell(""), Value::Null);
    }

    #[test]
    fn test_detect_delimiter_counts_all_header_lines() {
        let content = "Well, North, East;fact\n;Qliq\n;data1\n1;2\n";
        assert_eq!(detect_delimiter(content), ';');
    }

    #[test]
    fn test_detect_delimiter_defaults_to_semicolon() {
        assert_eq!(detect_delimiter("single"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_cp1251_decoding() {
        // "Дата" in windows-1251
        let bytes: &[u8] = &[0xC4, 0xE0, 0xF2, 0xE0];
        assert_eq!(decode_content(bytes, "windows-1251").unwrap(), "Дата");
    }
}
