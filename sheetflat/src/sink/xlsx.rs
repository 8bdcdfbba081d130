//! Spreadsheet sink built on rust_xlsxwriter.

use log::info;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use serde_json::Value;
use std::path::Path;

use super::column_union;
use crate::error::{SinkError, SinkResult};
use crate::models::Record;

/// Header row style: cyan bold text on black.
fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::Black)
        .set_font_color(Color::RGB(0x00FFFF))
}

/// Write records to an xlsx file, one row per record.
///
/// Columns are the union of record keys in first-seen order; a record
/// without a key leaves that cell blank.
pub fn write_xlsx(records: &[Record], path: &Path) -> SinkResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let columns = column_union(records);
    let format = header_format();

    let columns: Vec<(u16, &str)> = columns
        .into_iter()
        .enumerate()
        .map(|(col, name)| Ok((column_index(col)?, name)))
        .collect::<SinkResult<_>>()?;

    for &(col, name) in &columns {
        worksheet.write_string_with_format(0, col, name, &format)?;
    }

    for (row_idx, record) in records.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for &(col, name) in &columns {
            if let Some(value) = record.get(name) {
                write_value(worksheet, row, col, value)?;
            }
        }
    }

    workbook.save(path)?;
    info!("Wrote {} rows to {}", records.len(), path.display());

    Ok(())
}

fn column_index(col: usize) -> SinkResult<u16> {
    u16::try_from(col).map_err(|_| SinkError::ColumnOutOfRange(col))
}

fn write_value(ws: &mut Worksheet, row: u32, col: u16, value: &Value) -> SinkResult<()> {
    match value {
        Value::Null => { /* Leave cell empty */ }
        Value::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                ws.write_number(row, col, f)?;
            }
            None => {
                ws.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            ws.write_string(row, col, s)?;
        }
        other => {
            ws.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use serde_json::json;

    #[test]
    fn test_column_index_rejects_wide_sheets() {
        assert_eq!(column_index(3).unwrap(), 3);
        assert!(matches!(
            column_index(70_000),
            Err(SinkError::ColumnOutOfRange(70_000))
        ));
    }

    #[test]
    fn test_write_xlsx_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target_table.xlsx");
        let records: Vec<Record> = vec![
            json!({ "id": 1, "company": "company1", "total__Qliq__2023_01_10": 22 }),
            json!({ "id": 2, "company": null, "flag": true }),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();

        write_xlsx(&records, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let sheet = workbook.sheet_names()[0].clone();
        let range = workbook.worksheet_range(&sheet).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Data::String("id".into()));
        assert_eq!(rows[0][2], Data::String("total__Qliq__2023_01_10".into()));
        assert_eq!(rows[0][3], Data::String("flag".into()));
        assert_eq!(rows[1][2], Data::Float(22.0));
        assert_eq!(rows[2][1], Data::Empty);
        assert_eq!(rows[2][3], Data::Bool(true));
    }
}
