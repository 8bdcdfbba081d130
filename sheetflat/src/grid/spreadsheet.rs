//! Workbook loader (xlsx, xlsm, xlsb, xls, ods) built on calamine.

use calamine::{open_workbook_auto, Data, Reader};
use log::debug;
use serde_json::Value;
use std::path::Path;

use super::{assemble, format_number, number_value};
use crate::error::{SourceError, SourceResult};
use crate::models::{SourceGrid, HEADER_DEPTH};

/// Load one worksheet: `sheet` by name, or the first sheet.
pub fn load_workbook(path: &Path, sheet: Option<&str>) -> SourceResult<SourceGrid> {
    let mut workbook = open_workbook_auto(path)?;

    let names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => names
            .iter()
            .find(|n| n.as_str() == name)
            .cloned()
            .ok_or_else(|| SourceError::SheetNotFound {
                name: name.to_string(),
                available: names.join(", "),
            })?,
        None => names.first().cloned().ok_or(SourceError::EmptyWorkbook)?,
    };

    debug!("Reading sheet '{}'", sheet_name);
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header_cells: Vec<Vec<String>> = rows
        .by_ref()
        .take(HEADER_DEPTH)
        .map(|row| row.iter().map(header_text).collect())
        .collect();
    let data: Vec<Vec<Value>> = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    assemble(header_cells, data)
}

/// Header label of a cell; "" for blank.
fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

/// Record value of a data cell.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => number_value(*f),
        Data::Int(i) => Value::from(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => number_value(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}
