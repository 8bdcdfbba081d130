//! Source loading: input file to a [`SourceGrid`] with stacked headers.
//!
//! Two loaders feed the same header builder:
//!
//! - [`spreadsheet`] - xlsx / xlsm / xlsb / xls / ods through calamine
//! - [`delimited`] - CSV-like text with encoding and delimiter detection
//!
//! The first [`HEADER_DEPTH`] rows of the file are header levels, the rest
//! are data rows.

pub mod delimited;
pub mod spreadsheet;

use log::{debug, info};
use serde_json::Value;
use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::header::placeholder;
use crate::models::{RawHeader, SourceGrid, HEADER_DEPTH};

/// Load a source file, picking the loader from the file extension.
///
/// `sheet` selects a worksheet by name; it is ignored for delimited text.
pub fn load(path: &Path, sheet: Option<&str>) -> SourceResult<SourceGrid> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    info!("Loading {} ({})", path.display(), extension);

    match extension.as_str() {
        "csv" | "tsv" | "txt" => delimited::load_delimited_file(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => spreadsheet::load_workbook(path, sheet),
        other => Err(SourceError::UnsupportedFormat(other.to_string())),
    }
}

/// Split raw rows into header levels and data rows and build the grid.
///
/// `header_cells` are stringified header labels ("" for blank), `data` the
/// converted data rows. Fully blank data rows are dropped.
pub(crate) fn assemble(
    header_cells: Vec<Vec<String>>,
    data: Vec<Vec<Value>>,
) -> SourceResult<SourceGrid> {
    if header_cells.len() < HEADER_DEPTH {
        return Err(SourceError::MissingHeaderRows {
            expected: HEADER_DEPTH,
            found: header_cells.len(),
        });
    }

    let width = header_cells
        .iter()
        .map(Vec::len)
        .chain(data.iter().map(Vec::len))
        .max()
        .unwrap_or(0);

    let headers = build_headers(header_cells, width);

    let total = data.len();
    let rows: Vec<Vec<Value>> = data
        .into_iter()
        .filter(|row| row.iter().any(|v| !v.is_null()))
        .collect();

    if rows.len() < total {
        debug!("Skipped {} blank data rows", total - rows.len());
    }
    info!("Loaded {} columns, {} data rows", headers.len(), rows.len());

    Ok(SourceGrid::new(headers, rows))
}

/// Turn stacked header rows into one [`RawHeader`] per column.
///
/// Blank cells are forward-filled from the left, level by level, the way
/// merged header cells read back. A fill stops at any column where an
/// upper level carried its own label. Cells still blank become
/// `Unnamed: {column}_level_{level}` placeholders.
pub fn build_headers(mut header_cells: Vec<Vec<String>>, width: usize) -> Vec<RawHeader> {
    for row in header_cells.iter_mut() {
        row.resize(width, String::new());
    }

    // true while no level above has labelled this column itself
    let mut control = vec![true; width];

    for row in header_cells.iter_mut() {
        if width == 0 {
            break;
        }
        let mut last = row[0].clone();
        for i in 1..width {
            if !control[i] {
                last = row[i].clone();
            }
            if row[i].is_empty() {
                row[i] = last.clone();
            } else {
                control[i] = false;
                last = row[i].clone();
            }
        }
    }

    (0..width)
        .map(|column| {
            RawHeader::Levels(
                header_cells
                    .iter()
                    .enumerate()
                    .map(|(level, row)| {
                        if row[column].is_empty() {
                            placeholder(column, level)
                        } else {
                            row[column].clone()
                        }
                    })
                    .collect(),
            )
        })
        .collect()
}

/// Text form of an integral or fractional number as a header label.
pub(crate) fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// JSON value for a float cell; integral floats become integers.
pub(crate) fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
