//! High-level pipeline: load, flatten headers, build records, add totals.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetflat::{parse_file, DateTags, ParseOptions};
//! use std::path::Path;
//!
//! let mut dates = DateTags::new();
//! dates.insert("data1", "2023_01_10");
//!
//! let options = ParseOptions {
//!     targets: vec!["Qliq".into(), "Qoil".into()],
//!     dates,
//!     sheet: None,
//! };
//! let result = parse_file(Path::new("report.xlsx"), &options)?;
//! println!("{} records", result.records.len());
//! ```

use indexmap::IndexSet;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::aggregate::{total_keys, RowAggregator, SubstringAggregator};
use crate::error::{PipelineError, PipelineResult};
use crate::grid;
use crate::header::{ensure_not_reserved, ensure_unique, normalize};
use crate::models::{DateTags, Record, SourceGrid};

/// Per-call parse configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Attribute substrings to total (e.g. `Qliq`, `Qoil`).
    #[serde(default)]
    pub targets: Vec<String>,

    /// Date tags substituted into headers and used as total dates.
    #[serde(default)]
    pub dates: DateTags,

    /// Worksheet to read; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
}

/// Result of a parse.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// One record per data row, in source order, with totals added.
    pub records: Vec<Record>,

    /// Flattened column names, in source order.
    pub columns: Vec<String>,

    /// Total keys present in at least one record, first-seen order.
    pub totals: Vec<String>,
}

impl ParseResult {
    pub fn total_keys(&self) -> Vec<&str> {
        self.totals.iter().map(String::as_str).collect()
    }
}

/// Load `path` and parse it.
pub fn parse_file(path: &Path, options: &ParseOptions) -> PipelineResult<ParseResult> {
    let grid = grid::load(path, options.sheet.as_deref())?;
    parse(grid, &options.targets, &options.dates)
}

/// Parse an already loaded grid.
///
/// 1. Flatten the headers and reject name collisions, including columns
///    named like a total key
/// 2. Zip every data row with the flattened names
/// 3. Add totals to each record
pub fn parse(grid: SourceGrid, targets: &[String], dates: &DateTags) -> PipelineResult<ParseResult> {
    let columns = normalize(&grid.headers, dates)?;
    ensure_unique(&columns)?;
    let candidates = total_keys(targets, dates);
    ensure_not_reserved(&columns, &candidates)?;
    info!("Flattened {} columns", columns.len());

    let aggregator = SubstringAggregator::new(targets, dates);
    let mut records = Vec::with_capacity(grid.rows.len());

    for (row, cells) in grid.rows.into_iter().enumerate() {
        let record = to_record(&columns, cells, row)?;
        let record = aggregator
            .aggregate(&record)
            .map_err(|source| PipelineError::Aggregation { row, source })?;
        records.push(record);
    }

    debug!("Aggregated {} records", records.len());

    let totals: IndexSet<String> = records
        .iter()
        .flat_map(|record| record.keys())
        .filter(|key| candidates.contains(key.as_str()))
        .cloned()
        .collect();

    Ok(ParseResult {
        records,
        columns,
        totals: totals.into_iter().collect(),
    })
}

/// Build a record from one row; short rows are padded with nulls.
fn to_record(columns: &[String], cells: Vec<Value>, row: usize) -> PipelineResult<Record> {
    if cells.len() > columns.len() {
        return Err(PipelineError::RaggedRow {
            row,
            cells: cells.len(),
            columns: columns.len(),
        });
    }

    let mut cells = cells.into_iter();
    Ok(columns
        .iter()
        .map(|name| (name.clone(), cells.next().unwrap_or(Value::Null)))
        .collect())
}
