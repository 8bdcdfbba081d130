//! # sheetflat - stacked spreadsheet headers to flat records
//!
//! sheetflat reads a sheet whose header spans three rows, flattens every
//! column to one name, and adds per-row totals for chosen metrics on
//! chosen dates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ xlsx / csv  │────▶│    Grid     │────▶│   Header    │────▶│  Aggregate  │──▶ sinks
//! │ (3 headers) │     │  (loader)   │     │ (flatten)   │     │  (totals)   │   xlsx/sqlite/json
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetflat::{parse_file, write_table, write_xlsx, DateTags, ParseOptions};
//! use std::path::Path;
//!
//! let options = ParseOptions {
//!     targets: vec!["Qliq".into(), "Qoil".into()],
//!     dates: [("data1", "2023_01_10"), ("data2", "2023_01_20")].into_iter().collect(),
//!     sheet: None,
//! };
//! let result = parse_file(Path::new("report.xlsx"), &options)?;
//! write_xlsx(&result.records, Path::new("target_table.xlsx"))?;
//! write_table(&result.records, Path::new("tz_db.db"), "target_table")?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`models`] - Records, date tags, headers, grids
//! - [`header`] - Header flattening and collision checks
//! - [`aggregate`] - Per-row totals
//! - [`grid`] - Workbook and delimited-text loading
//! - [`pipeline`] - Parse orchestration
//! - [`sink`] - xlsx, SQLite and JSON output
//! - [`config`] - Run files and date arguments

// Core modules
pub mod error;
pub mod models;

// Transform
pub mod aggregate;
pub mod header;
pub mod pipeline;

// I/O
pub mod grid;
pub mod sink;

// Configuration
pub mod config;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregationError, ConfigError, HeaderError, PipelineError, PipelineResult, SinkError,
    SourceError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{DateTags, RawHeader, Record, SourceGrid, HEADER_DEPTH};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use aggregate::{aggregate, total_key, total_keys, RowAggregator, SubstringAggregator};
pub use header::{ensure_not_reserved, ensure_unique, flatten_header, normalize};
pub use pipeline::{parse, parse_file, ParseOptions, ParseResult};

// =============================================================================
// Re-exports - I/O
// =============================================================================

pub use grid::load;
pub use sink::json::write_json;
pub use sink::sqlite::write_table;
pub use sink::xlsx::write_xlsx;

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{parse_date_tags, RunConfig};
