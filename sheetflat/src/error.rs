//! Error types for the sheetflat pipeline.
//!
//! One error enum per layer:
//!
//! - [`SourceError`] - reading the input file into a grid
//! - [`HeaderError`] - flattening and renaming header columns
//! - [`AggregationError`] - summing matched columns into totals
//! - [`SinkError`] - writing records to xlsx / SQLite / JSON
//! - [`ConfigError`] - run configuration and date tags
//! - [`PipelineError`] - top-level orchestration
//!
//! Conversion upward is automatic via `From`, so `?` works across layers.

use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while loading the source file into a grid.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The spreadsheet reader rejected the workbook.
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    /// The delimited-text reader rejected a record.
    #[error("Invalid delimited file: {0}")]
    Delimited(#[from] csv::Error),

    /// Failed to decode the file contents.
    #[error("Failed to decode file: {0}")]
    Encoding(String),

    /// The file extension is not one we can load.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// The requested sheet does not exist.
    #[error("Sheet '{name}' not found (available: {available})")]
    SheetNotFound { name: String, available: String },

    /// The workbook contains no sheets.
    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    /// Fewer rows than the stacked header needs.
    #[error("Expected {expected} header rows, found {found}")]
    MissingHeaderRows { expected: usize, found: usize },
}

// =============================================================================
// Header Errors
// =============================================================================

/// Errors while flattening or renaming header columns.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// A multi-level header does not have the expected depth.
    #[error("Column {column}: header has {depth} levels, expected {expected}")]
    Malformed {
        column: usize,
        depth: usize,
        expected: usize,
    },

    /// Two columns flattened to an empty name.
    #[error("Columns {first} and {second} both flatten to an empty name")]
    EmptyName { first: usize, second: usize },

    /// Two columns flattened to the same name.
    #[error("Columns {first} and {second} both flatten to '{name}'")]
    Collision {
        name: String,
        first: usize,
        second: usize,
    },

    /// A column flattens to the key of a derived total.
    #[error("Column {column} flattens to '{name}', which is a total key")]
    ReservedName { name: String, column: usize },
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Errors while computing per-row totals.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// A matched column holds a value that cannot be summed.
    #[error("Column '{column}' holds non-numeric value {value}")]
    NonNumeric { column: String, value: String },
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors while persisting records.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A record's keys differ from the first record's keys.
    #[error("Record {row}: key '{key}' {reason}")]
    SchemaMismatch {
        row: usize,
        key: String,
        reason: String,
    },

    /// Nothing to write.
    #[error("No records to write")]
    EmptyInput,

    /// Table name is not a plain identifier.
    #[error("Invalid table name: '{0}'")]
    InvalidTableName(String),

    /// Column index does not fit a spreadsheet column number.
    #[error("Column index {0} is out of spreadsheet range")]
    ColumnOutOfRange(usize),

    /// xlsx writer error.
    #[error("Spreadsheet write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors in run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for a run.
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// A `tag=date` argument without `=` or with an empty side.
    #[error("Invalid date tag '{0}', expected tag=YYYY-MM-DD")]
    InvalidDateTag(String),

    /// The date part does not parse.
    #[error("Invalid date '{value}' for tag '{tag}': {message}")]
    InvalidDate {
        tag: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::pipeline::parse`] and friends.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading the source failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Header flattening or renaming failed.
    #[error("Header error: {0}")]
    Header(#[from] HeaderError),

    /// Aggregation failed on a data row.
    #[error("Row {row}: {source}")]
    Aggregation {
        row: usize,
        #[source]
        source: AggregationError,
    },

    /// A data row has more cells than there are columns.
    #[error("Row {row}: {cells} cells but only {columns} columns")]
    RaggedRow {
        row: usize,
        cells: usize,
        columns: usize,
    },

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Sink error.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source loading.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for header operations.
pub type HeaderResult<T> = Result<T, HeaderError>;

/// Result type for aggregation.
pub type AggregationResult<T> = Result<T, AggregationError>;

/// Result type for sinks.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let source_err = SourceError::EmptyWorkbook;
        let pipeline_err: PipelineError = source_err.into();
        assert!(pipeline_err.to_string().contains("no sheets"));

        let header_err = HeaderError::Collision {
            name: "Qliq".into(),
            first: 2,
            second: 5,
        };
        let pipeline_err: PipelineError = header_err.into();
        assert!(pipeline_err.to_string().contains("'Qliq'"));
    }

    #[test]
    fn test_aggregation_error_names_row_and_column() {
        let err = PipelineError::Aggregation {
            row: 7,
            source: AggregationError::NonNumeric {
                column: "fact__Qliq__2023_01_10".into(),
                value: "\"n/a\"".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 7"));
        assert!(msg.contains("fact__Qliq__2023_01_10"));
    }

    #[test]
    fn test_schema_mismatch_format() {
        let err = SinkError::SchemaMismatch {
            row: 3,
            key: "total__Qoil__2023_01_20".into(),
            reason: "is missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "Record 3: key 'total__Qoil__2023_01_20' is missing"
        );
    }
}
