//! SQLite table sink.
//!
//! The table is dropped and recreated from the first record's keys, then
//! every record is inserted in one transaction. All records must share the
//! first record's key set.

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{SinkError, SinkResult};
use crate::models::Record;

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid table name regex"));

/// Quote an identifier for SQLite.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check every record against the first record's keys.
///
/// Returns the column list on success.
pub fn check_schema(records: &[Record]) -> SinkResult<Vec<&str>> {
    let first = records.first().ok_or(SinkError::EmptyInput)?;
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    let expected: HashSet<&str> = columns.iter().copied().collect();

    for (row, record) in records.iter().enumerate().skip(1) {
        if let Some(missing) = columns.iter().find(|c| !record.contains_key(**c)) {
            return Err(SinkError::SchemaMismatch {
                row,
                key: missing.to_string(),
                reason: "is missing".to_string(),
            });
        }
        if let Some(extra) = record.keys().find(|k| !expected.contains(k.as_str())) {
            return Err(SinkError::SchemaMismatch {
                row,
                key: extra.clone(),
                reason: "is not in the table schema".to_string(),
            });
        }
    }

    Ok(columns)
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Recreate `table` in the database at `db_path` and insert `records`.
///
/// Returns the number of inserted rows.
pub fn write_table(records: &[Record], db_path: &Path, table: &str) -> SinkResult<usize> {
    if !TABLE_NAME_RE.is_match(table) {
        return Err(SinkError::InvalidTableName(table.to_string()));
    }
    let columns = check_schema(records)?;

    let mut conn = Connection::open(db_path)?;
    let tx = conn.transaction()?;

    let table_ident = quote_ident(table);
    let column_list: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} ({columns});",
        table = table_ident,
        columns = column_list.join(", "),
    ))?;
    debug!("Created table {} with {} columns", table, columns.len());

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            table_ident,
            placeholders.join(", ")
        ))?;
        for record in records {
            stmt.execute(params_from_iter(columns.iter().map(|c| sql_value(&record[*c]))))?;
        }
    }

    tx.commit()?;
    info!("Inserted {} rows into {}", records.len(), table);

    Ok(records.len())
}
