//! Sinks that persist parsed records.
//!
//! - [`xlsx`] - spreadsheet with a styled header row
//! - [`sqlite`] - (re)created SQLite table, one row per record
//! - [`json`] - pretty JSON array to a file or stdout
//!
//! Every sink writes exactly the records it is given.

pub mod json;
pub mod sqlite;
pub mod xlsx;

use indexmap::IndexSet;

use crate::models::Record;

/// Union of record keys in first-seen order.
pub fn column_union(records: &[Record]) -> Vec<&str> {
    let columns: IndexSet<&str> = records
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect();
    columns.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_union_first_seen_order() {
        let records: Vec<Record> = vec![
            json!({ "b": 1, "a": 2 }).as_object().cloned().unwrap(),
            json!({ "a": 3, "c": 4 }).as_object().cloned().unwrap(),
        ];
        assert_eq!(column_union(&records), vec!["b", "a", "c"]);
    }
}
