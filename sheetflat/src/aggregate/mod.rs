//! Row aggregator: per-record totals for (attribute, date) pairs.
//!
//! A column contributes to `total__{attr}__{date}` when its flattened name
//! contains both `attr` and `date` as substrings. Matches are not exclusive:
//! a column matching two attributes or two dates feeds every matching total.
//!
//! The matching rule lives behind [`RowAggregator`] so callers do not depend
//! on substring matching.

use indexmap::IndexSet;
use serde_json::{Number, Value};

use crate::error::{AggregationError, AggregationResult};
use crate::models::{DateTags, Record};

/// Prefix of every derived total key.
pub const TOTAL_PREFIX: &str = "total";

/// Key holding the total of `attr` on `date`.
pub fn total_key(attr: &str, date: &str) -> String {
    format!("{}__{}__{}", TOTAL_PREFIX, attr, date)
}

/// Every total key `targets` and `dates` can produce, target-major order.
pub fn total_keys(targets: &[String], dates: &DateTags) -> IndexSet<String> {
    targets
        .iter()
        .flat_map(|attr| dates.tokens().map(move |date| total_key(attr, date)))
        .collect()
}

/// Derives total keys for one record.
pub trait RowAggregator {
    /// Return a copy of `record` with total keys added. `record` is untouched.
    fn aggregate(&self, record: &Record) -> AggregationResult<Record>;
}

/// Matches columns by substring containment of attribute and date token.
#[derive(Debug, Clone, Copy)]
pub struct SubstringAggregator<'a> {
    targets: &'a [String],
    dates: &'a DateTags,
}

impl<'a> SubstringAggregator<'a> {
    pub fn new(targets: &'a [String], dates: &'a DateTags) -> Self {
        Self { targets, dates }
    }
}

impl RowAggregator for SubstringAggregator<'_> {
    fn aggregate(&self, record: &Record) -> AggregationResult<Record> {
        let mut output = record.clone();

        for (column, value) in record {
            for attr in self.targets.iter().filter(|a| column.contains(a.as_str())) {
                for date in self.dates.tokens().filter(|d| column.contains(d)) {
                    let total = output
                        .entry(total_key(attr, date))
                        .or_insert_with(|| Value::from(0));
                    *total = add_values(total, value, column)?;
                }
            }
        }

        Ok(output)
    }
}

/// Aggregate one record with substring matching.
pub fn aggregate(record: &Record, targets: &[String], dates: &DateTags) -> AggregationResult<Record> {
    SubstringAggregator::new(targets, dates).aggregate(record)
}

/// Add a cell value to a running total.
///
/// Integers stay integers until one side is a float or the sum overflows.
/// `Null` (an empty cell) adds nothing; any other non-number fails.
fn add_values(total: &Value, value: &Value, column: &str) -> AggregationResult<Value> {
    let value = match value {
        Value::Null => return Ok(total.clone()),
        Value::Number(n) => n,
        other => {
            return Err(AggregationError::NonNumeric {
                column: column.to_string(),
                value: other.to_string(),
            })
        }
    };

    let total = match total {
        Value::Number(n) => n,
        other => {
            return Err(AggregationError::NonNumeric {
                column: column.to_string(),
                value: other.to_string(),
            })
        }
    };

    if let (Some(a), Some(b)) = (total.as_i64(), value.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(Value::from(sum));
        }
    }

    let sum = total.as_f64().unwrap_or(0.0) + value.as_f64().unwrap_or(0.0);
    Ok(Number::from_f64(sum).map(Value::Number).unwrap_or(Value::Null))
}
