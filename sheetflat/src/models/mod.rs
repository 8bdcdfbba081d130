//! Domain models shared by the loader, the normalizer and the aggregator.
//!
//! - [`Record`] - one data row keyed by flattened column name
//! - [`DateTags`] - friendly tag to literal date token, in insertion order
//! - [`RawHeader`] - the per-level header labels of one column
//! - [`SourceGrid`] - headers plus data rows as loaded from a file

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Number of stacked header rows in a source file.
pub const HEADER_DEPTH: usize = 3;

/// One data row: flattened column name to scalar value, in column order.
pub type Record = Map<String, Value>;

// =============================================================================
// Date Tags
// =============================================================================

/// Mapping from a friendly tag (e.g. `data1`) to the date token embedded in
/// header text (e.g. `2023_01_10`).
///
/// Tags are unique. Iteration follows insertion order, which decides the
/// substitution order when one tag is a prefix of another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateTags {
    entries: IndexMap<String, String>,
}

impl DateTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag. An existing tag keeps its position and gets the new token.
    pub fn insert(&mut self, tag: impl Into<String>, token: impl Into<String>) {
        self.entries.insert(tag.into(), token.into());
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries.get(tag).map(String::as_str)
    }

    /// `(tag, token)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Date tokens in insertion order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` into `self`; tags from `other` win.
    pub fn extend(&mut self, other: DateTags) {
        self.entries.extend(other.entries);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DateTags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// =============================================================================
// Headers and Grid
// =============================================================================

/// Header labels of one source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawHeader {
    /// Stacked labels, top level first.
    Levels(Vec<String>),
    /// A plain single-row header.
    Single(String),
}

impl RawHeader {
    /// Build a stacked header from anything displayable.
    pub fn levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        RawHeader::Levels(levels.into_iter().map(|l| l.to_string()).collect())
    }
}

impl fmt::Display for RawHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawHeader::Levels(levels) => write!(f, "({})", levels.join(", ")),
            RawHeader::Single(s) => f.write_str(s),
        }
    }
}

/// A loaded source: one header per column, then the data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceGrid {
    pub headers: Vec<RawHeader>,
    pub rows: Vec<Vec<Value>>,
}

impl SourceGrid {
    pub fn new(headers: Vec<RawHeader>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
