//! Header normalizer: stacked header labels to one flat column name.
//!
//! ```text
//! ("fact", "Qliq", "data1")            ─▶  "fact__Qliq__2023_01_10"
//! ("id", "Unnamed: 0_level_1", ...)    ─▶  "id"
//! ```
//!
//! Levels are joined with a reserved separator, date tags are substituted on
//! the joined string, then the levels are split again and cut at the first
//! placeholder label.

use indexmap::IndexSet;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{HeaderError, HeaderResult};
use crate::models::{DateTags, RawHeader, HEADER_DEPTH};

/// Joins header levels before date substitution. Never occurs in real labels.
pub const COLUMN_SEPARATOR: &str = "---|---";

/// Joins the kept levels of a flattened name.
pub const FLAT_SEPARATOR: &str = "__";

/// Label a dataframe reader gives to a blank header cell.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Unnamed: \d+_level_\d+").expect("valid placeholder regex"));

/// Whether a header level is a placeholder for a blank cell.
pub fn is_placeholder(segment: &str) -> bool {
    PLACEHOLDER_RE.is_match(segment)
}

/// Placeholder label for a blank header cell at `column`, `level`.
pub fn placeholder(column: usize, level: usize) -> String {
    format!("Unnamed: {}_level_{}", column, level)
}

/// Replace every tag in `text` with its date token, in tag order.
fn substitute_dates(text: &str, dates: &DateTags) -> String {
    let mut out = text.to_string();
    for (tag, token) in dates.iter() {
        if !tag.is_empty() {
            out = out.replace(tag, token);
        }
    }
    out
}

/// Flatten a single header.
///
/// Stacked headers must have exactly [`HEADER_DEPTH`] levels; `column` only
/// feeds the error message.
pub fn flatten_header(header: &RawHeader, column: usize, dates: &DateTags) -> HeaderResult<String> {
    let levels = match header {
        RawHeader::Single(name) => return Ok(substitute_dates(name, dates)),
        RawHeader::Levels(levels) => levels,
    };

    if levels.len() != HEADER_DEPTH {
        return Err(HeaderError::Malformed {
            column,
            depth: levels.len(),
            expected: HEADER_DEPTH,
        });
    }

    let joined = substitute_dates(&levels.join(COLUMN_SEPARATOR), dates);

    let kept: Vec<&str> = joined
        .split(COLUMN_SEPARATOR)
        .take_while(|segment| !is_placeholder(segment))
        .collect();

    Ok(kept.join(FLAT_SEPARATOR))
}

/// Flatten every header, preserving order.
pub fn normalize(headers: &[RawHeader], dates: &DateTags) -> HeaderResult<Vec<String>> {
    headers
        .iter()
        .enumerate()
        .map(|(column, header)| {
            let name = flatten_header(header, column, dates)?;
            debug!("column {}: {} -> '{}'", column, header, name);
            Ok(name)
        })
        .collect()
}

/// Check that flattened names can safely become record keys.
///
/// Two empty names are reported as a malformed header, any other repeat as
/// a collision. Indices in the error are 0-based column positions.
pub fn ensure_unique(names: &[String]) -> HeaderResult<()> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(names.len());

    for (column, name) in names.iter().enumerate() {
        if let Some(&first) = seen.get(name.as_str()) {
            return Err(if name.is_empty() {
                HeaderError::EmptyName {
                    first,
                    second: column,
                }
            } else {
                HeaderError::Collision {
                    name: name.clone(),
                    first,
                    second: column,
                }
            });
        }
        seen.insert(name, column);
    }

    Ok(())
}

/// Reject columns whose flattened name is in `reserved`.
///
/// Totals are written under their own keys; a source column with the same
/// name would be summed into instead of kept.
pub fn ensure_not_reserved(names: &[String], reserved: &IndexSet<String>) -> HeaderResult<()> {
    match names.iter().position(|name| reserved.contains(name)) {
        Some(column) => Err(HeaderError::ReservedName {
            name: names[column].clone(),
            column,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(pairs: &[(&str, &str)]) -> DateTags {
        pairs.iter().copied().collect()
    }

    fn flatten(levels: [&str; 3], tags: &DateTags) -> String {
        flatten_header(&RawHeader::levels(levels), 0, tags).unwrap()
    }

    #[test]
    fn test_placeholder_truncation() {
        let name = flatten(
            ["Qliq", "Unnamed: 1_level_1", "Unnamed: 2_level_2"],
            &DateTags::new(),
        );
        assert_eq!(name, "Qliq");
    }

    #[test]
    fn test_date_substitution() {
        let name = flatten(
            ["Qliq", "data1", "Unnamed: 2_level_2"],
            &dates(&[("data1", "2023_01_10")]),
        );
        assert_eq!(name, "Qliq__2023_01_10");
    }

    #[test]
    fn test_no_placeholder_keeps_all_levels() {
        let name = flatten(["Qliq", "2023_01_10", "extra"], &DateTags::new());
        assert_eq!(name, "Qliq__2023_01_10__extra");
    }

    #[test]
    fn test_placeholder_in_middle_drops_rest() {
        let name = flatten(["fact", "Unnamed: 3_level_1", "Qoil"], &DateTags::new());
        assert_eq!(name, "fact");
    }

    #[test]
    fn test_placeholder_at_top_gives_empty_name() {
        let name = flatten(
            ["Unnamed: 0_level_0", "Qliq", "data1"],
            &DateTags::new(),
        );
        assert_eq!(name, "");
    }

    #[test]
    fn test_flattening_is_deterministic() {
        let tags = dates(&[("data1", "2023_01_10"), ("data2", "2023_01_20")]);
        let headers = vec![
            RawHeader::levels(["fact", "Qliq", "data1"]),
            RawHeader::levels(["forecast", "Qoil", "data2"]),
        ];
        assert_eq!(
            normalize(&headers, &tags).unwrap(),
            normalize(&headers, &tags).unwrap()
        );
    }

    #[test]
    fn test_normalize_preserves_order() {
        let tags = dates(&[("data1", "2023_01_10")]);
        let headers = vec![
            RawHeader::levels(["id", "Unnamed: 0_level_1", "Unnamed: 0_level_2"]),
            RawHeader::levels(["fact", "Qliq", "data1"]),
            RawHeader::Single("note data1".into()),
        ];
        let names = normalize(&headers, &tags).unwrap();
        assert_eq!(names, vec!["id", "fact__Qliq__2023_01_10", "note 2023_01_10"]);
    }

    #[test]
    fn test_substitution_applies_across_separator() {
        // A tag spanning two levels still matches on the joined string.
        let tags = dates(&[("a---|---b", "X")]);
        let name = flatten(["a", "b", "c"], &tags);
        assert_eq!(name, "X__c");
    }

    #[test]
    fn test_wrong_depth_is_malformed() {
        let header = RawHeader::levels(["fact", "Qliq"]);
        let err = flatten_header(&header, 4, &DateTags::new()).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::Malformed { column: 4, depth: 2, expected: 3 }
        ));
    }

    #[test]
    fn test_ensure_unique_reports_collision() {
        let names = vec!["id".to_string(), "Qliq".to_string(), "Qliq".to_string()];
        let err = ensure_unique(&names).unwrap_err();
        match err {
            HeaderError::Collision { name, first, second } => {
                assert_eq!(name, "Qliq");
                assert_eq!((first, second), (1, 2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ensure_unique_reports_empty_names() {
        let names = vec![String::new(), "id".to_string(), String::new()];
        assert!(matches!(
            ensure_unique(&names),
            Err(HeaderError::EmptyName { first: 0, second: 2 })
        ));
    }

    #[test]
    fn test_ensure_not_reserved() {
        let reserved: IndexSet<String> = ["total__Qliq__2023_01_10".to_string()].into_iter().collect();
        let ok = vec!["id".to_string(), "fact__Qliq__2023_01_10".to_string()];
        assert!(ensure_not_reserved(&ok, &reserved).is_ok());

        let clash = vec!["id".to_string(), "total__Qliq__2023_01_10".to_string()];
        match ensure_not_reserved(&clash, &reserved).unwrap_err() {
            HeaderError::ReservedName { name, column } => {
                assert_eq!(name, "total__Qliq__2023_01_10");
                assert_eq!(column, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder("Unnamed: 12_level_2"));
        assert!(is_placeholder(&placeholder(3, 1)));
        assert!(!is_placeholder("Qliq"));
        assert!(!is_placeholder("x Unnamed: 1_level_1"));
    }
}
