//! Run configuration.
//!
//! A run is configured from an optional JSON file and command-line flags:
//!
//! ```json
//! {
//!   "targets": ["Qliq", "Qoil"],
//!   "dates": { "data1": "2023_01_10", "data2": "2023_01_20" },
//!   "sheet": "Sheet1"
//! }
//! ```
//!
//! Dates in the file are literal header tokens. Dates on the command line
//! are calendar dates (`data1=2023-01-10`) rendered with a strftime format.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::models::DateTags;
use crate::pipeline::ParseOptions;

/// Token format of command-line dates, e.g. `2023_01_10`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y_%m_%d";

/// Default table for the SQLite sink.
pub const DEFAULT_TABLE: &str = "target_table";

/// Default SQLite database file.
pub const DEFAULT_DB: &str = "tz_db.db";

/// Contents of a JSON run file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub dates: DateTags,
    #[serde(default)]
    pub sheet: Option<String>,
}

impl RunConfig {
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Merge command-line values over the file.
    ///
    /// Targets are appended (without repeats), dates override by tag and the
    /// sheet given on the command line wins.
    pub fn merge(self, targets: Vec<String>, dates: DateTags, sheet: Option<String>) -> ParseOptions {
        let mut all_targets = self.targets;
        for target in targets {
            if !all_targets.contains(&target) {
                all_targets.push(target);
            }
        }

        let mut all_dates = self.dates;
        all_dates.extend(dates);

        ParseOptions {
            targets: all_targets,
            dates: all_dates,
            sheet: sheet.or(self.sheet),
        }
    }
}

/// Parse a `tag=YYYY-MM-DD` argument into `(tag, token)`.
pub fn parse_date_tag(arg: &str, format: &str) -> ConfigResult<(String, String)> {
    let (tag, value) = arg
        .split_once('=')
        .map(|(t, v)| (t.trim(), v.trim()))
        .filter(|(t, v)| !t.is_empty() && !v.is_empty())
        .ok_or_else(|| ConfigError::InvalidDateTag(arg.to_string()))?;

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| ConfigError::InvalidDate {
        tag: tag.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })?;

    Ok((tag.to_string(), date.format(format).to_string()))
}

/// Parse several `tag=date` arguments, keeping their order.
pub fn parse_date_tags(args: &[String], format: &str) -> ConfigResult<DateTags> {
    let mut tags = DateTags::new();
    for arg in args {
        let (tag, token) = parse_date_tag(arg, format)?;
        tags.insert(tag, token);
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_tag_default_format() {
        let (tag, token) = parse_date_tag("data1=2023-01-10", DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(tag, "data1");
        assert_eq!(token, "2023_01_10");
    }

    #[test]
    fn test_parse_date_tag_custom_format() {
        let (_, token) = parse_date_tag("d = 2023-01-20", "%d.%m.%Y").unwrap();
        assert_eq!(token, "20.01.2023");
    }

    #[test]
    fn test_parse_date_tag_errors() {
        assert!(matches!(
            parse_date_tag("data1", DEFAULT_DATE_FORMAT),
            Err(ConfigError::InvalidDateTag(_))
        ));
        assert!(matches!(
            parse_date_tag("=2023-01-10", DEFAULT_DATE_FORMAT),
            Err(ConfigError::InvalidDateTag(_))
        ));
        assert!(matches!(
            parse_date_tag("data1=2023-13-40", DEFAULT_DATE_FORMAT),
            Err(ConfigError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_run_config_from_json() {
        let config = RunConfig::from_json(
            r#"{"targets":["Qliq","Qoil"],"dates":{"data1":"2023_01_10"}}"#,
        )
        .unwrap();
        assert_eq!(config.targets, vec!["Qliq", "Qoil"]);
        assert_eq!(config.dates.get("data1"), Some("2023_01_10"));
        assert!(RunConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_merge_prefers_command_line() {
        let config = RunConfig {
            targets: vec!["Qliq".into()],
            dates: [("data1", "2023_01_10")].into_iter().collect(),
            sheet: Some("a".into()),
        };
        let cli_dates = parse_date_tags(
            &["data1=2023-02-01".to_string(), "data2=2023-01-20".to_string()],
            DEFAULT_DATE_FORMAT,
        )
        .unwrap();

        let options = config.merge(vec!["Qliq".into(), "Qoil".into()], cli_dates, None);

        assert_eq!(options.targets, vec!["Qliq", "Qoil"]);
        assert_eq!(options.dates.get("data1"), Some("2023_02_01"));
        assert_eq!(options.dates.get("data2"), Some("2023_01_20"));
        assert_eq!(options.sheet.as_deref(), Some("a"));
    }
}
