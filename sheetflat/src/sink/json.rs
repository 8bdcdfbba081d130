//! JSON sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::SinkResult;
use crate::models::Record;

/// Write records as a pretty JSON array to `path`, or to stdout.
pub fn write_json(records: &[Record], path: Option<&Path>) -> SinkResult<()> {
    match path {
        Some(p) => {
            let mut writer = BufWriter::new(File::create(p)?);
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_write_json_file_keeps_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let records = vec![json!({ "id": 1, "total__Qliq__2023_01_10": 5 })
            .as_object()
            .cloned()
            .unwrap()];

        write_json(&records, Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.find("\"id\"").unwrap() < content.find("total__").unwrap());
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["total__Qliq__2023_01_10"], json!(5));
    }
}
