//! Local JSON output for runs outside the platform.
//!
//! Each record becomes one line of JSON in the file named by
//! `ANTITHESIS_SDK_LOCAL_OUTPUT`, wrapped in a
//! [`LocalLogRecord`](voidstar_protocol::LocalLogRecord) envelope.  Lines
//! are flushed and synced as they are written so a crashing process still
//! leaves every record it emitted on disk.

use crate::error::SinkError;
use crate::lock;
use crate::sink::Sink;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use voidstar_protocol::LocalLogRecord;

/// Appends records to a local file, one JSON object per line.
pub struct LocalSink {
    path: PathBuf,
    file: Mutex<File>,
    start: Instant,
    source_name: Mutex<String>,
}

impl LocalSink {
    /// Open (creating if needed) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(SinkError::EmptyOutputPath);
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            start: Instant::now(),
            source_name: Mutex::new(String::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Nanoseconds since this sink was opened, saturating.
    fn ticks(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn write_record(&self, tag: &str, value: &Value) -> Result<(), SinkError> {
        let record = LocalLogRecord::new(
            self.ticks(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            lock(&self.source_name).clone(),
            tag,
            value.clone(),
        );
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let io_err = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = lock(&self.file);
        file.write_all(&line).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.sync_data().map_err(io_err)?;
        Ok(())
    }
}

impl Sink for LocalSink {
    fn is_emit_disabled(&self) -> bool {
        false
    }

    fn emit_json(&self, tag: &str, value: &Value) {
        if let Err(e) = self.write_record(tag, value) {
            log::error!("voidstar-sdk: failed to write {tag} record: {e}");
        }
    }

    fn set_source_name(&self, name: &str) {
        *lock(&self.source_name) = name.to_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn writes_one_line_per_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sdk.jsonl");

        let sink = LocalSink::open(&path).unwrap();
        sink.emit_json("first", &json!({"a": 1}));
        sink.emit_json("second", &json!("complete"));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["first"], json!({"a": 1}));
        assert_eq!(lines[1]["second"], json!("complete"));
        assert!(lines[1].get("first").is_none());
    }

    #[test]
    fn envelope_fields_present() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sdk.jsonl");

        let sink = LocalSink::open(&path).unwrap();
        sink.emit_json("event", &json!({}));

        let line = &read_lines(&path)[0];
        assert_eq!(line["stream"], json!("sdk"));
        assert_eq!(line["source"], json!(""));
        assert!(line["ticks"].is_u64());
        let time = line["time"].as_str().unwrap();
        assert!(time.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
    }

    #[test]
    fn envelope_named_event_written_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sdk.jsonl");

        let sink = LocalSink::open(&path).unwrap();
        sink.set_source_name("node-3");
        sink.emit_json("source", &json!({"x": 1}));

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("\"source\"").count(), 1);
        assert_eq!(read_lines(&path)[0]["source"], json!({"x": 1}));
    }

    #[test]
    fn ticks_do_not_go_backwards() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sdk.jsonl");

        let sink = LocalSink::open(&path).unwrap();
        for i in 0..5 {
            sink.emit_json("tick", &json!(i));
        }

        let ticks: Vec<u64> = read_lines(&path)
            .iter()
            .map(|l| l["ticks"].as_u64().unwrap())
            .collect();
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn source_name_applies_to_later_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sdk.jsonl");

        let sink = LocalSink::open(&path).unwrap();
        sink.emit_json("before", &json!(null));
        sink.set_source_name("client-2");
        sink.emit_json("after", &json!(null));

        let lines = read_lines(&path);
        assert_eq!(lines[0]["source"], json!(""));
        assert_eq!(lines[1]["source"], json!("client-2"));
    }

    #[test]
    fn appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sdk.jsonl");
        fs::write(&path, "{\"earlier\":true}\n").unwrap();

        let sink = LocalSink::open(&path).unwrap();
        sink.emit_json("later", &json!(true));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["earlier"], json!(true));
    }

    #[test]
    fn open_rejects_empty_path() {
        assert!(matches!(LocalSink::open(""), Err(SinkError::EmptyOutputPath)));
    }

    #[test]
    fn open_reports_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no/such/dir/sdk.jsonl");
        assert!(matches!(LocalSink::open(&path), Err(SinkError::Io { .. })));
    }
}
