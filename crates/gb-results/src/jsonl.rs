//! JSON-lines log of readings.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use gb_core::Reading;
use serde::Serialize;

use crate::ResultsResult;
use crate::sink::{ReadingSink, open_append};

#[derive(Serialize)]
struct Line<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(flatten)]
    reading: &'a Reading,
}

#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    file: File,
    timestamp: bool,
}

impl JsonlSink {
    pub fn open(path: &Path, timestamp: bool) -> ResultsResult<Self> {
        let file = open_append(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            timestamp,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append_at(&mut self, reading: &Reading, at: DateTime<Local>) -> ResultsResult<()> {
        let line = Line {
            timestamp: self.timestamp.then(|| at.to_rfc3339()),
            reading,
        };
        let mut content = serde_json::to_string(&line)?;
        content.push('\n');
        self.file.write_all(content.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

impl ReadingSink for JsonlSink {
    fn append(&mut self, reading: &Reading) -> ResultsResult<()> {
        self.append_at(reading, Local::now())
    }
}

/// Reads back a JSON-lines log, one object per non-empty line.
pub fn read_jsonl(path: &Path) -> ResultsResult<Vec<serde_json::Value>> {
    let content = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for line in content.lines() {
        if !line.trim().is_empty() {
            records.push(serde_json::from_str(line)?);
        }
    }
    Ok(records)
}
