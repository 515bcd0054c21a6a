//! Sink trait and configuration.

use std::path::PathBuf;

use gb_core::Reading;

use crate::csv::{CsvOptions, CsvSink};
use crate::jsonl::JsonlSink;
use crate::memory::MemorySink;
use crate::ResultsResult;

/// Destination for one row per successful cycle. Every append is flushed.
pub trait ReadingSink {
    fn append(&mut self, reading: &Reading) -> ResultsResult<()>;
}

/// Where a loop writes its readings. Opened when the loop starts running.
#[derive(Debug, Clone)]
pub enum SinkSpec {
    Csv { path: PathBuf, options: CsvOptions },
    Jsonl { path: PathBuf, timestamp: bool },
    Memory(MemorySink),
    Discard,
}

impl SinkSpec {
    pub fn open(&self) -> ResultsResult<Box<dyn ReadingSink>> {
        Ok(match self {
            Self::Csv { path, options } => Box::new(CsvSink::open(path, *options)?),
            Self::Jsonl { path, timestamp } => Box::new(JsonlSink::open(path, *timestamp)?),
            Self::Memory(sink) => Box::new(sink.clone()),
            Self::Discard => Box::new(DiscardSink),
        })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Csv { path, .. } => format!("csv:{}", path.display()),
            Self::Jsonl { path, .. } => format!("jsonl:{}", path.display()),
            Self::Memory(_) => "memory".to_string(),
            Self::Discard => "discard".to_string(),
        }
    }
}

/// Drops every reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl ReadingSink for DiscardSink {
    fn append(&mut self, _reading: &Reading) -> ResultsResult<()> {
        Ok(())
    }
}

pub(crate) fn open_append(path: &std::path::Path) -> ResultsResult<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    Ok(file)
}
