//! CSV log of readings.
//!
//! The header comes from the first reading's keys and is written only when
//! the file is empty, so restarting the loop keeps appending to the same log.
//! Reopening a log whose header names other columns fails on the first
//! append instead of adding rows under the stale header.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use gb_core::Reading;

use crate::sink::{ReadingSink, open_append};
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub header: bool,
    /// Leading `timestamp` column, RFC 3339 local time.
    pub timestamp: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            header: true,
            timestamp: false,
        }
    }
}

#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    file: File,
    options: CsvOptions,
    columns: Option<Vec<String>>,
    needs_header: bool,
    /// Header row already in the file, checked against the first reading.
    existing_header: Option<Vec<String>>,
}

/// Quotes a cell only when it contains a delimiter, quote or line break.
pub fn escape(cell: &str) -> std::borrow::Cow<'_, str> {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\"")).into()
    } else {
        cell.into()
    }
}

/// Splits one CSV line into cells, undoing [`escape`].
pub fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

fn first_line(path: &Path) -> ResultsResult<Option<String>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(reader.lines().next().transpose()?)
}

fn row<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    let mut line = cells
        .into_iter()
        .map(escape)
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

impl CsvSink {
    pub fn open(path: &Path, options: CsvOptions) -> ResultsResult<Self> {
        let file = open_append(path)?;
        let empty = file.metadata()?.len() == 0;
        let existing_header = if options.header && !empty {
            first_line(path)?.map(|line| split_row(&line))
        } else {
            None
        };
        tracing::debug!(path = %path.display(), empty, "csv log opened");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            options,
            columns: None,
            needs_header: options.header && empty,
            existing_header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row stamped with `at`.
    pub fn append_at(&mut self, reading: &Reading, at: DateTime<Local>) -> ResultsResult<()> {
        let keys: Vec<String> = reading.keys().map(str::to_string).collect();
        if let Some(expected) = &self.columns {
            if *expected != keys {
                return Err(ResultsError::ColumnMismatch {
                    expected: expected.clone(),
                    found: keys,
                });
            }
        } else {
            if let Some(existing) = self.existing_header.take() {
                let header = self.header_cells(&keys);
                if existing != header {
                    tracing::warn!(path = %self.path.display(), "csv header does not match reading");
                    return Err(ResultsError::ColumnMismatch {
                        expected: existing,
                        found: header,
                    });
                }
            }
            self.columns = Some(keys);
        }

        let mut out = String::new();
        if self.needs_header {
            let header = self.header_cells(self.columns.as_deref().unwrap_or_default());
            out.push_str(&row(header.iter().map(String::as_str)));
            self.needs_header = false;
        }

        let values: Vec<String> = reading.values().map(ToString::to_string).collect();
        let cells = values.iter().map(String::as_str);
        let stamp = at.to_rfc3339();
        out.push_str(&if self.options.timestamp {
            row(std::iter::once(stamp.as_str()).chain(cells))
        } else {
            row(cells)
        });

        self.file.write_all(out.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

impl CsvSink {
    fn header_cells(&self, keys: &[String]) -> Vec<String> {
        let stamp = self.options.timestamp.then(|| "timestamp".to_string());
        stamp.into_iter().chain(keys.iter().cloned()).collect()
    }
}

impl ReadingSink for CsvSink {
    fn append(&mut self, reading: &Reading) -> ResultsResult<()> {
        self.append_at(reading, Local::now())
    }
}
