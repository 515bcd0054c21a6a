//! gb-results: persistence sinks for per-cycle readings.

pub mod csv;
pub mod jsonl;
pub mod memory;
pub mod sink;

pub use csv::{CsvOptions, CsvSink};
pub use jsonl::{JsonlSink, read_jsonl};
pub use memory::MemorySink;
pub use sink::{DiscardSink, ReadingSink, SinkSpec};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A reading's keys differ from the columns already written.
    #[error("Column mismatch: expected [{}], got [{}]", expected.join(", "), found.join(", "))]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}
