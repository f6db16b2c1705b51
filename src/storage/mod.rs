//! Storage abstractions for record persistence.
//!
//! The collected records are flushed once, at the end of a run, through a
//! [`RecordSink`]. Local file backends live in [`local`].

pub mod local;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::models::{OutputConfig, OutputFormat, Record};

// Re-export for convenience
pub use local::{CsvSink, JsonSink};

/// Metadata about a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Where the records ended up
    pub destination: String,
    /// Number of data rows written (header excluded)
    pub rows: usize,
}

/// Trait for tabular record sinks.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Human-readable destination, used in reports and errors.
    fn destination(&self) -> String;

    /// Write one header of `columns` followed by one row per record.
    ///
    /// Either the whole output is written or the destination is left
    /// untouched.
    async fn write(
        &self,
        records: &[Record],
        columns: &[String],
    ) -> std::result::Result<WriteSummary, SinkError>;
}

/// Build the sink described by the output settings.
pub fn open_sink(output: &OutputConfig) -> Box<dyn RecordSink> {
    match output.format {
        OutputFormat::Csv => Box::new(CsvSink::new(&output.path)),
        OutputFormat::Json => Box::new(JsonSink::new(&output.path)),
    }
}
