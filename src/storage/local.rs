//! Local filesystem sinks.
//!
//! Output is rendered fully in memory, written to `<path>.tmp` and renamed
//! over the destination, so a failed write never leaves a partial file
//! behind.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tokio::io::AsyncWriteExt;

use crate::error::SinkError;
use crate::models::Record;
use crate::storage::{RecordSink, WriteSummary};

/// CSV file sink: one header row, then one row per record.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    async fn write(
        &self,
        records: &[Record],
        columns: &[String],
    ) -> std::result::Result<WriteSummary, SinkError> {
        let bytes =
            render_csv(records, columns).map_err(|e| SinkError::new(self.destination(), e))?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| SinkError::new(self.destination(), e))?;

        log::debug!("Wrote {} rows to {}", records.len(), self.path.display());
        Ok(WriteSummary {
            destination: self.destination(),
            rows: records.len(),
        })
    }
}

/// JSON file sink: an array of objects keyed in column order.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSink for JsonSink {
    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    async fn write(
        &self,
        records: &[Record],
        columns: &[String],
    ) -> std::result::Result<WriteSummary, SinkError> {
        let rows: Vec<Row<'_>> = records.iter().map(|record| Row { record, columns }).collect();
        let bytes = serde_json::to_vec_pretty(&rows)
            .map_err(|e| SinkError::new(self.destination(), e))?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| SinkError::new(self.destination(), e))?;

        log::debug!("Wrote {} rows to {}", records.len(), self.path.display());
        Ok(WriteSummary {
            destination: self.destination(),
            rows: records.len(),
        })
    }
}

/// A record projected onto the output columns.
struct Row<'a> {
    record: &'a Record,
    columns: &'a [String],
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.record.row(self.columns)) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Render records as CSV bytes, header first.
pub fn render_csv(records: &[Record], columns: &[String]) -> csv::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(record.row(columns))?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Write bytes atomically (write to temp, then rename).
async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = tmp_path(path);
    let result = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
