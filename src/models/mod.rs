// src/models/mod.rs

//! Domain models for the scraper.
//!
//! Plain data only: configuration, the record type, and the run state the
//! paginator mutates.

mod config;
pub mod presets;
mod record;
mod run;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, Extraction, FieldConfig, OutputConfig, OutputFormat, SourceConfig,
};
pub use record::Record;
pub use run::{PageRequest, RunState, StopReason};
