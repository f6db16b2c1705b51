//! Pagination run state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Record;

/// One page in the listing sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub number: u32,
    pub url: String,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    NotStopped,
    ExhaustedMaxPages,
    NoListingsFound,
    FetchFailed,
    /// The process was asked to shut down mid-run
    Interrupted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStopped => "not-stopped",
            Self::ExhaustedMaxPages => "exhausted-max-pages",
            Self::NoListingsFound => "no-listings-found",
            Self::FetchFailed => "fetch-failed",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulator owned by one run of the paginator.
///
/// Records are only ever appended, a full page at a time, so the state is
/// always flushable even if the run is abandoned mid-page.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Last page number the run attempted
    pub current_page: u32,
    /// Pages whose fetch succeeded
    pub pages_fetched: u32,
    pub records: Vec<Record>,
    pub stop_reason: StopReason,
    /// Fetch failure that ended the run, if any
    pub last_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            pages_fetched: 0,
            records: Vec::new(),
            stop_reason: StopReason::NotStopped,
            last_error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_reason != StopReason::NotStopped
    }

    pub fn stop(&mut self, reason: StopReason) {
        self.stop_reason = reason;
        self.finished_at = Some(Utc::now());
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
