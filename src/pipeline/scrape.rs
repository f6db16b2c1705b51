// src/pipeline/scrape.rs

//! Scrape pipeline: paginate, then flush once to the sink.

use std::future::Future;

use crate::error::Result;
use crate::models::{Config, RunState, StopReason};
use crate::services::Paginator;
use crate::storage::RecordSink;
use crate::utils::http::PageFetcher;

/// What the final flush produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// At least one record was written
    Written { rows: usize, destination: String },
    /// Nothing was collected; the destination holds only a header
    Empty { destination: String },
}

/// Result of a complete scrape.
#[derive(Debug)]
pub struct ScrapeReport {
    pub state: RunState,
    pub outcome: FlushOutcome,
}

impl ScrapeReport {
    /// One-line, user-facing summary.
    pub fn summary_line(&self) -> String {
        match &self.outcome {
            FlushOutcome::Written { rows, destination } => {
                format!("Saved {rows} records to {destination}")
            }
            FlushOutcome::Empty { destination } => {
                format!("No records collected; wrote header-only {destination}")
            }
        }
    }
}

/// Run the scraper until it stops on its own or the process receives Ctrl-C.
pub async fn run_scrape<F, S>(config: &Config, fetcher: &F, sink: &S) -> Result<ScrapeReport>
where
    F: PageFetcher + ?Sized,
    S: RecordSink + ?Sized,
{
    run_scrape_until(config, fetcher, sink, ctrl_c()).await
}

/// Run the scraper until it stops on its own or `shutdown` resolves.
///
/// Either way the records collected so far are flushed to `sink` exactly
/// once.
pub async fn run_scrape_until<F, S, D>(
    config: &Config,
    fetcher: &F,
    sink: &S,
    shutdown: D,
) -> Result<ScrapeReport>
where
    F: PageFetcher + ?Sized,
    S: RecordSink + ?Sized,
    D: Future<Output = ()>,
{
    let paginator = Paginator::new(config)?;
    let mut state = RunState::new();

    tokio::select! {
        _ = paginator.run_into(fetcher, &mut state) => {}
        _ = shutdown => {}
    }
    // the paginator always records a stop reason when it finishes on its own
    if !state.is_stopped() {
        log::warn!(
            "Interrupted on page {}; flushing {} collected records",
            state.current_page,
            state.records.len()
        );
        state.stop(StopReason::Interrupted);
    }

    log::info!(
        "Run stopped ({}) after {} pages with {} records",
        state.stop_reason,
        state.pages_fetched,
        state.records.len()
    );

    let summary = match sink.write(&state.records, &paginator.columns()).await {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("{} records could not be saved: {}", state.records.len(), e);
            return Err(e.into());
        }
    };

    let outcome = if summary.rows == 0 {
        FlushOutcome::Empty {
            destination: summary.destination,
        }
    } else {
        FlushOutcome::Written {
            rows: summary.rows,
            destination: summary.destination,
        }
    };

    Ok(ScrapeReport { state, outcome })
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::SinkError;
    use crate::models::Record;
    use crate::services::paginator::tests::{BASE, FakeFetcher, config, url};
    use crate::storage::WriteSummary;

    #[derive(Default)]
    struct MemorySink {
        writes: Mutex<Vec<(Vec<Record>, Vec<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl RecordSink for MemorySink {
        fn destination(&self) -> String {
            "memory".to_string()
        }

        async fn write(
            &self,
            records: &[Record],
            columns: &[String],
        ) -> std::result::Result<WriteSummary, SinkError> {
            if self.fail {
                return Err(SinkError::new(
                    self.destination(),
                    std::io::Error::other("disk full"),
                ));
            }
            self.writes
                .lock()
                .unwrap()
                .push((records.to_vec(), columns.to_vec()));
            Ok(WriteSummary {
                destination: self.destination(),
                rows: records.len(),
            })
        }
    }

    fn never() -> std::future::Pending<()> {
        std::future::pending()
    }

    #[tokio::test(start_paused = true)]
    async fn test_flushes_once_with_columns() {
        let fetcher = FakeFetcher::default()
            .page(BASE, &["a", "b"])
            .page(&url(2), &["c"])
            .page(&url(3), &[]);
        let sink = MemorySink::default();

        let report = run_scrape_until(&config(10), &fetcher, &sink, never())
            .await
            .unwrap();

        assert_eq!(report.state.stop_reason, StopReason::NoListingsFound);
        assert_eq!(
            report.outcome,
            FlushOutcome::Written {
                rows: 3,
                destination: "memory".to_string()
            }
        );
        assert_eq!(report.summary_line(), "Saved 3 records to memory");

        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0.len(), 3);
        assert_eq!(writes[0].1, ["title", "price"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_run_is_reported_distinctly() {
        let fetcher = FakeFetcher::default().page(BASE, &[]);
        let sink = MemorySink::default();

        let report = run_scrape_until(&config(10), &fetcher, &sink, never())
            .await
            .unwrap();

        assert!(matches!(report.outcome, FlushOutcome::Empty { .. }));
        assert!(report.summary_line().starts_with("No records collected"));
        assert_eq!(sink.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_flushes_partial_results() {
        let mut config = config(100);
        config.crawler.pause_ms = 2000;
        let mut fetcher = FakeFetcher::default();
        for page in 1..=100 {
            let page_url = if page == 1 { BASE.to_string() } else { url(page) };
            fetcher = fetcher.page(&page_url, &["x", "y"]);
        }
        let sink = MemorySink::default();

        // fetches land at t=0s, 2s and 4s; the interrupt arrives during the third pause
        let shutdown = tokio::time::sleep(Duration::from_millis(5000));
        let report = run_scrape_until(&config, &fetcher, &sink, shutdown)
            .await
            .unwrap();

        assert_eq!(report.state.stop_reason, StopReason::Interrupted);
        assert_eq!(report.state.records.len(), 6);
        assert_eq!(sink.writes.lock().unwrap()[0].0.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failure_is_surfaced() {
        let fetcher = FakeFetcher::default().page(BASE, &["a"]).page(&url(2), &[]);
        let sink = MemorySink {
            fail: true,
            ..MemorySink::default()
        };

        let err = run_scrape_until(&config(10), &fetcher, &sink, never())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("memory"));
        assert!(message.contains("disk full"));
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_fetching() {
        let mut config = config(10);
        config.crawler.pause_ms = 0;
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::default();

        assert!(
            run_scrape_until(&config, &fetcher, &sink, never())
                .await
                .is_err()
        );
        assert!(fetcher.urls().is_empty());
        assert!(sink.writes.lock().unwrap().is_empty());
    }
}
