// src/services/paginator.rs

//! Pagination driver.
//!
//! Walks listing pages 1, 2, 3, ... strictly in order, one page at a time,
//! until one of three things happens:
//!
//! - a page fetch fails (`fetch-failed`),
//! - a page yields no listings (`no-listings-found`, the normal end of a
//!   catalog, which never advertises its page count),
//! - the page cap is reached (`exhausted-max-pages`).
//!
//! Consecutive fetches are always separated by the configured pause.

use std::time::Duration;

use reqwest::header::HeaderMap;
use scraper::Html;

use crate::error::Result;
use crate::models::{Config, PageRequest, Record, RunState, SourceConfig, StopReason};
use crate::services::extractor::extract_listings;
use crate::services::schema::Schema;
use crate::utils::http::{PageFetcher, build_headers};
use crate::utils::page_url;

/// Drives one catalog source through its page sequence.
#[derive(Debug, Clone)]
pub struct Paginator {
    source: SourceConfig,
    schema: Schema,
    headers: HeaderMap,
    pause: Duration,
    max_pages: u32,
}

impl Paginator {
    /// Validate `config` and compile its schema.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            schema: Schema::compile(&config.source)?,
            source: config.source.clone(),
            headers: build_headers(&config.crawler)?,
            pause: Duration::from_millis(config.crawler.pause_ms),
            max_pages: config.max_pages(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Output columns, in schema order.
    pub fn columns(&self) -> Vec<String> {
        self.schema.columns()
    }

    /// Describe page `number` (1-based).
    pub fn page(&self, number: u32) -> PageRequest {
        PageRequest {
            number,
            url: page_url(
                self.schema.base_url(),
                &self.source.page_param,
                number,
                self.source.omit_param_on_first_page,
            ),
        }
    }

    /// Run to completion and return the final state.
    pub async fn run<F: PageFetcher + ?Sized>(&self, fetcher: &F) -> RunState {
        let mut state = RunState::new();
        self.run_into(fetcher, &mut state).await;
        state
    }

    /// Run against a caller-owned state.
    ///
    /// Records are appended a whole page at a time between suspension
    /// points, so if this future is dropped early `state` still holds every
    /// completed page and can be flushed as is.
    pub async fn run_into<F: PageFetcher + ?Sized>(&self, fetcher: &F, state: &mut RunState) {
        let max_pages = self.max_pages;
        log::info!(
            "Scraping '{}' (up to {} pages)",
            self.source.name,
            max_pages
        );

        for number in 1..=max_pages {
            state.current_page = number;
            let page = self.page(number);
            log::info!("Scraping page {}: {}", page.number, page.url);

            let body = match fetcher.fetch(&page.url, &self.headers).await {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("Stopping at page {}: {}", page.number, e);
                    state.last_error = Some(e.to_string());
                    state.stop(StopReason::FetchFailed);
                    return;
                }
            };
            state.pages_fetched += 1;

            let records = self.extract_page(&body);
            if records.is_empty() {
                log::info!("No more listings found on page {}", page.number);
                state.stop(StopReason::NoListingsFound);
                return;
            }

            log::debug!("Page {}: {} listings", page.number, records.len());
            state.records.extend(records);

            if number < max_pages {
                tokio::time::sleep(self.pause).await;
            }
        }

        log::info!("Reached the page limit ({})", max_pages);
        state.stop(StopReason::ExhaustedMaxPages);
    }

    fn extract_page(&self, body: &[u8]) -> Vec<Record> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);
        extract_listings(&document, &self.schema)
    }
}
