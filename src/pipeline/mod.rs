//! Pipeline entry points.
//!
//! - `run_scrape`: paginate a catalog source and flush the records to a sink

pub mod scrape;

pub use scrape::{FlushOutcome, ScrapeReport, run_scrape, run_scrape_until};
