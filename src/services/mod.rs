//! Service layer for the scraper.
//!
//! This module contains the scraping logic:
//! - Schema compilation (`Schema`)
//! - Listing field extraction (`extract`)
//! - Page sequencing and termination (`Paginator`)

pub mod extractor;
pub mod paginator;
pub mod schema;

pub use extractor::{extract, extract_listings};
pub use paginator::Paginator;
pub use schema::Schema;
