// src/lib.rs

//! Listing Scraper Library
//!
//! Walks the numbered listing pages of a web catalog, extracts one record per
//! listing card with a declarative field schema, and writes the records as
//! rows.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
