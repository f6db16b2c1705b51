//! Compiled extraction schema.
//!
//! Selector strings from [`SourceConfig`] are parsed once, up front, so a
//! malformed selector is a configuration error instead of a per-listing one.

use scraper::Selector;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Extraction, SourceConfig};

/// One field of the schema, ready to be applied to a listing.
#[derive(Debug, Clone)]
pub struct SchemaField {
    pub name: String,
    /// Selector alternatives, in priority order
    pub locators: Vec<Selector>,
    pub mode: Extraction,
    pub default: String,
    pub resolve_url: bool,
}

/// Immutable schema for one scrape run.
#[derive(Debug, Clone)]
pub struct Schema {
    listing: Selector,
    fields: Vec<SchemaField>,
    base_url: Url,
}

impl Schema {
    /// Validate `source` and parse all of its selectors.
    pub fn compile(source: &SourceConfig) -> Result<Self> {
        let base_url = Url::parse(&source.base_url)?;
        let listing = parse_selector(&source.listing_selector)?;

        let mut fields: Vec<SchemaField> = Vec::with_capacity(source.fields.len());
        for field in &source.fields {
            if fields.iter().any(|f| f.name == field.name) {
                return Err(AppError::validation(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
            if field.locators.is_empty() {
                return Err(AppError::validation(format!(
                    "field '{}' has no locators",
                    field.name
                )));
            }

            let locators = field
                .locators
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<Vec<_>>>()?;

            fields.push(SchemaField {
                name: field.name.clone(),
                locators,
                mode: field.mode.clone(),
                default: field
                    .default
                    .clone()
                    .unwrap_or_else(|| source.default_value.clone()),
                resolve_url: field.resolve_url,
            });
        }

        Ok(Self {
            listing,
            fields,
            base_url,
        })
    }

    /// Selector matching each listing node on a page.
    pub fn listing(&self) -> &Selector {
        &self.listing
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Field names in declared order.
    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
