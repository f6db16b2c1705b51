// src/services/extractor.rs

//! Field extraction.
//!
//! Turns one listing node into one [`Record`] by applying the schema. Every
//! schema field is present in the result; anything that cannot be located or
//! read falls back to the field's default value.

use scraper::{ElementRef, Html};
use url::Url;

use crate::models::{Extraction, Record};
use crate::services::schema::{Schema, SchemaField};
use crate::utils::{normalize_whitespace, resolve_url};

/// Separator between values of a joined field.
pub const JOIN_DELIMITER: &str = ";";

/// Extract every listing on a parsed page, in document order.
pub fn extract_listings(document: &Html, schema: &Schema) -> Vec<Record> {
    document
        .select(schema.listing())
        .map(|listing| extract(listing, schema))
        .collect()
}

/// Extract one record from a listing node.
pub fn extract(node: ElementRef<'_>, schema: &Schema) -> Record {
    let mut record = Record::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let value = extract_field(node, field, schema.base_url())
            .unwrap_or_else(|| field.default.clone());
        record.push(field.name.as_str(), value);
    }
    record
}

fn extract_field(node: ElementRef<'_>, field: &SchemaField, base: &Url) -> Option<String> {
    // first locator alternative with any match wins
    let matches = field.locators.iter().find_map(|locator| {
        let found: Vec<ElementRef<'_>> = node.select(locator).collect();
        (!found.is_empty()).then_some(found)
    })?;

    let finish = |value: String| {
        if field.resolve_url {
            resolve_url(base, &value)
        } else {
            value
        }
    };

    match &field.mode {
        Extraction::Text => Some(finish(element_text(matches[0]))),
        Extraction::Attribute { attr } => attribute(matches[0], attr).map(finish),
        Extraction::Joined { attr } => {
            let values: Vec<String> = matches
                .iter()
                .filter_map(|el| match attr {
                    Some(attr) => attribute(*el, attr),
                    None => Some(element_text(*el)),
                })
                .map(finish)
                .collect();
            (!values.is_empty()).then(|| values.join(JOIN_DELIMITER))
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

fn attribute(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value().attr(name).map(|v| v.trim().to_string())
}
