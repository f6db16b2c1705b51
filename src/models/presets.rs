//! Built-in catalog sources.

use crate::models::{FieldConfig, SourceConfig};

/// Names accepted by [`builtin`].
pub const NAMES: &[&str] = &["buyrentkenya", "property24"];

/// Look up a built-in source by name.
pub fn builtin(name: &str) -> Option<SourceConfig> {
    match name.to_ascii_lowercase().as_str() {
        "buyrentkenya" => Some(buyrentkenya()),
        "property24" => Some(property24()),
        _ => None,
    }
}

/// Flats and apartments for sale in Nairobi on buyrentkenya.com.
///
/// Page 1 is served without a page parameter.
pub fn buyrentkenya() -> SourceConfig {
    SourceConfig {
        name: "buyrentkenya".into(),
        base_url: "https://www.buyrentkenya.com/flats-apartments-for-sale/nairobi".into(),
        page_param: "page".into(),
        omit_param_on_first_page: true,
        max_pages: 157,
        listing_selector: "div.listing-card".into(),
        default_value: "N/A".into(),
        fields: vec![
            FieldConfig::text("title", &["h3.hide-title", "h2.font-semibold"]),
            FieldConfig::text("price", &[r#"p[class*="text-xl"]"#]),
            FieldConfig::text(
                "location",
                &[r#"p[class*="text-sm"][class*="truncate"]"#],
            ),
            FieldConfig::text("bedrooms", &[r#"span[data-cy="card-bedroom_count"]"#]),
            FieldConfig::text("bathrooms", &[r#"span[data-cy="card-bathroom_count"]"#]),
            FieldConfig::text("description", &[r#"h5[class*="mb-3"]"#]),
            FieldConfig::attribute("url", &["a[href]"], "href").resolving(),
            FieldConfig::attribute("main_image", &["img.h-42"], "src"),
            FieldConfig::joined("additional_images", &["img.h-16"], Some("src")),
            FieldConfig::attribute("agency", &[r#"a[data-cy="agency-logo"]"#], "href"),
        ],
    }
}

/// Property for sale in Nairobi on property24.co.ke.
///
/// Every page, including the first, carries the `Page` parameter.
pub fn property24() -> SourceConfig {
    SourceConfig {
        name: "property24".into(),
        base_url: "https://www.property24.co.ke/property-for-sale-in-nairobi-c1890".into(),
        page_param: "Page".into(),
        omit_param_on_first_page: false,
        max_pages: 10_000,
        listing_selector: "div.p24_regularTile".into(),
        default_value: "N/A".into(),
        fields: vec![
            FieldConfig::text("price", &["span.p24_price"]),
            FieldConfig::text("title", &["span.p24_propertyTitle"]),
            FieldConfig::text("location", &["span.p24_location"]),
            FieldConfig::text("address", &["span.p24_address"]),
            FieldConfig::text("description", &["span.p24_excerpt"]),
            FieldConfig::text(
                "bedrooms",
                &[r#"span.p24_icons span[title="Bedrooms"] span"#],
            ),
            FieldConfig::text(
                "bathrooms",
                &[r#"span.p24_icons span[title="Bathrooms"] span"#],
            ),
            FieldConfig::text(
                "parking",
                &[r#"span.p24_icons span[title="Parking Spaces"] span"#],
            ),
            FieldConfig::text("size", &["span.p24_icons span.p24_size span"]),
            FieldConfig::attribute("url", &["a[href]"], "href").resolving(),
            // html5ever rewrites <image> to <img>
            FieldConfig::attribute("image_url", &["img[src]"], "src"),
        ],
    }
}
