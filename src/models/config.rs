//! Application configuration structures.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::presets;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP and pacing settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Where and how the records are written
    #[serde(default)]
    pub output: OutputConfig,

    /// The catalog being scraped and its extraction schema
    #[serde(default = "presets::buyrentkenya")]
    pub source: SourceConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {:?}, using built-in defaults", path);
            return Self::default();
        }

        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Config load failed from {:?}: {}. Using defaults.", path, e);
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Selector syntax is checked separately when the schema is compiled.
    pub fn validate(&self) -> Result<()> {
        self.crawler.validate()?;
        self.source.validate()?;
        if self.output.path.as_os_str().is_empty() {
            return Err(AppError::validation("output.path is empty"));
        }
        Ok(())
    }

    /// Effective page cap: `crawler.max_pages` when set, otherwise the
    /// source's own cap.
    pub fn max_pages(&self) -> u32 {
        self.crawler.max_pages.unwrap_or(self.source.max_pages)
    }

    /// Switch to another source and name the output file after it,
    /// keeping the output directory and format.
    pub fn use_source(&mut self, source: SourceConfig) {
        self.output.path = self
            .output
            .path
            .with_file_name(format!("{}_listings", source.name))
            .with_extension(self.output.format.to_string());
        self.source = source;
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            output: OutputConfig::default(),
            source: presets::buyrentkenya(),
        }
    }
}

/// HTTP client and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every page request
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Politeness pause between consecutive page fetches, in milliseconds
    #[serde(default = "defaults::pause")]
    pub pause_ms: u64,

    /// Page cap for the run; overrides `source.max_pages` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,

    /// Additional fixed request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl CrawlerConfig {
    fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.pause_ms == 0 {
            return Err(AppError::validation("crawler.pause_ms must be > 0"));
        }
        if self.max_pages == Some(0) {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }
        if self.pause_is_short() {
            log::warn!(
                "crawler.pause_ms = {} is below the recommended {} ms between pages",
                self.pause_ms,
                defaults::pause()
            );
        }
        Ok(())
    }

    /// Whether the pause is shorter than the default politeness floor.
    pub fn pause_is_short(&self) -> bool {
        self.pause_ms < defaults::pause()
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            pause_ms: defaults::pause(),
            max_pages: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "defaults::output_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
            format: OutputFormat::default(),
        }
    }
}

/// Tabular file format for the record sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}' (expected csv or json)")),
        }
    }
}

/// A paginated catalog and the schema applied to each of its listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Short identifier used in logs
    pub name: String,

    /// Listing URL of page 1
    pub base_url: String,

    /// Query parameter carrying the 1-based page number
    #[serde(default = "defaults::page_param")]
    pub page_param: String,

    /// Request page 1 as the bare base URL
    #[serde(default = "defaults::omit_param_on_first_page")]
    pub omit_param_on_first_page: bool,

    /// Hard cap on the number of pages visited
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// CSS selector matching each listing card on a page
    pub listing_selector: String,

    /// Value recorded for fields absent from a listing
    #[serde(default = "defaults::default_value")]
    pub default_value: String,

    /// Ordered field schema; also the output column order
    pub fields: Vec<FieldConfig>,
}

impl SourceConfig {
    /// Output columns, in declared order.
    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    fn validate(&self) -> Result<()> {
        let context = |msg: &str| AppError::validation(format!("source '{}': {msg}", self.name));

        if url::Url::parse(&self.base_url).is_err() {
            return Err(context(&format!("invalid base_url '{}'", self.base_url)));
        }
        if self.page_param.trim().is_empty() {
            return Err(context("page_param is empty"));
        }
        if self.max_pages == 0 {
            return Err(context("max_pages must be > 0"));
        }
        if self.listing_selector.trim().is_empty() {
            return Err(context("listing_selector is empty"));
        }
        if self.default_value.trim().is_empty() {
            return Err(context("default_value is empty"));
        }
        if self.fields.is_empty() {
            return Err(context("no fields defined"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(context("field with empty name"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(context(&format!("duplicate field '{}'", field.name)));
            }
            if field.locators.is_empty() {
                return Err(context(&format!("field '{}' has no locators", field.name)));
            }
            if field.default.as_deref().is_some_and(|d| d.trim().is_empty()) {
                return Err(context(&format!("field '{}' has an empty default", field.name)));
            }
            if let Extraction::Attribute { attr } = &field.mode {
                if attr.trim().is_empty() {
                    return Err(context(&format!("field '{}' has an empty attr", field.name)));
                }
            }
        }
        Ok(())
    }
}

/// One entry of the field schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Output column name
    pub name: String,

    /// CSS selector alternatives, tried in order; the first one that
    /// matches anything inside the listing wins
    pub locators: Vec<String>,

    /// How a value is read from the matched element(s)
    #[serde(flatten)]
    pub mode: Extraction,

    /// Resolve the value as a URL relative to the source's base URL
    #[serde(default)]
    pub resolve_url: bool,

    /// Per-field override of the source default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldConfig {
    pub fn text(name: &str, locators: &[&str]) -> Self {
        Self::new(name, locators, Extraction::Text)
    }

    pub fn attribute(name: &str, locators: &[&str], attr: &str) -> Self {
        Self::new(
            name,
            locators,
            Extraction::Attribute {
                attr: attr.to_string(),
            },
        )
    }

    pub fn joined(name: &str, locators: &[&str], attr: Option<&str>) -> Self {
        Self::new(
            name,
            locators,
            Extraction::Joined {
                attr: attr.map(str::to_string),
            },
        )
    }

    /// Resolve extracted values against the source base URL.
    pub fn resolving(mut self) -> Self {
        self.resolve_url = true;
        self
    }

    fn new(name: &str, locators: &[&str], mode: Extraction) -> Self {
        Self {
            name: name.to_string(),
            locators: locators.iter().map(|s| s.to_string()).collect(),
            mode,
            resolve_url: false,
            default: None,
        }
    }
}

/// Extraction mode for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Extraction {
    /// Normalized text of the first match
    Text,

    /// Attribute value of the first match
    Attribute { attr: String },

    /// Values of every match, in document order, joined with `;`
    Joined {
        /// Attribute to read; text content when absent
        #[serde(default)]
        attr: Option<String>,
    },
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn pause() -> u64 {
        2000
    }
    pub fn output_path() -> PathBuf {
        PathBuf::from("listings.csv")
    }
    pub fn page_param() -> String {
        "page".into()
    }
    pub fn omit_param_on_first_page() -> bool {
        true
    }
    pub fn max_pages() -> u32 {
        157
    }
    pub fn default_value() -> String {
        "N/A".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_pause() {
        let mut config = Config::default();
        config.crawler.pause_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_pages() {
        let mut config = Config::default();
        config.source.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_crawler_max_pages() {
        let mut config = Config::default();
        config.crawler.max_pages = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_default() {
        let mut config = Config::default();
        config.source.default_value = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_value"));

        let mut config = Config::default();
        config.source.default_value = " \t".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_field_default() {
        let mut config = Config::default();
        config.source.fields[1].default = Some(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("empty default"));
    }

    #[test]
    fn short_pause_is_accepted_but_flagged() {
        let mut config = Config::default();
        assert!(!config.crawler.pause_is_short());

        config.crawler.pause_ms = 1;
        assert!(config.crawler.pause_is_short());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_fields() {
        let mut config = Config::default();
        let first = config.source.fields[0].clone();
        config.source.fields.push(first);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate field"));
    }

    #[test]
    fn validate_rejects_field_without_locators() {
        let mut config = Config::default();
        config.source.fields[0].locators.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.source.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            pause_ms = 500

            [output]
            path = "out/homes.json"
            format = "json"

            [source]
            name = "homes"
            base_url = "https://homes.example/listings"
            page_param = "p"
            omit_param_on_first_page = false
            max_pages = 3
            listing_selector = "article.home"

            [[source.fields]]
            name = "title"
            locators = ["h2", "h3"]
            mode = "text"

            [[source.fields]]
            name = "link"
            locators = ["a[href]"]
            mode = "attribute"
            attr = "href"
            resolve_url = true

            [[source.fields]]
            name = "photos"
            locators = ["img"]
            mode = "joined"
            attr = "src"
            default = "none"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.crawler.pause_ms, 500);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.source.default_value, "N/A");
        assert_eq!(config.source.columns(), vec!["title", "link", "photos"]);
        assert_eq!(config.source.fields[0].mode, Extraction::Text);
        assert_eq!(
            config.source.fields[1].mode,
            Extraction::Attribute {
                attr: "href".to_string()
            }
        );
        assert!(config.source.fields[1].resolve_url);
        assert_eq!(config.source.fields[2].default.as_deref(), Some("none"));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[crawler]\ntimeout_secs = 5\n").unwrap();
        assert_eq!(config.crawler.timeout_secs, 5);
        assert_eq!(config.crawler.pause_ms, 2000);
        assert_eq!(config.source.name, "buyrentkenya");
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn crawler_max_pages_caps_the_run() {
        let config: Config = toml::from_str("[crawler]\nmax_pages = 3\n").unwrap();
        assert_eq!(config.crawler.max_pages, Some(3));
        assert_eq!(config.max_pages(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn source_max_pages_applies_without_crawler_cap() {
        let config = Config::default();
        assert_eq!(config.max_pages(), 157);

        let mut config = Config::default();
        config.use_source(presets::property24());
        assert_eq!(config.max_pages(), 10_000);
        config.crawler.max_pages = Some(25);
        assert_eq!(config.max_pages(), 25);
    }

    #[test]
    fn misplaced_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[output]\nmax_pages = 3\n").is_err());
        assert!(toml::from_str::<Config>("[crawler]\npause = 500\n").is_err());
        assert!(toml::from_str::<Config>("[limits]\nmax_pages = 3\n").is_err());
    }

    #[test]
    fn use_source_renames_output_after_source() {
        let mut config = Config::default();
        config.output.path = PathBuf::from("out/buyrentkenya_apartments.csv");
        config.use_source(presets::property24());

        assert_eq!(config.source.name, "property24");
        assert_eq!(config.output.path, PathBuf::from("out/property24_listings.csv"));

        config.output.format = OutputFormat::Json;
        config.use_source(presets::buyrentkenya());
        assert_eq!(config.output.path, PathBuf::from("out/buyrentkenya_listings.json"));
    }

    #[test]
    fn bundled_config_file_is_valid() {
        let config: Config = toml::from_str(include_str!("../../data/config.toml")).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xlsx".parse::<OutputFormat>().is_err());
    }
}
