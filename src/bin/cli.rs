//! Listing Scraper CLI
//!
//! Runs with no arguments: scrapes the configured (or built-in) source and
//! writes the records to the configured output file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use listing_scraper::{
    error::{AppError, Result},
    models::{Config, OutputFormat, presets},
    pipeline,
    services::Schema,
    storage,
    utils::http::HttpFetcher,
};

/// Listing Scraper - paginated catalog to CSV
#[derive(Parser, Debug)]
#[command(name = "listing-scraper", version, about = "Paginated catalog listing scraper")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Defaults to `scrape`
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape every listing page and save the records
    Scrape(ScrapeArgs),

    /// Validate the configuration and its selectors
    Validate,

    /// List the built-in catalog sources
    Sources,
}

#[derive(Args, Debug, Default)]
struct ScrapeArgs {
    /// Use a built-in source instead of the configured one; the output file
    /// is renamed after it unless `--output` is given
    #[arg(long)]
    source: Option<String>,

    /// Override the page cap
    #[arg(long)]
    max_pages: Option<u32>,

    /// Override the output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: csv or json
    #[arg(long)]
    format: Option<OutputFormat>,
}

impl ScrapeArgs {
    fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(format) = self.format {
            config.output.format = format;
            config.output.path.set_extension(format.to_string());
        }
        if let Some(name) = self.source {
            let source = presets::builtin(&name).ok_or_else(|| {
                AppError::config(format!(
                    "unknown source '{}' (available: {})",
                    name,
                    presets::NAMES.join(", ")
                ))
            })?;
            config.use_source(source);
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = Some(max_pages);
        }
        if let Some(output) = self.output {
            config.output.path = output;
        }
        Ok(())
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);

    match cli.command.unwrap_or(Command::Scrape(ScrapeArgs::default())) {
        Command::Scrape(args) => {
            args.apply(&mut config)?;

            let fetcher = HttpFetcher::from_config(&config.crawler)?;
            let sink = storage::open_sink(&config.output);
            let report = pipeline::run_scrape(&config, &fetcher, sink.as_ref()).await?;

            println!("{}", report.summary_line());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            config.validate()?;
            let schema = Schema::compile(&config.source)?;
            log::info!(
                "✓ Config OK: source '{}' with {} fields",
                config.source.name,
                schema.fields().len()
            );
        }

        Command::Sources => {
            for name in presets::NAMES {
                if let Some(source) = presets::builtin(name) {
                    println!("{:<14} {}", source.name, source.base_url);
                }
            }
        }
    }

    Ok(())
}
