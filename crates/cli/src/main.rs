//! pagesift command-line entry point.
//!
//! Fetches every route of a site, extracts its main content and writes
//! text, JSON and markdown files per route. Logs go to stderr; the batch
//! summary goes to stdout.

mod routes_file;
mod writer;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pagesift_client::{FetchClient, FetchConfig, HeuristicExtractor, RouteProcessor};
use pagesift_core::{AppConfig, BatchReport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::routes_file::{load_routes, split_routes};
use crate::writer::FileWriter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract the main content of a site's pages into text, JSON and markdown", long_about = None)]
struct Cli {
    /// Base URL every route is resolved against
    #[arg(short, long)]
    base_url: Option<String>,

    /// Routes to process (comma-separated)
    #[arg(short, long)]
    routes: Option<String>,

    /// JSON file containing an array of routes
    #[arg(long)]
    routes_file: Option<PathBuf>,

    /// Output format: text, json, markdown or all
    #[arg(short, long)]
    format: Option<String>,

    /// Directory output files are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Command-line values take precedence over file and environment config.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if let Some(routes_file) = &self.routes_file {
            config.routes_file = Some(routes_file.clone());
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
    }

    fn resolve_routes(&self, config: &AppConfig) -> Result<Vec<String>> {
        if let Some(list) = &self.routes {
            let routes = split_routes(list);
            if routes.is_empty() {
                bail!("--routes was given but contains no routes");
            }
            return Ok(routes);
        }

        match &config.routes_file {
            Some(path) => Ok(load_routes(path)?),
            None => Ok(vec!["/".to_string()]),
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_summary(report: &BatchReport) {
    println!("Processed {} route(s) as {}", report.total(), report.format);
    println!("  succeeded: {}", report.succeeded());
    println!("  failed:    {}", report.failed());
    for failure in &report.failures {
        println!("  - {} ({}): {}", failure.route, failure.url, failure.reason);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = AppConfig::load().context("failed to load configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    let base_url = config.require_base_url()?.to_string();
    let routes = cli.resolve_routes(&config)?;

    tracing::info!(base_url = %base_url, routes = routes.len(), output_dir = %config.output_dir.display(), "starting");

    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let writer = FileWriter::new(&config.output_dir);
    let processor = RouteProcessor::with_defaults(Arc::new(fetcher), Arc::new(HeuristicExtractor::new()))
        .with_sink(Arc::new(writer));

    let report = processor.process_routes(&base_url, &routes, &config.format).await?;
    print_summary(&report);

    if report.succeeded() == 0 {
        bail!("all {} route(s) failed", report.failed());
    }

    Ok(())
}
