// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up tracing diagnostics on stderr
// 3. Validate the arguments into a CrawlConfig (fatal if invalid)
// 4. Run the crawl, with Ctrl-C wired to a graceful drain
// 5. Exit with proper code (0 = completed, 2 = error, 130 = interrupted)
//
// stdout carries only results (visited URLs, emails, the completion line),
// so the output can be piped; everything diagnostic goes to stderr.
// =============================================================================

mod cli;
mod config;
mod crawl;
mod email;
mod fetch;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::CrawlConfig;
use crawl::Crawler;
use fetch::HttpFetcher;
use report::{StdoutReporter, COMPLETED_LINE};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins; otherwise warnings only, or debug for this crate with -v
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,email_crawler=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = CrawlConfig::from_cli(&cli).context("invalid crawl configuration")?;

    let fetcher = HttpFetcher::new(config.request_timeout, &config.user_agent)
        .context("failed to build HTTP client")?
        .with_scope(config.scope_prefix.clone());

    let crawler = Crawler::new(config, Arc::new(fetcher), Arc::new(StdoutReporter));

    // First Ctrl-C drains the crawl; the process stays in control
    let cancel = crawler.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, draining queued work without fetching");
            cancel.cancel();
        }
    });

    let summary = crawler.run().await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    println!("{}", COMPLETED_LINE);

    Ok(summary.exit_code())
}
