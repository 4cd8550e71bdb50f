// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is a single command: crawl from a seed URL. Everything else is an
// optional flag with a default, so `email-crawler https://example.org/a/`
// is a complete invocation.
//
// The raw values are validated and turned into a CrawlConfig in config.rs.
// =============================================================================

use crate::config::{DEFAULT_QUEUE_CAPACITY, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, DEFAULT_WORKERS};
use clap::builder::TypedValueParser;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "email-crawler",
    version,
    about = "Crawl every page under a URL prefix and print the email addresses found",
    long_about = "email-crawler starts at a seed URL, follows every link that stays under the \
                  scope prefix (each page at most once), and prints the email addresses it \
                  finds on each page. Pages are fetched by a fixed pool of concurrent workers."
)]
pub struct Cli {
    /// Page to start crawling from (e.g., https://www.w3.org/staff/)
    pub seed_url: String,

    /// Only follow links that start with this prefix
    ///
    /// Defaults to the seed's directory: https://example.org/a/index.html
    /// gives https://example.org/a/
    #[arg(long)]
    pub prefix: Option<String>,

    /// Number of concurrent workers fetching pages
    #[arg(long, default_value_t = DEFAULT_WORKERS,
          value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub workers: usize,

    /// How many discovered URLs may wait in the queue before producers block
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY,
          value_parser = clap::value_parser!(u32).range(1..=1_000_000).map(|n| n as usize))]
    pub queue_capacity: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Print a JSON summary of the crawl before the completion line
    #[arg(long)]
    pub json: bool,

    /// Show debug diagnostics on stderr (RUST_LOG overrides this)
    #[arg(short, long)]
    pub verbose: bool,
}
