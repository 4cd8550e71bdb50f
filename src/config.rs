// src/config.rs
// =============================================================================
// The validated settings for one crawl.
//
// The CLI hands us strings; CrawlConfig holds a parsed seed URL, the scope
// prefix as a plain string (scoping is a string-prefix test), and the pool
// and queue sizes. Anything wrong here is fatal and is reported before a
// single worker starts.
// =============================================================================

use crate::cli::Cli;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_WORKERS: usize = 12;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("email-crawler/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },
    #[error("seed URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("seed URL has no host: {0}")]
    NoHost(String),
    #[error("seed URL {seed} is outside the scope prefix {prefix}")]
    SeedOutOfScope { seed: String, prefix: String },
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("queue capacity must be at least 1")]
    NoQueueCapacity,
    #[error("request timeout must be at least 1 second")]
    NoTimeout,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed: Url,
    pub scope_prefix: String,
    pub workers: usize,
    pub queue_capacity: usize,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl CrawlConfig {
    /// Default settings for `seed`, scoped to the seed's directory.
    pub fn for_seed(seed: &str) -> Result<Self, ConfigError> {
        let seed = parse_seed(seed)?;
        let scope_prefix = default_scope_prefix(&seed);

        Ok(Self {
            seed,
            scope_prefix,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::for_seed(&cli.seed_url)?
            .with_workers(cli.workers)
            .with_queue_capacity(cli.queue_capacity)
            .with_request_timeout(Duration::from_secs(cli.timeout));
        if let Some(prefix) = &cli.prefix {
            config.scope_prefix = prefix.clone();
        }
        config.user_agent = cli.user_agent.clone();

        config.validate()?;
        Ok(config)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::NoQueueCapacity);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::NoTimeout);
        }
        if !self.seed.as_str().starts_with(&self.scope_prefix) {
            return Err(ConfigError::SeedOutOfScope {
                seed: self.seed.to_string(),
                prefix: self.scope_prefix.clone(),
            });
        }
        Ok(())
    }
}

fn parse_seed(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidSeed {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::NoHost(raw.to_string()));
    }

    // Same normalization the fetcher applies to discovered links
    url.set_fragment(None);
    Ok(url)
}

// The seed's "directory": query and fragment dropped, path cut after its
// last '/'
//
//   https://example.org/a/            -> https://example.org/a/
//   https://example.org/a/index.html  -> https://example.org/a/
//   https://example.org               -> https://example.org/
pub fn default_scope_prefix(seed: &Url) -> String {
    let mut base = seed.clone();
    base.set_query(None);
    base.set_fragment(None);

    let directory = match base.path().rfind('/') {
        Some(end) => base.path()[..=end].to_string(),
        None => "/".to_string(),
    };
    base.set_path(&directory);
    base.to_string()
}
