// src/fetch/mod.rs
// =============================================================================
// This module is the page fetcher: the crawler's only window onto the network.
//
// A fetcher is given a URL and a handler. It downloads the page, then calls
// the handler once per discovered hyperlink (already made absolute) and once
// with the page's visible text. The crawl scheduler never sees HTML or HTTP.
//
// Submodules:
// - http: the reqwest-backed fetcher and its error classification
// - html: link and text extraction from a parsed document
//
// Rust concepts:
// - Traits: PageFetcher / PageHandler are the seam between scheduler and I/O
// - async-trait: lets us keep an async method on a trait object
// =============================================================================

mod html;
mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpFetcher;

// Receives the events produced while fetching one page.
//
// Both methods are called synchronously from inside `PageFetcher::fetch`,
// before it returns. Implementations must not block for long.
pub trait PageHandler: Send {
    /// Called once per absolute http(s) link found on the page
    fn on_link(&mut self, url: &str);
    /// Called once with the page's visible text
    fn on_text(&mut self, text: &str);
}

/// Downloads a page and reports its links and text to a handler.
///
/// Implementations must be safe to call from many workers at once.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, handler: &mut dyn PageHandler) -> Result<(), FetchError>;
}

// Everything that can go wrong while fetching a single page
//
// None of these abort the crawl: the scheduler logs them and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("could not resolve hostname")]
    Dns,
    #[error("connection failed")]
    Connect,
    #[error("TLS certificate error")]
    Tls,
    #[error("HTTP {0}")]
    Status(u16),
    /// The response was fine but is not a page we can read links from
    #[error("not an HTML document ({0})")]
    NotHtml(String),
    /// Redirects led outside the crawl's scope prefix
    #[error("redirected out of scope to {0}")]
    RedirectedOutOfScope(String),
    #[error("crawl cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    // A skipped page is not a failure: the URL answered, just not with an
    // in-scope HTML page
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            FetchError::NotHtml(_) | FetchError::RedirectedOutOfScope(_)
        )
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait instead of calling reqwest directly?
//    - The scheduler only needs "give me links and text for this URL"
//    - Tests plug in an in-memory fetcher and never touch the network
//
// 2. Why is PageHandler synchronous?
//    - The callbacks just record what was found; they never wait on anything
//    - Anything that can block (pushing onto a full queue) happens after
//      fetch() returns, in the worker
//
// 3. What does #[async_trait] do?
//    - It rewrites `async fn` in the trait into a method returning a boxed
//      future, which is what lets us store an Arc<dyn PageFetcher>
// -----------------------------------------------------------------------------
