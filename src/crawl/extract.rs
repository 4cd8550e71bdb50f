// src/crawl/extract.rs
// =============================================================================
// This module decides which discovered links become work.
//
// A raw link from the fetcher goes through three gates:
// 1. Non-empty and inside the scope prefix (otherwise dropped quietly)
// 2. Claimed in the visited set (otherwise it's a duplicate)
// 3. Wrapped in a WorkItem that carries its own unit of in-flight work
//
// Out-of-scope links are normal on almost every page, so they are only ever
// logged at debug level and never reported as errors.
// =============================================================================

use super::completion::{CompletionTracker, WorkUnit};
use super::visited::VisitedSet;
use crate::email::EmailScanner;
use crate::fetch::PageHandler;
use std::sync::Arc;
use tracing::debug;

// A URL waiting for (or being served by) a worker
#[derive(Debug)]
pub struct WorkItem {
    pub url: String,
    // Held, never read: dropping the item closes the unit
    _unit: WorkUnit,
}

#[derive(Debug)]
pub struct LinkExtractor {
    scope_prefix: String,
    visited: VisitedSet,
    tracker: Arc<CompletionTracker>,
}

impl LinkExtractor {
    pub fn new(scope_prefix: impl Into<String>, tracker: Arc<CompletionTracker>) -> Self {
        Self {
            scope_prefix: scope_prefix.into(),
            visited: VisitedSet::new(),
            tracker,
        }
    }

    pub fn scope_prefix(&self) -> &str {
        &self.scope_prefix
    }

    pub fn in_scope(&self, url: &str) -> bool {
        !url.is_empty() && url.starts_with(&self.scope_prefix)
    }

    pub fn claimed(&self) -> usize {
        self.visited.len()
    }

    // Returns a new work item the first time an in-scope URL is seen, and
    // None for everything else
    pub fn discover(&self, url: &str) -> Option<WorkItem> {
        if !self.in_scope(url) {
            debug!(url, "dropping out-of-scope link");
            return None;
        }

        if !self.visited.try_claim(url) {
            debug!(url, "dropping already-claimed link");
            return None;
        }

        Some(WorkItem {
            url: url.to_string(),
            _unit: self.tracker.register(),
        })
    }
}

// Collects everything one fetch produced, for the worker to act on once the
// fetch returns
pub struct PageVisit<'a> {
    extractor: &'a LinkExtractor,
    scanner: &'a EmailScanner,
    pub links_seen: usize,
    pub discovered: Vec<WorkItem>,
    pub emails: Vec<String>,
}

impl<'a> PageVisit<'a> {
    pub fn new(extractor: &'a LinkExtractor, scanner: &'a EmailScanner) -> Self {
        Self {
            extractor,
            scanner,
            links_seen: 0,
            discovered: Vec::new(),
            emails: Vec::new(),
        }
    }
}

impl PageHandler for PageVisit<'_> {
    fn on_link(&mut self, url: &str) {
        self.links_seen += 1;
        if let Some(item) = self.extractor.discover(url) {
            self.discovered.push(item);
        }
    }

    fn on_text(&mut self, text: &str) {
        self.emails.extend(self.scanner.scan(text));
    }
}
