// src/crawl/session.rs
// =============================================================================
// One crawl, from seed to "Completed all tasks".
//
// How it works:
// 1. The seed is claimed and queued like any other link
// 2. N workers pop URLs, fetch them, and queue the new in-scope links
// 3. A watcher task waits for the completion tracker to reach zero,
//    then closes the queue
// 4. Workers see closed-and-empty, exit, and run() returns a summary
//
// Every piece of shared state (visited set, queue, tracker) lives in the
// Crawler itself. Two crawls in one process never see each other's state.
//
// Rust concepts:
// - Arc<Self>: workers and the watcher share one Crawler across tasks
// - tokio::select!: races a fetch or a push against cancellation
// - RAII: a WorkItem closes its unit of work on every exit path
// =============================================================================

use super::completion::CompletionTracker;
use super::extract::{LinkExtractor, PageVisit, WorkItem};
use super::queue::{TryPushError, WorkQueue};
use crate::config::CrawlConfig;
use crate::email::EmailScanner;
use crate::fetch::{FetchError, PageFetcher};
use crate::report::{CrawlSummary, Reporter};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct CrawlStats {
    visited: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    emails: AtomicUsize,
}

pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn PageFetcher>,
    reporter: Arc<dyn Reporter>,
    scanner: EmailScanner,
    extractor: LinkExtractor,
    queue: WorkQueue<WorkItem>,
    tracker: Arc<CompletionTracker>,
    // Workers currently blocked pushing onto a full queue
    stalled: AtomicUsize,
    stats: CrawlStats,
    cancel: CancellationToken,
}

impl Crawler {
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn PageFetcher>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let tracker = CompletionTracker::new();
        let extractor = LinkExtractor::new(config.scope_prefix.clone(), Arc::clone(&tracker));
        let queue = WorkQueue::new(config.queue_capacity);

        Self {
            config,
            fetcher,
            reporter,
            scanner: EmailScanner::new(),
            extractor,
            queue,
            tracker,
            stalled: AtomicUsize::new(0),
            stats: CrawlStats::default(),
            cancel: CancellationToken::new(),
        }
    }

    // Cancelling this token stops new fetches; queued work drains unfetched
    // and run() still returns normally
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(self) -> CrawlSummary {
        let crawler = Arc::new(self);
        info!(
            seed = %crawler.config.seed,
            prefix = %crawler.extractor.scope_prefix(),
            workers = crawler.config.workers,
            queue_capacity = crawler.queue.capacity(),
            "starting crawl"
        );

        // The queue is empty and capacity is at least 1, so this never blocks
        if let Some(seed) = crawler.extractor.discover(crawler.config.seed.as_str()) {
            crawler.enqueue(seed).await;
        }

        let watcher = {
            let crawler = Arc::clone(&crawler);
            tokio::spawn(async move {
                crawler.tracker.wait_for_drain().await;
                debug_assert!(crawler.queue.is_empty());
                crawler.queue.close();
                info!(claimed = crawler.extractor.claimed(), "all work drained, queue closed");
            })
        };

        let workers = (0..crawler.config.workers).map(|id| {
            let crawler = Arc::clone(&crawler);
            tokio::spawn(crawler.worker_loop(id))
        });

        for result in join_all(workers).await {
            if let Err(e) = result {
                error!("worker task failed: {}", e);
            }
        }

        // If every worker died, queued items keep the tracker above zero
        if crawler.queue.is_closed() {
            if let Err(e) = watcher.await {
                error!("completion watcher failed: {}", e);
            }
        } else {
            watcher.abort();
        }

        crawler.summary()
    }

    async fn worker_loop(self: Arc<Self>, id: usize) {
        while let Some(item) = self.queue.pop().await {
            if self.cancel.is_cancelled() {
                debug!(worker = id, url = %item.url, "cancelled, dropping queued url");
                continue;
            }

            self.reporter.visiting(&item.url);
            self.process(item).await;
        }

        debug!(worker = id, "worker exiting");
    }

    // Fetches one page and acts on what it produced. `item` is held until
    // the end so its unit of work outlives every push made on its behalf.
    async fn process(&self, item: WorkItem) {
        let mut visit = PageVisit::new(&self.extractor, &self.scanner);

        let outcome = tokio::select! {
            result = self.fetcher.fetch(&item.url, &mut visit) => result,
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
        };

        match outcome {
            Ok(()) => {
                self.stats.visited.fetch_add(1, Ordering::Relaxed);
                if visit.links_seen == 0 {
                    debug!(url = %item.url, "no links found");
                }
            }
            Err(FetchError::Cancelled) => {
                debug!(url = %item.url, "fetch abandoned");
            }
            Err(e) if e.is_skip() => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                info!(url = %item.url, reason = %e, "skipping page");
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(url = %item.url, error = %e, "fetch failed");
                self.reporter.fetch_failed(&item.url, &e);
            }
        }

        if !visit.emails.is_empty() {
            self.stats.emails.fetch_add(visit.emails.len(), Ordering::Relaxed);
            self.reporter.emails_found(&item.url, &visit.emails);
        }

        for next in visit.discovered {
            if self.cancel.is_cancelled() {
                break;
            }
            self.enqueue(next).await;
        }

        drop(item);
    }

    // Pushes with backpressure, except when every worker is already blocked
    // pushing: then nobody is left to pop, and the item goes in over capacity
    async fn enqueue(&self, item: WorkItem) {
        let item = match self.queue.try_push(item) {
            Ok(()) => return,
            Err(TryPushError::Full(item)) => item,
            Err(TryPushError::Closed(item)) => {
                error!(url = %item.url, "queue closed while work was outstanding");
                return;
            }
        };

        let stalled = self.stalled.fetch_add(1, Ordering::AcqRel) + 1;
        let result = if stalled >= self.config.workers {
            debug!(
                url = %item.url,
                queued = self.queue.len(),
                "all workers blocked on a full queue, pushing over capacity"
            );
            self.queue.force_push(item)
        } else {
            tokio::select! {
                result = self.queue.push(item) => result,
                // Dropping the pending push drops the item and its unit
                _ = self.cancel.cancelled() => Ok(()),
            }
        };
        self.stalled.fetch_sub(1, Ordering::AcqRel);

        if let Err(rejected) = result {
            error!(url = %rejected.0.url, "queue closed while work was outstanding");
        }
    }

    fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            pages_visited: self.stats.visited.load(Ordering::Relaxed),
            pages_failed: self.stats.failed.load(Ordering::Relaxed),
            pages_skipped: self.stats.skipped.load(Ordering::Relaxed),
            emails_found: self.stats.emails.load(Ordering::Relaxed),
            cancelled: self.cancel.is_cancelled(),
        }
    }
}
