// src/crawl/completion.rs
// =============================================================================
// Tracks how much work the crawl still owes.
//
// A unit of work is opened the moment a link is claimed, which is before it
// sits in the queue. The unit closes when the page has been fetched and every
// link it produced has been enqueued. That ordering matters: a page only opens
// new units while its own unit is still open, so the count cannot reach zero
// while anything is queued or being fetched.
//
// Units are RAII guards (WorkUnit). Dropping one, on any path, closes it.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CompletionTracker {
    outstanding: AtomicUsize,
    drained: Notify,
}

impl CompletionTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Opens one unit of in-flight work.
    pub fn register(self: &Arc<Self>) -> WorkUnit {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        WorkUnit {
            tracker: Arc::clone(self),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Resolves once no unit is open.
    pub async fn wait_for_drain(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }

            notified.await;
        }
    }

    fn release(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }
}

/// One open unit of work; closes itself when dropped.
#[derive(Debug)]
pub struct WorkUnit {
    tracker: Arc<CompletionTracker>,
}

impl Drop for WorkUnit {
    fn drop(&mut self) {
        self.tracker.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_idle_tracker_is_drained() {
        let tracker = CompletionTracker::new();
        timeout(Duration::from_millis(100), tracker.wait_for_drain())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_counts_units() {
        let tracker = CompletionTracker::new();
        let first = tracker.register();
        let second = tracker.register();
        assert_eq!(tracker.outstanding(), 2);

        drop(first);
        assert_eq!(tracker.outstanding(), 1);
        drop(second);
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_waiter_released_by_last_unit() {
        let tracker = CompletionTracker::new();
        let parent = tracker.register();

        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.wait_for_drain().await })
        };

        // The parent opens a child before it closes, so the count never hits zero
        let child = tracker.register();
        drop(parent);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(child);
        timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }
}
