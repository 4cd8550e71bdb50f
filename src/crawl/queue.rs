// src/crawl/queue.rs
// =============================================================================
// This module implements the bounded work queue between link discovery and
// the worker pool.
//
// How it works:
// 1. push() waits for a free slot (backpressure), then appends to the back
// 2. pop() takes from the front, or waits until something arrives
// 3. close() refuses every later push; items already queued still drain
// 4. Once closed AND empty, pop() returns None and workers exit
//
// Slots are counted with a tokio Semaphore sized to the capacity. A popped
// item hands its slot back to the semaphore.
//
// Rust concepts:
// - Generics: WorkQueue<T> doesn't care what a work item is
// - Notify: wakes poppers without holding a lock across an await
// - VecDeque: FIFO with O(1) push_back / pop_front
// =============================================================================

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::{Notify, Semaphore, TryAcquireError};

/// The queue was closed; the rejected item is handed back.
#[derive(Debug, Error)]
#[error("work queue is closed")]
pub struct QueueClosed<T>(pub T);

// Result of a non-blocking push
#[derive(Debug)]
pub enum TryPushError<T> {
    /// Every slot is taken
    Full(T),
    /// The queue no longer accepts work
    Closed(T),
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    // Items admitted past capacity by force_push(). Popping one of these does
    // not return a slot to the semaphore.
    overflow: usize,
}

#[derive(Debug)]
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    slots: Semaphore,
    ready: Notify,
    closed: AtomicBool,
    capacity: usize,
}

impl<T> WorkQueue<T> {
    // Creates an open queue with room for `capacity` items (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                overflow: 0,
            }),
            slots: Semaphore::new(capacity),
            ready: Notify::new(),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Appends `item`, waiting while the queue is full.
    pub async fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
        if self.is_closed() {
            return Err(QueueClosed(item));
        }

        // close() also closes the semaphore, which releases blocked pushers
        match self.slots.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(QueueClosed(item)),
        }

        self.enqueue(item, false)
    }

    /// Appends `item` only if a slot is free right now.
    pub fn try_push(&self, item: T) -> Result<(), TryPushError<T>> {
        if self.is_closed() {
            return Err(TryPushError::Closed(item));
        }

        match self.slots.try_acquire() {
            Ok(permit) => permit.forget(),
            Err(TryAcquireError::NoPermits) => return Err(TryPushError::Full(item)),
            Err(TryAcquireError::Closed) => return Err(TryPushError::Closed(item)),
        }

        self.enqueue(item, false)
            .map_err(|QueueClosed(item)| TryPushError::Closed(item))
    }

    /// Appends `item` even if the queue is full.
    ///
    /// Only for breaking a stall where every consumer is itself blocked
    /// pushing; ordinary producers should use `push`.
    pub fn force_push(&self, item: T) -> Result<(), QueueClosed<T>> {
        self.enqueue(item, true)
    }

    /// Removes the oldest item, waiting while the queue is open and empty.
    ///
    /// Returns None once the queue is closed and fully drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            // Register for a wakeup before looking, so a push that lands
            // between the check and the await is not missed
            let notified = self.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.try_pop() {
                return Some(item);
            }
            if self.is_closed() {
                return None;
            }

            notified.await;
        }
    }

    /// Removes the oldest item without waiting.
    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.lock();
        let item = state.items.pop_front()?;

        if state.overflow > 0 {
            state.overflow -= 1;
        } else {
            self.slots.add_permits(1);
        }

        Some(item)
    }

    /// Stops accepting pushes. Queued items still drain through pop().
    pub fn close(&self) {
        {
            // Taken under the lock so no enqueue can slip in after the flag flips
            let _state = self.lock();
            self.closed.store(true, Ordering::Release);
        }
        self.slots.close();
        self.ready.notify_waiters();
    }

    fn enqueue(&self, item: T, overflow: bool) -> Result<(), QueueClosed<T>> {
        {
            let mut state = self.lock();
            if self.is_closed() {
                return Err(QueueClosed(item));
            }
            state.items.push_back(item);
            if overflow {
                state.overflow += 1;
            }
        }

        self.ready.notify_one();
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not tokio::sync::mpsc?
//    - An mpsc Receiver has exactly one owner, but we have N workers popping
//    - Sharing it behind a Mutex would hold the lock across recv().await,
//      and then nothing else could close the queue while a worker waits
//
// 2. What does permit.forget() do?
//    - Normally a semaphore permit is returned when it is dropped
//    - forget() keeps the slot taken; pop() hands it back with add_permits(1)
//    - That way a slot stays occupied for as long as the item sits in the queue
//
// 3. Why std::sync::Mutex in async code?
//    - The lock is only held for a push_back / pop_front, never across .await
//    - For short critical sections like these, the std mutex is the right tool
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = WorkQueue::new(4);
        queue.push("a").await.unwrap();
        queue.push("b").await.unwrap();
        queue.push("c").await.unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().await, Some("a"));
        assert_eq!(queue.pop().await, Some("b"));
        assert_eq!(queue.pop().await, Some("c"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_close_drains_then_reports_done() {
        let queue = WorkQueue::new(4);
        queue.push(1).await.unwrap();
        queue.push(2).await.unwrap();
        queue.close();

        assert!(matches!(queue.push(3).await, Err(QueueClosed(3))));
        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_poppers() {
        let queue: Arc<WorkQueue<u32>> = Arc::new(WorkQueue::new(2));

        let popper = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let popped = timeout(Duration::from_secs(1), popper).await.unwrap().unwrap();
        assert_eq!(popped, None);
    }

    #[tokio::test]
    async fn test_full_queue_blocks_second_producer() {
        let queue = Arc::new(WorkQueue::new(1));
        queue.push("first").await.unwrap();
        assert!(matches!(queue.try_push("x"), Err(TryPushError::Full("x"))));

        let second = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push("second").await })
        };

        // Still blocked: nothing was dropped and nothing errored
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!second.is_finished());
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.pop().await, Some("first"));
        timeout(Duration::from_secs(1), second)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(queue.pop().await, Some("second"));
    }

    #[tokio::test]
    async fn test_close_releases_blocked_producer() {
        let queue = Arc::new(WorkQueue::new(1));
        queue.push(1).await.unwrap();

        let blocked = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push(2).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let result = timeout(Duration::from_secs(1), blocked).await.unwrap().unwrap();
        assert!(matches!(result, Err(QueueClosed(2))));
        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn test_force_push_does_not_grow_capacity() {
        let queue = WorkQueue::new(1);
        queue.push(1).await.unwrap();
        queue.force_push(2).unwrap();
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));

        // Exactly one slot again: one push fits, the next does not
        assert!(queue.try_push(3).is_ok());
        assert!(matches!(queue.try_push(4), Err(TryPushError::Full(4))));
    }
}
