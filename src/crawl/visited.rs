// src/crawl/visited.rs
// =============================================================================
// The set of URLs this crawl has already claimed.
//
// "Claiming" is check-and-insert as one step under a single lock. Two workers
// that discover the same link at the same moment can never both win.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited. Returns true only for the first caller.
    pub fn try_claim(&self, url: &str) -> bool {
        let mut seen = self.lock();
        if seen.contains(url) {
            return false;
        }
        seen.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // The critical sections never panic midway, so a poisoned set is still
    // consistent and safe to keep using
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
