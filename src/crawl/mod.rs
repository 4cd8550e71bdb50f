// src/crawl/mod.rs
// =============================================================================
// This module is the concurrent crawl scheduler.
//
// Pieces, leaf first:
// - visited: the claim-once URL set
// - queue: the bounded FIFO between discovery and the workers
// - completion: counts outstanding work and says when the crawl is drained
// - extract: scope filter + claim, turning raw links into work items
// - session: the Crawler that owns all of the above for one run
//
// Only the Crawler is visible outside this module.
// =============================================================================

mod completion;
mod extract;
mod queue;
mod session;
mod visited;

pub use session::Crawler;
