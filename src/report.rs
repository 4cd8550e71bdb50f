// src/report.rs
// =============================================================================
// This module prints crawl results.
//
// Output format (stdout, line oriented):
//   <url>                 one line per page as a worker picks it up
//   Emails Found:         header, only for pages with at least one match
//   <email>               one line per match, in page order
//
// Fetch failures go to stderr as "failed: <url> (<reason>)", so they never
// mix with result lines when stdout is piped somewhere.
//
// Rust concepts:
// - Traits: the crawler talks to a Reporter, tests swap in a recorder
// - Locking stdout: keeps one page's email block from interleaving with
//   another worker's output
// =============================================================================

use crate::fetch::FetchError;
use serde::Serialize;
use std::io::Write;

pub const EMAILS_HEADER: &str = "Emails Found:";
pub const COMPLETED_LINE: &str = "Completed all tasks";

// Receives crawl events as they happen, from any worker
pub trait Reporter: Send + Sync {
    fn visiting(&self, url: &str);
    fn emails_found(&self, url: &str, emails: &[String]);
    fn fetch_failed(&self, url: &str, error: &FetchError);
}

/// Writes results to stdout and failures to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn visiting(&self, url: &str) {
        println!("{}", url);
    }

    fn emails_found(&self, _url: &str, emails: &[String]) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        // A closed stdout (e.g. piped into `head`) is not worth crashing for
        let _ = writeln!(out, "{}", EMAILS_HEADER);
        for email in emails {
            let _ = writeln!(out, "{}", email);
        }
    }

    fn fetch_failed(&self, url: &str, error: &FetchError) {
        eprintln!("failed: {} ({})", url, error);
    }
}

// Final tallies for one crawl, printed with --json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages_visited: usize,
    pub pages_failed: usize,
    /// Pages that answered with something other than HTML
    pub pages_skipped: usize,
    pub emails_found: usize,
    pub cancelled: bool,
}

impl CrawlSummary {
    pub fn exit_code(&self) -> i32 {
        if self.cancelled {
            130
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_fields() {
        let summary = CrawlSummary {
            pages_visited: 2,
            pages_failed: 1,
            pages_skipped: 0,
            emails_found: 3,
            cancelled: false,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["pages_visited"], 2);
        assert_eq!(json["emails_found"], 3);
        assert_eq!(json["cancelled"], false);
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(CrawlSummary::default().exit_code(), 0);
        let cancelled = CrawlSummary {
            cancelled: true,
            ..Default::default()
        };
        assert_eq!(cancelled.exit_code(), 130);
    }
}
