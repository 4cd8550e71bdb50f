// src/email.rs
// =============================================================================
// This module finds email addresses in page text.
//
// It is a purely lexical scan: a run of local-part characters, an '@', one or
// more domain labels, a dot and a suffix of at least two letters. Nothing is
// validated beyond the shape (no DNS lookups, no RFC 5322 grammar).
//
// Rust concepts:
// - Lazy statics: the regex is compiled once, on first use
// - Iterators: find_iter() yields non-overlapping matches left to right
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;

// The pattern is a constant, so a failure to compile it is a programmer error
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap()
});

/// Scans page text for email-address shaped substrings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailScanner;

impl EmailScanner {
    pub fn new() -> Self {
        Self
    }

    // Returns every non-overlapping match, in order of first appearance.
    //
    // Duplicates within the same text are kept: the caller prints exactly
    // what the page contains.
    pub fn scan(&self, text: &str) -> Vec<String> {
        EMAIL_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
