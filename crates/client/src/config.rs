//! Configuration for the printer link.

use std::time::Duration;

/// Settings for one printer link.
///
/// A single timeout governs every blocking operation in a poll cycle —
/// connect, send, and receive — matching the protocol's strictly sequential
/// request/response discipline. No operation may block indefinitely.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Maximum time for each blocking operation (connect, send, receive).
    pub timeout: Duration,
    /// Record every command's raw decoded response under a
    /// `Debug(<command>)` field, independent of the semantic transform.
    pub debug: bool,
}

impl LinkConfig {
    /// Create a config with an explicit timeout and debug toggle.
    pub fn new(timeout: Duration, debug: bool) -> Self {
        Self { timeout, debug }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), false)
    }
}
