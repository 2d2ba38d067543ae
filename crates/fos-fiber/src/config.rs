//! Reconciler Configuration

use std::time::Duration;

/// Reconciler configuration options
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Keep performing units of work while the deadline reports at least this
    /// much time remaining
    pub yield_threshold: Duration,

    /// Maximum render passes a single `flush` may run before giving up
    pub max_flush_passes: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            max_flush_passes: 1000,
        }
    }
}

impl ReconcilerConfig {
    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_max_flush_passes(mut self, passes: usize) -> Self {
        self.max_flush_passes = passes;
        self
    }
}
