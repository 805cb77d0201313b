//! Coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the search coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Provider fetches in flight at once per search.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_fetches: usize,

    /// Whole-search deadline in seconds. Unfinished providers are cancelled
    /// when it passes.
    #[serde(default)]
    pub search_deadline_secs: Option<u64>,
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent(),
            search_deadline_secs: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max;
        self
    }

    pub fn with_deadline(mut self, secs: u64) -> Self {
        self.search_deadline_secs = Some(secs);
        self
    }

    /// Fan-out width, never zero.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.search_deadline_secs.map(Duration::from_secs)
    }
}
