//! Retry policy configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the resilient fetch session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchConfig {
    /// Total attempts per request (minimum 1).
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Sleep `backoff_factor * 2^(attempt - 1)` seconds after a failed attempt.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Response statuses that are retried.
    #[serde(default = "default_status_forcelist")]
    pub status_forcelist: Vec<u16>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_status_forcelist() -> Vec<u16> {
    vec![500, 502, 503, 504, 509]
}

fn default_timeout() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            backoff_factor: default_backoff_factor(),
            status_forcelist: default_status_forcelist(),
            timeout_secs: default_timeout(),
        }
    }
}

impl FetchConfig {
    /// Sets the number of attempts.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the backoff factor.
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn is_forced(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Attempts actually made, never fewer than one.
    pub fn max_attempts(&self) -> u32 {
        self.retries.max(1)
    }
}
