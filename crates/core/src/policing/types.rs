//! Quota configuration, state and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-provider quota limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Rolling score at which the provider is policed.
    pub max_score: f64,

    /// Requests allowed per 24h window.
    pub max_daily: u32,

    /// Score added per successful request.
    #[serde(default = "default_request_weight")]
    pub request_weight: f64,

    /// Score added per failed request. Defaults to `request_weight`.
    #[serde(default)]
    pub failure_weight: Option<f64>,

    /// Score removed per elapsed minute.
    #[serde(default)]
    pub score_decay_per_minute: f64,
}

fn default_request_weight() -> f64 {
    1.0
}

impl QuotaConfig {
    pub fn new(max_score: f64, max_daily: u32) -> Self {
        Self {
            max_score,
            max_daily,
            request_weight: default_request_weight(),
            failure_weight: None,
            score_decay_per_minute: 0.0,
        }
    }

    pub fn with_request_weight(mut self, weight: f64) -> Self {
        self.request_weight = weight;
        self
    }

    pub fn with_failure_weight(mut self, weight: f64) -> Self {
        self.failure_weight = Some(weight);
        self
    }

    pub fn with_decay(mut self, per_minute: f64) -> Self {
        self.score_decay_per_minute = per_minute;
        self
    }

    /// Weight charged for one request with the given outcome.
    pub fn weight_for(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Success => self.request_weight,
            Outcome::Failure => self.failure_weight.unwrap_or(self.request_weight),
        }
    }

    /// Check the limits are usable. Returns the reason when they are not.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_score.is_finite() && self.max_score > 0.0) {
            return Err(format!("max_score must be positive, got {}", self.max_score));
        }
        if self.max_daily == 0 {
            return Err("max_daily must be positive".to_string());
        }
        if !(self.request_weight.is_finite() && self.request_weight > 0.0) {
            return Err(format!(
                "request_weight must be positive, got {}",
                self.request_weight
            ));
        }
        if let Some(weight) = self.failure_weight {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(format!("failure_weight must be positive, got {weight}"));
            }
        }
        if !(self.score_decay_per_minute.is_finite() && self.score_decay_per_minute >= 0.0) {
            return Err(format!(
                "score_decay_per_minute must not be negative, got {}",
                self.score_decay_per_minute
            ));
        }
        Ok(())
    }
}

/// Result of one fetch attempt, as far as quotas care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// Usage counters for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaState {
    pub provider: String,
    /// Rolling request score (never negative).
    pub score: f64,
    /// Requests recorded in the current window.
    pub daily_count: u32,
    pub window_start: DateTime<Utc>,
    pub last_decay: DateTime<Utc>,
    /// Lifetime successful requests.
    pub successes: u64,
    /// Lifetime failed requests.
    pub failures: u64,
}

impl QuotaState {
    /// Fresh state with the window opening at `now`.
    pub fn new(provider: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            provider: provider.into(),
            score: 0.0,
            daily_count: 0,
            window_start: now,
            last_decay: now,
            successes: 0,
            failures: 0,
        }
    }

    /// Decay the score and roll the daily window over.
    pub fn advance(&mut self, config: &QuotaConfig, now: DateTime<Utc>) {
        if now > self.last_decay {
            let elapsed_ms = (now - self.last_decay).num_milliseconds() as f64;
            let decay = config.score_decay_per_minute * elapsed_ms / 60_000.0;
            self.score = (self.score - decay).max(0.0);
            self.last_decay = now;
        }

        if now >= self.window_start + chrono::Duration::hours(24) {
            self.daily_count = 0;
            self.window_start = now;
        }
    }

    /// Charge one request against the quota.
    pub fn charge(&mut self, config: &QuotaConfig, outcome: Outcome) {
        self.score += config.weight_for(outcome);
        self.daily_count = self.daily_count.saturating_add(1);
        match outcome {
            Outcome::Success => self.successes += 1,
            Outcome::Failure => self.failures += 1,
        }
    }

    /// Lifetime sample size used by ranking.
    pub fn sample_size(&self) -> u64 {
        self.successes + self.failures
    }
}

/// Provider reliability sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reliability {
    pub sample_size: u64,
    /// `successes / sample_size`, 0 when there is no sample.
    pub raw_score: f64,
}

impl Reliability {
    pub fn from_state(state: &QuotaState) -> Self {
        let sample_size = state.sample_size();
        let raw_score = if sample_size == 0 {
            0.0
        } else {
            state.successes as f64 / sample_size as f64
        };
        Self {
            sample_size,
            raw_score,
        }
    }
}

/// Why a provider may not be queried right now.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PolicingError {
    #[error("Provider {provider} score {score:.2} reached limit {max_score:.2}")]
    ScoreExceeded {
        provider: String,
        score: f64,
        max_score: f64,
    },

    #[error("Provider {provider} reached its daily limit of {max_daily} requests")]
    DailyExceeded { provider: String, max_daily: u32 },

    #[error("Provider {provider} has an invalid quota configuration: {reason}")]
    InvalidConfiguration { provider: String, reason: String },
}

impl PolicingError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            PolicingError::ScoreExceeded { .. } => "score_exceeded",
            PolicingError::DailyExceeded { .. } => "daily_exceeded",
            PolicingError::InvalidConfiguration { .. } => "invalid_configuration",
        }
    }

    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, PolicingError::InvalidConfiguration { .. })
    }
}

/// Errors from quota persistence.
#[derive(Debug, Error)]
pub enum QuotaStoreError {
    #[error("Database error: {0}")]
    Database(String),
}
