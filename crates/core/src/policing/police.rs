//! Per-provider request policing.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::store::{InMemoryQuotaStore, QuotaStore};
use super::types::{
    Outcome, PolicingError, QuotaConfig, QuotaState, QuotaStoreError, Reliability,
};

struct Entry {
    config: Option<QuotaConfig>,
    state: QuotaState,
}

/// Quota gate consulted before every provider request.
///
/// The registry map is behind an `RwLock`; each provider's state has its own
/// mutex, so different providers never contend while updates for the same
/// provider serialize.
pub struct RequestPolice {
    entries: RwLock<HashMap<String, Arc<Mutex<Entry>>>>,
    store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
}

impl RequestPolice {
    pub fn new(store: Arc<dyn QuotaStore>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Police backed by an in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryQuotaStore::new()))
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a provider, restoring its persisted state if any.
    ///
    /// A missing config is accepted here; `check` then reports the provider
    /// as misconfigured.
    pub async fn register(
        &self,
        provider: &str,
        config: Option<QuotaConfig>,
    ) -> Result<(), QuotaStoreError> {
        let state = match self.store.load(provider)? {
            Some(state) => state,
            None => QuotaState::new(provider, self.clock.now()),
        };

        if let Some(reason) = config.as_ref().and_then(|c| c.validate().err()) {
            warn!(provider, reason = %reason, "Invalid quota configuration");
        }

        let entry = Arc::new(Mutex::new(Entry { config, state }));
        self.entries
            .write()
            .await
            .insert(provider.to_string(), entry);
        info!(provider, "Registered provider quota");
        Ok(())
    }

    pub async fn is_registered(&self, provider: &str) -> bool {
        self.entries.read().await.contains_key(provider)
    }

    async fn entry(&self, provider: &str) -> Result<Arc<Mutex<Entry>>, PolicingError> {
        self.entries
            .read()
            .await
            .get(provider)
            .cloned()
            .ok_or_else(|| PolicingError::InvalidConfiguration {
                provider: provider.to_string(),
                reason: "provider is not registered".to_string(),
            })
    }

    fn valid_config(provider: &str, entry: &Entry) -> Result<QuotaConfig, PolicingError> {
        let config = entry
            .config
            .clone()
            .ok_or_else(|| PolicingError::InvalidConfiguration {
                provider: provider.to_string(),
                reason: "no quota configured".to_string(),
            })?;
        config
            .validate()
            .map_err(|reason| PolicingError::InvalidConfiguration {
                provider: provider.to_string(),
                reason,
            })?;
        Ok(config)
    }

    fn persist(&self, state: &QuotaState) {
        if let Err(e) = self.store.save(state) {
            warn!(provider = %state.provider, error = %e, "Failed to persist quota state");
        }
    }

    /// Decide whether the provider may be queried now.
    pub async fn check(&self, provider: &str) -> Result<(), PolicingError> {
        let entry = self.entry(provider).await?;
        let mut entry = entry.lock().await;
        let config = Self::valid_config(provider, &entry)?;

        entry.state.advance(&config, self.clock.now());
        self.persist(&entry.state);

        let state = &entry.state;
        if state.daily_count >= config.max_daily {
            debug!(provider, daily_count = state.daily_count, "Daily limit reached");
            return Err(PolicingError::DailyExceeded {
                provider: provider.to_string(),
                max_daily: config.max_daily,
            });
        }
        if state.score > config.max_score {
            debug!(provider, score = state.score, "Score limit reached");
            return Err(PolicingError::ScoreExceeded {
                provider: provider.to_string(),
                score: state.score,
                max_score: config.max_score,
            });
        }
        Ok(())
    }

    /// Charge one completed request to the provider.
    pub async fn record(&self, provider: &str, outcome: Outcome) -> Result<(), PolicingError> {
        let entry = self.entry(provider).await?;
        let mut entry = entry.lock().await;
        let config = Self::valid_config(provider, &entry)?;

        entry.state.advance(&config, self.clock.now());
        entry.state.charge(&config, outcome);
        debug!(
            provider,
            ?outcome,
            score = entry.state.score,
            daily_count = entry.state.daily_count,
            "Recorded request"
        );
        self.persist(&entry.state);
        Ok(())
    }

    /// Current state of a registered provider.
    pub async fn snapshot(&self, provider: &str) -> Option<QuotaState> {
        let entry = self.entry(provider).await.ok()?;
        let state = entry.lock().await.state.clone();
        Some(state)
    }

    /// Reliability sample of a registered provider.
    pub async fn reliability(&self, provider: &str) -> Option<Reliability> {
        self.snapshot(provider)
            .await
            .map(|state| Reliability::from_state(&state))
    }
}
