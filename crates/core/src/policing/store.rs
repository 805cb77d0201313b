//! Quota state persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use super::types::{QuotaState, QuotaStoreError};

/// Storage for per-provider quota state.
pub trait QuotaStore: Send + Sync {
    /// Load the stored state for a provider, if any.
    fn load(&self, provider: &str) -> Result<Option<QuotaState>, QuotaStoreError>;

    /// Insert or replace the state for `state.provider`.
    fn save(&self, state: &QuotaState) -> Result<(), QuotaStoreError>;

    /// All stored states, ordered by provider.
    fn list(&self) -> Result<Vec<QuotaState>, QuotaStoreError>;
}

/// Process-local store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct InMemoryQuotaStore {
    states: Mutex<HashMap<String, QuotaState>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, QuotaState>>, QuotaStoreError> {
        self.states
            .lock()
            .map_err(|_| QuotaStoreError::Database("quota store lock poisoned".to_string()))
    }
}

impl QuotaStore for InMemoryQuotaStore {
    fn load(&self, provider: &str) -> Result<Option<QuotaState>, QuotaStoreError> {
        Ok(self.lock()?.get(provider).cloned())
    }

    fn save(&self, state: &QuotaState) -> Result<(), QuotaStoreError> {
        self.lock()?.insert(state.provider.clone(), state.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<QuotaState>, QuotaStoreError> {
        let mut states: Vec<QuotaState> = self.lock()?.values().cloned().collect();
        states.sort_by(|a, b| a.provider.cmp(&b.provider));
        Ok(states)
    }
}
