//! Provider configuration.

use serde::{Deserialize, Serialize};

use crate::policing::QuotaConfig;
use crate::search::{SearchMode, SearchRequest};

/// Provider families.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Jackett JSON results API.
    Jackett,
    /// Torznab RSS feed.
    Torznab,
    /// EZTV HTML search pages.
    Eztv,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Jackett => write!(f, "jackett"),
            ProviderKind::Torznab => write!(f, "torznab"),
            ProviderKind::Eztv => write!(f, "eztv"),
        }
    }
}

/// One `[[providers]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Unique provider identifier.
    pub id: String,
    pub kind: ProviderKind,
    /// Base URL (e.g., "http://localhost:9117").
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Jackett indexer to query.
    #[serde(default = "default_indexer")]
    pub indexer: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Serves daily searches.
    #[serde(default = "default_true")]
    pub daily: bool,
    /// Serves backlog and manual searches.
    #[serde(default = "default_true")]
    pub backlog: bool,
    /// Supports whole-season queries.
    #[serde(default)]
    pub season_search: bool,
    /// Reliability hint applied to every candidate, in [0, 1].
    #[serde(default)]
    pub trust_hint: Option<f64>,
    /// Quota limits. Without them the provider is never queried.
    #[serde(default)]
    pub quota: Option<QuotaConfig>,
}

fn default_indexer() -> String {
    "all".to_string()
}

fn default_true() -> bool {
    true
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>, kind: ProviderKind, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            url: url.into(),
            api_key: None,
            indexer: default_indexer(),
            enabled: true,
            daily: true,
            backlog: true,
            season_search: false,
            trust_hint: None,
            quota: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_quota(mut self, quota: QuotaConfig) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn with_season_search(mut self, supported: bool) -> Self {
        self.season_search = supported;
        self
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Enabled, serving this mode, and able to honour season search.
    pub fn accepts(&self, request: &SearchRequest) -> bool {
        if !self.enabled {
            return false;
        }
        let serves_mode = match request.mode() {
            SearchMode::Daily => self.daily,
            SearchMode::Backlog => self.backlog,
        };
        serves_mode && (!request.options.season_search || self.season_search)
    }
}
