use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::coordinator::CoordinatorConfig;
use crate::fetch::FetchConfig;
use crate::policing::QuotaConfig;
use crate::provider::{ProviderConfig, ProviderKind};
use crate::scoring::RankingPolicy;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub ranking: RankingPolicy,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file holding provider quota state.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("scout.db")
}

/// Metrics export configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Prometheus textfile written after each search (node-exporter textfile
    /// collector format).
    #[serde(default)]
    pub textfile: Option<PathBuf>,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub database: DatabaseConfig,
    pub fetch: FetchConfig,
    pub coordinator: CoordinatorConfig,
    pub ranking: RankingPolicy,
    pub metrics: MetricsConfig,
    pub providers: Vec<SanitizedProviderConfig>,
}

/// Sanitized provider config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub id: String,
    pub kind: ProviderKind,
    pub url: String,
    pub api_key_configured: bool,
    pub enabled: bool,
    pub daily: bool,
    pub backlog: bool,
    pub season_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaConfig>,
}

impl From<&ProviderConfig> for SanitizedProviderConfig {
    fn from(p: &ProviderConfig) -> Self {
        Self {
            id: p.id.clone(),
            kind: p.kind,
            url: p.url.clone(),
            api_key_configured: p.api_key.as_deref().is_some_and(|k| !k.is_empty()),
            enabled: p.enabled,
            daily: p.daily,
            backlog: p.backlog,
            season_search: p.season_search,
            quota: p.quota.clone(),
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            database: config.database.clone(),
            fetch: config.fetch.clone(),
            coordinator: config.coordinator.clone(),
            ranking: config.ranking.clone(),
            metrics: config.metrics.clone(),
            providers: config.providers.iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database.path, PathBuf::from("scout.db"));
        assert_eq!(config.fetch.retries, 3);
        assert_eq!(config.coordinator.max_concurrent_fetches, 4);
        assert!(config.metrics.textfile.is_none());
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_deserialize_providers() {
        let toml = r#"
[ranking]
trust_weight = 0.5
quality_order = ["sd_tv", "hd_tv", "full_hd_web_dl"]

[[providers]]
id = "jackett"
kind = "jackett"
url = "http://localhost:9117"
api_key = "secret"
season_search = true

[providers.quota]
max_score = 50.0
max_daily = 500
score_decay_per_minute = 0.5

[[providers]]
id = "eztv"
kind = "eztv"
url = "https://eztv.example"
enabled = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ranking.trust_weight, 0.5);
        assert_eq!(config.ranking.popularity_weight, 0.2);
        assert_eq!(config.ranking.quality_order.max_ordinal(), 3);
        assert_eq!(config.providers.len(), 2);

        let jackett = &config.providers[0];
        assert!(jackett.season_search);
        let quota = jackett.quota.as_ref().unwrap();
        assert_eq!(quota.max_daily, 500);
        assert_eq!(quota.score_decay_per_minute, 0.5);

        assert!(!config.providers[1].enabled);
        assert!(config.providers[1].quota.is_none());
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let toml = r#"
[[providers]]
id = "jackett"
kind = "jackett"
url = "http://localhost:9117"
api_key = "super-secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.providers[0].api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
    }
}
