use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::provider::ProviderKind;

/// Validate configuration.
///
/// Quota limits are deliberately not checked here: a provider with a bad or
/// missing quota is reported as misconfigured at search time while the
/// other providers keep working.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let fail = |msg: String| Err(ConfigError::ValidationError(msg));

    // Fetch
    if !(config.fetch.backoff_factor.is_finite() && config.fetch.backoff_factor >= 0.0) {
        return fail("fetch.backoff_factor must be a non-negative number".to_string());
    }
    if config.fetch.timeout_secs == 0 {
        return fail("fetch.timeout_secs cannot be 0".to_string());
    }
    if let Some(code) = config
        .fetch
        .status_forcelist
        .iter()
        .find(|c| !(100..=599).contains(*c))
    {
        return fail(format!("fetch.status_forcelist contains invalid status {code}"));
    }

    // Coordinator
    if config.coordinator.max_concurrent_fetches == 0 {
        return fail("coordinator.max_concurrent_fetches cannot be 0".to_string());
    }

    // Ranking
    let ranking = &config.ranking;
    for (name, weight) in [
        ("trust_weight", ranking.trust_weight),
        ("popularity_weight", ranking.popularity_weight),
        ("quality_weight", ranking.quality_weight),
        ("hint_weight", ranking.hint_weight),
        ("bayes_threshold", ranking.bayes_threshold),
    ] {
        if !(weight.is_finite() && weight >= 0.0) {
            return fail(format!("ranking.{name} must be a non-negative number"));
        }
    }
    if ranking.quality_order.is_empty() {
        return fail("ranking.quality_order cannot be empty".to_string());
    }

    // Providers
    let mut seen = HashSet::new();
    for provider in &config.providers {
        if provider.id.trim().is_empty() {
            return fail("provider id cannot be empty".to_string());
        }
        if !seen.insert(provider.id.as_str()) {
            return fail(format!("duplicate provider id: {}", provider.id));
        }
        if provider.url.trim().is_empty() {
            return fail(format!("provider {} has an empty url", provider.id));
        }
        if provider.kind == ProviderKind::Jackett
            && provider.api_key.as_deref().is_none_or(|k| k.is_empty())
        {
            return fail(format!("provider {} requires an api_key", provider.id));
        }
        if let Some(hint) = provider.trust_hint {
            if !(0.0..=1.0).contains(&hint) {
                return fail(format!(
                    "provider {} trust_hint must be between 0 and 1",
                    provider.id
                ));
            }
        }
    }

    Ok(())
}
