//! Provider construction from configuration.

use std::sync::Arc;

use tracing::info;

use super::config::{ProviderConfig, ProviderKind};
use super::eztv::EztvProvider;
use super::jackett::JackettProvider;
use super::torznab::TorznabProvider;
use super::traits::Provider;

/// Build one provider.
pub fn build_provider(config: &ProviderConfig) -> Arc<dyn Provider> {
    match config.kind {
        ProviderKind::Jackett => Arc::new(JackettProvider::new(config.clone())),
        ProviderKind::Torznab => Arc::new(TorznabProvider::new(config.clone())),
        ProviderKind::Eztv => Arc::new(EztvProvider::new(config.clone())),
    }
}

/// Build every configured provider, in configuration order.
///
/// Disabled providers are still built; they decline every request through
/// `accepts`.
pub fn build_providers(configs: &[ProviderConfig]) -> Vec<Arc<dyn Provider>> {
    configs
        .iter()
        .map(|config| {
            info!(provider = %config.id, kind = %config.kind, enabled = config.enabled, "Building provider");
            build_provider(config)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_providers_keeps_order_and_kind() {
        let configs = vec![
            ProviderConfig::new("t", ProviderKind::Torznab, "http://t"),
            ProviderConfig::new("j", ProviderKind::Jackett, "http://j"),
            ProviderConfig::new("e", ProviderKind::Eztv, "http://e"),
        ];
        let providers = build_providers(&configs);
        let ids: Vec<_> = providers.iter().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, vec!["t", "j", "e"]);
        assert_eq!(providers[0].kind(), ProviderKind::Torznab);
        assert_eq!(providers[1].kind(), ProviderKind::Jackett);
        assert_eq!(providers[2].kind(), ProviderKind::Eztv);
    }
}
