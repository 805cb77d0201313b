use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_core::{
    build_providers, load_config, metrics, validate_config, Config, FetchSession, QuotaStore,
    ReqwestTransport, RequestPolice, SanitizedConfig, SearchCoordinator, SearchRequest,
    SqliteQuotaStore,
};

const USAGE: &str = "usage: scout [REQUEST.json | -]\n       scout config";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so stdout carries only the result document
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let arg = std::env::args().nth(1);
    if matches!(arg.as_deref(), Some("-h" | "--help")) {
        println!("{USAGE}");
        return Ok(());
    }

    // Determine config path
    let config_path = std::env::var("SCOUT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    if arg.as_deref() == Some("config") {
        let sanitized = SanitizedConfig::from(&config);
        println!("{}", serde_json::to_string_pretty(&sanitized)?);
        return Ok(());
    }

    let request = read_request(arg.as_deref())?;
    let coordinator = build_coordinator(&config).await?;

    // Ctrl+C stops the search; finished providers are still ranked
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_signal(cancel.clone()));

    let result = coordinator
        .execute_with_cancel(request, cancel)
        .await
        .context("Search request rejected")?;
    watcher.abort();

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(path) = &config.metrics.textfile {
        match metrics::gather_text() {
            Ok(text) => {
                if let Err(e) = std::fs::write(path, text) {
                    warn!("Failed to write metrics textfile {:?}: {}", path, e);
                }
            }
            Err(e) => warn!("Failed to gather metrics: {}", e),
        }
    }

    Ok(())
}

/// Read the search request JSON from a file, or stdin for `-` / no argument.
fn read_request(arg: Option<&str>) -> Result<SearchRequest> {
    let json = match arg {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request from {:?}", path))?,
    };
    serde_json::from_str(&json).context("Invalid search request JSON")
}

async fn build_coordinator(config: &Config) -> Result<SearchCoordinator> {
    let store: Arc<dyn QuotaStore> = Arc::new(
        SqliteQuotaStore::new(&config.database.path).context("Failed to open quota store")?,
    );
    info!("Quota store at {:?}", config.database.path);

    let police = Arc::new(RequestPolice::new(store));
    for provider in &config.providers {
        police
            .register(&provider.id, provider.quota.clone())
            .await
            .with_context(|| format!("Failed to restore quota state for {}", provider.id))?;
    }

    let transport = ReqwestTransport::new(Duration::from_secs(config.fetch.timeout_secs))
        .context("Failed to create HTTP client")?;
    let session = Arc::new(FetchSession::new(config.fetch.clone(), Arc::new(transport)));

    let providers = build_providers(&config.providers);
    info!("Registered {} providers", providers.len());

    Ok(SearchCoordinator::new(
        config.coordinator.clone(),
        providers,
        session,
        police,
        config.ranking.clone(),
    ))
}

/// Cancel the token on Ctrl+C or SIGTERM.
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, cancelling search");
    cancel.cancel();
}
