//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, metrics and persistence in dependency order
//! - Restore the persisted chaos configuration
//! - Apply the long-startup fault before any port is bound
//! - Bind the listener, start the config watcher and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::chaos::{ChaosEngine, RandomSource, SystemRandom};
use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, ChaosConfig, ConfigError, ProxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};
use crate::persistence::{self, PersistenceError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence setup failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delay to apply before binding, if the long-startup fault is armed.
pub fn simulate_long_startup(config: &ChaosConfig, rng: &dyn RandomSource) -> Option<Duration> {
    if !config.enabled || !config.faults.long_startup {
        return None;
    }
    let (min, max) = config.ranges.startup_duration_ms.ordered();
    Some(Duration::from_millis(u64::from(rng.between(min, max))))
}

/// Run the proxy until a shutdown signal arrives.
///
/// With no `config_path` the built-in defaults are used and hot reload is off.
pub async fn launch(config_path: Option<&Path>) -> Result<(), StartupError> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        chaos_enabled = config.chaos.enabled,
        "chaos-proxy starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let backend = persistence::from_config(&config.persistence)?;
    let engine = Arc::new(
        ChaosEngine::builder(config.chaos.clone())
            .persistence(backend)
            .build(),
    );
    if engine.load_persisted().await {
        tracing::info!("Restored persisted chaos configuration");
    }

    if let Some(delay) = simulate_long_startup(&engine.config(), &SystemRandom) {
        tracing::warn!(delay_ms = delay.as_millis() as u64, "Simulating long startup");
        tokio::time::sleep(delay).await;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher handle must outlive the server for reloads to keep flowing.
    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    (None, updates)
                }
            }
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    signals::install(shutdown.clone());

    let server = HttpServer::with_engine(config, engine);
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
