//! Chaos configuration persistence.
//!
//! # Data Flow
//! ```text
//! startup:  backend.load() → Some(cfg) → engine.update (no save)
//! update:   admin PUT → engine swaps config → backend.save(cfg)
//! ```
//!
//! # Design Decisions
//! - The in-memory configuration is authoritative; persistence is best effort
//! - Callers log backend failures and carry on

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{ChaosConfig, PersistenceBackend, PersistenceConfig};

pub mod file;
pub mod http_kv;

pub use file::FilePersistence;
pub use http_kv::HttpKvPersistence;

/// Error type for persistence backends.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from key-value store")]
    Status { status: u16 },
}

/// Load/save contract for the chaos configuration document.
#[async_trait]
pub trait ConfigPersistence: Send + Sync + std::fmt::Debug {
    /// Stored configuration, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<ChaosConfig>, PersistenceError>;

    async fn save(&self, config: &ChaosConfig) -> Result<(), PersistenceError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Build the backend selected in the configuration.
pub fn from_config(
    config: &PersistenceConfig,
) -> Result<Option<Arc<dyn ConfigPersistence>>, PersistenceError> {
    let backend: Option<Arc<dyn ConfigPersistence>> = match config.backend {
        PersistenceBackend::None => None,
        PersistenceBackend::File => Some(Arc::new(FilePersistence::new(&config.path))),
        PersistenceBackend::Http => Some(Arc::new(HttpKvPersistence::new(
            &config.url,
            &config.key,
            Duration::from_secs(config.timeout_secs),
        )?)),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_backend_builds_nothing() {
        let config = PersistenceConfig::default();
        assert!(from_config(&config).unwrap().is_none());
    }

    #[test]
    fn selects_backend() {
        let mut config = PersistenceConfig::default();
        config.backend = PersistenceBackend::File;
        assert_eq!(from_config(&config).unwrap().unwrap().name(), "file");

        config.backend = PersistenceBackend::Http;
        assert_eq!(from_config(&config).unwrap().unwrap().name(), "http");
    }
}
