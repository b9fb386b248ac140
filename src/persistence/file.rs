//! JSON file backend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::ChaosConfig;
use crate::persistence::{ConfigPersistence, PersistenceError};

#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigPersistence for FilePersistence {
    async fn load(&self) -> Result<Option<ChaosConfig>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, config: &ChaosConfig) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(config)?;
        // Write beside the target and rename, so a crash never leaves half a document.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChaosTarget, FrequencyStrategy};

    #[tokio::test]
    async fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistence::new(dir.path().join("absent.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistence::new(dir.path().join("chaos.json"));

        let mut cfg = ChaosConfig::default();
        cfg.enabled = true;
        cfg.target = ChaosTarget::WebApp;
        cfg.faults.high_memory = true;
        cfg.frequency.strategy = FrequencyStrategy::EveryNSeconds;
        cfg.frequency.every_n_seconds = 12;

        store.save(&cfg).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(cfg));
        assert!(!dir.path().join("chaos.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chaos.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = FilePersistence::new(&path).load().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Serde(_)));
    }
}
