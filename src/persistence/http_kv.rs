//! Remote key-value store backend.
//!
//! Speaks a minimal REST dialect: `GET {base}/kv/{key}` returns the stored
//! document (404 when absent), `PUT {base}/kv/{key}` replaces it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::ChaosConfig;
use crate::persistence::{ConfigPersistence, PersistenceError};

#[derive(Debug, Clone)]
pub struct HttpKvPersistence {
    client: reqwest::Client,
    url: String,
}

impl HttpKvPersistence {
    pub fn new(base_url: &str, key: &str, timeout: Duration) -> Result<Self, PersistenceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let url = format!(
            "{}/kv/{}",
            base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        );
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ConfigPersistence for HttpKvPersistence {
    async fn load(&self) -> Result<Option<ChaosConfig>, PersistenceError> {
        let response = self.client.get(&self.url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(PersistenceError::Status {
                status: status.as_u16(),
            }),
        }
    }

    async fn save(&self, config: &ChaosConfig) -> Result<(), PersistenceError> {
        let response = self.client.put(&self.url).json(config).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PersistenceError::Status {
                status: status.as_u16(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
