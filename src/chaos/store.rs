//! Chaos configuration store.
//!
//! A lock-free cell holding the current `ChaosConfig`. Readers get an `Arc`
//! snapshot that stays valid after a later `set`; writers replace the whole
//! value, last write wins.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::ChaosConfig;

#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<ChaosConfig>,
}

impl ConfigStore {
    pub fn new(initial: ChaosConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> Arc<ChaosConfig> {
        self.current.load_full()
    }

    /// Replace the snapshot, returning the previous one.
    pub fn set(&self, config: ChaosConfig) -> Arc<ChaosConfig> {
        self.current.swap(Arc::new(config))
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(ChaosConfig::default())
    }
}
