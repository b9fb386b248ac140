//! Hot reload of the `chaos` section from the configuration file.
//!
//! Listener, upstream and admin settings are read once at startup; a change to
//! them needs a restart. Only the clamped chaos section is forwarded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::chaos::ChaosConfig;
use crate::config::loader::load_config;

/// Watches one configuration file and emits its chaos section on change.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ChaosConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its update channel.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ChaosConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching on notify's background thread.
    ///
    /// Reloads stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_change(&event.kind) => {
                    if let Some(chaos) = reload(&reload_path) {
                        let _ = update_tx.send(chaos);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    kind.is_modify() || kind.is_create()
}

/// Re-read the file. Invalid files are logged and ignored.
fn reload(path: &Path) -> Option<ChaosConfig> {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                enabled = config.chaos.enabled,
                "Chaos configuration reloaded from file"
            );
            Some(config.chaos)
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to reload config, keeping current chaos configuration"
            );
            None
        }
    }
}
