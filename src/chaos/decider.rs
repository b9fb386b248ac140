//! Trigger decider.
//!
//! Answers "inject now?" for one request. Three strategies, selected by the
//! configuration:
//!
//! - `EveryNRequests`: shared atomic counter, fires on multiples of n
//! - `EveryNSeconds`: shared timestamp, fires when n seconds have passed
//!   since the last firing
//! - `Percentage`: independent draw per call, no shared state
//!
//! The counter and timestamp live in a `DeciderState` owned by whoever builds
//! the decider. They are not reset when the configuration changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::chaos::context::RequestContext;
use crate::chaos::random::RandomSource;
use crate::chaos::store::ConfigStore;
use crate::config::{ChaosConfig, ChaosTarget, FrequencyStrategy};

/// Mutable state shared by every evaluation.
#[derive(Debug, Default)]
pub struct DeciderState {
    request_counter: AtomicU64,
    /// `None` until the first time-based trigger.
    last_trigger: Mutex<Option<Instant>>,
}

impl DeciderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `EveryNRequests` evaluations so far.
    pub fn request_count(&self) -> u64 {
        self.request_counter.load(Ordering::SeqCst)
    }

    fn next_request(&self) -> u64 {
        self.request_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Check-and-set under one lock.
    fn try_claim_window(&self, window: Duration) -> bool {
        let mut last = self
            .last_trigger
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let due = match *last {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= window,
        };
        if due {
            *last = Some(now);
        }
        due
    }
}

/// Per-request trigger decision.
#[derive(Debug, Clone)]
pub struct TriggerDecider {
    store: Arc<ConfigStore>,
    state: Arc<DeciderState>,
    rng: Arc<dyn RandomSource>,
}

impl TriggerDecider {
    pub fn new(store: Arc<ConfigStore>, state: Arc<DeciderState>, rng: Arc<dyn RandomSource>) -> Self {
        Self { store, state, rng }
    }

    pub fn state(&self) -> &Arc<DeciderState> {
        &self.state
    }

    /// Decide against the current configuration snapshot.
    pub fn should_trigger(&self, context: RequestContext) -> bool {
        let config = self.store.get();
        self.should_trigger_with(&config, context)
    }

    /// Decide against a snapshot the caller already holds.
    pub fn should_trigger_with(&self, config: &ChaosConfig, context: RequestContext) -> bool {
        if !config.enabled {
            return false;
        }

        match (config.target, context) {
            (ChaosTarget::WebApi, RequestContext::App) => return false,
            (ChaosTarget::WebApp, RequestContext::Api) => return false,
            _ => {}
        }

        let freq = &config.frequency;
        match freq.strategy {
            FrequencyStrategy::EveryNRequests => {
                let n = u64::from(freq.every_n_requests.max(1));
                self.state.next_request() % n == 0
            }
            FrequencyStrategy::EveryNSeconds => {
                let window = Duration::from_secs(u64::from(freq.every_n_seconds.max(1)));
                self.state.try_claim_window(window)
            }
            FrequencyStrategy::Percentage => self.rng.below(100) < freq.percentage,
        }
    }
}
