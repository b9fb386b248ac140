//! The chaos engine: configuration, decision and execution behind one handle.

use std::sync::Arc;

use crate::chaos::context::RequestContext;
use crate::chaos::decider::{DeciderState, TriggerDecider};
use crate::chaos::executor::FaultExecutor;
use crate::chaos::fault::{active_fault_kinds, FaultKind};
use crate::chaos::random::{RandomSource, SystemRandom};
use crate::chaos::store::ConfigStore;
use crate::config::validation::clamp_chaos_config;
use crate::config::ChaosConfig;
use crate::persistence::ConfigPersistence;

/// A fault chosen for one request, with the snapshot it was chosen from.
#[derive(Debug, Clone)]
pub struct Injection {
    pub kind: FaultKind,
    pub config: Arc<ChaosConfig>,
}

/// Outcome of evaluating one request.
///
/// `triggered` is the decider's verdict; `injection` is `None` when it did not
/// trigger or when no fault kind is enabled.
#[derive(Debug, Clone)]
pub struct Decision {
    pub triggered: bool,
    pub injection: Option<Injection>,
}

#[derive(Debug)]
pub struct ChaosEngine {
    store: Arc<ConfigStore>,
    decider: TriggerDecider,
    executor: FaultExecutor,
    persistence: Option<Arc<dyn ConfigPersistence>>,
}

impl ChaosEngine {
    /// Engine with OS randomness, fresh decider state and no persistence.
    pub fn new(initial: ChaosConfig) -> Self {
        Self::builder(initial).build()
    }

    pub fn builder(initial: ChaosConfig) -> ChaosEngineBuilder {
        ChaosEngineBuilder {
            initial,
            rng: Arc::new(SystemRandom),
            state: Arc::new(DeciderState::new()),
            executor: None,
            persistence: None,
        }
    }

    pub fn config(&self) -> Arc<ChaosConfig> {
        self.store.get()
    }

    /// Swap in `config`, then persist it. Persistence failures are logged only.
    pub async fn update_config(&self, config: ChaosConfig) {
        self.store.set(config.clone());
        tracing::info!(
            enabled = config.enabled,
            target = ?config.target,
            strategy = ?config.frequency.strategy,
            "Chaos configuration updated"
        );

        if let Some(backend) = &self.persistence {
            if let Err(e) = backend.save(&config).await {
                tracing::warn!(
                    backend = backend.name(),
                    error = %e,
                    "Failed to persist chaos configuration; keeping in-memory copy"
                );
            }
        }
    }

    /// Replace the in-memory configuration with the persisted one, if any.
    ///
    /// The stored document is clamped like admin input before it is applied.
    /// Returns whether a persisted configuration was applied.
    pub async fn load_persisted(&self) -> bool {
        let Some(backend) = &self.persistence else {
            return false;
        };
        match backend.load().await {
            Ok(Some(config)) => {
                tracing::info!(backend = backend.name(), "Loaded persisted chaos configuration");
                self.store.set(clamp_chaos_config(config));
                true
            }
            Ok(None) => {
                tracing::info!(backend = backend.name(), "No persisted chaos configuration, using defaults");
                false
            }
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    error = %e,
                    "Failed to load persisted chaos configuration; using in-memory configuration"
                );
                false
            }
        }
    }

    pub fn should_trigger(&self, context: RequestContext) -> bool {
        self.decider.should_trigger(context)
    }

    pub fn active_fault_kinds(&self) -> Vec<FaultKind> {
        active_fault_kinds(&self.store.get())
    }

    pub fn active_chaos_types(&self) -> Vec<&'static str> {
        self.active_fault_kinds()
            .iter()
            .map(FaultKind::as_str)
            .collect()
    }

    /// Decide and select against a single snapshot.
    pub fn choose(&self, context: RequestContext) -> Decision {
        let config = self.store.get();
        if !self.decider.should_trigger_with(&config, context) {
            return Decision {
                triggered: false,
                injection: None,
            };
        }
        let injection = self
            .executor
            .pick(&active_fault_kinds(&config))
            .map(|kind| Injection { kind, config });
        Decision {
            triggered: true,
            injection,
        }
    }

    pub fn executor(&self) -> &FaultExecutor {
        &self.executor
    }

    pub fn decider(&self) -> &TriggerDecider {
        &self.decider
    }
}

pub struct ChaosEngineBuilder {
    initial: ChaosConfig,
    rng: Arc<dyn RandomSource>,
    state: Arc<DeciderState>,
    executor: Option<FaultExecutor>,
    persistence: Option<Arc<dyn ConfigPersistence>>,
}

impl ChaosEngineBuilder {
    pub fn random(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(mut self, state: Arc<DeciderState>) -> Self {
        self.state = state;
        self
    }

    /// Use a preconfigured executor instead of one built on the engine's random source.
    pub fn executor(mut self, executor: FaultExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn persistence(mut self, backend: Option<Arc<dyn ConfigPersistence>>) -> Self {
        self.persistence = backend;
        self
    }

    pub fn build(self) -> ChaosEngine {
        let store = Arc::new(ConfigStore::new(self.initial));
        let decider = TriggerDecider::new(Arc::clone(&store), self.state, Arc::clone(&self.rng));
        let executor = self
            .executor
            .unwrap_or_else(|| FaultExecutor::new(Arc::clone(&self.rng)));
        ChaosEngine {
            store,
            decider,
            executor,
            persistence: self.persistence,
        }
    }
}
