//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → `chaos` section seeds the chaos engine
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps in the new chaos section
//!
//! On admin update:
//!     validation.rs clamps the submitted ChaosConfig
//!     → engine swaps it in and persists it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full replacement
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod chaos;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use chaos::{
    Bounds, ChaosConfig, ChaosTarget, FaultToggles, FixedParameters, FrequencyConfig,
    FrequencyStrategy, RangedParameters,
};
pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, ListenerConfig, ObservabilityConfig, PersistenceBackend, PersistenceConfig,
    ProxyConfig, RoutingConfig, TimeoutConfig, UpstreamConfig,
};
