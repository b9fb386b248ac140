//! Chaos injection subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → context.rs (excluded? api or app?)
//!     → decider.rs (inject now? one config snapshot per request)
//!     → fault.rs (enabled kinds in declaration order)
//!     → executor.rs (pick one, resolve parameters, apply)
//!     → Forward / ForwardThenDelay / Respond
//! ```
//!
//! # Design Decisions
//! - Configuration lives in an `ArcSwap`; it is replaced, never edited
//! - Decider state is owned and injected, not global
//! - All randomness goes through `RandomSource`

pub mod context;
pub mod decider;
pub mod engine;
pub mod executor;
pub mod fault;
pub mod random;
pub mod store;

pub use context::{Classifier, RequestContext};
pub use decider::{DeciderState, TriggerDecider};
pub use engine::{ChaosEngine, ChaosEngineBuilder, Decision, Injection};
pub use executor::{ChaosErrorBody, Disposition, FaultExecutor};
pub use fault::{active_fault_kinds, FaultKind};
pub use random::{RandomSource, SeededRandom, SystemRandom};
pub use store::ConfigStore;
