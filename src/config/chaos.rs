//! Chaos configuration schema.
//!
//! A `ChaosConfig` is always replaced as a whole; nothing in the crate mutates
//! a live configuration in place.

use serde::{Deserialize, Serialize};

/// Which request contexts are eligible for chaos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaosTarget {
    /// Browser-facing pages only (`app` context).
    WebApp,
    /// API endpoints only (`api` context).
    WebApi,
    #[default]
    Both,
}

/// How often chaos fires once a request is eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyStrategy {
    EveryNRequests,
    EveryNSeconds,
    #[default]
    Percentage,
}

/// Root chaos configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChaosConfig {
    /// Master switch.
    pub enabled: bool,

    /// Eligible request contexts.
    pub target: ChaosTarget,

    /// Draw durations and sizes from `ranges` instead of `fixed`.
    pub use_ranged_parameters: bool,

    /// Per-fault enable flags.
    pub faults: FaultToggles,

    /// Fixed fault parameters.
    pub fixed: FixedParameters,

    /// Min/max fault parameters.
    pub ranges: RangedParameters,

    /// Trigger frequency.
    pub frequency: FrequencyConfig,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: ChaosTarget::Both,
            use_ranged_parameters: false,
            faults: FaultToggles::default(),
            fixed: FixedParameters::default(),
            ranges: RangedParameters::default(),
            frequency: FrequencyConfig::default(),
        }
    }
}

/// One flag per fault kind. All off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FaultToggles {
    pub high_cpu: bool,
    pub high_memory: bool,
    pub high_latency: bool,
    pub slow_response: bool,
    pub error_404: bool,
    pub error_429: bool,
    pub error_500: bool,
    pub error_503: bool,
    pub stack_overflow: bool,
    pub random_errors: bool,
    /// Delay process startup. Applied once by the lifecycle layer, never per request.
    pub long_startup: bool,
}

/// Fixed durations (ms) and sizes (MB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FixedParameters {
    pub cpu_duration_ms: u32,
    pub memory_size_mb: u32,
    pub latency_ms: u32,
    pub slow_response_ms: u32,
}

impl Default for FixedParameters {
    fn default() -> Self {
        Self {
            cpu_duration_ms: 2000,
            memory_size_mb: 100,
            latency_ms: 3000,
            slow_response_ms: 5000,
        }
    }
}

/// Inclusive `[min, max]` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Bounds as `(low, high)` with `low <= high`, whatever order they were given in.
    pub fn ordered(&self) -> (u32, u32) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }
}

/// Ranged durations (ms) and sizes (MB), used when `use_ranged_parameters` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RangedParameters {
    pub cpu_duration_ms: Bounds,
    pub memory_size_mb: Bounds,
    pub latency_ms: Bounds,
    pub slow_response_ms: Bounds,
    /// Always ranged; there is no fixed startup delay.
    pub startup_duration_ms: Bounds,
}

impl Default for RangedParameters {
    fn default() -> Self {
        Self {
            cpu_duration_ms: Bounds::new(500, 5000),
            memory_size_mb: Bounds::new(50, 500),
            latency_ms: Bounds::new(500, 10_000),
            slow_response_ms: Bounds::new(500, 10_000),
            startup_duration_ms: Bounds::new(5000, 30_000),
        }
    }
}

/// Frequency strategy and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrequencyConfig {
    pub strategy: FrequencyStrategy,
    pub every_n_requests: u32,
    pub every_n_seconds: u32,
    /// 0..=100
    pub percentage: u32,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            strategy: FrequencyStrategy::Percentage,
            every_n_requests: 10,
            every_n_seconds: 30,
            percentage: 10,
        }
    }
}
