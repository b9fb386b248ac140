//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of the proxy file (serde handles syntactic)
//! - Clamp chaos configuration submitted through the admin API into sane bounds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Clamping never fails; the chaos engine downstream does not re-validate

use std::net::SocketAddr;

use crate::config::chaos::{Bounds, ChaosConfig};
use crate::config::schema::{PersistenceBackend, ProxyConfig};

const CPU_MS: (u32, u32) = (100, 30_000);
const MEMORY_MB: (u32, u32) = (10, 2_000);
const DELAY_MS: (u32, u32) = (100, 60_000);
const STARTUP_MIN_MS: (u32, u32) = (1_000, 120_000);
const STARTUP_MAX_MS: (u32, u32) = (1_000, 300_000);

/// A single semantic problem in a proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {value} exceeds maximum {max}")]
    TooLarge { field: &'static str, value: u32, max: u32 },

    #[error("{field}: min {min} is greater than max {max}")]
    InvertedRange { field: &'static str, min: u32, max: u32 },

    #[error("{field}: must start with '/'")]
    NotAPath { field: &'static str },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },
}

/// Check a loaded proxy configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_address(&mut errors, "upstream.address", &config.upstream.address);

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if !config.routing.api_prefix.starts_with('/') {
        errors.push(ValidationError::NotAPath { field: "routing.api_prefix" });
    }
    if config.routing.excluded_prefixes.iter().any(|p| !p.starts_with('/')) {
        errors.push(ValidationError::NotAPath { field: "routing.excluded_prefixes" });
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::Empty { field: "admin.api_key" });
        }
    }

    match config.persistence.backend {
        PersistenceBackend::None => {}
        PersistenceBackend::File if config.persistence.path.is_empty() => {
            errors.push(ValidationError::Empty { field: "persistence.path" });
        }
        PersistenceBackend::File => {}
        PersistenceBackend::Http => {
            if config.persistence.url.is_empty() {
                errors.push(ValidationError::Empty { field: "persistence.url" });
            }
            if config.persistence.key.is_empty() {
                errors.push(ValidationError::Empty { field: "persistence.key" });
            }
        }
    }

    validate_chaos(&mut errors, &config.chaos);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn validate_chaos(errors: &mut Vec<ValidationError>, chaos: &ChaosConfig) {
    let freq = &chaos.frequency;
    if freq.every_n_requests == 0 {
        errors.push(ValidationError::Zero { field: "chaos.frequency.every_n_requests" });
    }
    if freq.every_n_seconds == 0 {
        errors.push(ValidationError::Zero { field: "chaos.frequency.every_n_seconds" });
    }
    if freq.percentage > 100 {
        errors.push(ValidationError::TooLarge {
            field: "chaos.frequency.percentage",
            value: freq.percentage,
            max: 100,
        });
    }

    let ranges = [
        ("chaos.ranges.cpu_duration_ms", chaos.ranges.cpu_duration_ms),
        ("chaos.ranges.memory_size_mb", chaos.ranges.memory_size_mb),
        ("chaos.ranges.latency_ms", chaos.ranges.latency_ms),
        ("chaos.ranges.slow_response_ms", chaos.ranges.slow_response_ms),
        ("chaos.ranges.startup_duration_ms", chaos.ranges.startup_duration_ms),
    ];
    for (field, bounds) in ranges {
        if bounds.min > bounds.max {
            errors.push(ValidationError::InvertedRange {
                field,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }
}

/// Force every chaos parameter into its accepted range.
///
/// This is the boundary between operator input and the engine.
pub fn clamp_chaos_config(mut config: ChaosConfig) -> ChaosConfig {
    let fixed = &mut config.fixed;
    fixed.cpu_duration_ms = clamp(fixed.cpu_duration_ms, CPU_MS);
    fixed.memory_size_mb = clamp(fixed.memory_size_mb, MEMORY_MB);
    fixed.latency_ms = clamp(fixed.latency_ms, DELAY_MS);
    fixed.slow_response_ms = clamp(fixed.slow_response_ms, DELAY_MS);

    let ranges = &mut config.ranges;
    ranges.cpu_duration_ms = clamp_bounds(ranges.cpu_duration_ms, CPU_MS, CPU_MS);
    ranges.memory_size_mb = clamp_bounds(ranges.memory_size_mb, MEMORY_MB, MEMORY_MB);
    ranges.latency_ms = clamp_bounds(ranges.latency_ms, DELAY_MS, DELAY_MS);
    ranges.slow_response_ms = clamp_bounds(ranges.slow_response_ms, DELAY_MS, DELAY_MS);
    ranges.startup_duration_ms =
        clamp_bounds(ranges.startup_duration_ms, STARTUP_MIN_MS, STARTUP_MAX_MS);

    let freq = &mut config.frequency;
    freq.every_n_requests = freq.every_n_requests.max(1);
    freq.every_n_seconds = freq.every_n_seconds.max(1);
    freq.percentage = freq.percentage.min(100);

    config
}

fn clamp(value: u32, (lo, hi): (u32, u32)) -> u32 {
    value.clamp(lo, hi)
}

fn clamp_bounds(bounds: Bounds, min_range: (u32, u32), max_range: (u32, u32)) -> Bounds {
    Bounds::new(clamp(bounds.min, min_range), clamp(bounds.max, max_range))
}
