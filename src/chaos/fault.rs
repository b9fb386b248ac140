//! Fault kinds and the active-fault list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ChaosConfig, FaultToggles};

/// Every per-request fault the proxy can inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum FaultKind {
    HighCpu,
    HighMemory,
    HighLatency,
    Error404,
    Error500,
    Error503,
    Error429,
    StackOverflow,
    SlowResponse,
    RandomErrors,
}

impl FaultKind {
    /// Declaration order. `active_fault_kinds` reports kinds in this order.
    pub const ALL: [FaultKind; 10] = [
        FaultKind::HighCpu,
        FaultKind::HighMemory,
        FaultKind::HighLatency,
        FaultKind::Error404,
        FaultKind::Error500,
        FaultKind::Error503,
        FaultKind::Error429,
        FaultKind::StackOverflow,
        FaultKind::SlowResponse,
        FaultKind::RandomErrors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::HighCpu => "HighCpu",
            FaultKind::HighMemory => "HighMemory",
            FaultKind::HighLatency => "HighLatency",
            FaultKind::Error404 => "Error404",
            FaultKind::Error500 => "Error500",
            FaultKind::Error503 => "Error503",
            FaultKind::Error429 => "Error429",
            FaultKind::StackOverflow => "StackOverflow",
            FaultKind::SlowResponse => "SlowResponse",
            FaultKind::RandomErrors => "RandomErrors",
        }
    }

    pub fn is_enabled(&self, toggles: &FaultToggles) -> bool {
        match self {
            FaultKind::HighCpu => toggles.high_cpu,
            FaultKind::HighMemory => toggles.high_memory,
            FaultKind::HighLatency => toggles.high_latency,
            FaultKind::Error404 => toggles.error_404,
            FaultKind::Error500 => toggles.error_500,
            FaultKind::Error503 => toggles.error_503,
            FaultKind::Error429 => toggles.error_429,
            FaultKind::StackOverflow => toggles.stack_overflow,
            FaultKind::SlowResponse => toggles.slow_response,
            FaultKind::RandomErrors => toggles.random_errors,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enabled fault kinds in declaration order; empty when chaos is off.
pub fn active_fault_kinds(config: &ChaosConfig) -> Vec<FaultKind> {
    if !config.enabled {
        return Vec::new();
    }
    FaultKind::ALL
        .into_iter()
        .filter(|kind| kind.is_enabled(&config.faults))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> FaultToggles {
        FaultToggles {
            high_cpu: true,
            high_memory: true,
            high_latency: true,
            slow_response: true,
            error_404: true,
            error_429: true,
            error_500: true,
            error_503: true,
            stack_overflow: true,
            random_errors: true,
            long_startup: true,
        }
    }

    #[test]
    fn empty_when_disabled() {
        let mut cfg = ChaosConfig::default();
        cfg.faults = all_on();
        assert!(active_fault_kinds(&cfg).is_empty());
    }

    #[test]
    fn empty_when_no_flags() {
        let mut cfg = ChaosConfig::default();
        cfg.enabled = true;
        assert!(active_fault_kinds(&cfg).is_empty());
    }

    #[test]
    fn long_startup_is_not_a_request_fault() {
        let mut cfg = ChaosConfig::default();
        cfg.enabled = true;
        cfg.faults.long_startup = true;
        assert!(active_fault_kinds(&cfg).is_empty());
    }

    #[test]
    fn declaration_order_is_kept() {
        let mut cfg = ChaosConfig::default();
        cfg.enabled = true;
        cfg.faults = all_on();
        assert_eq!(active_fault_kinds(&cfg), FaultKind::ALL.to_vec());

        cfg.faults = FaultToggles::default();
        cfg.faults.slow_response = true;
        cfg.faults.error_429 = true;
        cfg.faults.high_cpu = true;
        assert_eq!(
            active_fault_kinds(&cfg),
            vec![FaultKind::HighCpu, FaultKind::Error429, FaultKind::SlowResponse]
        );
    }

    #[test]
    fn names_are_stable() {
        let names: Vec<&str> = FaultKind::ALL.iter().map(FaultKind::as_str).collect();
        assert_eq!(
            names,
            vec![
                "HighCpu",
                "HighMemory",
                "HighLatency",
                "Error404",
                "Error500",
                "Error503",
                "Error429",
                "StackOverflow",
                "SlowResponse",
                "RandomErrors",
            ]
        );
    }
}
