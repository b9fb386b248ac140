//! Fault execution.
//!
//! # Responsibilities
//! - Pick one fault kind among the active ones
//! - Resolve its duration or size (fixed, or uniform in `[min, max]`)
//! - Apply the effect and tell the caller how the request continues
//!
//! # Pipeline positions
//! ```text
//! HighCpu / HighMemory / HighLatency   effect → forward
//! SlowResponse                         forward → delay → respond
//! Error* / StackOverflow / RandomErrors  respond, never forward
//! ```
//!
//! # Design Decisions
//! - CPU burn runs on the blocking pool; once started it runs to completion
//! - Latency uses `tokio::time::sleep`, never a thread sleep
//! - Memory ballast is owned by a guard, so it is freed on every exit path,
//!   including when the request future is dropped mid-hold

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::chaos::fault::FaultKind;
use crate::chaos::random::RandomSource;
use crate::config::{Bounds, ChaosConfig};
use crate::observability::metrics;

const MIB: usize = 1024 * 1024;

/// How long HighMemory keeps its allocation alive.
pub const MEMORY_HOLD: Duration = Duration::from_millis(200);

/// Status codes RandomErrors draws from.
pub const RANDOM_ERROR_CODES: [StatusCode; 10] = [
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// What the pipeline does after a fault ran.
#[derive(Debug)]
pub enum Disposition {
    /// Forward the request as usual.
    Forward,
    /// Forward, then hold the response for the given time before sending it.
    ForwardThenDelay(Duration),
    /// Send this response; do not forward.
    Respond(Response),
}

/// JSON body of a short-circuited response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaosErrorBody {
    pub error: String,
    pub message: String,
    pub path: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated: Option<String>,
}

/// Applies faults. Cheap to clone; clones share the ballast counter.
#[derive(Debug, Clone)]
pub struct FaultExecutor {
    rng: Arc<dyn RandomSource>,
    ballast_bytes: Arc<AtomicUsize>,
    memory_hold: Duration,
}

impl FaultExecutor {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self {
            rng,
            ballast_bytes: Arc::new(AtomicUsize::new(0)),
            memory_hold: MEMORY_HOLD,
        }
    }

    /// Override the HighMemory hold period.
    pub fn with_memory_hold(mut self, hold: Duration) -> Self {
        self.memory_hold = hold;
        self
    }

    /// Bytes currently held by in-flight HighMemory faults.
    pub fn ballast_bytes(&self) -> usize {
        self.ballast_bytes.load(Ordering::SeqCst)
    }

    /// Uniform choice among `kinds`; `None` for an empty slice.
    pub fn pick(&self, kinds: &[FaultKind]) -> Option<FaultKind> {
        if kinds.is_empty() {
            return None;
        }
        let index = self.rng.below(kinds.len() as u32) as usize;
        kinds.get(index).copied()
    }

    /// Fixed value, or a draw from `bounds` when ranged parameters are on.
    pub fn resolve(&self, config: &ChaosConfig, fixed: u32, bounds: Bounds) -> u32 {
        if config.use_ranged_parameters {
            let (lo, hi) = bounds.ordered();
            self.rng.between(lo, hi)
        } else {
            fixed
        }
    }

    /// Apply `kind` for the request at `path`.
    pub async fn execute(&self, kind: FaultKind, config: &ChaosConfig, path: &str) -> Disposition {
        let fixed = &config.fixed;
        let ranges = &config.ranges;

        match kind {
            FaultKind::HighCpu => {
                let ms = self.resolve(config, fixed.cpu_duration_ms, ranges.cpu_duration_ms);
                burn_cpu(Duration::from_millis(u64::from(ms))).await;
                Disposition::Forward
            }
            FaultKind::HighMemory => {
                let mb = self.resolve(config, fixed.memory_size_mb, ranges.memory_size_mb);
                self.hold_memory(mb).await;
                Disposition::Forward
            }
            FaultKind::HighLatency => {
                let ms = self.resolve(config, fixed.latency_ms, ranges.latency_ms);
                tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
                Disposition::Forward
            }
            FaultKind::SlowResponse => {
                let ms = self.resolve(config, fixed.slow_response_ms, ranges.slow_response_ms);
                Disposition::ForwardThenDelay(Duration::from_millis(u64::from(ms)))
            }
            FaultKind::Error404 => Disposition::Respond(error_response(StatusCode::NOT_FOUND, path)),
            FaultKind::Error429 => {
                Disposition::Respond(error_response(StatusCode::TOO_MANY_REQUESTS, path))
            }
            FaultKind::Error500 => {
                Disposition::Respond(error_response(StatusCode::INTERNAL_SERVER_ERROR, path))
            }
            FaultKind::Error503 => {
                Disposition::Respond(error_response(StatusCode::SERVICE_UNAVAILABLE, path))
            }
            FaultKind::StackOverflow => Disposition::Respond(stack_overflow_response(path)),
            FaultKind::RandomErrors => {
                let index = self.rng.below(RANDOM_ERROR_CODES.len() as u32) as usize;
                let status = RANDOM_ERROR_CODES
                    .get(index)
                    .copied()
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Disposition::Respond(error_response(status, path))
            }
        }
    }

    async fn hold_memory(&self, size_mb: u32) {
        // Filling up to 2000 MiB is slow; keep it off the async workers.
        let chunks = match tokio::task::spawn_blocking(move || fill_chunks(size_mb)).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::error!(error = %e, "Memory ballast allocation failed");
                return;
            }
        };
        let ballast = Ballast::new(chunks, Arc::clone(&self.ballast_bytes));
        tracing::debug!(bytes = ballast.bytes(), "Memory ballast allocated");
        tokio::time::sleep(self.memory_hold).await;
        drop(ballast);
    }
}

fn fill_chunks(size_mb: u32) -> Vec<Vec<u8>> {
    // Non-zero fill so the pages are actually committed.
    (0..size_mb).map(|_| vec![0xA5u8; MIB]).collect()
}

/// Memory held for the HighMemory fault. Accounting is undone on drop.
///
/// The guard is built on the async side once the fill completes, so a request
/// dropped mid-fill never touches the counter.
struct Ballast {
    chunks: Vec<Vec<u8>>,
    counter: Arc<AtomicUsize>,
}

impl Ballast {
    fn new(chunks: Vec<Vec<u8>>, counter: Arc<AtomicUsize>) -> Self {
        let ballast = Ballast { chunks, counter };
        let held = ballast.counter.fetch_add(ballast.bytes(), Ordering::SeqCst) + ballast.bytes();
        metrics::record_ballast(held);
        ballast
    }

    fn bytes(&self) -> usize {
        self.chunks.len() * MIB
    }
}

impl Drop for Ballast {
    fn drop(&mut self) {
        let bytes = self.bytes();
        let remaining = self.counter.fetch_sub(bytes, Ordering::SeqCst) - bytes;
        metrics::record_ballast(remaining);
        tracing::trace!(bytes, "Memory ballast released");
    }
}

async fn burn_cpu(duration: Duration) {
    let result = tokio::task::spawn_blocking(move || spin(duration)).await;
    if let Err(e) = result {
        tracing::error!(error = %e, "CPU burn task failed");
    }
}

fn spin(duration: Duration) {
    let deadline = std::time::Instant::now() + duration;
    let mut acc = 0f64;
    while std::time::Instant::now() < deadline {
        for i in 0..10_000u32 {
            acc += f64::from(i).sqrt();
        }
        std::hint::black_box(acc);
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Short-circuit response for an injected HTTP error.
pub fn error_response(status: StatusCode, path: &str) -> Response {
    let body = ChaosErrorBody {
        error: status.canonical_reason().unwrap_or("Error").to_string(),
        message: format!("Chaos Engineering: {} injected", status.as_u16()),
        path: path.to_string(),
        timestamp: timestamp(),
        simulated: None,
    };

    let mut response = (status, Json(body)).into_response();
    if let Some(secs) = retry_after(status) {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static(secs));
    }
    response
}

fn retry_after(status: StatusCode) -> Option<&'static str> {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Some("60"),
        StatusCode::SERVICE_UNAVAILABLE => Some("30"),
        _ => None,
    }
}

/// A 500 that reports a stack overflow without recursing.
pub fn stack_overflow_response(path: &str) -> Response {
    let body = ChaosErrorBody {
        error: "Stack Overflow".to_string(),
        message: "Chaos Engineering: stack overflow simulated (infinite recursion detected)"
            .to_string(),
        path: path.to_string(),
        timestamp: timestamp(),
        simulated: Some("stack_overflow".to_string()),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
