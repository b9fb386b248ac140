//! Chaos-injecting reverse proxy library.
//!
//! Sits in front of a single upstream and, on eligible requests, injects
//! configured faults (errors, latency, CPU and memory pressure) before or
//! instead of forwarding.

pub mod admin;
pub mod chaos;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod persistence;

pub use chaos::ChaosEngine;
pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
