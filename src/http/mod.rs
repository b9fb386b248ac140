//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, local routes)
//!     → request.rs (add request ID)
//!     → middleware/chaos.rs (classify, decide, inject)
//!     → server.rs proxy handler (forward to upstream)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
