//! Chaos Proxy
//!
//! A reverse proxy that injects faults into traffic bound for one upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ timeout ─▶ chaos middleware ─┬─▶ proxy handler ─▶ Upstream
//!                                                 │              │
//!                                                 │  classify    │  forward / delay
//!                                                 │  decide      │
//!                                                 │  execute ────┴─▶ synthetic error
//!                                                 ▼
//!                                            ChaosEngine ◀── admin API / config watcher
//!                                                 │
//!                                                 ▼
//!                                            persistence (file / HTTP key-value)
//! ```

use std::path::PathBuf;

use clap::Parser;

use chaos_proxy::lifecycle;

#[derive(Parser)]
#[command(name = "chaos-proxy")]
#[command(about = "Reverse proxy with configurable chaos injection", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    lifecycle::launch(cli.config.as_deref()).await?;
    Ok(())
}
