//! Routewarden -- autonomous DNS failover sentinel drill appliance.
//!
//! This crate provides the core library for the sentinel control loop:
//! synthetic probe telemetry, AI-assisted health analysis with a
//! deterministic fallback, the failover state machine, and the JSON API
//! that exposes it all to operators.

pub mod api;
pub mod brain;
pub mod config;
pub mod journal;
pub mod probe;
pub mod sentinel;

use std::sync::Arc;

use anyhow::Result;

use crate::api::state::AppState;
use crate::config::WardenConfig;

/// Assemble a sentinel from configuration: brain, boot journal, state
/// machine. Shared by the daemon and the headless drill mode.
pub fn build_sentinel(cfg: &WardenConfig) -> sentinel::Sentinel {
    let brain = brain::Brain::from_config(&cfg.brain);
    let journal = journal::Journal::with_boot_entries(
        cfg.sentinel.journal_len,
        probe::FLEET.len(),
        &brain.describe(),
    );
    sentinel::Sentinel::new(cfg, Arc::new(brain), journal)
}

/// Start the Routewarden daemon: sentinel core plus API server.
pub async fn serve(bind: &str, cfg: WardenConfig) -> Result<()> {
    let sentinel = build_sentinel(&cfg);
    let app = api::router(AppState { sentinel });

    let addr: std::net::SocketAddr = bind.parse()?;
    tracing::info!(%addr, "Routewarden listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
