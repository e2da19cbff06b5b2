// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregator;
pub mod api;
pub mod config;
pub mod metrics;
pub mod ranking;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::Aggregator;
pub use crate::api::router;
pub use crate::config::SourcesConfig;
pub use crate::sources::{FetchError, Item, Retriever, SourceConnector};

use anyhow::Context;

/// Build the HTTP router for the real sources described by `cfg`.
/// Metrics are not mounted here; the recorder is process-global and owned by the binary.
pub fn app(cfg: &SourcesConfig) -> anyhow::Result<axum::Router> {
    let state = api::AppState::from_config(cfg).context("wiring story sources")?;
    Ok(api::router(state))
}
