//! Top Stories Service — Binary Entrypoint
//! Boots the Axum HTTP server: config, tracing, metrics, and the feed routes.

use shuttle_axum::ShuttleAxum;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use top_stories_aggregator::{metrics::Metrics, SourcesConfig};

/// Logs filtered by RUST_LOG; LOG_FORMAT=json switches to one JSON object per line.
/// The hosting runtime may already have installed a subscriber, in which case this is a no-op.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("top_stories_aggregator=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer().compact()))
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = SourcesConfig::load_default()?;
    info!(
        max_items = cfg.max_return_items,
        fetch_timeout_ms = cfg.fetch_timeout_ms,
        hacker_news = %cfg.hacker_news.api_url,
        lobsters = %cfg.lobsters.url,
        "sources configured"
    );

    let metrics = Metrics::init(&cfg)?;
    let router = top_stories_aggregator::app(&cfg)?.merge(metrics.router());

    Ok(router.into())
}
