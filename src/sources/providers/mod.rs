// src/sources/providers/mod.rs
pub mod hacker_news;
pub mod lobsters;

use reqwest::Client;

/// Shared client settings for every upstream: identify ourselves, nothing else.
/// Deadlines live in the aggregator, not here.
pub(crate) fn http_client() -> Client {
    Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default http client");
            Client::new()
        })
}
