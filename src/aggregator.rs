// src/aggregator.rs
//! Fan-out over every configured source, fail-closed merge, then ranking.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt as _;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::ranking::rank;
use crate::sources::{FetchError, Item, SourceConnector};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("aggregate_requests_total", "Aggregations started.");
        describe_counter!(
            "aggregate_failures_total",
            "Aggregations that failed because a source failed."
        );
        describe_counter!(
            "source_fetch_errors_total",
            "Per-source retrieval errors, including deadline expiry."
        );
        describe_counter!("source_items_total", "Items returned by each source.");
        describe_histogram!("source_fetch_ms", "Source retrieval time in milliseconds.");
    });
}

/// What a single fan-out task reports back.
struct FetchOutcome {
    index: usize,
    source: String,
    result: Result<Vec<Item>, FetchError>,
}

pub struct Aggregator {
    connectors: Vec<SourceConnector>,
    fetch_timeout: Option<Duration>,
}

impl Aggregator {
    /// At least one source is required; the per-source quota divides by the source count.
    pub fn new(connectors: Vec<SourceConnector>) -> Result<Self, FetchError> {
        if connectors.is_empty() {
            return Err(FetchError::InvalidConfiguration(
                "aggregator needs at least one source".to_string(),
            ));
        }
        Ok(Self {
            connectors,
            fetch_timeout: None,
        })
    }

    /// Upper bound for every single source retrieval.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.connectors.iter().map(|c| c.name.as_str()).collect()
    }

    /// Floor division; the remainder is never handed out.
    pub fn items_per_source(&self, max_items: usize) -> usize {
        max_items / self.connectors.len()
    }

    /// Ask every source for its quota concurrently and wait for all of them.
    /// Any source error fails the whole call. Successful slices are truncated
    /// to the quota, concatenated in configuration order and ranked.
    ///
    /// Dropping the returned future aborts the retrievals still in flight.
    #[instrument(level = "info", skip(self), fields(sources = self.connectors.len()))]
    pub async fn get_items(&self, max_items: usize) -> Result<Vec<Item>, FetchError> {
        ensure_metrics_described();
        counter!("aggregate_requests_total").increment(1);

        let per_source = self.items_per_source(max_items);
        let mut tasks = JoinSet::new();
        for (index, connector) in self.connectors.iter().enumerate() {
            let retriever = Arc::clone(&connector.retriever);
            let source = connector.name.clone();
            let deadline = self.fetch_timeout;
            tasks.spawn(async move {
                let fetch = AssertUnwindSafe(retriever.get_items(per_source)).catch_unwind();
                let caught = match deadline {
                    Some(limit) => match tokio::time::timeout(limit, fetch).await {
                        Ok(caught) => caught,
                        Err(_) => Ok(Err(FetchError::DeadlineExceeded {
                            source_name: source.clone(),
                            timeout: limit,
                        })),
                    },
                    None => fetch.await,
                };
                let result = caught.unwrap_or_else(|_| {
                    Err(FetchError::TaskFailed(format!("source '{source}' panicked")))
                });
                FetchOutcome {
                    index,
                    source,
                    result,
                }
            });
        }

        // Barrier: every task reports before anything is merged.
        let mut slots: Vec<Option<Result<Vec<Item>, FetchError>>> =
            vec![None; self.connectors.len()];
        let mut lost: Option<FetchError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    record_outcome(&outcome);
                    slots[outcome.index] = Some(outcome.result);
                }
                Err(e) => {
                    warn!(error = %e, "retrieval task did not complete");
                    lost.get_or_insert(FetchError::TaskFailed(e.to_string()));
                }
            }
        }

        let mut merged = Vec::with_capacity(per_source * self.connectors.len());
        for (connector, slot) in self.connectors.iter().zip(slots) {
            let items = match slot {
                Some(Ok(items)) => items,
                Some(Err(e)) => {
                    counter!("aggregate_failures_total").increment(1);
                    warn!(source = %connector.name, kind = e.kind(), error = %e, "aggregation failed");
                    return Err(e);
                }
                None => {
                    counter!("aggregate_failures_total").increment(1);
                    return Err(lost.take().unwrap_or_else(|| {
                        FetchError::TaskFailed(format!("no outcome from '{}'", connector.name))
                    }));
                }
            };
            if items.len() < per_source {
                debug!(source = %connector.name, got = items.len(), quota = per_source, "source under-filled");
            }
            merged.extend(items.into_iter().take(per_source));
        }

        let ranked = rank(merged);
        info!(quota = per_source, items = ranked.len(), "aggregation finished");
        Ok(ranked)
    }
}

fn record_outcome(outcome: &FetchOutcome) {
    let source = outcome.source.clone();
    match &outcome.result {
        Ok(items) => {
            counter!("source_items_total", "source" => source).increment(items.len() as u64);
        }
        Err(e) => {
            warn!(source = %outcome.source, kind = e.kind(), error = %e, "source retrieval failed");
            counter!("source_fetch_errors_total", "source" => source, "kind" => e.kind())
                .increment(1);
        }
    }
}
