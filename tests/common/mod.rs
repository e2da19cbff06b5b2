// tests/common/mod.rs
// Shared helpers: in-process upstream servers and scripted retrievers.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use top_stories_aggregator::{FetchError, Item, Retriever};

/// Serve `router` on an ephemeral localhost port; returns the base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

/// A URL nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

/// An upstream that accepts the request but answers only after `delay`.
pub async fn stalled_url(delay: Duration) -> String {
    let router = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "too late"
    });
    serve(router).await
}

/// Client that gives up long before `stalled_url` answers.
pub fn impatient_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .expect("test client")
}

pub fn items_from_json(raw: &str) -> Vec<Item> {
    serde_json::from_str(raw).expect("fixture items json")
}

pub fn authors(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.author.as_str()).collect()
}

/// Returns a fixed list after an optional delay and records what it was asked for.
pub struct StaticRetriever {
    items: Vec<Item>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub last_max: AtomicUsize,
}

impl StaticRetriever {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_max: AtomicUsize::new(usize::MAX),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn get_items(&self, max_items: usize) -> Result<Vec<Item>, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_max.store(max_items, Ordering::SeqCst);
        Ok(self.items.clone())
    }
}

pub struct FailingRetriever {
    error: FetchError,
    delay: Duration,
}

impl FailingRetriever {
    pub fn new(error: FetchError) -> Self {
        Self {
            error,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Retriever for FailingRetriever {
    async fn get_items(&self, _max_items: usize) -> Result<Vec<Item>, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Err(self.error.clone())
    }
}

/// Sleeps for `wait`, then flips `finished`. Used to observe hangs and aborts.
pub struct SlowRetriever {
    wait: Duration,
    pub finished: Arc<AtomicBool>,
}

impl SlowRetriever {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Retriever for SlowRetriever {
    async fn get_items(&self, _max_items: usize) -> Result<Vec<Item>, FetchError> {
        tokio::time::sleep(self.wait).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

pub struct PanickingRetriever;

#[async_trait]
impl Retriever for PanickingRetriever {
    async fn get_items(&self, _max_items: usize) -> Result<Vec<Item>, FetchError> {
        panic!("adapter bug");
    }
}
