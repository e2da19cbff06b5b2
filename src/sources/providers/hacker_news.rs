// src/sources/providers/hacker_news.rs
//! REST-backed source: lists candidate ids, then fetches every item record.

use async_trait::async_trait;
use futures::future::join_all;
use metrics::histogram;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::sources::error::FetchError;
use crate::sources::types::{Item, Retriever};

pub const DEFAULT_ITEMS_ENDPOINT: &str = "topstories";
pub const DEFAULT_ITEM_ENDPOINT: &str = "item";

pub struct HackerNewsApi {
    api_url: String,
    items_endpoint: String,
    item_endpoint: String,
    client: Client,
}

impl HackerNewsApi {
    pub fn new(
        api_url: impl Into<String>,
        items_endpoint: impl Into<String>,
        item_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            items_endpoint: items_endpoint.into(),
            item_endpoint: item_endpoint.into(),
            client: super::http_client(),
        }
    }

    /// Builder for tests/tools that want to share or tune the HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn ids_url(&self) -> String {
        format!("{}/{}.json", self.api_url, self.items_endpoint)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{}/{}.json", self.api_url, self.item_endpoint, id)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, %url, provider = "hacker_news", "request failed");
            FetchError::NetworkFailure(e.to_string())
        })?;

        if resp.status() != StatusCode::OK {
            warn!(status = %resp.status(), %url, provider = "hacker_news", "non-200 response");
            return Err(FetchError::UpstreamStatus(resp.status().as_u16()));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, %url, provider = "hacker_news", "unparsable body");
            FetchError::MalformedPayload(format!("{url}: {e}"))
        })
    }

    async fn fetch_ids(&self) -> Result<Vec<i64>, FetchError> {
        let url = self.ids_url();
        let v = self.get_json(&url).await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn fetch_item(&self, id: i64) -> Result<Item, FetchError> {
        let url = self.item_url(id);
        let v = self.get_json(&url).await?;
        if !v.is_object() {
            return Err(FetchError::MalformedPayload(format!(
                "item {id} is not a JSON object"
            )));
        }
        let item: Item = serde_json::from_value(v)?;
        Ok(item)
    }
}

#[async_trait]
impl Retriever for HackerNewsApi {
    async fn get_items(&self, max_items: usize) -> Result<Vec<Item>, FetchError> {
        let t0 = std::time::Instant::now();

        let ids = self.fetch_ids().await?;
        let wanted = ids.len().min(max_items);
        debug!(available = ids.len(), wanted, "hacker news ids listed");

        // One request per id, all in flight together; results keep id order.
        let results = join_all(ids[..wanted].iter().map(|&id| self.fetch_item(id))).await;
        let items = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("source_fetch_ms", "source" => "hacker_news").record(ms);
        Ok(items)
    }
}
