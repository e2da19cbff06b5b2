use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{debug, error};

use crate::aggregator::Aggregator;
use crate::config::SourcesConfig;
use crate::sources::providers::{hacker_news::HackerNewsApi, lobsters::LobstersScraper};
use crate::sources::{DynRetriever, FetchError, Item, SourceConnector};

pub const HACKER_NEWS_NAME: &str = "Hacker News";
pub const LOBSTERS_NAME: &str = "Lobsters";

/// Generic body for every failed aggregation; the kind travels in `X-Error-Kind`.
pub const ERROR_BODY: &str = "Error obtaining required data";
pub const ERROR_KIND_HEADER: &str = "x-error-kind";

#[derive(Clone)]
pub struct AppState {
    pub max_items: usize,
    pub hacker_news: Arc<Aggregator>,
    pub lobsters: Arc<Aggregator>,
    pub combined: Arc<Aggregator>,
}

impl AppState {
    /// Wire the two real sources into the three feeds. Source order in the
    /// combined feed is fixed: Hacker News first, then Lobsters.
    pub fn from_config(cfg: &SourcesConfig) -> Result<Self, FetchError> {
        let hn: DynRetriever = Arc::new(HackerNewsApi::new(
            cfg.hacker_news.api_url.clone(),
            cfg.hacker_news.items_endpoint.clone(),
            cfg.hacker_news.item_endpoint.clone(),
        ));
        let lobsters: DynRetriever = Arc::new(LobstersScraper::new(cfg.lobsters.url.clone()));
        Self::with_retrievers(cfg, hn, lobsters)
    }

    /// Same wiring with caller-provided retrievers (tests, alternative upstreams).
    pub fn with_retrievers(
        cfg: &SourcesConfig,
        hacker_news: DynRetriever,
        lobsters: DynRetriever,
    ) -> Result<Self, FetchError> {
        let timeout = cfg.fetch_timeout();
        let hn = SourceConnector::new(HACKER_NEWS_NAME, hacker_news);
        let lob = SourceConnector::new(LOBSTERS_NAME, lobsters);

        let feed = |connectors: Vec<SourceConnector>| -> Result<Arc<Aggregator>, FetchError> {
            Ok(Arc::new(Aggregator::new(connectors)?.with_fetch_timeout(timeout)))
        };

        Ok(Self {
            max_items: cfg.max_return_items,
            hacker_news: feed(vec![hn.clone()])?,
            lobsters: feed(vec![lob.clone()])?,
            combined: feed(vec![hn, lob])?,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/hacker-news-items", get(hacker_news_items))
        .route("/lobsters-items", get(lobsters_items))
        .route("/combine-sources-items", get(combined_items))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// One ranked story as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoryResponse {
    pub order: usize, // 1-based rank
    pub id: String,
    pub title: String,
    pub url: String,
    pub comments: u64,
    pub score: u64,
}

impl StoryResponse {
    pub fn from_ranked(items: Vec<Item>) -> Vec<Self> {
        items
            .into_iter()
            .enumerate()
            .map(|(i, it)| {
                let order = i + 1;
                debug!(
                    order,
                    title_len = it.title.chars().count(),
                    title = %it.title,
                    comments = it.descendants,
                    score = it.score,
                    id = it.id,
                    "story"
                );
                StoryResponse {
                    order,
                    id: it.id.to_string(),
                    title: it.title,
                    url: it.url,
                    comments: it.descendants,
                    score: it.score,
                }
            })
            .collect()
    }
}

/// Aggregation failure as seen by HTTP clients: always a bare 500.
#[derive(Debug)]
pub struct ApiError(pub FetchError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(ERROR_KIND_HEADER, self.0.kind())],
            ERROR_BODY,
        )
            .into_response()
    }
}

async fn serve_feed(
    aggregator: &Aggregator,
    max_items: usize,
) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    match aggregator.get_items(max_items).await {
        Ok(items) => Ok(Json(StoryResponse::from_ranked(items))),
        Err(e) => {
            error!(
                error = %e,
                kind = e.kind(),
                sources = ?aggregator.source_names(),
                "failed to get items"
            );
            Err(ApiError(e))
        }
    }
}

async fn hacker_news_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    serve_feed(&state.hacker_news, state.max_items).await
}

async fn lobsters_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    serve_feed(&state.lobsters, state.max_items).await
}

async fn combined_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    serve_feed(&state.combined, state.max_items).await
}
