// src/sources/providers/lobsters.rs
//! Scrape-backed source: reads the story list straight from the Lobsters front page.

use async_trait::async_trait;
use metrics::histogram;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::sources::error::FetchError;
use crate::sources::types::{Item, Retriever};

static STORY_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ol.stories.list li.story").expect("story selector"));
static TITLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.h-entry .details .link a").expect("title selector"));
static SCORE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.h-entry .voters .score").expect("score selector"));
static COMMENTS_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.h-entry .details .byline .comments_label a").expect("comments selector")
});
static AUTHOR_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.u-author").expect("author selector"));
static COMMENTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s+comments?\b").expect("comments regex"));

pub struct LobstersScraper {
    url: String,
    client: Client,
}

impl LobstersScraper {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: super::http_client(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn fetch_page(&self) -> Result<String, FetchError> {
        let resp = self.client.get(&self.url).send().await.map_err(|e| {
            warn!(error = %e, url = %self.url, provider = "lobsters", "request failed");
            FetchError::NetworkFailure(e.to_string())
        })?;
        if resp.status() != StatusCode::OK {
            warn!(status = %resp.status(), url = %self.url, provider = "lobsters", "non-200 response");
            return Err(FetchError::UpstreamStatus(resp.status().as_u16()));
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl Retriever for LobstersScraper {
    async fn get_items(&self, max_items: usize) -> Result<Vec<Item>, FetchError> {
        let t0 = std::time::Instant::now();
        let html = self.fetch_page().await?;
        let items = parse_stories(&html, &self.url, max_items)?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("source_fetch_ms", "source" => "lobsters").record(ms);
        Ok(items)
    }
}

/// Extract up to `max_items` stories from a Lobsters listing page.
/// Ids are positional, starting at 1. Extracting nothing is an error, even when
/// the page has stories but `max_items` is 0.
pub fn parse_stories(html: &str, page_url: &str, max_items: usize) -> Result<Vec<Item>, FetchError> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let mut items = Vec::new();
    for (i, story) in document.select(&STORY_SEL).enumerate().take(max_items) {
        let link = story.select(&TITLE_SEL).next();
        let href = link.and_then(|a| a.value().attr("href")).unwrap_or_default();
        let url = match base.as_ref().and_then(|b| b.join(href).ok()) {
            Some(abs) if !href.is_empty() => abs.to_string(),
            _ => href.to_string(),
        };

        items.push(Item {
            id: (i + 1) as i64,
            title: link.map(text_of).unwrap_or_default(),
            descendants: first_text(&story, &COMMENTS_SEL)
                .map(|t| extract_comments(&t))
                .unwrap_or(0),
            score: first_text(&story, &SCORE_SEL)
                .and_then(|t| t.parse::<u64>().ok())
                .unwrap_or(0),
            url,
            time: 0,
            author: first_text(&story, &AUTHOR_SEL).unwrap_or_default(),
            kind: "story".to_string(),
        });
    }

    if items.is_empty() {
        return Err(FetchError::EmptyScrapeResult);
    }
    debug!(kept = items.len(), "lobsters stories parsed");
    Ok(items)
}

fn first_text(scope: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope.select(sel).next().map(text_of)
}

// Collapse inner whitespace the way a browser renders inline text.
fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// "12 comments" → 12, "1 comment" → 1, anything else ("discuss") → 0.
pub fn extract_comments(s: &str) -> u64 {
    COMMENTS_RE
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
