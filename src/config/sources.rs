// src/config/sources.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::providers::hacker_news::{DEFAULT_ITEMS_ENDPOINT, DEFAULT_ITEM_ENDPOINT};

pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";
pub const ENV_MAX_RETURN_ITEMS: &str = "MAX_RETURN_ITEMS";
pub const ENV_FETCH_TIMEOUT_MS: &str = "FETCH_TIMEOUT_MS";

pub const DEFAULT_SOURCES_TOML: &str = "config/sources.toml";
pub const DEFAULT_SOURCES_JSON: &str = "config/sources.json";

pub const DEFAULT_HN_API_URL: &str = "https://hacker-news.firebaseio.com/v0";
pub const DEFAULT_LOBSTERS_URL: &str = "https://lobste.rs/";
pub const DEFAULT_MAX_RETURN_ITEMS: usize = 30;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

fn default_max_return_items() -> usize {
    DEFAULT_MAX_RETURN_ITEMS
}
fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Items returned by every feed endpoint, split evenly across its sources.
    #[serde(default = "default_max_return_items")]
    pub max_return_items: usize,
    /// Per-source deadline for one retrieval.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default)]
    pub hacker_news: HackerNewsConfig,
    #[serde(default)]
    pub lobsters: LobstersConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HackerNewsConfig {
    pub api_url: String,
    pub items_endpoint: String,
    pub item_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobstersConfig {
    pub url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            max_return_items: DEFAULT_MAX_RETURN_ITEMS,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            hacker_news: HackerNewsConfig::default(),
            lobsters: LobstersConfig::default(),
        }
    }
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_HN_API_URL.to_string(),
            items_endpoint: DEFAULT_ITEMS_ENDPOINT.to_string(),
            item_endpoint: DEFAULT_ITEM_ENDPOINT.to_string(),
        }
    }
}

impl Default for LobstersConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LOBSTERS_URL.to_string(),
        }
    }
}

impl SourcesConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Load from an explicit path. TOML or JSON, picked by extension then by content.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse(&content, &ext)
            .with_context(|| format!("parsing sources config {}", path.display()))?;
        cfg.validated()
    }

    /// Resolve configuration using env var + fallbacks, then apply env overrides:
    /// 1) $SOURCES_CONFIG_PATH (must exist)
    /// 2) config/sources.toml
    /// 3) config/sources.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_SOURCES_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_SOURCES_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_SOURCES_TOML).exists() {
            Self::load_from(Path::new(DEFAULT_SOURCES_TOML))?
        } else if Path::new(DEFAULT_SOURCES_JSON).exists() {
            Self::load_from(Path::new(DEFAULT_SOURCES_JSON))?
        } else {
            Self::default()
        };
        base.with_env_overrides().validated()
    }

    /// MAX_RETURN_ITEMS / FETCH_TIMEOUT_MS win over the file. Invalid values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = parse_positive_env(std::env::var(ENV_MAX_RETURN_ITEMS).ok()) {
            self.max_return_items = n as usize;
        }
        if let Some(ms) = parse_positive_env(std::env::var(ENV_FETCH_TIMEOUT_MS).ok()) {
            self.fetch_timeout_ms = ms;
        }
        self
    }

    fn validated(self) -> Result<Self> {
        if self.max_return_items == 0 {
            bail!("max_return_items must be positive");
        }
        if self.fetch_timeout_ms == 0 {
            bail!("fetch_timeout_ms must be positive");
        }
        Ok(self)
    }
}

fn parse_positive_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

fn parse(s: &str, hint_ext: &str) -> Result<SourcesConfig> {
    if hint_ext == "json" || s.trim_start().starts_with('{') {
        return serde_json::from_str(s).context("sources config is not valid JSON");
    }
    toml::from_str(s).context("sources config is not valid TOML")
}
