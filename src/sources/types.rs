// src/sources/types.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::sources::error::FetchError;

/// One aggregated story, in the shape every source is normalized into.
///
/// Field names on the wire follow the Hacker News item schema (`by`, `type`).
/// Numeric fields are lenient: absent, `null` or unparseable values become 0
/// instead of failing the whole item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub descendants: u64, // comment count
    #[serde(default, deserialize_with = "lenient_count")]
    pub score: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub time: i64, // unix seconds
    #[serde(rename = "by", default, deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
}

/// Anything that can hand back up to `max_items` stories.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    async fn get_items(&self, max_items: usize) -> Result<Vec<Item>, FetchError>;
}

pub type DynRetriever = Arc<dyn Retriever>;

/// Named source, fixed at startup and owned by an aggregator.
#[derive(Clone)]
pub struct SourceConnector {
    pub name: String,
    pub retriever: DynRetriever,
}

impl SourceConnector {
    pub fn new(name: impl Into<String>, retriever: DynRetriever) -> Self {
        Self {
            name: name.into(),
            retriever,
        }
    }
}

impl std::fmt::Debug for SourceConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConnector")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn value_to_i64(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(value_to_i64(&v).unwrap_or(0))
}

// Negative counts make no sense for comments or votes; clamp at zero.
fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(value_to_i64(&v).map(|n| n.max(0) as u64).unwrap_or(0))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
