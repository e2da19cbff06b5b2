// src/sources/mod.rs
//! Story sources: the retrieval contract, the shared item shape, and the
//! concrete adapters (Hacker News API, Lobsters front page).

pub mod error;
pub mod providers;
pub mod types;

pub use error::FetchError;
pub use types::{DynRetriever, Item, Retriever, SourceConnector};
