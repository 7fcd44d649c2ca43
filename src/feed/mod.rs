//! Feed retrieval for the article cache
//!
//! This module defines the [`Article`] payload stored by the cache and the
//! [`FeedFetcher`] trait the cache calls on a miss. The production fetcher,
//! [`HttpFetcher`], downloads a feed over HTTP and parses RSS or Atom with `feed-rs`.

pub mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single article from a feed
///
/// The cache never interprets these fields; it stores and returns them verbatim.
/// Optional fields are omitted from the cache file when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Article {
    /// Article headline
    pub title: String,
    /// Short summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Full body, when the feed carries it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Primary link to the article
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Every link listed for the article
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    /// When the article was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// When the article was first published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    /// Author names
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// Feed-assigned unique identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    /// Category terms
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// Errors that can occur when fetching a feed
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body was not a valid RSS or Atom document
    #[error("Failed to parse feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),

    /// The fetch panicked before producing a result
    #[error("Fetching {url} aborted unexpectedly")]
    Aborted { url: String },
}

/// Retrieves the articles published at a feed URL
///
/// The cache imposes no timeout of its own; latency and timeouts are the
/// implementation's concern. A successful result fully replaces whatever the
/// cache held for the URL before.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse the feed at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<Article>, FetchError>;
}
