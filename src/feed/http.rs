//! HTTP feed fetcher
//!
//! Downloads a feed with `reqwest` and parses the RSS or Atom body with `feed-rs`.

use async_trait::async_trait;
use feed_rs::model::Entry;
use reqwest::Client;
use tracing::debug;

use super::{Article, FeedFetcher, FetchError};

/// Fetches feeds over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a new HttpFetcher with default settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a new HttpFetcher with a custom HTTP client
    ///
    /// Use this to configure timeouts, proxies or a user agent.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<Article>, FetchError> {
        debug!(url, "requesting feed");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        parse_feed(&body)
    }
}

/// Parse an RSS or Atom document into articles, preserving feed order
pub fn parse_feed(body: &[u8]) -> Result<Vec<Article>, FetchError> {
    let feed = feed_rs::parser::parse(body)?;
    Ok(feed.entries.into_iter().map(entry_to_article).collect())
}

fn entry_to_article(entry: Entry) -> Article {
    let links: Vec<String> = entry.links.into_iter().map(|link| link.href).collect();

    Article {
        title: entry.title.map(|text| text.content).unwrap_or_default(),
        description: entry.summary.map(|text| text.content),
        content: entry.content.and_then(|content| content.body),
        link: links.first().cloned(),
        links,
        updated: entry.updated,
        published: entry.published,
        authors: entry.authors.into_iter().map(|person| person.name).collect(),
        guid: Some(entry.id).filter(|id| !id.is_empty()),
        categories: entry
            .categories
            .into_iter()
            .map(|category| category.term)
            .collect(),
    }
}
