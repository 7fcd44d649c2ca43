//! Single-writer task owning a `CacheStore`
//!
//! Callers talk to the store through a cloneable `CacheHandle` over a tokio
//! channel. Fetches run on their own tasks and report back to the service, which
//! is the only writer of the map. Concurrent requests for the same stale URL
//! wait on one shared fetch instead of each hitting the network.

use chrono::Utc;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{CacheError, CacheStore};
use crate::feed::{Article, FeedFetcher, FetchError};

/// Capacity of the request channel
const REQUEST_BUFFER: usize = 32;

/// Outcome delivered to every caller waiting on one fetch
type SharedResult = Result<Vec<Article>, Arc<FetchError>>;

/// Messages sent from handles to the service task
enum Request {
    GetArticle {
        url: String,
        reply: oneshot::Sender<SharedResult>,
    },
    Save {
        reply: oneshot::Sender<Result<(), CacheError>>,
    },
}

/// Handle for querying a running `CacheService`
#[derive(Debug, Clone)]
pub struct CacheHandle {
    sender: mpsc::Sender<Request>,
}

impl CacheHandle {
    /// Returns the articles for `url`, fetching them if missing or expired
    ///
    /// If another caller is already fetching `url`, this waits for that fetch
    /// and receives the same articles or error.
    pub async fn get_article(&self, url: impl Into<String>) -> Result<Vec<Article>, CacheError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Request::GetArticle {
                url: url.into(),
                reply,
            })
            .await
            .map_err(|_| CacheError::ServiceStopped)?;

        let result = response.await.map_err(|_| CacheError::ServiceStopped)?;
        result.map_err(CacheError::Fetch)
    }

    /// Writes the current cache contents to disk
    pub async fn save(&self) -> Result<(), CacheError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Request::Save { reply })
            .await
            .map_err(|_| CacheError::ServiceStopped)?;

        response.await.map_err(|_| CacheError::ServiceStopped)?
    }
}

/// Owns a `CacheStore` on a background task
pub struct CacheService<F> {
    store: CacheStore,
    fetcher: Arc<F>,
    completed: mpsc::UnboundedSender<(String, Result<Vec<Article>, FetchError>)>,
    /// Callers waiting on an in-flight fetch, keyed by URL
    waiters: HashMap<String, Vec<oneshot::Sender<SharedResult>>>,
}

impl<F: FeedFetcher + 'static> CacheService<F> {
    /// Moves `store` onto a new task and returns a handle to it
    ///
    /// The returned `JoinHandle` resolves to the store once every `CacheHandle`
    /// has been dropped and all in-flight fetches have finished, so the caller
    /// can save it on shutdown.
    pub fn spawn(store: CacheStore, fetcher: F) -> (CacheHandle, JoinHandle<CacheStore>) {
        let (sender, requests) = mpsc::channel(REQUEST_BUFFER);
        let (completed, completions) = mpsc::unbounded_channel();

        let service = Self {
            store,
            fetcher: Arc::new(fetcher),
            completed,
            waiters: HashMap::new(),
        };

        let task = tokio::spawn(service.run(requests, completions));
        (CacheHandle { sender }, task)
    }

    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut completions: mpsc::UnboundedReceiver<(String, Result<Vec<Article>, FetchError>)>,
    ) -> CacheStore {
        let mut accepting = true;

        while accepting || !self.waiters.is_empty() {
            tokio::select! {
                request = requests.recv(), if accepting => match request {
                    Some(Request::GetArticle { url, reply }) => self.get_article(url, reply),
                    Some(Request::Save { reply }) => {
                        let _ = reply.send(self.save().await);
                    }
                    None => accepting = false,
                },
                Some((url, result)) = completions.recv() => self.finish(url, result),
            }
        }

        debug!(entries = self.store.len(), "cache service stopped");
        self.store
    }

    fn get_article(&mut self, url: String, reply: oneshot::Sender<SharedResult>) {
        if let Some(items) = self.store.fresh_items(&url, Utc::now()) {
            debug!(url = %url, "cache hit");
            let _ = reply.send(Ok(items.to_vec()));
            return;
        }

        if let Some(waiting) = self.waiters.get_mut(&url) {
            debug!(url = %url, "joining in-flight fetch");
            waiting.push(reply);
            return;
        }

        debug!(url = %url, "cache miss, fetching");
        self.waiters.insert(url.clone(), vec![reply]);

        let fetcher = Arc::clone(&self.fetcher);
        let completed = self.completed.clone();
        tokio::spawn(async move {
            // A panicking fetcher must still answer its waiters
            let result = AssertUnwindSafe(fetcher.fetch(&url))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(FetchError::Aborted { url: url.clone() }));
            let _ = completed.send((url, result));
        });
    }

    /// Writes a snapshot of the store on the blocking pool
    ///
    /// Requests queue up behind the save, but the runtime thread is not blocked.
    async fn save(&self) -> Result<(), CacheError> {
        let snapshot = self.store.clone();
        tokio::task::spawn_blocking(move || snapshot.save())
            .await
            .map_err(|_| CacheError::ServiceStopped)?
    }

    fn finish(&mut self, url: String, result: Result<Vec<Article>, FetchError>) {
        let waiting = self.waiters.remove(&url).unwrap_or_default();

        let shared = match result {
            Ok(items) => {
                self.store.store_fetched(&url, items.clone(), Utc::now());
                Ok(items)
            }
            Err(err) => {
                warn!(url = %url, error = %err, "feed fetch failed");
                Err(Arc::new(err))
            }
        };

        for reply in waiting {
            let _ = reply.send(shared.clone());
        }
    }
}
