//! In-memory article cache mirrored to a JSON file
//!
//! Provides a `CacheStore` mapping feed URLs to cached entries, with load/save to
//! a single file and a get-or-fetch operation that refreshes expired entries.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{default_path, CacheError, Entry};
use crate::feed::{Article, FeedFetcher};

/// How long fetched articles are served from cache by default
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Where the cache lives and how long entries stay fresh
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Location of the cache file
    pub path: PathBuf,
    /// Lifetime of a fetched entry
    pub ttl: Duration,
}

impl CacheConfig {
    /// Creates a config for the given cache file with the default 24 hour TTL
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    /// Creates a config pointing at `<user cache dir>/goread/cache.json`
    ///
    /// Fails with `CacheError::Environment` if the platform cache directory
    /// cannot be determined.
    pub fn from_default_location() -> Result<Self, CacheError> {
        Ok(Self::new(default_path()?))
    }

    /// Overrides the entry lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Feed articles keyed by feed URL
///
/// The in-memory map is the source of truth; the file at `path()` is a mirror
/// updated only by `save`. The store is a plain owned value: callers that need
/// shared access should go through `CacheService`.
#[derive(Debug, Clone)]
pub struct CacheStore {
    file_path: PathBuf,
    ttl: Duration,
    content: HashMap<String, Entry>,
}

impl CacheStore {
    /// Creates an empty store; call `load` to read the existing cache file
    pub fn new(config: CacheConfig) -> Self {
        Self {
            file_path: config.path,
            ttl: config.ttl,
            content: HashMap::new(),
        }
    }

    /// Path of the backing cache file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Lifetime given to newly fetched entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// All cached entries keyed by feed URL
    pub fn entries(&self) -> &HashMap<String, Entry> {
        &self.content
    }

    /// The cached entry for `url`, fresh or not
    pub fn get(&self, url: &str) -> Option<&Entry> {
        self.content.get(url)
    }

    /// Stores `entry` under `url`, returning any entry it replaced
    pub fn insert(&mut self, url: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.content.insert(url.into(), entry)
    }

    /// Number of cached feeds
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// True when no feed is cached
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Reads the cache file, replacing the in-memory content
    ///
    /// Entries that expired before now are dropped. On any error the in-memory
    /// content is left untouched.
    pub fn load(&mut self) -> Result<(), CacheError> {
        self.load_at(Utc::now())
    }

    /// Same as `load`, pruning against the given instant
    pub fn load_at(&mut self, now: DateTime<Utc>) -> Result<(), CacheError> {
        let bytes = fs::read(&self.file_path).map_err(|source| CacheError::Read {
            path: self.file_path.clone(),
            source,
        })?;

        let mut content: HashMap<String, Entry> =
            serde_json::from_slice(&bytes).map_err(CacheError::Decode)?;

        let total = content.len();
        content.retain(|_, entry| !entry.is_prunable(now));

        info!(
            path = %self.file_path.display(),
            loaded = content.len(),
            pruned = total - content.len(),
            "loaded article cache"
        );

        self.content = content;
        Ok(())
    }

    /// Writes the cache to its file
    ///
    /// Each attempt writes a temporary file beside the target and renames it into
    /// place, so the cache file is never left half written. If the first attempt
    /// fails the parent directory is created and the write is retried once.
    pub fn save(&self) -> Result<(), CacheError> {
        let data = serde_json::to_vec(&self.content).map_err(CacheError::Encode)?;

        if let Err(err) = write_atomic(&self.file_path, &data) {
            let dir = parent_dir(&self.file_path);
            warn!(
                path = %self.file_path.display(),
                error = %err,
                "cache write failed, creating directory and retrying"
            );

            create_dir(dir).map_err(|source| CacheError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;

            write_atomic(&self.file_path, &data).map_err(|source| CacheError::Write {
                path: self.file_path.clone(),
                source,
            })?;
        }

        debug!(
            path = %self.file_path.display(),
            entries = self.content.len(),
            "saved article cache"
        );
        Ok(())
    }

    /// Returns the articles for `url`, fetching them if missing or expired
    ///
    /// A fresh entry is returned without calling the fetcher. Otherwise the
    /// fetched articles replace the entry with a new expiry of now + TTL. A fetch
    /// error is returned as-is and leaves the cache unchanged.
    pub async fn get_article<F>(
        &mut self,
        url: &str,
        fetcher: &F,
    ) -> Result<Vec<Article>, CacheError>
    where
        F: FeedFetcher + ?Sized,
    {
        self.get_or_fetch(url, fetcher, Utc::now).await
    }

    /// Same as `get_article`, treating `now` as the current time throughout
    pub async fn get_article_at<F>(
        &mut self,
        url: &str,
        fetcher: &F,
        now: DateTime<Utc>,
    ) -> Result<Vec<Article>, CacheError>
    where
        F: FeedFetcher + ?Sized,
    {
        self.get_or_fetch(url, fetcher, || now).await
    }

    async fn get_or_fetch<F>(
        &mut self,
        url: &str,
        fetcher: &F,
        clock: impl Fn() -> DateTime<Utc>,
    ) -> Result<Vec<Article>, CacheError>
    where
        F: FeedFetcher + ?Sized,
    {
        if let Some(items) = self.fresh_items(url, clock()) {
            debug!(url, "cache hit");
            return Ok(items.to_vec());
        }

        debug!(url, "cache miss, fetching");
        let items = fetcher.fetch(url).await?;
        self.store_fetched(url, items.clone(), clock());
        Ok(items)
    }

    /// The cached articles for `url` if its entry is still fresh at `now`
    pub fn fresh_items(&self, url: &str, now: DateTime<Utc>) -> Option<&[Article]> {
        self.content
            .get(url)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.items.as_slice())
    }

    /// Records freshly fetched articles for `url`, expiring one TTL after `now`
    pub fn store_fetched(&mut self, url: &str, items: Vec<Article>, now: DateTime<Utc>) {
        self.content
            .insert(url.to_string(), Entry::new(items, now, self.ttl));
    }
}

/// Directory holding `path`; a bare file name lives in the working directory
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Writes `data` to a temp file (mode 0600) next to `path` and renames it over `path`
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = NamedTempFile::new_in(parent_dir(path))?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Creates `dir` and any missing parents with mode 0755
fn create_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}
