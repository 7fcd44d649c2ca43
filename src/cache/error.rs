use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::feed::FetchError;

/// Errors that can occur while loading, saving or filling the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file could not be opened or read
    #[error("Failed to read cache file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file does not contain a valid cache document
    #[error("Failed to decode cache file: {0}")]
    Decode(#[source] serde_json::Error),

    /// The in-memory cache could not be serialized
    #[error("Failed to encode cache: {0}")]
    Encode(#[source] serde_json::Error),

    /// Writing the cache file failed even after creating its directory
    #[error("Failed to write cache file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache directory could not be created
    #[error("Failed to create cache directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The feed fetcher failed; shared so coalesced callers see the same error
    #[error("Failed to fetch feed: {0}")]
    Fetch(#[from] Arc<FetchError>),

    /// The platform cache directory could not be determined
    #[error("Could not determine the user cache directory")]
    Environment,

    /// The cache service task is no longer running
    #[error("Cache service has stopped")]
    ServiceStopped,
}

impl From<FetchError> for CacheError {
    fn from(err: FetchError) -> Self {
        CacheError::Fetch(Arc::new(err))
    }
}

impl CacheError {
    /// True when a load failed only because no cache file exists yet
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            CacheError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
