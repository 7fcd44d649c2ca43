//! Cache module for feed articles keyed by feed URL
//!
//! This module provides a `CacheStore` that keeps fetched articles in memory with
//! an expiry timestamp per feed and mirrors them to a single JSON file on disk.
//! Expired entries are refetched on access and pruned when the file is loaded.
//! `CacheService` wraps a store in a single-writer task so that concurrent callers
//! can share it and share in-flight fetches.

mod entry;
mod error;
mod path;
mod service;
mod store;

pub use entry::Entry;
pub use error::CacheError;
pub use path::default_path;
pub use service::{CacheHandle, CacheService};
pub use store::{CacheConfig, CacheStore, DEFAULT_TTL_HOURS};
