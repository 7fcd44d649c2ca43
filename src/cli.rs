//! Command-line interface parsing for goread
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the cache configuration used at startup.

use std::path::PathBuf;

use chrono::Duration;
use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::cache::{CacheConfig, CacheError, DEFAULT_TTL_HOURS};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The argument is not an absolute URL
    #[error("Invalid feed URL: '{0}'")]
    InvalidUrl(String),

    /// The URL uses a scheme other than http or https
    #[error("Unsupported URL scheme '{scheme}' in '{url}'. Use http or https")]
    UnsupportedScheme { url: String, scheme: String },
}

/// goread - Read RSS and Atom feeds through a local article cache
#[derive(Parser, Debug)]
#[command(name = "goread")]
#[command(about = "Fetch feeds through a 24-hour on-disk article cache")]
#[command(version)]
pub struct Cli {
    /// Feed URLs to read
    ///
    /// Examples:
    ///   goread https://blog.rust-lang.org/feed.xml
    ///   goread --ttl-hours 1 https://example.com/rss https://example.org/atom.xml
    #[arg(required = true, value_name = "URL", value_parser = parse_feed_url)]
    pub urls: Vec<String>,

    /// Cache file to use instead of <user cache dir>/goread/cache.json
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// How long fetched articles are served from cache
    #[arg(
        long,
        value_name = "HOURS",
        default_value_t = DEFAULT_TTL_HOURS,
        value_parser = clap::value_parser!(i64).range(1..=24 * 365)
    )]
    pub ttl_hours: i64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Validates a feed URL argument.
///
/// # Arguments
/// * `s` - The URL string from the command line
///
/// # Returns
/// * `Ok(String)` with the URL exactly as given if it is an absolute http(s) URL
/// * `Err(CliError)` otherwise
pub fn parse_feed_url(s: &str) -> Result<String, CliError> {
    let url = Url::parse(s).map_err(|_| CliError::InvalidUrl(s.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(s.to_string()),
        scheme => Err(CliError::UnsupportedScheme {
            url: s.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

impl Cli {
    /// Builds the cache configuration from parsed CLI arguments.
    ///
    /// Falls back to the platform default cache location when `--cache-file`
    /// is absent, which fails with `CacheError::Environment` if no user cache
    /// directory exists.
    pub fn cache_config(&self) -> Result<CacheConfig, CacheError> {
        let config = match &self.cache_file {
            Some(path) => CacheConfig::new(path.clone()),
            None => CacheConfig::from_default_location()?,
        };
        Ok(config.with_ttl(Duration::hours(self.ttl_hours)))
    }

    /// Log filter directive matching the `-v` count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
