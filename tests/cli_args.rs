//! Integration tests for the goread binary
//!
//! Runs the binary against temporary cache files. Feeds are served from a
//! pre-seeded cache or point at a closed local port, so no test needs network access.

use std::fs;
use std::process::Command;

use chrono::{Duration, Utc};
use tempfile::TempDir;

/// Address nothing listens on, so fetches fail fast
const UNREACHABLE_FEED: &str = "http://127.0.0.1:9/feed.xml";

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_goread"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute goread")
}

/// Writes a cache file holding one entry for `url` with the given expiry offset
fn seed_cache(dir: &TempDir, url: &str, expires_in: Duration) -> String {
    let path = dir.path().join("cache.json");
    let mut cache = serde_json::Map::new();
    cache.insert(
        url.to_string(),
        serde_json::json!({
            "Expire": (Utc::now() + expires_in).to_rfc3339(),
            "Items": [
                { "title": "Cached headline", "link": "https://example.com/cached" }
            ]
        }),
    );
    let json = serde_json::Value::Object(cache);
    fs::write(&path, json.to_string()).expect("Failed to seed cache");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("goread"), "Help should mention goread");
    assert!(stdout.contains("cache-file"), "Help should mention --cache-file");
    assert!(stdout.contains("ttl-hours"), "Help should mention --ttl-hours");
}

#[test]
fn test_invalid_url_prints_error_and_exits() {
    let output = run_cli(&["not-a-url"]);
    assert!(!output.status.success(), "Expected invalid URL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid feed URL"),
        "Should print error message about the URL: {}",
        stderr
    );
}

#[test]
fn test_missing_url_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_zero_ttl_is_rejected() {
    let output = run_cli(&["--ttl-hours", "0", "https://example.com/feed"]);
    assert!(!output.status.success());
}

#[test]
fn test_fresh_cache_entry_is_printed_without_fetching() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let cache_file = seed_cache(&dir, UNREACHABLE_FEED, Duration::hours(1));

    let output = run_cli(&["--cache-file", &cache_file, UNREACHABLE_FEED]);

    assert!(
        output.status.success(),
        "Fresh cache hit should not touch the network: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cached headline"));
    assert!(stdout.contains("https://example.com/cached"));
}

#[test]
fn test_expired_entry_is_pruned_and_failed_refetch_is_reported() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let cache_file = seed_cache(&dir, UNREACHABLE_FEED, Duration::minutes(-1));

    let output = run_cli(&["--cache-file", &cache_file, UNREACHABLE_FEED]);

    assert!(!output.status.success(), "Failed fetch should set a failure exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(UNREACHABLE_FEED), "Error should name the feed: {}", stderr);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Cached headline"));

    // Save still runs and the expired feed is gone from the file
    let saved = fs::read_to_string(&cache_file).expect("Cache file should remain");
    let saved: serde_json::Value = serde_json::from_str(&saved).expect("Saved cache is JSON");
    assert!(saved.get(UNREACHABLE_FEED).is_none());
}

#[test]
fn test_first_run_creates_cache_file_in_missing_directory() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let cache_file = dir.path().join("nested").join("goread").join("cache.json");
    let cache_arg = cache_file.to_string_lossy().into_owned();

    let output = run_cli(&["--cache-file", &cache_arg, UNREACHABLE_FEED]);

    // The fetch fails, but the (empty) cache is still written
    assert!(!output.status.success());
    let saved = fs::read_to_string(&cache_file).expect("Cache file should be created");
    assert_eq!(saved.trim(), "{}");
}

#[test]
fn test_save_failure_is_reported_as_readable_message() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "a file, not a directory").expect("Failed to write file");
    let cache_arg = blocker.join("cache.json").to_string_lossy().into_owned();

    let output = run_cli(&["--cache-file", &cache_arg, UNREACHABLE_FEED]);

    assert!(!output.status.success(), "Failed save should set a failure exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to create cache directory"),
        "Save error should use its display form: {}",
        stderr
    );
    assert!(!stderr.contains("CreateDir {"), "Debug form leaked: {}", stderr);
}
