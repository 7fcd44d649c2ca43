//! goread - Read RSS and Atom feeds through a local article cache
//!
//! Loads the on-disk cache, resolves every feed URL given on the command line
//! (serving fresh entries from cache and fetching the rest), prints the article
//! titles and saves the cache before exiting.

use std::process::ExitCode;

use clap::Parser;
use futures::future::join_all;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use goread::cache::{CacheService, CacheStore};
use goread::cli::Cli;
use goread::feed::{Article, HttpFetcher};

/// Sets up stderr logging; `RUST_LOG` wins over the `-v` flags when set
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints one feed's articles as an indented title list
fn print_feed(url: &str, articles: &[Article]) {
    println!("{} ({} articles)", url, articles.len());
    for article in articles {
        match &article.link {
            Some(link) => println!("  - {} <{}>", article.title, link),
            None => println!("  - {}", article.title),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let config = cli.cache_config()?;
    let mut store = CacheStore::new(config);

    // A missing file just means this is the first run
    match store.load() {
        Ok(()) => {}
        Err(err) if err.is_missing_file() => {
            info!(path = %store.path().display(), "no cache file yet, starting empty");
        }
        Err(err) => warn!(error = %err, "ignoring unreadable cache file"),
    }

    let (cache, service) = CacheService::spawn(store, HttpFetcher::new());

    let results = join_all(cli.urls.iter().map(|url| cache.get_article(url.as_str()))).await;

    let mut failed = false;
    for (url, result) in cli.urls.iter().zip(results) {
        match result {
            Ok(articles) => print_feed(url, &articles),
            Err(err) => {
                failed = true;
                eprintln!("{}: {}", url, err);
            }
        }
    }

    drop(cache);
    let store = service.await?;
    if let Err(err) = store.save() {
        failed = true;
        eprintln!("{}", err);
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
