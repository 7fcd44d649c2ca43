use std::path::PathBuf;

use directories::BaseDirs;

use super::CacheError;

/// Subdirectory of the user cache directory holding the cache file
const APP_DIR: &str = "goread";

/// Name of the cache file
const CACHE_FILE: &str = "cache.json";

/// Returns the default cache file location, `<user cache dir>/goread/cache.json`
///
/// The user cache directory is `~/.cache` on Linux (or `$XDG_CACHE_HOME`),
/// `~/Library/Caches` on macOS and `%LOCALAPPDATA%` on Windows.
pub fn default_path() -> Result<PathBuf, CacheError> {
    let base = BaseDirs::new().ok_or(CacheError::Environment)?;
    Ok(base.cache_dir().join(APP_DIR).join(CACHE_FILE))
}
