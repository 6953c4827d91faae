use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the platform-appropriate cache directory for regional-pool
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("regional-pool/http-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/regional-pool/http-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the HTTP cache directory
pub fn clear_cache() -> Result<()> {
    let cache_path = get_cache_path();
    match std::fs::remove_dir_all(&cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

#[derive(Serialize, Deserialize)]
struct CachedBody {
    fetched_at: u64, // Unix timestamp
    body: Vec<u8>,
}

/// Response bodies on disk, keyed by URL, fresh for `ttl` after fetching.
#[derive(Clone, Debug)]
pub struct ResponseCache {
    path: PathBuf,
    ttl: Duration,
    enabled: bool, // false when --no-cache
}

impl ResponseCache {
    pub fn new(path: PathBuf, ttl: Duration, enabled: bool) -> Self {
        Self { path, ttl, enabled }
    }

    pub fn disabled() -> Self {
        Self::new(get_cache_path(), Duration::ZERO, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Async wrapper for `read_sync`; disk access runs on the blocking pool
    pub async fn read(&self, key: &str) -> Option<Vec<u8>> {
        if !self.enabled {
            return None;
        }
        let cache = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || cache.read_sync(&key))
            .await
            .ok()
            .flatten()
    }

    /// Async wrapper for `write_sync`
    pub async fn write(&self, key: &str, body: &[u8]) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let cache = self.clone();
        let key = key.to_string();
        let body = body.to_vec();
        tokio::task::spawn_blocking(move || cache.write_sync(&key, &body))
            .await
            .context("Cache write task failed")?
    }

    /// Cached body for `key` if present and still fresh
    pub fn read_sync(&self, key: &str) -> Option<Vec<u8>> {
        if !self.enabled {
            return None;
        }
        let bytes = cacache::read_sync(&self.path, key).ok()?;
        let cached: CachedBody = serde_json::from_slice(&bytes).ok()?;
        if now_secs().saturating_sub(cached.fetched_at) < self.ttl.as_secs() {
            Some(cached.body)
        } else {
            None
        }
    }

    pub fn write_sync(&self, key: &str, body: &[u8]) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let entry = CachedBody {
            fetched_at: now_secs(),
            body: body.to_vec(),
        };
        let json = serde_json::to_vec(&entry)?;
        cacache::write_sync(&self.path, key, &json).context("Failed to write cache entry")?;
        Ok(())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
