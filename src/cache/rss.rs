// RSS feed cache: fetch, parse, store under {cache}/feeds/{sha256(url)}.rss

use super::{content_key, prime, validate_url, CacheEntry, Refresh};
use crate::error::{CacheError, FetchError};
use crate::net::{self, feed};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(300);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// TTL cache over one RSS feed URL. Construction primes the entry (a
/// synchronous fetch if the cached copy is missing or stale); thereafter a
/// refresh worker keeps it fresh on the expiration interval.
pub struct RssCache {
    entry: CacheEntry,
    url: String,
    client: reqwest::blocking::Client,
}

impl RssCache {
    pub fn new(base_path: &Path, url: &str) -> Result<Self, CacheError> {
        validate_url(url)?;
        let entry = CacheEntry::new(
            base_path,
            "feeds",
            &format!("{}.rss", content_key(url)),
            Some(DEFAULT_EXPIRATION),
            true,
        )?;
        let cache = Self {
            entry,
            url: url.to_string(),
            client: net::client(DEFAULT_TIMEOUT)?,
        };
        prime(&cache.entry, &cache)?;
        Ok(cache)
    }

    /// Handle to the underlying entry; change sources hold a clone of this.
    pub fn entry(&self) -> &CacheEntry {
        &self.entry
    }
}

impl Refresh for RssCache {
    fn refresh(&self) -> Result<(), CacheError> {
        let response = net::http_get(&self.client, &self.url)?;
        if !response.content_type.contains("xml") {
            return Err(FetchError::ContentType {
                url: self.url.clone(),
                content_type: response.content_type,
            }
            .into());
        }
        let parsed = feed::parse_rss(&String::from_utf8_lossy(&response.body));
        tracing::info!(
            "refreshed feed '{}' ({} items) from {}",
            parsed.title,
            parsed.items.len(),
            self.url
        );
        self.entry.save(&parsed)
    }
}
