// Remote image cache: fetched once, stored under
// {cache}/images/{sha256(url)}.image, never expires
//
// Image widgets and skin backgrounds read the decoded file straight from
// `path()`; there is no background worker because the entry has no
// expiration.

use super::{content_key, prime, validate_url, CacheEntry, Refresh};
use crate::error::{CacheError, FetchError};
use crate::net;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RemoteImageCache {
    entry: CacheEntry,
    url: String,
    client: reqwest::blocking::Client,
}

impl RemoteImageCache {
    pub fn new(base_path: &Path, url: &str) -> Result<Self, CacheError> {
        Self::with_timeout(base_path, url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_path: &Path,
        url: &str,
        timeout: Duration,
    ) -> Result<Self, CacheError> {
        validate_url(url)?;
        if timeout.is_zero() {
            return Err(CacheError::InvalidArgument(
                "timeout must be positive".to_string(),
            ));
        }
        let entry = CacheEntry::new(
            base_path,
            "images",
            &format!("{}.image", content_key(url)),
            None,
            false,
        )?;
        let cache = Self {
            entry,
            url: url.to_string(),
            client: net::client(timeout)?,
        };
        prime(&cache.entry, &cache)?;
        Ok(cache)
    }

    /// Path to the cached image bytes, for decoding.
    pub fn path(&self) -> &Path {
        self.entry.path()
    }
}

impl Refresh for RemoteImageCache {
    fn refresh(&self) -> Result<(), CacheError> {
        let response = net::http_get(&self.client, &self.url)?;
        if !response.content_type.contains("image") {
            return Err(FetchError::ContentType {
                url: self.url.clone(),
                content_type: response.content_type,
            }
            .into());
        }
        tracing::info!(
            "refreshed remote image from {} ({} bytes)",
            self.url,
            response.body.len()
        );
        self.entry.save_bytes(&response.body)
    }
}
