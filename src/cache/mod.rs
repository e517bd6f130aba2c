// Cache module - generic TTL file cache
//
// Each cache entry is one file at {base}/{category}/{sha256(key)[:64]}.{ext}.
// Validity is decided by the file's modification time, never by an embedded
// timestamp, so external tooling can touch cache files to extend or expire
// them. Saves go through a temp file + rename and a per-entry RwLock, so a
// reader never observes a partially-written entry and the last_change signal
// becomes visible together with the content.
//
// Refresh model: the fetch logic lives behind the Refresh trait. At
// construction an invalid entry is refreshed synchronously (prime), and
// errors propagate to the caller. Entries with a finite expiration then get
// one background worker per cache that refreshes on the expiration interval;
// worker-side errors are logged and swallowed so a single bad fetch does not
// kill the worker. This asymmetry is contractual.

pub mod remote_image;
pub mod rss;

use crate::error::CacheError;
use crate::worker::PeriodicWorker;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};

/// Derive the stable on-disk key for a cache source identifier (usually a
/// URL): the full 64-hex-char SHA-256 digest.
pub fn content_key(identifier: &str) -> String {
    let digest = Sha256::digest(identifier.as_bytes());
    let mut key = String::with_capacity(64);
    for byte in digest {
        key.push_str(&format!("{:02x}", byte));
    }
    key
}

/// Reject cache source URLs that are not plain http(s).
pub(crate) fn validate_url(url: &str) -> Result<(), CacheError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(CacheError::InvalidArgument(format!(
            "unsupported URL scheme: {}",
            url
        )))
    }
}

struct EntryInner {
    path: PathBuf,
    expiration: Option<Duration>,
    purge_expired: bool,
    /// Serializes file access between the render thread and the refresh
    /// worker. Writers also hold this across the last_change update.
    file_lock: RwLock<()>,
    /// Timestamp of the last successful save in this process. Never mutated
    /// by loads.
    last_change: Mutex<Option<DateTime<Utc>>>,
}

/// Handle to a single on-disk cache entry. Cheap to clone; clones share the
/// same lock and change signal.
#[derive(Clone)]
pub struct CacheEntry {
    inner: Arc<EntryInner>,
}

impl CacheEntry {
    /// Create an entry under `{base}/{category}/{file_name}`, ensuring the
    /// directory exists. `expiration = None` means the entry never expires.
    pub fn new(
        base: &Path,
        category: &str,
        file_name: &str,
        expiration: Option<Duration>,
        purge_expired: bool,
    ) -> Result<Self, CacheError> {
        let dir = base.join(category);
        fs::create_dir_all(&dir).map_err(|source| CacheError::DirectoryCreate {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            inner: Arc::new(EntryInner {
                path: dir.join(file_name),
                expiration,
                purge_expired,
                file_lock: RwLock::new(()),
                last_change: Mutex::new(None),
            }),
        })
    }

    /// Full path of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Expiration interval, if any. Drives the background worker cadence.
    pub fn expiration(&self) -> Option<Duration> {
        self.inner.expiration
    }

    /// Whether the backing file exists on disk.
    pub fn exists(&self) -> bool {
        self.inner.path.exists()
    }

    /// Validity law: the entry exists AND (never expires OR is younger than
    /// its expiration). Age is measured from the file's mtime.
    pub fn valid(&self) -> bool {
        self.exists() && !self.expired()
    }

    /// Timestamp of the last successful save, None before the first one.
    pub fn last_change(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_change.lock().unwrap()
    }

    fn age(&self) -> Option<Duration> {
        let mtime = fs::metadata(&self.inner.path).and_then(|m| m.modified()).ok()?;
        SystemTime::now().duration_since(mtime).ok()
    }

    fn expired(&self) -> bool {
        match self.inner.expiration {
            None => false,
            Some(ttl) => match self.age() {
                Some(age) => age >= ttl,
                // Unreadable mtime: treat as expired so a refresh replaces it
                None => true,
            },
        }
    }

    /// Serialize `data` to the entry and stamp `last_change`.
    pub fn save<T: Serialize>(&self, data: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_vec(data).map_err(|source| CacheError::Corrupt {
            path: self.inner.path.clone(),
            source,
        })?;
        self.write_raw(&raw)
    }

    /// Same contract as `save` for opaque byte payloads (images).
    pub fn save_bytes(&self, raw: &[u8]) -> Result<(), CacheError> {
        self.write_raw(raw)
    }

    fn write_raw(&self, raw: &[u8]) -> Result<(), CacheError> {
        let _guard = self.inner.file_lock.write().unwrap();

        // Write the sibling temp file first, then rename over the entry.
        // Rename within one directory is atomic, so readers see either the
        // old content or the new content, never a torn write.
        let tmp = self.inner.path.with_extension("tmp");
        let io_err = |source| CacheError::Io {
            path: self.inner.path.clone(),
            source,
        };
        fs::write(&tmp, raw).map_err(io_err)?;
        fs::rename(&tmp, &self.inner.path).map_err(io_err)?;

        *self.inner.last_change.lock().unwrap() = Some(Utc::now());
        tracing::debug!("cache saved ({})", self.inner.path.display());
        Ok(())
    }

    /// Load and deserialize the entry.
    ///
    /// Returns `Ok(None)` for a miss (missing or expired file; an expired
    /// entry with purging enabled is deleted as a side effect). A fresh file
    /// that fails to deserialize is `Err(Corrupt)`, not a miss - callers must
    /// be able to distinguish "no data" from "bad data".
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, CacheError> {
        match self.load_raw()? {
            None => Ok(None),
            Some(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|source| CacheError::Corrupt {
                    path: self.inner.path.clone(),
                    source,
                }),
        }
    }

    /// `load` for opaque byte payloads.
    pub fn load_bytes(&self) -> Result<Option<Vec<u8>>, CacheError> {
        self.load_raw()
    }

    fn load_raw(&self) -> Result<Option<Vec<u8>>, CacheError> {
        {
            let _guard = self.inner.file_lock.read().unwrap();
            if !self.exists() {
                tracing::debug!("cache miss ({})", self.inner.path.display());
                return Ok(None);
            }
            if !self.expired() {
                return match fs::read(&self.inner.path) {
                    Ok(raw) => Ok(Some(raw)),
                    // The file vanished between the checks: plain miss
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(source) => Err(CacheError::Io {
                        path: self.inner.path.clone(),
                        source,
                    }),
                };
            }
        }

        // Expired. Purging is the documented side effect of observing an
        // invalid entry during load; re-check under the write lock in case a
        // refresh landed in between.
        tracing::debug!("cache expired ({})", self.inner.path.display());
        if self.inner.purge_expired {
            let _guard = self.inner.file_lock.write().unwrap();
            if self.expired() && self.exists() {
                if let Err(e) = fs::remove_file(&self.inner.path) {
                    tracing::warn!(
                        "failed to purge expired cache ({}): {}",
                        self.inner.path.display(),
                        e
                    );
                }
            }
        }
        Ok(None)
    }
}

/// Fetch hook supplied by each specialized cache. Implementations fetch
/// their source and call `save`/`save_bytes` on their entry.
pub trait Refresh: Send + Sync + 'static {
    fn refresh(&self) -> Result<(), CacheError>;
}

/// Construction-time refresh: if the entry is currently invalid, run the
/// fetch synchronously. Errors propagate to the caller and should abort that
/// widget's setup.
pub fn prime(entry: &CacheEntry, refresher: &dyn Refresh) -> Result<(), CacheError> {
    if entry.valid() {
        return Ok(());
    }
    refresher.refresh()
}

/// Spawn the periodic refresh worker for an entry, if it has a finite
/// expiration. An entry that never expires is refreshed exactly once, at
/// priming, and never again automatically.
///
/// Worker-side refresh errors are logged and retried next interval.
pub fn spawn_refresh_worker(
    name: &str,
    entry: &CacheEntry,
    refresher: Arc<dyn Refresh>,
) -> Option<PeriodicWorker> {
    let interval = entry.expiration()?;
    let tag = name.to_string();
    Some(PeriodicWorker::spawn(name, interval, move || {
        if let Err(e) = refresher.refresh() {
            tracing::warn!("background refresh of '{}' failed: {}", tag, e);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        text: String,
        value: i64,
    }

    fn sample() -> Payload {
        Payload {
            text: "hello".to_string(),
            value: 42,
        }
    }

    fn entry(dir: &Path, ttl: Option<Duration>, purge: bool) -> CacheEntry {
        CacheEntry::new(dir, "feeds", "entry.rss", ttl, purge).unwrap()
    }

    #[test]
    fn test_content_key_is_stable_64_hex() {
        let a = content_key("https://example.com/feed");
        let b = content_key("https://example.com/feed");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, content_key("https://example.com/other"));
    }

    #[test]
    fn test_validate_url_schemes() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("example.com").is_err());
    }

    #[test]
    fn test_new_creates_category_directory() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), None, false);
        assert!(dir.path().join("feeds").is_dir());
        assert!(!e.exists());
        assert!(!e.valid());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), None, false);
        e.save(&sample()).unwrap();
        assert!(e.valid());
        assert_eq!(e.load::<Payload>().unwrap(), Some(sample()));
    }

    #[test]
    fn test_save_bytes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let e = CacheEntry::new(dir.path(), "images", "entry.image", None, false).unwrap();
        e.save_bytes(&[1, 2, 3, 255]).unwrap();
        assert_eq!(e.load_bytes().unwrap(), Some(vec![1, 2, 3, 255]));
    }

    #[test]
    fn test_load_missing_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), Some(Duration::from_secs(300)), true);
        assert!(matches!(e.load::<Payload>(), Ok(None)));
    }

    #[test]
    fn test_corrupt_entry_is_error_not_miss() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), None, false);
        fs::write(e.path(), b"{ not json").unwrap();
        assert!(matches!(
            e.load::<Payload>(),
            Err(CacheError::Corrupt { .. })
        ));
        // The raw bytes are still readable as an opaque payload
        assert!(e.load_bytes().unwrap().is_some());
    }

    #[test]
    fn test_expiry_invalidates_and_purges_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), Some(Duration::from_millis(20)), true);
        e.save(&sample()).unwrap();
        assert!(e.valid());

        std::thread::sleep(Duration::from_millis(30));
        assert!(!e.valid());
        assert!(e.exists());

        // Purge happens as a side effect of the first load after expiry
        assert!(matches!(e.load::<Payload>(), Ok(None)));
        assert!(!e.exists());
    }

    #[test]
    fn test_expired_without_purge_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), Some(Duration::from_millis(20)), false);
        e.save(&sample()).unwrap();
        std::thread::sleep(Duration::from_millis(30));

        assert!(matches!(e.load::<Payload>(), Ok(None)));
        assert!(e.exists());
    }

    #[test]
    fn test_never_expiring_entry_stays_valid() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), None, true);
        e.save(&sample()).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert!(e.valid());
        assert!(e.load::<Payload>().unwrap().is_some());
    }

    #[test]
    fn test_last_change_set_by_save_never_by_load() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), None, false);
        assert_eq!(e.last_change(), None);

        e.save(&sample()).unwrap();
        let first = e.last_change().expect("set after save");

        e.load::<Payload>().unwrap();
        assert_eq!(e.last_change(), Some(first));

        std::thread::sleep(Duration::from_millis(5));
        e.save(&sample()).unwrap();
        let second = e.last_change().expect("set after save");
        assert!(second > first);
    }

    #[test]
    fn test_clones_share_change_signal() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), None, false);
        let handle = e.clone();
        e.save(&sample()).unwrap();
        assert_eq!(handle.last_change(), e.last_change());
        assert!(handle.last_change().is_some());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), None, false);
        e.save(&sample()).unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("feeds"))
            .unwrap()
            .map(|f| f.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("entry.rss")]);
    }

    struct CountingRefresh {
        entry: CacheEntry,
        calls: AtomicUsize,
    }

    impl Refresh for CountingRefresh {
        fn refresh(&self) -> Result<(), CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entry.save(&sample())
        }
    }

    #[test]
    fn test_prime_refreshes_only_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), Some(Duration::from_secs(300)), true);
        let refresher = CountingRefresh {
            entry: e.clone(),
            calls: AtomicUsize::new(0),
        };

        prime(&e, &refresher).unwrap();
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert!(e.valid());

        // Entry is now valid: priming again is a no-op
        prime(&e, &refresher).unwrap();
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    struct FailingRefresh;

    impl Refresh for FailingRefresh {
        fn refresh(&self) -> Result<(), CacheError> {
            Err(CacheError::InvalidArgument("boom".to_string()))
        }
    }

    #[test]
    fn test_prime_propagates_refresh_errors() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), Some(Duration::from_secs(300)), true);
        assert!(prime(&e, &FailingRefresh).is_err());
    }

    #[test]
    fn test_no_worker_for_never_expiring_entry() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), None, false);
        assert!(spawn_refresh_worker("img", &e, Arc::new(FailingRefresh)).is_none());
    }

    #[test]
    fn test_worker_refreshes_on_interval_and_survives_errors() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), Some(Duration::from_millis(10)), true);

        struct FlakyRefresh {
            entry: CacheEntry,
            calls: AtomicUsize,
        }
        impl Refresh for FlakyRefresh {
            fn refresh(&self) -> Result<(), CacheError> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    // First periodic run fails; the worker must keep going
                    return Err(CacheError::InvalidArgument("transient".to_string()));
                }
                self.entry.save(&sample())
            }
        }

        let refresher = Arc::new(FlakyRefresh {
            entry: e.clone(),
            calls: AtomicUsize::new(0),
        });
        let worker = spawn_refresh_worker("rss", &e, refresher.clone()).expect("finite ttl");

        std::thread::sleep(Duration::from_millis(60));
        worker.stop();

        assert!(refresher.calls.load(Ordering::SeqCst) >= 2);
        assert!(e.exists());
    }
}
