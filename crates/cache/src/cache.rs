use crate::sweep::CacheSweepTask;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Errors raised by cache operations.
///
/// Purely in-memory caches never fail; every variant here concerns the
/// optional durable mirror.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The mirror file could not be read or written.
    #[error("cache persistence failure: {0}")]
    Persistence(#[from] std::io::Error),
    /// The mirror file does not parse.
    #[error("corrupt cache file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Milliseconds since the Unix epoch. Wall-clock on purpose: persisted
/// entries must keep aging across process restarts.
pub(crate) fn unix_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    value: Vec<u8>,
    expires_at_ms: u64,
}

impl Entry {
    const fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[derive(Debug)]
pub(crate) struct CacheInner {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    mirror: Option<PathBuf>,
}

impl CacheInner {
    /// Drop every expired entry. Runs on the sweeper thread; see
    /// [`DashMap::retain`] for why it must not run under a held guard.
    pub(crate) fn sweep(&self) {
        let now = unix_ms();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    fn write_mirror(&self) -> Result<(), CacheError> {
        let Some(path) = &self.mirror else {
            return Ok(());
        };
        let snapshot: BTreeMap<String, Entry> =
            self.entries.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
        fs::write(path, serde_json::to_vec(&snapshot)?)?;
        Ok(())
    }
}

/// A concurrency-safe TTL cache from string keys to opaque byte values.
///
/// Every entry expires `ttl` after the write that created or refreshed it;
/// expiry is lazy, so a read of an expired entry behaves exactly like a
/// miss and drops the entry. The TTL is a property of the cache instance,
/// not of individual entries — callers needing several lifetimes hold
/// several caches.
///
/// With [`TtlCache::with_persistence`] the contents are mirrored to a JSON
/// file on every write, and entries that have not yet expired survive a
/// restart.
#[derive(Debug, Clone)]
pub struct TtlCache {
    inner: Arc<CacheInner>,
}

impl TtlCache {
    /// Create a purely in-memory cache.
    pub fn new(ttl: Duration) -> Self {
        Self { inner: Arc::new(CacheInner { entries: DashMap::new(), ttl, mirror: None }) }
    }

    /// Create a cache mirrored to the file at `path`, loading whatever
    /// unexpired entries a previous process left there. The parent
    /// directory must exist.
    pub fn with_persistence(ttl: Duration, path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = DashMap::new();

        match fs::read(&path) {
            Ok(bytes) => {
                let now = unix_ms();
                let stored: BTreeMap<String, Entry> = serde_json::from_slice(&bytes)?;
                for (key, entry) in stored {
                    if !entry.is_expired(now) {
                        entries.insert(key, entry);
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self { inner: Arc::new(CacheInner { entries, ttl, mirror: Some(path) }) })
    }

    /// Look up a key. Expired entries read as absent and are dropped.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = unix_ms();
        let hit = self
            .inner
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone());
        if hit.is_none() {
            self.inner.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        hit
    }

    /// Insert or overwrite a key. The entry's expiry restarts from now
    /// either way. Fails only if the durable mirror cannot be written.
    pub fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let expires_at_ms = unix_ms() + self.inner.ttl.as_millis() as u64;
        self.inner.entries.insert(key.to_string(), Entry { value, expires_at_ms });
        self.inner.write_mirror()
    }

    /// Remove a key regardless of its expiry state. Idempotent. Returns
    /// whether a live (unexpired) entry was present.
    pub fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let now = unix_ms();
        let removed =
            self.inner.entries.remove(key).is_some_and(|(_, entry)| !entry.is_expired(now));
        self.inner.write_mirror()?;
        Ok(removed)
    }

    /// The instance TTL.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Number of stored entries, possibly counting expired entries no
    /// sweep or read has dropped yet.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// True if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Spawn a background thread that periodically drops expired entries,
    /// bounding memory for caches that see many distinct keys. Correctness
    /// never depends on it; the thread exits when the cache is dropped.
    pub fn spawn_sweeper(&self, interval: Duration) {
        CacheSweepTask::new(Arc::downgrade(&self.inner), interval).spawn();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread::sleep;

    fn mirror_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("meridian-cache-{}-{tag}.json", std::process::id()))
    }

    #[test]
    fn test_get_set_delete() {
        let cache = TtlCache::new(Duration::from_secs(1));

        assert_eq!(cache.get("testKey"), None);
        cache.set("testKey", b"testValue".to_vec()).unwrap();
        assert_eq!(cache.get("testKey"), Some(b"testValue".to_vec()));

        assert!(cache.delete("testKey").unwrap());
        assert_eq!(cache.get("testKey"), None);
        assert!(!cache.delete("testKey").unwrap());
    }

    #[test]
    fn test_expired_entries_read_as_absent() {
        let cache = TtlCache::new(Duration::from_millis(40));
        cache.set("k", vec![1]).unwrap();

        assert_eq!(cache.get("k"), Some(vec![1]));
        sleep(Duration::from_millis(80));
        assert_eq!(cache.get("k"), None);
        // The expired entry was dropped by the read.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_resets_expiry() {
        let cache = TtlCache::new(Duration::from_millis(90));
        cache.set("k", vec![1]).unwrap();
        sleep(Duration::from_millis(50));
        cache.set("k", vec![2]).unwrap();
        sleep(Duration::from_millis(50));

        // 100ms after the first write, 50ms after the refresh.
        assert_eq!(cache.get("k"), Some(vec![2]));
    }

    #[test]
    fn test_mirror_survives_reopen() {
        let path = mirror_path("reopen");
        let _ = fs::remove_file(&path);

        {
            let cache = TtlCache::with_persistence(Duration::from_secs(60), &path).unwrap();
            cache.set("durable", vec![7, 7]).unwrap();
        }

        let reopened = TtlCache::with_persistence(Duration::from_secs(60), &path).unwrap();
        assert_eq!(reopened.get("durable"), Some(vec![7, 7]));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_mirror_drops_expired_on_load() {
        let path = mirror_path("expiry");
        let _ = fs::remove_file(&path);

        {
            let cache = TtlCache::with_persistence(Duration::from_millis(30), &path).unwrap();
            cache.set("shortLived", vec![1]).unwrap();
        }
        sleep(Duration::from_millis(60));

        let reopened = TtlCache::with_persistence(Duration::from_millis(30), &path).unwrap();
        assert_eq!(reopened.get("shortLived"), None);
        assert!(reopened.is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_delete_reaches_mirror() {
        let path = mirror_path("delete");
        let _ = fs::remove_file(&path);

        {
            let cache = TtlCache::with_persistence(Duration::from_secs(60), &path).unwrap();
            cache.set("gone", vec![9]).unwrap();
            cache.delete("gone").unwrap();
        }

        let reopened = TtlCache::with_persistence(Duration::from_secs(60), &path).unwrap();
        assert_eq!(reopened.get("gone"), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_sweeper_drops_expired_entries() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.spawn_sweeper(Duration::from_millis(10));

        cache.set("a", vec![1]).unwrap();
        cache.set("b", vec![2]).unwrap();
        sleep(Duration::from_millis(120));

        // Swept without any read touching the keys.
        assert!(cache.is_empty());
    }
}
