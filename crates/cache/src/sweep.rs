use crate::cache::CacheInner;
use std::{sync::Weak, time::Duration};
use tracing::{debug, trace};

/// Background task that periodically drops expired entries from a
/// [`TtlCache`].
///
/// The task holds only a [`Weak`] handle, so it never keeps a cache
/// alive: once the last [`TtlCache`] clone is dropped, the next tick
/// fails to upgrade and the thread exits.
///
/// [`TtlCache`]: crate::TtlCache
#[derive(Debug)]
pub(crate) struct CacheSweepTask {
    cache: Weak<CacheInner>,
    interval: Duration,
}

impl CacheSweepTask {
    /// Create a new task sweeping `cache` every `interval`.
    pub(crate) const fn new(cache: Weak<CacheInner>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Spawn the task on a dedicated thread.
    pub(crate) fn spawn(self) {
        std::thread::spawn(move || loop {
            std::thread::sleep(self.interval);
            trace!("sweeping expired cache entries");
            let Some(cache) = self.cache.upgrade() else {
                debug!("cache dropped, shutting down sweep task");
                break;
            };
            cache.sweep();
        });
    }
}
