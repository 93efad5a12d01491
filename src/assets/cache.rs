//! Layer sheet cache
//!
//! Deduplicated, memoizing async loader for layer artwork. Each
//! [`ResourceIdentity`] owns one cell: concurrent requesters share a single
//! in-flight fetch, successes are memoized for the cache lifetime, and
//! failures are memoized too so a missing or stalled asset cannot trigger a
//! retry storm. A user-initiated retry goes through [`ResourceCache::reset_failures`].

use crate::assets::fetch::AssetFetch;
use crate::assets::{LoadFailure, LoadResult, RasterSheet, ResourceIdentity};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

type LoadCell = Arc<OnceCell<LoadResult<Arc<RasterSheet>>>>;

/// Loader statistics
#[derive(Debug, Default, Clone)]
pub struct ResourceCacheStats {
    pub requests: u64,
    pub memo_hits: u64,
    pub loads_started: u64,
    pub load_failures: u64,
    pub failures_reset: u64,
}

impl ResourceCacheStats {
    /// Share of requests answered from the memo, as a percentage.
    pub fn hit_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            (self.memo_hits as f64 / self.requests as f64) * 100.0
        }
    }
}

pub struct ResourceCache {
    fetcher: Arc<dyn AssetFetch>,
    entries: Mutex<HashMap<ResourceIdentity, LoadCell>>,
    load_timeout: Duration,
    frame_size: u32,
    stats: RwLock<ResourceCacheStats>,
}

impl ResourceCache {
    pub fn new(fetcher: Arc<dyn AssetFetch>, load_timeout: Duration, frame_size: u32) -> Self {
        info!(
            timeout_secs = load_timeout.as_secs(),
            frame_size, "initializing resource cache"
        );
        Self {
            fetcher,
            entries: Mutex::new(HashMap::new()),
            load_timeout,
            frame_size,
            stats: RwLock::new(ResourceCacheStats::default()),
        }
    }

    /// Request a layer sheet.
    ///
    /// At most one load runs per identity; every concurrent caller awaits
    /// the same outcome, and later callers get the memoized result without
    /// touching the fetcher again. Memoized failures return immediately.
    pub async fn request(&self, identity: &ResourceIdentity) -> LoadResult<Arc<RasterSheet>> {
        {
            let mut stats = self.stats.write().await;
            stats.requests += 1;
        }

        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(
                entries
                    .entry(identity.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        if let Some(outcome) = cell.get() {
            let mut stats = self.stats.write().await;
            stats.memo_hits += 1;
            if outcome.is_err() {
                debug!(%identity, "memoized failure, fetch not retried");
            }
            return outcome.clone();
        }

        cell.get_or_init(|| self.load(identity)).await.clone()
    }

    async fn load(&self, identity: &ResourceIdentity) -> LoadResult<Arc<RasterSheet>> {
        {
            let mut stats = self.stats.write().await;
            stats.loads_started += 1;
        }

        let path = identity.resolve_path();
        debug!(%identity, path = path.as_str(), "fetching layer sheet");

        let outcome = match timeout(self.load_timeout, self.fetcher.fetch_bytes(&path)).await {
            Err(_) => Err(LoadFailure::Timeout {
                path: path.clone(),
                seconds: self.load_timeout.as_secs(),
            }),
            Ok(Err(err)) => {
                debug!(path = path.as_str(), error = %err, "asset fetch failed");
                Err(LoadFailure::NotFound { path: path.clone() })
            }
            Ok(Ok(bytes)) => RasterSheet::from_bytes(&bytes, self.frame_size, &path).map(Arc::new),
        };

        if let Err(failure) = &outcome {
            warn!(%identity, %failure, "layer sheet load failed, memoized as permanent");
            let mut stats = self.stats.write().await;
            stats.load_failures += 1;
        }
        outcome
    }

    /// Forget memoized failures so the next request refetches.
    ///
    /// Successful entries and loads still in flight are untouched. Returns
    /// how many failure memos were cleared.
    pub async fn reset_failures(&self) -> usize {
        let cleared = {
            let mut entries = self.entries.lock().await;
            let before = entries.len();
            entries.retain(|_, cell| !matches!(cell.get(), Some(Err(_))));
            before - entries.len()
        };
        if cleared > 0 {
            let mut stats = self.stats.write().await;
            stats.failures_reset += cleared as u64;
            info!(cleared, "cleared memoized asset failures");
        }
        cleared
    }

    /// Whether the identity has a completed (success or failure) memo.
    pub async fn is_settled(&self, identity: &ResourceIdentity) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(identity)
            .map(|cell| cell.get().is_some())
            .unwrap_or(false)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn stats(&self) -> ResourceCacheStats {
        self.stats.read().await.clone()
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("load_timeout", &self.load_timeout)
            .field("frame_size", &self.frame_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Category;
    use anyhow::bail;
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::RgbaImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FRAME: u32 = 8;

    fn png_bytes() -> Bytes {
        let image = RgbaImage::from_pixel(9 * FRAME, 4 * FRAME, image::Rgba([7, 7, 7, 255]));
        let mut cursor = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        Bytes::from(cursor.into_inner())
    }

    enum Mode {
        Png,
        Missing,
        Garbage,
        Hang,
    }

    struct StubFetcher {
        calls: AtomicUsize,
        mode: Mode,
    }

    impl StubFetcher {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                mode,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssetFetch for StubFetcher {
        async fn fetch_bytes(&self, _path: &str) -> anyhow::Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                Mode::Png => {
                    // Forces concurrent requesters to overlap.
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(png_bytes())
                }
                Mode::Missing => bail!("no such file"),
                Mode::Garbage => Ok(Bytes::from_static(b"not a png")),
                Mode::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    bail!("unreachable")
                }
            }
        }
    }

    fn cache(fetcher: Arc<StubFetcher>, timeout: Duration) -> ResourceCache {
        ResourceCache::new(fetcher, timeout, FRAME)
    }

    fn hair_identity() -> ResourceIdentity {
        ResourceIdentity::new(Category::Hair, "ponytail")
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let fetcher = StubFetcher::new(Mode::Png);
        let cache = cache(Arc::clone(&fetcher), Duration::from_secs(5));
        let identity = hair_identity();

        let (a, b) = tokio::join!(cache.request(&identity), cache.request(&identity));
        let a = a.unwrap();
        let b = b.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_success_is_memoized() {
        let fetcher = StubFetcher::new(Mode::Png);
        let cache = cache(Arc::clone(&fetcher), Duration::from_secs(5));
        let identity = hair_identity();

        cache.request(&identity).await.unwrap();
        cache.request(&identity).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.stats().await.memo_hits, 1);
    }

    #[tokio::test]
    async fn test_distinct_identities_fetch_separately_even_with_shared_path() {
        use crate::avatar::configuration::BodyType;
        let fetcher = StubFetcher::new(Mode::Png);
        let cache = cache(Arc::clone(&fetcher), Duration::from_secs(5));

        // Teen and pregnant shoes both resolve to the female folder, but the
        // identities are distinct and cached separately.
        let teen = ResourceIdentity::new(Category::Shoes, "boots").with_body(BodyType::Teen);
        let pregnant =
            ResourceIdentity::new(Category::Shoes, "boots").with_body(BodyType::Pregnant);
        assert_eq!(teen.resolve_path(), pregnant.resolve_path());

        cache.request(&teen).await.unwrap();
        cache.request(&pregnant).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_memoized_until_reset() {
        let fetcher = StubFetcher::new(Mode::Missing);
        let cache = cache(Arc::clone(&fetcher), Duration::from_secs(5));
        let identity = hair_identity();

        let first = cache.request(&identity).await.unwrap_err();
        assert!(matches!(first, LoadFailure::NotFound { .. }));
        let second = cache.request(&identity).await.unwrap_err();
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);

        assert_eq!(cache.reset_failures().await, 1);
        let _ = cache.request(&identity).await.unwrap_err();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_memoized_and_fast_on_retry() {
        let fetcher = StubFetcher::new(Mode::Hang);
        let cache = cache(Arc::clone(&fetcher), Duration::from_millis(20));
        let identity = hair_identity();

        let failure = cache.request(&identity).await.unwrap_err();
        assert!(matches!(failure, LoadFailure::Timeout { .. }));

        let started = std::time::Instant::now();
        let _ = cache.request(&identity).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_millis(20));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_a_decode_failure() {
        let fetcher = StubFetcher::new(Mode::Garbage);
        let cache = cache(Arc::clone(&fetcher), Duration::from_secs(5));
        let identity = hair_identity();

        let failure = cache.request(&identity).await.unwrap_err();
        assert!(matches!(failure, LoadFailure::Decode { .. }));
    }

    #[tokio::test]
    async fn test_reset_keeps_successes() {
        let fetcher = StubFetcher::new(Mode::Png);
        let cache = cache(Arc::clone(&fetcher), Duration::from_secs(5));
        let identity = hair_identity();

        cache.request(&identity).await.unwrap();
        assert_eq!(cache.reset_failures().await, 0);
        assert!(cache.is_settled(&identity).await);
        cache.request(&identity).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
    }
}
