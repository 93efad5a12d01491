//! Composition cache with LRU eviction
//!
//! Bounded map from canonical configuration key to published texture. The
//! cache holds the only long-lived strong reference to a composed sheet;
//! evicting an entry releases the texture as soon as the last in-flight
//! clone drops.

use crate::compose::ComposedTexture;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct CacheEntry {
    texture: Arc<ComposedTexture>,
    last_accessed: Instant,
    access_count: u64,
}

/// Cache performance statistics
#[derive(Debug, Default, Clone)]
pub struct CompositionCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub insertions: u64,
    pub entries: usize,
}

impl CompositionCacheStats {
    /// Cache hit ratio as a percentage.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug)]
pub struct CompositionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    capacity: usize,
    stats: RwLock<CompositionCacheStats>,
}

impl CompositionCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!(capacity, "initializing composition cache");
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            stats: RwLock::new(CompositionCacheStats::default()),
        }
    }

    /// Look up a composed sheet, refreshing its LRU timestamp on a hit.
    pub async fn get(&self, key: &str) -> Option<Arc<ComposedTexture>> {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        if let Some(entry) = entries.get_mut(key) {
            entry.last_accessed = Instant::now();
            entry.access_count += 1;
            stats.hits += 1;
            debug!(handle = %entry.texture.handle, "composition cache hit");
            Some(Arc::clone(&entry.texture))
        } else {
            stats.misses += 1;
            None
        }
    }

    /// Insert a freshly composed sheet.
    ///
    /// Inserting a new key while full evicts the least-recently-accessed
    /// entry. The displaced texture (evicted, or replaced under the same
    /// key) is handed back so the caller can retire anything derived from
    /// its handle.
    pub async fn insert(
        &self,
        key: String,
        texture: Arc<ComposedTexture>,
    ) -> Option<Arc<ComposedTexture>> {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        let displaced = if entries.contains_key(&key) {
            entries.remove(&key).map(|entry| entry.texture)
        } else if entries.len() >= self.capacity {
            let stalest = entries
                .iter()
                .min_by(|(_, a), (_, b)| {
                    a.last_accessed
                        .cmp(&b.last_accessed)
                        .then_with(|| a.access_count.cmp(&b.access_count))
                })
                .map(|(key, _)| key.clone());
            match stalest {
                Some(stale_key) => entries.remove(&stale_key).map(|entry| {
                    stats.evictions += 1;
                    info!(handle = %entry.texture.handle, "evicted composed sheet");
                    entry.texture
                }),
                None => None,
            }
        } else {
            None
        };

        stats.insertions += 1;
        stats.entries = entries.len() + 1;
        entries.insert(
            key,
            CacheEntry {
                texture,
                last_accessed: Instant::now(),
                access_count: 1,
            },
        );
        displaced
    }

    /// Remove one entry, returning its texture for teardown.
    pub async fn evict(&self, key: &str) -> Option<Arc<ComposedTexture>> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(key).map(|entry| entry.texture);
        if removed.is_some() {
            let mut stats = self.stats.write().await;
            stats.evictions += 1;
            stats.entries = entries.len();
        }
        removed
    }

    /// Drop every entry; returns how many were released.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        let mut stats = self.stats.write().await;
        stats.entries = 0;
        if count > 0 {
            info!(count, "cleared composition cache");
        }
        count
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CompositionCacheStats {
        let mut stats = self.stats.read().await.clone();
        stats.entries = self.entries.read().await.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::TextureHandle;
    use image::RgbaImage;

    fn texture() -> Arc<ComposedTexture> {
        Arc::new(ComposedTexture {
            handle: TextureHandle::new(),
            sheet: RgbaImage::new(1, 1),
            frame_width: 1,
            frame_height: 1,
            columns: 1,
            rows: 1,
        })
    }

    #[tokio::test]
    async fn test_get_refreshes_and_insert_evicts_stalest() {
        let cache = CompositionCache::new(2);
        cache.insert("a".to_string(), texture()).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        cache.insert("b".to_string(), texture()).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        // Touch "a" so "b" becomes the stalest.
        assert!(cache.get("a").await.is_some());
        let displaced = cache.insert("c".to_string(), texture()).await;
        assert!(displaced.is_some());

        assert!(cache.contains("a").await);
        assert!(!cache.contains("b").await);
        assert!(cache.contains("c").await);
    }

    #[tokio::test]
    async fn test_eviction_releases_texture_resource() {
        let cache = CompositionCache::new(1);
        let first = texture();
        let weak = Arc::downgrade(&first);
        cache.insert("a".to_string(), first).await;
        // Only the cache holds the texture now.
        assert!(weak.upgrade().is_some());

        cache.insert("b".to_string(), texture()).await;
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_reinsert_same_key_replaces_without_eviction() {
        let cache = CompositionCache::new(1);
        let first = texture();
        let first_handle = first.handle;
        cache.insert("a".to_string(), first).await;
        let displaced = cache.insert("a".to_string(), texture()).await;
        assert_eq!(displaced.map(|t| t.handle), Some(first_handle));
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let cache = CompositionCache::new(4);
        cache.insert("a".to_string(), texture()).await;
        cache.get("a").await;
        cache.get("a").await;
        cache.get("missing").await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_ratio() - 66.66).abs() < 1.0);
    }

    #[tokio::test]
    async fn test_clear_and_evict() {
        let cache = CompositionCache::new(4);
        cache.insert("a".to_string(), texture()).await;
        cache.insert("b".to_string(), texture()).await;

        assert!(cache.evict("a").await.is_some());
        assert!(cache.evict("a").await.is_none());
        assert_eq!(cache.clear().await, 1);
        assert!(cache.is_empty().await);
    }
}
