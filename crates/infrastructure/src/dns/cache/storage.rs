use super::entry::CacheEntry;
use super::key::CacheKey;
use super::metrics::{CacheMetrics, CacheMetricsSnapshot};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Fraction of capacity removed per eviction pass.
const EVICTION_BATCH_DIVISOR: usize = 100;

/// Sharded TTL cache keyed by (name, type, class).
///
/// Expiry is lazy on lookup; the maintenance job sweeps the remainder.
/// At capacity, the least-recently-used entries are evicted in a batch so
/// insert-heavy workloads do not pay a scan per insert.
pub struct ResolverCache {
    entries: DashMap<CacheKey, Arc<CacheEntry>, FxBuildHasher>,
    max_entries: usize,
    metrics: CacheMetrics,
}

impl ResolverCache {
    pub fn new(max_entries: usize, shard_amount: usize) -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(
                max_entries.min(16_384),
                FxBuildHasher,
                shard_amount,
            ),
            max_entries,
            metrics: CacheMetrics::default(),
        }
    }

    /// A hit returns the entry and its remaining TTL. Expired entries are
    /// removed on the way out and count as misses.
    pub fn lookup(&self, key: &CacheKey) -> Option<(Arc<CacheEntry>, u32)> {
        let entry = match self.entries.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => {
                self.metrics.record_miss();
                return None;
            }
        };

        if entry.is_expired() {
            self.entries
                .remove_if(key, |_, stored| stored.is_expired());
            self.metrics.record_miss();
            self.metrics.record_expired_removals(1);
            return None;
        }

        entry.record_hit();
        self.metrics.record_hit();
        let remaining = entry.remaining_ttl();
        Some((entry, remaining))
    }

    pub fn insert(&self, key: CacheKey, entry: CacheEntry) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_lru_batch();
        }
        self.entries.insert(key, Arc::new(entry));
        self.metrics.record_insertion();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Drop all expired entries. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.metrics.record_expired_removals(removed as u64);
        }
        removed
    }

    /// Entries close enough to expiry to be worth re-resolving, skipping
    /// ones already claimed by a refresh pass.
    pub fn refresh_candidates(&self, prefetch_fraction: f64) -> Vec<(CacheKey, Arc<CacheEntry>)> {
        self.entries
            .iter()
            .filter(|item| {
                item.value().should_refresh(prefetch_fraction)
                    && !item.value().refreshing.load(Ordering::Acquire)
            })
            .map(|item| (item.key().clone(), Arc::clone(item.value())))
            .collect()
    }

    /// Remove the coldest entries by last access, about 1% of capacity.
    fn evict_lru_batch(&self) {
        let batch = (self.max_entries / EVICTION_BATCH_DIVISOR).max(1);

        let mut coldest: Vec<(CacheKey, u64)> = self
            .entries
            .iter()
            .map(|item| {
                (
                    item.key().clone(),
                    item.value().last_access.load(Ordering::Relaxed),
                )
            })
            .collect();
        coldest.sort_unstable_by_key(|(_, last_access)| *last_access);
        coldest.truncate(batch);

        let mut removed = 0u64;
        for (key, _) in coldest {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            self.metrics.record_evictions(removed);
            debug!(evicted = removed, size = self.entries.len(), "Cache eviction");
        }
    }
}
