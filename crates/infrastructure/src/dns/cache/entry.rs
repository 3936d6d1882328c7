use cinder_dns_domain::{DnssecStatus, Message};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// One cached answer. Immutable once stored apart from the access
/// counters and the refresh gate; replacement happens at the map slot.
#[derive(Debug)]
pub struct CacheEntry {
    pub message: Arc<Message>,
    pub dnssec_status: DnssecStatus,
    pub negative: bool,
    pub original_ttl: u32,
    pub inserted_at: Instant,
    pub expires_at: Instant,
    pub hit_count: AtomicU64,
    /// Unix seconds of the last read, for LRU eviction ordering.
    pub last_access: AtomicU64,
    pub refreshing: AtomicBool,
}

impl CacheEntry {
    pub fn new(
        message: Arc<Message>,
        ttl: u32,
        negative: bool,
        dnssec_status: DnssecStatus,
    ) -> Self {
        let now = Instant::now();
        Self {
            message,
            dnssec_status,
            negative,
            original_ttl: ttl,
            inserted_at: now,
            expires_at: now + Duration::from_secs(ttl as u64),
            hit_count: AtomicU64::new(0),
            last_access: AtomicU64::new(unix_now()),
            refreshing: AtomicBool::new(false),
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn remaining_ttl(&self) -> u32 {
        self.expires_at
            .saturating_duration_since(Instant::now())
            .as_secs() as u32
    }

    /// Seconds the entry has been sitting in the cache.
    pub fn age(&self) -> u32 {
        self.inserted_at.elapsed().as_secs() as u32
    }

    pub fn should_refresh(&self, prefetch_fraction: f64) -> bool {
        !self.negative
            && !self.is_expired()
            && (self.remaining_ttl() as f64) < (self.original_ttl as f64) * prefetch_fraction
    }

    pub fn record_hit(&self) {
        self.hit_count.fetch_add(1, Ordering::Relaxed);
        self.last_access.store(unix_now(), Ordering::Relaxed);
    }

    /// Claim the refresh slot. Only one maintenance pass may re-resolve
    /// an entry at a time.
    pub fn begin_refresh(&self) -> bool {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end_refresh(&self) {
        self.refreshing.store(false, Ordering::Release);
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_dns_domain::{Message, RecordType};

    fn entry(ttl: u32) -> CacheEntry {
        let message = Arc::new(Message::query(0, "example.com", RecordType::A));
        CacheEntry::new(message, ttl, false, DnssecStatus::Unknown)
    }

    #[test]
    fn zero_ttl_is_immediately_expired() {
        assert!(entry(0).is_expired());
    }

    #[test]
    fn fresh_entry_reports_remaining_ttl() {
        let e = entry(300);
        assert!(!e.is_expired());
        let remaining = e.remaining_ttl();
        assert!(remaining == 299 || remaining == 300);
    }

    #[test]
    fn refresh_gate_admits_one_claimant() {
        let e = entry(300);
        assert!(e.begin_refresh());
        assert!(!e.begin_refresh());
        e.end_refresh();
        assert!(e.begin_refresh());
    }

    #[test]
    fn long_ttl_entry_is_not_a_refresh_candidate() {
        assert!(!entry(300).should_refresh(0.10));
    }
}
