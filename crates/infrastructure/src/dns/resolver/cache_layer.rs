use crate::dns::cache::{CacheEntry, CacheKey, NegativeTtlPolicy, ResolverCache};
use async_trait::async_trait;
use cinder_dns_application::ports::{DnsResolver, Resolution};
use cinder_dns_domain::{DnssecStatus, DomainError, Message, Question};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

type InflightSender = Arc<watch::Sender<Option<Resolution>>>;

/// Removes the in-flight registration when the leader finishes, even if
/// it panics or is cancelled; waiting followers then fall through.
struct InflightLeaderGuard {
    inflight: Arc<DashMap<CacheKey, InflightSender, FxBuildHasher>>,
    key: CacheKey,
}

impl Drop for InflightLeaderGuard {
    fn drop(&mut self) {
        if let Some((_, tx)) = self.inflight.remove(&self.key) {
            let _ = tx.send(None);
        }
    }
}

/// TTL clamps for positive answers.
#[derive(Debug, Clone, Copy)]
pub struct PositiveTtlPolicy {
    pub min_ttl: u32,
    pub max_ttl: u32,
}

/// Caching layer with single-flight de-duplication.
///
/// A miss makes the first caller the leader: it resolves through the
/// inner stack, stores the answer, and broadcasts it on a watch channel.
/// Concurrent misses on the same key subscribe instead of forwarding, so
/// each key has at most one outstanding upstream refresh.
pub struct CachedResolver {
    inner: Arc<dyn DnsResolver>,
    cache: Arc<ResolverCache>,
    positive_ttl: PositiveTtlPolicy,
    negative_ttl: NegativeTtlPolicy,
    inflight: Arc<DashMap<CacheKey, InflightSender, FxBuildHasher>>,
}

impl CachedResolver {
    pub fn new(
        inner: Arc<dyn DnsResolver>,
        cache: Arc<ResolverCache>,
        positive_ttl: PositiveTtlPolicy,
        negative_ttl: NegativeTtlPolicy,
    ) -> Self {
        Self {
            inner,
            cache,
            positive_ttl,
            negative_ttl,
            inflight: Arc::new(DashMap::with_hasher(FxBuildHasher)),
        }
    }

    fn check_cache(&self, question: &Question) -> Option<Resolution> {
        let key = CacheKey::for_question(question);
        let (entry, _remaining) = self.cache.lookup(&key)?;
        debug!(
            domain = %question.name,
            record_type = %question.rtype,
            "Cache HIT"
        );
        Some(Resolution::cached(
            decayed_message(&entry),
            entry.dnssec_status,
        ))
    }

    fn store(&self, key: CacheKey, resolution: &Resolution) {
        if let Some(entry) = build_cache_entry(
            &resolution.message,
            resolution.dnssec_status,
            self.positive_ttl,
            self.negative_ttl,
        ) {
            self.cache.insert(key, entry);
        }
    }

    fn register_or_join_inflight(
        &self,
        key: &CacheKey,
    ) -> (bool, watch::Receiver<Option<Resolution>>) {
        match self.inflight.entry(key.clone()) {
            dashmap::Entry::Occupied(e) => {
                let rx = e.get().subscribe();
                drop(e);
                (false, rx)
            }
            dashmap::Entry::Vacant(e) => {
                let (tx, rx) = watch::channel(None::<Resolution>);
                e.insert(Arc::new(tx));
                (true, rx)
            }
        }
    }

    async fn resolve_as_follower(
        &self,
        question: &Question,
        mut rx: watch::Receiver<Option<Resolution>>,
    ) -> Result<Resolution, DomainError> {
        if rx.changed().await.is_ok() {
            if let Some(mut resolution) = rx.borrow().clone() {
                resolution.cache_hit = true;
                return Ok(resolution);
            }
        }

        // Leader failed or went away. One more cache check before taking
        // over as leader ourselves.
        if let Some(cached) = self.check_cache(question) {
            return Ok(cached);
        }
        self.resolve(question).await
    }

    async fn resolve_as_leader(
        &self,
        question: &Question,
        key: CacheKey,
    ) -> Result<Resolution, DomainError> {
        debug!(
            domain = %question.name,
            record_type = %question.rtype,
            "Cache MISS"
        );

        let _guard = InflightLeaderGuard {
            inflight: Arc::clone(&self.inflight),
            key: key.clone(),
        };

        let result = self.inner.resolve(question).await;

        if let Ok(resolution) = &result {
            self.store(key.clone(), resolution);
            if let Some((_, tx)) = self.inflight.remove(&key) {
                let _ = tx.send(Some(resolution.clone()));
            }
        }
        // On error the guard broadcasts None and followers retry.

        result
    }
}

#[async_trait]
impl DnsResolver for CachedResolver {
    async fn resolve(&self, question: &Question) -> Result<Resolution, DomainError> {
        if let Some(cached) = self.check_cache(question) {
            return Ok(cached);
        }

        let key = CacheKey::for_question(question);
        let (is_leader, rx) = self.register_or_join_inflight(&key);

        if is_leader {
            self.resolve_as_leader(question, key).await
        } else {
            self.resolve_as_follower(question, rx).await
        }
    }

    fn try_cache(&self, question: &Question) -> Option<Resolution> {
        self.check_cache(question)
    }
}

/// Decide whether and how long to cache a response. Server errors are
/// never cached; Bogus answers never become positive entries.
pub(crate) fn build_cache_entry(
    message: &Arc<Message>,
    dnssec_status: DnssecStatus,
    positive_ttl: PositiveTtlPolicy,
    negative_ttl: NegativeTtlPolicy,
) -> Option<CacheEntry> {
    if message.is_server_error() || dnssec_status == DnssecStatus::Bogus {
        return None;
    }

    if message.is_negative() {
        if !negative_ttl.enabled() {
            return None;
        }
        let ttl = negative_ttl.ttl_for(message);
        return Some(CacheEntry::new(
            Arc::clone(message),
            ttl,
            true,
            dnssec_status,
        ));
    }

    let ttl = message
        .min_answer_ttl()
        .unwrap_or(positive_ttl.min_ttl)
        .clamp(positive_ttl.min_ttl, positive_ttl.max_ttl);
    Some(CacheEntry::new(
        Arc::clone(message),
        ttl,
        false,
        dnssec_status,
    ))
}

/// A copy of the cached message with every record TTL decayed by the
/// entry's age, so clients see the remaining rather than original TTL.
fn decayed_message(entry: &CacheEntry) -> Arc<Message> {
    let elapsed = entry.age();
    if elapsed == 0 {
        return Arc::clone(&entry.message);
    }
    let mut message = (*entry.message).clone();
    for record in message
        .answers
        .iter_mut()
        .chain(message.authorities.iter_mut())
        .chain(message.additionals.iter_mut())
    {
        record.ttl = record.ttl.saturating_sub(elapsed);
    }
    Arc::new(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_dns_domain::{RData, Rcode, RecordType, ResourceRecord};

    fn positive_policy() -> PositiveTtlPolicy {
        PositiveTtlPolicy {
            min_ttl: 1,
            max_ttl: 86_400,
        }
    }

    fn negative_policy() -> NegativeTtlPolicy {
        NegativeTtlPolicy::new(30, 3_600, 60)
    }

    fn positive_response(ttl: u32) -> Arc<Message> {
        let mut message = Message::query(1, "example.com", RecordType::A);
        message.header.response = true;
        message.answers = vec![ResourceRecord::new(
            "example.com",
            ttl,
            RData::A("192.0.2.1".parse().unwrap()),
        )];
        Arc::new(message)
    }

    #[test]
    fn positive_answer_uses_min_answer_ttl() {
        let entry = build_cache_entry(
            &positive_response(300),
            DnssecStatus::Unknown,
            positive_policy(),
            negative_policy(),
        )
        .unwrap();
        assert_eq!(entry.original_ttl, 300);
        assert!(!entry.negative);
    }

    #[test]
    fn ttl_above_max_is_clamped_down() {
        let entry = build_cache_entry(
            &positive_response(1_000_000),
            DnssecStatus::Unknown,
            positive_policy(),
            negative_policy(),
        )
        .unwrap();
        assert_eq!(entry.original_ttl, 86_400);
    }

    #[test]
    fn zero_ttl_is_raised_to_min() {
        let entry = build_cache_entry(
            &positive_response(0),
            DnssecStatus::Unknown,
            positive_policy(),
            negative_policy(),
        )
        .unwrap();
        assert_eq!(entry.original_ttl, 1);
    }

    #[test]
    fn bogus_answer_is_never_cached() {
        assert!(build_cache_entry(
            &positive_response(300),
            DnssecStatus::Bogus,
            positive_policy(),
            negative_policy(),
        )
        .is_none());
    }

    #[test]
    fn server_error_is_never_cached() {
        let mut message = Message::query(1, "example.com", RecordType::A);
        message.header.response = true;
        message.header.rcode = Rcode::ServFail;
        assert!(build_cache_entry(
            &Arc::new(message),
            DnssecStatus::Unknown,
            positive_policy(),
            negative_policy(),
        )
        .is_none());
    }

    #[test]
    fn nxdomain_becomes_a_negative_entry() {
        let mut message = Message::query(1, "missing.example.com", RecordType::A);
        message.header.response = true;
        message.header.rcode = Rcode::NxDomain;
        let entry = build_cache_entry(
            &Arc::new(message),
            DnssecStatus::Insecure,
            positive_policy(),
            negative_policy(),
        )
        .unwrap();
        assert!(entry.negative);
        assert_eq!(entry.original_ttl, 60, "no SOA falls back to default");
    }

    #[test]
    fn disabled_negative_caching_stores_nothing() {
        let mut message = Message::query(1, "missing.example.com", RecordType::A);
        message.header.response = true;
        message.header.rcode = Rcode::NxDomain;
        assert!(build_cache_entry(
            &Arc::new(message),
            DnssecStatus::Unknown,
            positive_policy(),
            NegativeTtlPolicy::new(30, 0, 60),
        )
        .is_none());
    }
}
