use async_trait::async_trait;
use cinder_dns_domain::{DnssecStatus, DomainError, Message, Question};
use std::sync::Arc;

/// A resolved answer, either served from cache or fetched upstream.
///
/// `message` is the full upstream-shaped response (answer and authority
/// sections, rcode). Cached copies carry already-decayed TTLs.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub message: Arc<Message>,
    pub cache_hit: bool,
    pub dnssec_status: DnssecStatus,
    /// Endpoint that produced the answer; `None` for pure cache hits.
    pub upstream_url: Option<Arc<str>>,
}

impl Resolution {
    pub fn cached(message: Arc<Message>, dnssec_status: DnssecStatus) -> Self {
        Self {
            message,
            cache_hit: true,
            dnssec_status,
            upstream_url: None,
        }
    }

    pub fn upstream(
        message: Arc<Message>,
        dnssec_status: DnssecStatus,
        upstream_url: Arc<str>,
    ) -> Self {
        Self {
            message,
            cache_hit: false,
            dnssec_status,
            upstream_url: Some(upstream_url),
        }
    }
}

#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, question: &Question) -> Result<Resolution, DomainError>;

    /// Check only the cache without going upstream.
    /// Returns `Some(resolution)` on hit, `None` on miss.
    /// Default implementation returns None (no cache).
    fn try_cache(&self, _question: &Question) -> Option<Resolution> {
        None
    }
}
