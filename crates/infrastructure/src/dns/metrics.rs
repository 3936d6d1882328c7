use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::dns::cache::ResolverCache;
use cinder_dns_application::ports::{StatsReadout, StatsSnapshot};
use cinder_dns_domain::Rcode;

/// Server-wide query counters, shared across listeners.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    pub queries: AtomicU64,
    pub servfail_responses: AtomicU64,
    pub nxdomain_responses: AtomicU64,
    pub malformed_requests: AtomicU64,
}

impl ServerMetrics {
    pub fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response(&self, rcode: Rcode) {
        match rcode {
            Rcode::ServFail => {
                self.servfail_responses.fetch_add(1, Ordering::Relaxed);
            }
            Rcode::NxDomain => {
                self.nxdomain_responses.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> ServerMetricsSnapshot {
        ServerMetricsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            servfail_responses: self.servfail_responses.load(Ordering::Relaxed),
            nxdomain_responses: self.nxdomain_responses.load(Ordering::Relaxed),
            malformed_requests: self.malformed_requests.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerMetricsSnapshot {
    pub queries: u64,
    pub servfail_responses: u64,
    pub nxdomain_responses: u64,
    pub malformed_requests: u64,
}

/// Combines server counters and cache metrics into the stats readout
/// the periodic stats job logs.
pub struct StatsCollector {
    server: Arc<ServerMetrics>,
    cache: Arc<ResolverCache>,
}

impl StatsCollector {
    pub fn new(server: Arc<ServerMetrics>, cache: Arc<ResolverCache>) -> Self {
        Self { server, cache }
    }
}

impl StatsReadout for StatsCollector {
    fn snapshot(&self) -> StatsSnapshot {
        let server = self.server.snapshot();
        let cache = self.cache.metrics();
        StatsSnapshot {
            queries: server.queries,
            servfail_responses: server.servfail_responses,
            malformed_requests: server.malformed_requests,
            cache_size: self.cache.len(),
            cache_hit_rate: cache.hit_rate,
        }
    }
}
