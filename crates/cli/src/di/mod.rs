use cinder_dns_application::{DnsResolver, HandleDnsQueryUseCase};
use cinder_dns_domain::Config;
use cinder_dns_infrastructure::{
    CacheMaintenance, CachedResolver, DnsRequestHandler, DnssecValidator, ForwardingResolver,
    NegativeTtlPolicy, PositiveTtlPolicy, ResolverCache, ServerMetrics, StatsCollector,
    TrustAnchorStore, UpstreamPool, UpstreamProber,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Wired resolver stack plus the background-job collaborators.
pub struct DnsServices {
    pub handler: DnsRequestHandler,
    pub maintenance: Option<Arc<CacheMaintenance>>,
    pub prober: Arc<UpstreamProber>,
    pub stats: Arc<StatsCollector>,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let dns = &config.dns;
        let query_timeout = Duration::from_millis(dns.query_timeout_ms);
        let queue_wait = Duration::from_millis(dns.queue_wait_ms);

        let pool = Arc::new(UpstreamPool::new(
            &dns.upstream_urls,
            dns.doh_method,
            query_timeout,
            dns.failure_threshold,
            Duration::from_secs(dns.upstream_cooldown_secs),
        )?);
        let prober = Arc::new(UpstreamProber::new(pool.clone()));

        let forwarding: Arc<dyn DnsResolver> = Arc::new(ForwardingResolver::new(pool));

        let upstream_stack: Arc<dyn DnsResolver> = if dns.dnssec_enabled {
            let anchors = match &dns.trust_anchor_key {
                Some(key) => TrustAnchorStore::with_root_key_b64(key)?,
                None => TrustAnchorStore::new(),
            };
            info!("DNSSEC validation enabled");
            Arc::new(cinder_dns_infrastructure::ValidatingResolver::new(
                forwarding,
                DnssecValidator::new(anchors),
            ))
        } else {
            forwarding
        };

        let cache = Arc::new(ResolverCache::new(
            dns.cache_max_entries,
            dns.cache_shard_amount,
        ));
        let positive_ttl = PositiveTtlPolicy {
            min_ttl: dns.min_ttl,
            max_ttl: dns.max_ttl,
        };
        let negative_ttl = NegativeTtlPolicy {
            min_ttl: dns.negative_min_ttl,
            max_ttl: dns.negative_max_ttl,
            default_ttl: dns.negative_default_ttl,
        };

        let (resolver, maintenance): (Arc<dyn DnsResolver>, Option<Arc<CacheMaintenance>>) =
            if dns.cache_enabled {
                info!(
                    max_entries = dns.cache_max_entries,
                    shards = dns.cache_shard_amount,
                    "Resolver cache enabled"
                );
                let cached = Arc::new(CachedResolver::new(
                    upstream_stack.clone(),
                    cache.clone(),
                    positive_ttl,
                    negative_ttl,
                ));
                let maintenance = Arc::new(CacheMaintenance::new(
                    cache.clone(),
                    upstream_stack,
                    dns.prefetch_fraction,
                    positive_ttl,
                    negative_ttl,
                ));
                (cached, Some(maintenance))
            } else {
                (upstream_stack, None)
            };

        let use_case = Arc::new(HandleDnsQueryUseCase::new(
            resolver,
            dns.max_inflight_forwards,
            queue_wait,
            query_timeout,
        ));

        let metrics = Arc::new(ServerMetrics::default());
        let stats = Arc::new(StatsCollector::new(metrics.clone(), cache));
        let handler = DnsRequestHandler::new(use_case, metrics);

        Ok(Self {
            handler,
            maintenance,
            prober,
            stats,
        })
    }
}
