use super::cache_layer::{build_cache_entry, PositiveTtlPolicy};
use crate::dns::cache::{NegativeTtlPolicy, ResolverCache};
use async_trait::async_trait;
use cinder_dns_application::ports::{
    CacheMaintenancePort, DnsResolver, RefreshOutcome, SweepOutcome,
};
use cinder_dns_domain::{DomainError, Question};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maintenance over the resolver cache: prefetch refresh and expiry
/// sweeps. Refreshes go through the non-caching resolver stack so the
/// cache itself cannot answer them.
pub struct CacheMaintenance {
    cache: Arc<ResolverCache>,
    upstream: Arc<dyn DnsResolver>,
    prefetch_fraction: f64,
    positive_ttl: PositiveTtlPolicy,
    negative_ttl: NegativeTtlPolicy,
}

impl CacheMaintenance {
    pub fn new(
        cache: Arc<ResolverCache>,
        upstream: Arc<dyn DnsResolver>,
        prefetch_fraction: f64,
        positive_ttl: PositiveTtlPolicy,
        negative_ttl: NegativeTtlPolicy,
    ) -> Self {
        Self {
            cache,
            upstream,
            prefetch_fraction,
            positive_ttl,
            negative_ttl,
        }
    }
}

#[async_trait]
impl CacheMaintenancePort for CacheMaintenance {
    async fn run_refresh_cycle(&self) -> Result<RefreshOutcome, DomainError> {
        let candidates = self.cache.refresh_candidates(self.prefetch_fraction);
        let mut outcome = RefreshOutcome {
            candidates_found: candidates.len(),
            ..RefreshOutcome::default()
        };

        for (key, entry) in candidates {
            if !entry.begin_refresh() {
                continue;
            }

            let question = Question {
                name: key.name.clone(),
                rtype: key.rtype,
                class: key.class,
            };

            match self.upstream.resolve(&question).await {
                Ok(resolution) => {
                    if let Some(fresh) = build_cache_entry(
                        &resolution.message,
                        resolution.dnssec_status,
                        self.positive_ttl,
                        self.negative_ttl,
                    ) {
                        self.cache.insert(key.clone(), fresh);
                        outcome.refreshed += 1;
                        debug!(domain = %key.name, record_type = %key.rtype, "Prefetch refreshed");
                    } else {
                        outcome.failed += 1;
                        entry.end_refresh();
                    }
                }
                Err(error) => {
                    outcome.failed += 1;
                    warn!(
                        domain = %key.name,
                        record_type = %key.rtype,
                        error = %error,
                        "Prefetch refresh failed"
                    );
                    // The stale entry stays until it expires or sweeps.
                    entry.end_refresh();
                }
            }
        }

        outcome.cache_size = self.cache.len();
        Ok(outcome)
    }

    async fn run_sweep_cycle(&self) -> Result<SweepOutcome, DomainError> {
        let entries_removed = self.cache.sweep();
        if entries_removed > 0 {
            debug!(removed = entries_removed, size = self.cache.len(), "Cache sweep");
        }
        Ok(SweepOutcome {
            entries_removed,
            cache_size: self.cache.len(),
        })
    }
}
