use super::pool::UpstreamPool;
use async_trait::async_trait;
use cinder_dns_application::ports::{ProbeOutcome, UpstreamHealthPort};
use cinder_dns_domain::wire::{decode_message, encode_message};
use cinder_dns_domain::{DomainError, Message, RecordType};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A name every public resolver can answer, used as the trial query.
const PROBE_DOMAIN: &str = "example.com";
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Sends one trial query to each unhealthy endpoint whose cooldown has
/// elapsed, readmitting it on success.
pub struct UpstreamProber {
    pool: Arc<UpstreamPool>,
}

impl UpstreamProber {
    pub fn new(pool: Arc<UpstreamPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UpstreamHealthPort for UpstreamProber {
    async fn probe_cooled_down(&self) -> Result<ProbeOutcome, DomainError> {
        let mut outcome = ProbeOutcome::default();

        for endpoint in self.pool.endpoints() {
            if !endpoint.health.cooldown_elapsed() {
                continue;
            }
            outcome.probed += 1;

            let id = fastrand::u16(..);
            let query = Message::query(id, PROBE_DOMAIN, RecordType::A);
            let query_bytes = encode_message(&query)?;

            let verdict = match endpoint.transport.send(&query_bytes, PROBE_TIMEOUT).await {
                Ok(response) => match decode_message(&response.bytes) {
                    Ok(message) if message.header.id == id && message.header.response => Ok(()),
                    Ok(_) => Err("probe response id mismatch".to_string()),
                    Err(e) => Err(e.to_string()),
                },
                Err(e) => Err(e.to_string()),
            };

            match verdict {
                Ok(()) => {
                    endpoint.health.record_success(&endpoint.url);
                    outcome.recovered += 1;
                    info!(endpoint = %endpoint.url, "Probe succeeded, endpoint readmitted");
                }
                Err(error) => {
                    endpoint.health.record_failure(&endpoint.url, &error);
                    outcome.still_unhealthy += 1;
                    debug!(endpoint = %endpoint.url, error = %error, "Probe failed");
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::transport::{DnsTransport, TransportResponse};
    use crate::dns::upstream::{EndpointStatus, UpstreamEndpoint};
    use cinder_dns_domain::Rcode;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlippableTransport {
        healthy: Arc<AtomicBool>,
    }

    #[async_trait]
    impl DnsTransport for FlippableTransport {
        async fn send(
            &self,
            message_bytes: &[u8],
            _timeout: Duration,
        ) -> Result<TransportResponse, DomainError> {
            if !self.healthy.load(Ordering::SeqCst) {
                return Err(DomainError::UpstreamUnavailable("down".into()));
            }
            let mut request = decode_message(message_bytes).unwrap();
            request.header.response = true;
            request.header.rcode = Rcode::NoError;
            Ok(TransportResponse {
                bytes: encode_message(&request).unwrap(),
            })
        }
    }

    #[tokio::test]
    async fn probe_readmits_recovered_endpoint() {
        let healthy = Arc::new(AtomicBool::new(false));
        let endpoint = Arc::new(UpstreamEndpoint::new(
            Arc::from("https://flaky.test/dns-query"),
            Arc::new(FlippableTransport {
                healthy: Arc::clone(&healthy),
            }),
            1,
            Duration::ZERO,
        ));
        endpoint.health.record_failure(&endpoint.url, "down");
        assert_eq!(endpoint.health.status(), EndpointStatus::Unhealthy);

        let pool = Arc::new(UpstreamPool::with_endpoints(
            vec![Arc::clone(&endpoint)],
            Duration::from_secs(3),
        ));
        let prober = UpstreamProber::new(pool);

        // Endpoint still down: probe counts it and re-penalizes.
        let outcome = prober.probe_cooled_down().await.unwrap();
        assert_eq!(outcome.probed, 1);
        assert_eq!(outcome.still_unhealthy, 1);

        healthy.store(true, Ordering::SeqCst);
        let outcome = prober.probe_cooled_down().await.unwrap();
        assert_eq!(outcome.recovered, 1);
        assert_eq!(endpoint.health.status(), EndpointStatus::Healthy);
    }
}
