use std::sync::Arc;
use std::time::{Duration, Instant};

use cinder_dns_domain::{DomainError, Message, Opcode, Rcode, RecordType};
use tokio::sync::Semaphore;

use crate::ports::DnsResolver;

/// Dispatches one decoded query through the resolver stack and always
/// produces a response message; failures become error rcodes, never
/// silence.
pub struct HandleDnsQueryUseCase {
    resolver: Arc<dyn DnsResolver>,
    /// Ceiling on concurrent upstream forwards. Cache hits bypass it.
    forward_slots: Arc<Semaphore>,
    queue_wait: Duration,
    query_timeout: Duration,
}

impl HandleDnsQueryUseCase {
    pub fn new(
        resolver: Arc<dyn DnsResolver>,
        max_inflight_forwards: usize,
        queue_wait: Duration,
        query_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            forward_slots: Arc::new(Semaphore::new(max_inflight_forwards)),
            queue_wait,
            query_timeout,
        }
    }

    pub async fn execute(&self, request: &Message) -> Message {
        if request.header.response {
            return Message::response_to(request, Rcode::FormErr);
        }
        if request.header.opcode != Opcode::Query {
            return Message::response_to(request, Rcode::NotImp);
        }
        let question = match request.question() {
            Some(q) if request.questions.len() == 1 => q.clone(),
            _ => return Message::response_to(request, Rcode::FormErr),
        };

        let start = Instant::now();

        // Fresh cache entries are served without consuming a forward slot.
        if let Some(resolution) = self.resolver.try_cache(&question) {
            tracing::debug!(
                domain = %question.name,
                record_type = %question.rtype,
                dnssec = %resolution.dnssec_status,
                "Cache hit"
            );
            return build_response(request, &resolution.message);
        }

        let permit = match tokio::time::timeout(
            self.queue_wait,
            Arc::clone(&self.forward_slots).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            _ => {
                tracing::warn!(
                    domain = %question.name,
                    record_type = %question.rtype,
                    error = %DomainError::CapacityExceeded,
                    "Shedding query"
                );
                return Message::response_to(request, Rcode::ServFail);
            }
        };

        let outcome = tokio::time::timeout(self.query_timeout, self.resolver.resolve(&question)).await;
        drop(permit);

        match outcome {
            Ok(Ok(resolution)) => {
                tracing::debug!(
                    domain = %question.name,
                    record_type = %question.rtype,
                    cache_hit = resolution.cache_hit,
                    dnssec = %resolution.dnssec_status,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Resolved"
                );
                build_response(request, &resolution.message)
            }
            Ok(Err(error)) => {
                let rcode = rcode_for_error(&error);
                tracing::warn!(
                    domain = %question.name,
                    record_type = %question.rtype,
                    error = %error,
                    rcode = %rcode,
                    "Resolution failed"
                );
                Message::response_to(request, rcode)
            }
            Err(_) => {
                tracing::warn!(
                    domain = %question.name,
                    record_type = %question.rtype,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "Query deadline exceeded"
                );
                Message::response_to(request, Rcode::ServFail)
            }
        }
    }
}

fn rcode_for_error(error: &DomainError) -> Rcode {
    match error {
        DomainError::NxDomain => Rcode::NxDomain,
        DomainError::MalformedMessage(_) | DomainError::InvalidDomainName(_) => Rcode::FormErr,
        DomainError::UpstreamUnavailable(_)
        | DomainError::ValidationBogus(_)
        | DomainError::CapacityExceeded
        | DomainError::QueryTimeout
        | DomainError::ConfigError(_)
        | DomainError::IoError(_) => Rcode::ServFail,
    }
}

/// Graft the resolved sections onto a reply for this client: the client's
/// id, opcode, and RD bit, with RA set. OPT pseudo-records are dropped
/// since the server negotiates no EDNS options.
fn build_response(request: &Message, resolved: &Message) -> Message {
    let mut response = Message::response_to(request, resolved.header.rcode);
    response.answers = resolved.answers.clone();
    response.authorities = resolved.authorities.clone();
    response.additionals = resolved
        .additionals
        .iter()
        .filter(|r| r.rtype != RecordType::OPT)
        .cloned()
        .collect();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Resolution;
    use async_trait::async_trait;
    use cinder_dns_domain::{DnssecStatus, Question, RData, ResourceRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubResolver {
        answer_ttl: u32,
        delay: Option<Duration>,
        fail_with: Option<fn() -> DomainError>,
        calls: AtomicUsize,
    }

    impl StubResolver {
        fn answering(ttl: u32) -> Self {
            Self {
                answer_ttl: ttl,
                delay: None,
                fail_with: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::answering(300)
            }
        }

        fn failing(make: fn() -> DomainError) -> Self {
            Self {
                fail_with: Some(make),
                ..Self::answering(300)
            }
        }
    }

    #[async_trait]
    impl DnsResolver for StubResolver {
        async fn resolve(&self, question: &Question) -> Result<Resolution, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(make) = self.fail_with {
                return Err(make());
            }
            let mut message = Message::query(0, question.name.clone(), question.rtype);
            message.header.response = true;
            message.answers = vec![ResourceRecord::new(
                question.name.clone(),
                self.answer_ttl,
                RData::A("192.0.2.1".parse().unwrap()),
            )];
            Ok(Resolution::upstream(
                Arc::new(message),
                DnssecStatus::Unknown,
                Arc::from("https://dns.test/dns-query"),
            ))
        }
    }

    fn use_case(resolver: StubResolver, max_inflight: usize) -> HandleDnsQueryUseCase {
        HandleDnsQueryUseCase::new(
            Arc::new(resolver),
            max_inflight,
            Duration::from_millis(500),
            Duration::from_secs(3),
        )
    }

    fn request(id: u16) -> Message {
        Message::query(id, "example.com", RecordType::A)
    }

    #[tokio::test]
    async fn echoes_id_and_sets_ra_on_success() {
        let uc = use_case(StubResolver::answering(300), 4);
        let response = uc.execute(&request(0xBEEF)).await;
        assert_eq!(response.header.id, 0xBEEF);
        assert!(response.header.response);
        assert!(response.header.recursion_available);
        assert_eq!(response.header.rcode, Rcode::NoError);
        assert_eq!(response.answers.len(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_servfail() {
        let uc = use_case(
            StubResolver::failing(|| DomainError::UpstreamUnavailable("all endpoints down".into())),
            4,
        );
        let response = uc.execute(&request(7)).await;
        assert_eq!(response.header.rcode, Rcode::ServFail);
        assert!(response.answers.is_empty());
    }

    #[tokio::test]
    async fn bogus_validation_maps_to_servfail() {
        let uc = use_case(
            StubResolver::failing(|| DomainError::ValidationBogus("rrsig mismatch".into())),
            4,
        );
        let response = uc.execute(&request(7)).await;
        assert_eq!(response.header.rcode, Rcode::ServFail);
    }

    #[tokio::test]
    async fn non_query_opcode_gets_notimp() {
        let uc = use_case(StubResolver::answering(300), 4);
        let mut req = request(1);
        req.header.opcode = Opcode::Status;
        let response = uc.execute(&req).await;
        assert_eq!(response.header.rcode, Rcode::NotImp);
    }

    #[tokio::test]
    async fn empty_question_section_gets_formerr() {
        let uc = use_case(StubResolver::answering(300), 4);
        let mut req = request(1);
        req.questions.clear();
        let response = uc.execute(&req).await;
        assert_eq!(response.header.rcode, Rcode::FormErr);
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_forward_slots_shed_with_servfail() {
        let uc = Arc::new(HandleDnsQueryUseCase::new(
            Arc::new(StubResolver::slow(Duration::from_secs(2))),
            1,
            Duration::from_millis(500),
            Duration::from_secs(10),
        ));

        let first = tokio::spawn({
            let uc = Arc::clone(&uc);
            async move { uc.execute(&request(1)).await }
        });
        tokio::task::yield_now().await;
        let second = uc.execute(&request(2)).await;

        assert_eq!(second.header.rcode, Rcode::ServFail, "slot queue overflow");
        let first = first.await.unwrap();
        assert_eq!(first.header.rcode, Rcode::NoError);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_exceeded_maps_to_servfail() {
        let uc = HandleDnsQueryUseCase::new(
            Arc::new(StubResolver::slow(Duration::from_secs(30))),
            4,
            Duration::from_millis(500),
            Duration::from_secs(3),
        );
        let response = uc.execute(&request(9)).await;
        assert_eq!(response.header.rcode, Rcode::ServFail);
    }
}
