use cinder_dns_domain::Message;

/// RFC 2308 negative-cache TTL derivation with configured clamps.
#[derive(Debug, Clone, Copy)]
pub struct NegativeTtlPolicy {
    pub min_ttl: u32,
    /// Zero disables negative caching entirely.
    pub max_ttl: u32,
    /// Used when the response carries no SOA in the authority section.
    pub default_ttl: u32,
}

impl NegativeTtlPolicy {
    pub fn new(min_ttl: u32, max_ttl: u32, default_ttl: u32) -> Self {
        Self {
            min_ttl,
            max_ttl,
            default_ttl,
        }
    }

    pub fn enabled(&self) -> bool {
        self.max_ttl > 0
    }

    /// TTL for a negative answer: min(SOA.minimum, SOA record TTL),
    /// clamped; the configured default when there is no SOA.
    pub fn ttl_for(&self, response: &Message) -> u32 {
        response
            .soa_negative_ttl()
            .map(|ttl| ttl.clamp(self.min_ttl, self.max_ttl))
            .unwrap_or(self.default_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_dns_domain::{Message, RData, Rcode, RecordType, ResourceRecord, SoaData};

    fn policy() -> NegativeTtlPolicy {
        NegativeTtlPolicy::new(30, 3_600, 60)
    }

    fn nxdomain_with_soa(minimum: u32, record_ttl: u32) -> Message {
        let mut message = Message::query(1, "missing.example.com", RecordType::A);
        message.header.response = true;
        message.header.rcode = Rcode::NxDomain;
        message.authorities = vec![ResourceRecord::new(
            "example.com",
            record_ttl,
            RData::SOA(SoaData {
                mname: "ns1.example.com".to_string(),
                rname: "hostmaster.example.com".to_string(),
                serial: 1,
                refresh: 7200,
                retry: 900,
                expire: 1_209_600,
                minimum,
            }),
        )];
        message
    }

    #[test]
    fn soa_minimum_of_60_yields_60() {
        assert_eq!(policy().ttl_for(&nxdomain_with_soa(60, 3_600)), 60);
    }

    #[test]
    fn huge_soa_minimum_is_capped() {
        assert_eq!(policy().ttl_for(&nxdomain_with_soa(86_400, 86_400)), 3_600);
    }

    #[test]
    fn tiny_soa_minimum_is_raised_to_floor() {
        assert_eq!(policy().ttl_for(&nxdomain_with_soa(5, 3_600)), 30);
    }

    #[test]
    fn soa_record_ttl_caps_the_minimum() {
        assert_eq!(policy().ttl_for(&nxdomain_with_soa(900, 45)), 45);
    }

    #[test]
    fn missing_soa_falls_back_to_default() {
        let mut message = Message::query(1, "missing.example.com", RecordType::A);
        message.header.response = true;
        message.header.rcode = Rcode::NxDomain;
        assert_eq!(policy().ttl_for(&message), 60);
    }

    #[test]
    fn zero_max_ttl_disables_negative_caching() {
        assert!(!NegativeTtlPolicy::new(30, 0, 60).enabled());
    }
}
