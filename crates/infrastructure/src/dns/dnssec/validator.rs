use super::crypto::{key_tag, SignatureVerifier};
use super::trust_anchor::TrustAnchorStore;
use cinder_dns_domain::wire::{encode_name_canonical, encode_record_canonical};
use cinder_dns_domain::{
    DnssecStatus, DomainError, Message, RData, RecordType, ResourceRecord, RrsigData,
};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Signature validation against the trust-anchor store.
///
/// RRSIGs covering the answer RRsets are verified against the trusted
/// keys for the signer zone. Full chain-of-trust walking (per-zone DS
/// fetches) is out of scope; an answer signed by a zone with no anchored
/// keys validates as `Insecure`.
pub struct DnssecValidator {
    anchors: TrustAnchorStore,
    verifier: SignatureVerifier,
}

impl DnssecValidator {
    pub fn new(anchors: TrustAnchorStore) -> Self {
        Self {
            anchors,
            verifier: SignatureVerifier,
        }
    }

    pub fn validate(&self, message: &Message) -> DnssecStatus {
        let rrsigs: Vec<(&str, &RrsigData)> = message
            .answers
            .iter()
            .filter_map(|r| match &r.rdata {
                RData::RRSIG(sig) => Some((r.name.as_str(), sig)),
                _ => None,
            })
            .collect();

        if rrsigs.is_empty() {
            return DnssecStatus::Insecure;
        }

        let mut rrsets: BTreeMap<(String, u16), Vec<&ResourceRecord>> = BTreeMap::new();
        for record in &message.answers {
            if record.rtype == RecordType::RRSIG {
                continue;
            }
            rrsets
                .entry((record.name.to_ascii_lowercase(), record.rtype.to_u16()))
                .or_default()
                .push(record);
        }

        let mut overall = DnssecStatus::Secure;
        for ((name, rtype), records) in &rrsets {
            let covering: Vec<&RrsigData> = rrsigs
                .iter()
                .filter(|(owner, sig)| {
                    owner.eq_ignore_ascii_case(name) && sig.type_covered.to_u16() == *rtype
                })
                .map(|(_, sig)| *sig)
                .collect();

            // Signatures exist in this answer but not for this rrset.
            if covering.is_empty() {
                debug!(name = %name, rtype, "RRset lacks a covering RRSIG");
                return DnssecStatus::Bogus;
            }

            match self.validate_rrset(records, &covering) {
                DnssecStatus::Bogus => return DnssecStatus::Bogus,
                DnssecStatus::Insecure | DnssecStatus::Unknown => {
                    overall = DnssecStatus::Insecure;
                }
                DnssecStatus::Secure => {}
            }
        }

        overall
    }

    fn validate_rrset(
        &self,
        records: &[&ResourceRecord],
        rrsigs: &[&RrsigData],
    ) -> DnssecStatus {
        let mut any_trusted_key = false;

        for rrsig in rrsigs {
            let keys = self.anchors.keys_for_zone(&rrsig.signer_name);
            if keys.is_empty() {
                continue;
            }
            any_trusted_key = true;

            if !time_window_valid(rrsig) {
                debug!(
                    signer = %rrsig.signer_name,
                    inception = rrsig.inception,
                    expiration = rrsig.expiration,
                    "RRSIG outside its validity window"
                );
                continue;
            }

            for dnskey in keys {
                if key_tag(dnskey) != rrsig.key_tag || dnskey.algorithm != rrsig.algorithm {
                    continue;
                }
                match self.signed_data(rrsig, records) {
                    Ok(data) => match self.verifier.verify(
                        rrsig.algorithm,
                        &data,
                        &rrsig.signature,
                        dnskey,
                    ) {
                        Ok(true) => return DnssecStatus::Secure,
                        Ok(false) => {}
                        Err(e) => {
                            debug!(error = %e, "Signature verification unusable");
                        }
                    },
                    Err(e) => {
                        debug!(error = %e, "Could not build signed data");
                    }
                }
            }
        }

        if any_trusted_key {
            // A trusted key for the signer zone exists but nothing verified.
            DnssecStatus::Bogus
        } else {
            DnssecStatus::Insecure
        }
    }

    /// RFC 4034 §3.1.8.1 signed data: RRSIG rdata (sans signature) with
    /// the canonical signer name, then the RRset in canonical form and
    /// order at the original TTL.
    fn signed_data(
        &self,
        rrsig: &RrsigData,
        records: &[&ResourceRecord],
    ) -> Result<Vec<u8>, DomainError> {
        let mut data = Vec::new();
        data.extend_from_slice(&rrsig.type_covered.to_u16().to_be_bytes());
        data.push(rrsig.algorithm);
        data.push(rrsig.labels);
        data.extend_from_slice(&rrsig.original_ttl.to_be_bytes());
        data.extend_from_slice(&rrsig.expiration.to_be_bytes());
        data.extend_from_slice(&rrsig.inception.to_be_bytes());
        data.extend_from_slice(&rrsig.key_tag.to_be_bytes());
        encode_name_canonical(&rrsig.signer_name, &mut data)?;

        let mut encoded: Vec<Vec<u8>> = Vec::with_capacity(records.len());
        for record in records {
            let mut buf = Vec::new();
            encode_record_canonical(record, rrsig.original_ttl, &mut buf)?;
            encoded.push(buf);
        }
        // Within one rrset the wire prefix is identical, so sorting the
        // full encoding sorts by rdata as the RFC requires.
        encoded.sort();
        for record_bytes in encoded {
            data.extend_from_slice(&record_bytes);
        }
        Ok(data)
    }
}

fn time_window_valid(rrsig: &RrsigData) -> bool {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    now >= rrsig.inception && now <= rrsig.expiration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::dnssec::TrustAnchor;
    use cinder_dns_domain::{DnskeyData, Rcode};

    fn unix_now() -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32
    }

    fn answer_with_a(name: &str) -> Message {
        let mut message = Message::query(1, name, RecordType::A);
        message.header.response = true;
        message.header.rcode = Rcode::NoError;
        message.answers = vec![ResourceRecord::new(
            name,
            300,
            RData::A("192.0.2.1".parse().unwrap()),
        )];
        message
    }

    fn zone_key() -> DnskeyData {
        DnskeyData {
            flags: 256,
            protocol: 3,
            algorithm: 15,
            public_key: vec![0u8; 32],
        }
    }

    fn rrsig_for(name: &str, signer: &str, dnskey: &DnskeyData) -> ResourceRecord {
        ResourceRecord::new(
            name,
            300,
            RData::RRSIG(RrsigData {
                type_covered: RecordType::A,
                algorithm: dnskey.algorithm,
                labels: 2,
                original_ttl: 300,
                expiration: unix_now() + 3_600,
                inception: unix_now().saturating_sub(3_600),
                key_tag: key_tag(dnskey),
                signer_name: signer.to_string(),
                signature: vec![0u8; 64],
            }),
        )
    }

    #[test]
    fn unsigned_answer_is_insecure() {
        let validator = DnssecValidator::new(TrustAnchorStore::new());
        assert_eq!(
            validator.validate(&answer_with_a("example.com")),
            DnssecStatus::Insecure
        );
    }

    #[test]
    fn signer_without_anchored_keys_is_insecure() {
        let validator = DnssecValidator::new(TrustAnchorStore::empty());
        let key = zone_key();
        let mut message = answer_with_a("example.com");
        message
            .answers
            .push(rrsig_for("example.com", "example.com", &key));
        assert_eq!(validator.validate(&message), DnssecStatus::Insecure);
    }

    #[test]
    fn bad_signature_under_anchored_key_is_bogus() {
        let key = zone_key();
        let mut anchors = TrustAnchorStore::empty();
        anchors.add_anchor(TrustAnchor::new("example.com", key.clone()));
        let validator = DnssecValidator::new(anchors);

        let mut message = answer_with_a("example.com");
        message
            .answers
            .push(rrsig_for("example.com", "example.com", &key));
        assert_eq!(validator.validate(&message), DnssecStatus::Bogus);
    }

    #[test]
    fn expired_signature_window_is_bogus() {
        let key = zone_key();
        let mut anchors = TrustAnchorStore::empty();
        anchors.add_anchor(TrustAnchor::new("example.com", key.clone()));
        let validator = DnssecValidator::new(anchors);

        let mut message = answer_with_a("example.com");
        let mut rrsig = rrsig_for("example.com", "example.com", &key);
        if let RData::RRSIG(ref mut sig) = rrsig.rdata {
            sig.expiration = unix_now().saturating_sub(7_200);
            sig.inception = unix_now().saturating_sub(14_400);
        }
        message.answers.push(rrsig);
        assert_eq!(validator.validate(&message), DnssecStatus::Bogus);
    }

    #[test]
    fn rrset_without_covering_rrsig_is_bogus() {
        let key = zone_key();
        let mut anchors = TrustAnchorStore::empty();
        anchors.add_anchor(TrustAnchor::new("example.com", key.clone()));
        let validator = DnssecValidator::new(anchors);

        let mut message = answer_with_a("example.com");
        // AAAA rrset appears alongside a signed A rrset but has no RRSIG.
        message.answers.push(ResourceRecord::new(
            "example.com",
            300,
            RData::AAAA("2001:db8::1".parse().unwrap()),
        ));
        message
            .answers
            .push(rrsig_for("example.com", "example.com", &key));
        assert_eq!(validator.validate(&message), DnssecStatus::Bogus);
    }
}
