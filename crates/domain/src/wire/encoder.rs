use super::name::{encode_name, encode_name_canonical};
use crate::errors::DomainError;
use crate::message::{Message, Question, Rcode};
use crate::record::{RData, ResourceRecord};
use crate::record_type::{RClass, RecordType};

/// Encode a message to wire bytes. Names are written uncompressed.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(512);
    encode_header(message, &mut buf);

    for question in &message.questions {
        encode_question(question, &mut buf)?;
    }
    for record in &message.answers {
        encode_record(record, &mut buf)?;
    }
    for record in &message.authorities {
        encode_record(record, &mut buf)?;
    }
    for record in &message.additionals {
        encode_record(record, &mut buf)?;
    }
    Ok(buf)
}

/// Convenience for upstream forwarding: a single-question recursive query.
pub fn encode_query(
    name: &str,
    rtype: RecordType,
    id: u16,
) -> Result<Vec<u8>, DomainError> {
    encode_message(&Message::query(id, name, rtype))
}

/// Encode a response for a transport with a payload bound (UDP).
///
/// If the full encoding exceeds `max_len`, the answer sections are dropped
/// and the TC bit set so the client retries over TCP.
pub fn encode_response_limited(
    message: &Message,
    max_len: usize,
) -> Result<Vec<u8>, DomainError> {
    let full = encode_message(message)?;
    if full.len() <= max_len {
        return Ok(full);
    }

    let mut truncated = Message {
        header: message.header,
        questions: message.questions.clone(),
        answers: vec![],
        authorities: vec![],
        additionals: vec![],
    };
    truncated.header.truncated = true;
    encode_message(&truncated)
}

fn encode_header(message: &Message, buf: &mut Vec<u8>) {
    let h = &message.header;
    buf.extend_from_slice(&h.id.to_be_bytes());

    let mut flags: u16 = 0;
    if h.response {
        flags |= 0x8000;
    }
    flags |= (h.opcode.to_u8() as u16) << 11;
    if h.authoritative {
        flags |= 0x0400;
    }
    if h.truncated {
        flags |= 0x0200;
    }
    if h.recursion_desired {
        flags |= 0x0100;
    }
    if h.recursion_available {
        flags |= 0x0080;
    }
    flags |= h.rcode.to_u8() as u16;
    buf.extend_from_slice(&flags.to_be_bytes());

    buf.extend_from_slice(&(message.questions.len() as u16).to_be_bytes());
    buf.extend_from_slice(&(message.answers.len() as u16).to_be_bytes());
    buf.extend_from_slice(&(message.authorities.len() as u16).to_be_bytes());
    buf.extend_from_slice(&(message.additionals.len() as u16).to_be_bytes());
}

fn encode_question(question: &Question, buf: &mut Vec<u8>) -> Result<(), DomainError> {
    encode_name(&question.name, buf)?;
    buf.extend_from_slice(&question.rtype.to_u16().to_be_bytes());
    buf.extend_from_slice(&question.class.to_u16().to_be_bytes());
    Ok(())
}

fn encode_record(record: &ResourceRecord, buf: &mut Vec<u8>) -> Result<(), DomainError> {
    encode_name(&record.name, buf)?;
    buf.extend_from_slice(&record.rtype.to_u16().to_be_bytes());
    buf.extend_from_slice(&record.class.to_u16().to_be_bytes());
    buf.extend_from_slice(&record.ttl.to_be_bytes());

    let len_pos = buf.len();
    buf.extend_from_slice(&[0, 0]);
    encode_rdata(&record.rdata, buf)?;
    let rdlen = buf.len() - len_pos - 2;
    if rdlen > u16::MAX as usize {
        return Err(DomainError::MalformedMessage("rdata exceeds 64 KiB".into()));
    }
    buf[len_pos..len_pos + 2].copy_from_slice(&(rdlen as u16).to_be_bytes());
    Ok(())
}

pub(crate) fn encode_rdata(rdata: &RData, buf: &mut Vec<u8>) -> Result<(), DomainError> {
    match rdata {
        RData::A(addr) => buf.extend_from_slice(&addr.octets()),
        RData::AAAA(addr) => buf.extend_from_slice(&addr.octets()),
        RData::CNAME(name) | RData::NS(name) | RData::PTR(name) => {
            encode_name(name, buf)?;
        }
        RData::MX {
            preference,
            exchange,
        } => {
            buf.extend_from_slice(&preference.to_be_bytes());
            encode_name(exchange, buf)?;
        }
        RData::TXT(segments) => {
            for segment in segments {
                if segment.len() > 255 {
                    return Err(DomainError::MalformedMessage(
                        "TXT segment exceeds 255 bytes".into(),
                    ));
                }
                buf.push(segment.len() as u8);
                buf.extend_from_slice(segment);
            }
        }
        RData::SOA(soa) => {
            encode_name(&soa.mname, buf)?;
            encode_name(&soa.rname, buf)?;
            buf.extend_from_slice(&soa.serial.to_be_bytes());
            buf.extend_from_slice(&soa.refresh.to_be_bytes());
            buf.extend_from_slice(&soa.retry.to_be_bytes());
            buf.extend_from_slice(&soa.expire.to_be_bytes());
            buf.extend_from_slice(&soa.minimum.to_be_bytes());
        }
        RData::RRSIG(sig) => {
            buf.extend_from_slice(&sig.type_covered.to_u16().to_be_bytes());
            buf.push(sig.algorithm);
            buf.push(sig.labels);
            buf.extend_from_slice(&sig.original_ttl.to_be_bytes());
            buf.extend_from_slice(&sig.expiration.to_be_bytes());
            buf.extend_from_slice(&sig.inception.to_be_bytes());
            buf.extend_from_slice(&sig.key_tag.to_be_bytes());
            encode_name(&sig.signer_name, buf)?;
            buf.extend_from_slice(&sig.signature);
        }
        RData::DNSKEY(key) => {
            buf.extend_from_slice(&key.flags.to_be_bytes());
            buf.push(key.protocol);
            buf.push(key.algorithm);
            buf.extend_from_slice(&key.public_key);
        }
        RData::DS(ds) => {
            buf.extend_from_slice(&ds.key_tag.to_be_bytes());
            buf.push(ds.algorithm);
            buf.push(ds.digest_type);
            buf.extend_from_slice(&ds.digest);
        }
        RData::Unknown { data, .. } => buf.extend_from_slice(data),
    }
    Ok(())
}

/// Encode a record in DNSSEC canonical form (RFC 4034 §6.2-6.3): owner
/// name lowercased and uncompressed, TTL forced to `original_ttl`, names
/// inside rdata lowercased.
pub fn encode_record_canonical(
    record: &ResourceRecord,
    original_ttl: u32,
    buf: &mut Vec<u8>,
) -> Result<(), DomainError> {
    encode_name_canonical(&record.name, buf)?;
    buf.extend_from_slice(&record.rtype.to_u16().to_be_bytes());
    buf.extend_from_slice(&RClass::IN.to_u16().to_be_bytes());
    buf.extend_from_slice(&original_ttl.to_be_bytes());

    let len_pos = buf.len();
    buf.extend_from_slice(&[0, 0]);
    match &record.rdata {
        RData::CNAME(name) => encode_name_canonical(name, buf)?,
        RData::NS(name) => encode_name_canonical(name, buf)?,
        RData::PTR(name) => encode_name_canonical(name, buf)?,
        RData::MX {
            preference,
            exchange,
        } => {
            buf.extend_from_slice(&preference.to_be_bytes());
            encode_name_canonical(exchange, buf)?;
        }
        RData::SOA(soa) => {
            encode_name_canonical(&soa.mname, buf)?;
            encode_name_canonical(&soa.rname, buf)?;
            buf.extend_from_slice(&soa.serial.to_be_bytes());
            buf.extend_from_slice(&soa.refresh.to_be_bytes());
            buf.extend_from_slice(&soa.retry.to_be_bytes());
            buf.extend_from_slice(&soa.expire.to_be_bytes());
            buf.extend_from_slice(&soa.minimum.to_be_bytes());
        }
        other => encode_rdata(other, buf)?,
    }
    let rdlen = buf.len() - len_pos - 2;
    buf[len_pos..len_pos + 2].copy_from_slice(&(rdlen as u16).to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_has_rd_flag_and_matching_id() {
        let bytes = encode_query("google.com", RecordType::A, 0xBEEF).unwrap();
        assert!(bytes.len() >= 12);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 0xBEEF);
        // Byte 2: QR(1) Opcode(4) AA(1) TC(1) RD(1) — RD is the low bit.
        assert_eq!(bytes[2] & 0x01, 0x01, "RD flag should be set");
        assert_eq!(bytes[2] & 0x80, 0x00, "QR must be clear on a query");
    }

    #[test]
    fn oversized_response_is_truncated_with_tc() {
        let mut message = Message::query(1, "example.com", RecordType::TXT);
        message.header.response = true;
        for _ in 0..40 {
            message.answers.push(ResourceRecord::new(
                "example.com",
                60,
                RData::TXT(vec![vec![b'x'; 200]]),
            ));
        }
        let bytes = encode_response_limited(&message, crate::wire::MAX_UDP_PAYLOAD).unwrap();
        assert!(bytes.len() <= crate::wire::MAX_UDP_PAYLOAD);
        assert_eq!(bytes[2] & 0x02, 0x02, "TC flag should be set");
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 0, "no answers");
    }
}
