use super::name::parse_name;
use super::HEADER_LEN;
use crate::errors::DomainError;
use crate::message::{Header, Message, Opcode, Question, Rcode};
use crate::record::{DnskeyData, DsData, RData, ResourceRecord, RrsigData, SoaData};
use crate::record_type::{RClass, RecordType};
use std::net::{Ipv4Addr, Ipv6Addr};

fn malformed(msg: impl Into<String>) -> DomainError {
    DomainError::MalformedMessage(msg.into())
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, DomainError> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| malformed("message truncated reading u16"))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, DomainError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| malformed("message truncated reading u32"))
}

/// Decode a complete DNS message from wire bytes.
pub fn decode_message(data: &[u8]) -> Result<Message, DomainError> {
    if data.len() < HEADER_LEN {
        return Err(malformed(format!("header truncated: {} bytes", data.len())));
    }

    let id = read_u16(data, 0)?;
    let flags = read_u16(data, 2)?;
    let qdcount = read_u16(data, 4)?;
    let ancount = read_u16(data, 6)?;
    let nscount = read_u16(data, 8)?;
    let arcount = read_u16(data, 10)?;

    let header = Header {
        id,
        response: flags & 0x8000 != 0,
        opcode: Opcode::from_u8(((flags >> 11) & 0x0F) as u8),
        authoritative: flags & 0x0400 != 0,
        truncated: flags & 0x0200 != 0,
        recursion_desired: flags & 0x0100 != 0,
        recursion_available: flags & 0x0080 != 0,
        rcode: Rcode::from_u8((flags & 0x000F) as u8),
    };

    let mut offset = HEADER_LEN;

    let mut questions = Vec::with_capacity(qdcount as usize);
    for _ in 0..qdcount {
        let (question, next) = decode_question(data, offset)?;
        questions.push(question);
        offset = next;
    }

    let mut answers = Vec::with_capacity(ancount as usize);
    for _ in 0..ancount {
        let (record, next) = decode_record(data, offset)?;
        answers.push(record);
        offset = next;
    }

    let mut authorities = Vec::with_capacity(nscount as usize);
    for _ in 0..nscount {
        let (record, next) = decode_record(data, offset)?;
        authorities.push(record);
        offset = next;
    }

    let mut additionals = Vec::with_capacity(arcount as usize);
    for _ in 0..arcount {
        let (record, next) = decode_record(data, offset)?;
        additionals.push(record);
        offset = next;
    }

    Ok(Message {
        header,
        questions,
        answers,
        authorities,
        additionals,
    })
}

fn decode_question(data: &[u8], offset: usize) -> Result<(Question, usize), DomainError> {
    let (name, offset) = parse_name(data, offset)?;
    let rtype = RecordType::from_u16(read_u16(data, offset)?);
    let class = RClass::from_u16(read_u16(data, offset + 2)?);
    Ok((Question { name, rtype, class }, offset + 4))
}

fn decode_record(data: &[u8], offset: usize) -> Result<(ResourceRecord, usize), DomainError> {
    let (name, offset) = parse_name(data, offset)?;
    let rtype = RecordType::from_u16(read_u16(data, offset)?);
    let class = RClass::from_u16(read_u16(data, offset + 2)?);
    let ttl = read_u32(data, offset + 4)?;
    let rdlen = read_u16(data, offset + 8)? as usize;

    let rdata_start = offset + 10;
    let rdata_end = rdata_start + rdlen;
    if rdata_end > data.len() {
        return Err(malformed(format!(
            "rdata length {} exceeds remaining buffer",
            rdlen
        )));
    }

    let rdata = decode_rdata(data, rtype, rdata_start, rdata_end)?;

    Ok((
        ResourceRecord {
            name,
            rtype,
            class,
            ttl,
            rdata,
        },
        rdata_end,
    ))
}

fn decode_rdata(
    data: &[u8],
    rtype: RecordType,
    start: usize,
    end: usize,
) -> Result<RData, DomainError> {
    let raw = &data[start..end];

    match rtype {
        RecordType::A => {
            let bytes: [u8; 4] = raw
                .try_into()
                .map_err(|_| malformed(format!("A rdata has {} bytes, expected 4", raw.len())))?;
            Ok(RData::A(Ipv4Addr::from(bytes)))
        }
        RecordType::AAAA => {
            let bytes: [u8; 16] = raw.try_into().map_err(|_| {
                malformed(format!("AAAA rdata has {} bytes, expected 16", raw.len()))
            })?;
            Ok(RData::AAAA(Ipv6Addr::from(bytes)))
        }
        RecordType::CNAME | RecordType::NS | RecordType::PTR => {
            let (target, consumed) = parse_name(data, start)?;
            if consumed > end {
                return Err(malformed("name rdata exceeds rdata length"));
            }
            Ok(match rtype {
                RecordType::CNAME => RData::CNAME(target),
                RecordType::NS => RData::NS(target),
                _ => RData::PTR(target),
            })
        }
        RecordType::MX => {
            let preference = read_u16(data, start)?;
            let (exchange, consumed) = parse_name(data, start + 2)?;
            if consumed > end {
                return Err(malformed("MX exchange exceeds rdata length"));
            }
            Ok(RData::MX {
                preference,
                exchange,
            })
        }
        RecordType::TXT => {
            let mut segments = Vec::new();
            let mut pos = start;
            while pos < end {
                let len = data[pos] as usize;
                pos += 1;
                if pos + len > end {
                    return Err(malformed("TXT segment exceeds rdata length"));
                }
                segments.push(data[pos..pos + len].to_vec());
                pos += len;
            }
            Ok(RData::TXT(segments))
        }
        RecordType::SOA => {
            let (mname, pos) = parse_name(data, start)?;
            let (rname, pos) = parse_name(data, pos)?;
            if pos + 20 > end {
                return Err(malformed("SOA rdata truncated"));
            }
            Ok(RData::SOA(SoaData {
                mname,
                rname,
                serial: read_u32(data, pos)?,
                refresh: read_u32(data, pos + 4)?,
                retry: read_u32(data, pos + 8)?,
                expire: read_u32(data, pos + 12)?,
                minimum: read_u32(data, pos + 16)?,
            }))
        }
        RecordType::RRSIG => {
            if raw.len() < 18 {
                return Err(malformed("RRSIG rdata too short"));
            }
            let type_covered = RecordType::from_u16(read_u16(data, start)?);
            let algorithm = raw[2];
            let labels = raw[3];
            let original_ttl = read_u32(data, start + 4)?;
            let expiration = read_u32(data, start + 8)?;
            let inception = read_u32(data, start + 12)?;
            let key_tag = read_u16(data, start + 16)?;
            // Signer name is never compressed (RFC 4034 §3.1.7).
            let (signer_name, pos) = parse_name(data, start + 18)?;
            if pos > end {
                return Err(malformed("RRSIG signer name exceeds rdata length"));
            }
            Ok(RData::RRSIG(RrsigData {
                type_covered,
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag,
                signer_name,
                signature: data[pos..end].to_vec(),
            }))
        }
        RecordType::DNSKEY => {
            if raw.len() < 4 {
                return Err(malformed("DNSKEY rdata too short"));
            }
            Ok(RData::DNSKEY(DnskeyData {
                flags: read_u16(data, start)?,
                protocol: raw[2],
                algorithm: raw[3],
                public_key: raw[4..].to_vec(),
            }))
        }
        RecordType::DS => {
            if raw.len() < 4 {
                return Err(malformed("DS rdata too short"));
            }
            Ok(RData::DS(DsData {
                key_tag: read_u16(data, start)?,
                algorithm: raw[2],
                digest_type: raw[3],
                digest: raw[4..].to_vec(),
            }))
        }
        other => Ok(RData::Unknown {
            rtype: other.to_u16(),
            data: raw.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::encode_message;

    #[test]
    fn rejects_truncated_header() {
        let err = decode_message(&[0u8; 5]).unwrap_err();
        assert!(matches!(err, DomainError::MalformedMessage(_)));
    }

    #[test]
    fn rejects_rdata_past_end() {
        let mut bytes = encode_message(&Message::query(1, "example.com", RecordType::A)).unwrap();
        // Claim one answer but provide a record whose rdlen overruns.
        bytes[7] = 1;
        bytes.extend_from_slice(&[0xC0, 0x0C]); // name: pointer to question
        bytes.extend_from_slice(&1u16.to_be_bytes()); // type A
        bytes.extend_from_slice(&1u16.to_be_bytes()); // class IN
        bytes.extend_from_slice(&300u32.to_be_bytes()); // ttl
        bytes.extend_from_slice(&64u16.to_be_bytes()); // rdlen larger than buffer
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        let err = decode_message(&bytes).unwrap_err();
        assert!(matches!(err, DomainError::MalformedMessage(_)));
    }

    #[test]
    fn rejects_pointer_cycle() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x1234u16.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes()); // one question
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        // Question name is a pointer chain that can never terminate:
        // both pointers target each other's position.
        bytes.extend_from_slice(&[0xC0, 0x0E, 0xC0, 0x0C]);
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        let err = decode_message(&bytes).unwrap_err();
        assert!(matches!(err, DomainError::MalformedMessage(_)));
    }

    #[test]
    fn decodes_compressed_answer_name() {
        let mut bytes = encode_message(&Message::query(7, "example.com", RecordType::A)).unwrap();
        bytes[7] = 1; // ancount = 1
        bytes.extend_from_slice(&[0xC0, 0x0C]);
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&300u32.to_be_bytes());
        bytes.extend_from_slice(&4u16.to_be_bytes());
        bytes.extend_from_slice(&[93, 184, 216, 34]);

        let message = decode_message(&bytes).unwrap();
        assert_eq!(message.answers.len(), 1);
        assert_eq!(message.answers[0].name, "example.com");
        assert_eq!(message.answers[0].ttl, 300);
        assert_eq!(
            message.answers[0].rdata,
            RData::A("93.184.216.34".parse().unwrap())
        );
    }
}
