use super::{MAX_COMPRESSION_HOPS, MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use crate::errors::DomainError;

fn malformed(msg: impl Into<String>) -> DomainError {
    DomainError::MalformedMessage(msg.into())
}

/// Parse a domain name starting at `start`, following compression pointers.
///
/// Returns the dotted name (no trailing dot, root is the empty string) and
/// the offset just past the name at its original position. Pointers must
/// target a strictly earlier offset than the pointer byte itself; together
/// with the hop cap this rejects pointer cycles instead of following them.
pub fn parse_name(data: &[u8], start: usize) -> Result<(String, usize), DomainError> {
    let mut name = String::with_capacity(64);
    let mut offset = start;
    let mut hops = 0usize;
    let mut end_offset: Option<usize> = None;

    loop {
        let len_byte = *data
            .get(offset)
            .ok_or_else(|| malformed("name runs past end of message"))?;
        let len = len_byte as usize;

        if len == 0 {
            if end_offset.is_none() {
                end_offset = Some(offset + 1);
            }
            break;
        }

        if len_byte & 0xC0 == 0xC0 {
            let low = *data
                .get(offset + 1)
                .ok_or_else(|| malformed("truncated compression pointer"))?;
            let target = ((len & 0x3F) << 8) | low as usize;
            if target >= offset {
                return Err(malformed(format!(
                    "compression pointer at {} does not point backward (target {})",
                    offset, target
                )));
            }
            if end_offset.is_none() {
                end_offset = Some(offset + 2);
            }
            hops += 1;
            if hops > MAX_COMPRESSION_HOPS {
                return Err(malformed("compression pointer chain too long"));
            }
            offset = target;
            continue;
        }

        if len_byte & 0xC0 != 0 {
            return Err(malformed(format!("reserved label type 0x{:02X}", len_byte & 0xC0)));
        }

        if len > MAX_LABEL_LENGTH {
            return Err(malformed("label exceeds 63 bytes"));
        }

        let label = data
            .get(offset + 1..offset + 1 + len)
            .ok_or_else(|| malformed("label runs past end of message"))?;

        if !name.is_empty() {
            name.push('.');
        }
        for &b in label {
            if b.is_ascii() && b != b'.' {
                name.push(b as char);
            } else {
                name.push_str(&format!("\\{:03}", b));
            }
        }

        if name.len() > MAX_NAME_LENGTH {
            return Err(malformed("name exceeds 255 bytes"));
        }

        offset += 1 + len;
    }

    Ok((name, end_offset.unwrap_or(offset)))
}

/// Append a dotted name in uncompressed wire form.
pub fn encode_name(name: &str, buf: &mut Vec<u8>) -> Result<(), DomainError> {
    let name = name.trim_end_matches('.');
    if name.is_empty() {
        buf.push(0);
        return Ok(());
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidDomainName(format!(
            "name too long: '{}'",
            name
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(DomainError::InvalidDomainName(format!(
                "empty label in '{}'",
                name
            )));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(DomainError::InvalidDomainName(format!(
                "label too long in '{}'",
                name
            )));
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
    Ok(())
}

/// Append a name in DNSSEC canonical form: uncompressed and lowercased
/// (RFC 4034 §6.2).
pub fn encode_name_canonical(name: &str, buf: &mut Vec<u8>) -> Result<(), DomainError> {
    encode_name(&name.to_ascii_lowercase(), buf)
}
