use cinder_dns_domain::{DnskeyData, DomainError, DsData};
use ring::digest;
use ring::signature;

/// RFC 4034 appendix B key tag: ones-complement-ish checksum over the
/// DNSKEY rdata wire form.
pub fn key_tag(dnskey: &DnskeyData) -> u16 {
    let mut wire = Vec::with_capacity(4 + dnskey.public_key.len());
    wire.extend_from_slice(&dnskey.flags.to_be_bytes());
    wire.push(dnskey.protocol);
    wire.push(dnskey.algorithm);
    wire.extend_from_slice(&dnskey.public_key);

    let mut accumulator: u32 = 0;
    for chunk in wire.chunks(2) {
        if chunk.len() == 2 {
            accumulator += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
        } else {
            accumulator += u32::from(chunk[0]) << 8;
        }
    }
    accumulator += accumulator >> 16;
    (accumulator & 0xFFFF) as u16
}

/// ring-backed verification for the DNSSEC algorithms in current use.
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Verify `sig` over `data` with `dnskey`. `Ok(false)` is a bad
    /// signature; `Err` means the key or algorithm is unusable.
    pub fn verify(
        &self,
        algorithm: u8,
        data: &[u8],
        sig: &[u8],
        dnskey: &DnskeyData,
    ) -> Result<bool, DomainError> {
        match algorithm {
            8 => self.verify_rsa(&signature::RSA_PKCS1_2048_8192_SHA256, data, sig, dnskey),
            10 => self.verify_rsa(&signature::RSA_PKCS1_2048_8192_SHA512, data, sig, dnskey),
            13 => self.verify_ecdsa(
                &signature::ECDSA_P256_SHA256_FIXED,
                64,
                data,
                sig,
                dnskey,
            ),
            14 => self.verify_ecdsa(
                &signature::ECDSA_P384_SHA384_FIXED,
                96,
                data,
                sig,
                dnskey,
            ),
            15 => self.verify_ed25519(data, sig, dnskey),
            other => Err(DomainError::ValidationBogus(format!(
                "Unsupported DNSSEC algorithm {}",
                other
            ))),
        }
    }

    /// Check a DS digest against a DNSKEY (RFC 4034 §5.1.4).
    pub fn verify_ds(
        &self,
        ds: &DsData,
        dnskey: &DnskeyData,
        owner_name: &str,
    ) -> Result<bool, DomainError> {
        if key_tag(dnskey) != ds.key_tag || dnskey.algorithm != ds.algorithm {
            return Ok(false);
        }

        let mut data = Vec::new();
        cinder_dns_domain::wire::encode_name_canonical(owner_name, &mut data)?;
        data.extend_from_slice(&dnskey.flags.to_be_bytes());
        data.push(dnskey.protocol);
        data.push(dnskey.algorithm);
        data.extend_from_slice(&dnskey.public_key);

        let computed = match ds.digest_type {
            2 => digest::digest(&digest::SHA256, &data).as_ref().to_vec(),
            4 => digest::digest(&digest::SHA384, &data).as_ref().to_vec(),
            other => {
                return Err(DomainError::ValidationBogus(format!(
                    "Unsupported DS digest type {}",
                    other
                )))
            }
        };

        Ok(computed == ds.digest)
    }

    fn verify_rsa(
        &self,
        params: &'static signature::RsaParameters,
        data: &[u8],
        sig: &[u8],
        dnskey: &DnskeyData,
    ) -> Result<bool, DomainError> {
        let (exponent, modulus) = parse_rsa_key(&dnskey.public_key)?;
        let public_key = signature::RsaPublicKeyComponents {
            n: &modulus,
            e: &exponent,
        };
        Ok(public_key.verify(params, data, sig).is_ok())
    }

    fn verify_ecdsa(
        &self,
        params: &'static signature::EcdsaVerificationAlgorithm,
        key_len: usize,
        data: &[u8],
        sig: &[u8],
        dnskey: &DnskeyData,
    ) -> Result<bool, DomainError> {
        if dnskey.public_key.len() != key_len {
            return Err(DomainError::ValidationBogus(format!(
                "ECDSA public key length {} (expected {})",
                dnskey.public_key.len(),
                key_len
            )));
        }
        if sig.len() != key_len {
            return Ok(false);
        }

        // DNSKEY stores the raw point; ring wants the uncompressed form.
        let mut point = Vec::with_capacity(key_len + 1);
        point.push(0x04);
        point.extend_from_slice(&dnskey.public_key);

        let public_key = signature::UnparsedPublicKey::new(params, &point);
        Ok(public_key.verify(data, sig).is_ok())
    }

    fn verify_ed25519(
        &self,
        data: &[u8],
        sig: &[u8],
        dnskey: &DnskeyData,
    ) -> Result<bool, DomainError> {
        if dnskey.public_key.len() != 32 {
            return Err(DomainError::ValidationBogus(
                "Ed25519 public key must be 32 bytes".to_string(),
            ));
        }
        if sig.len() != 64 {
            return Ok(false);
        }
        let public_key = signature::UnparsedPublicKey::new(&signature::ED25519, &dnskey.public_key);
        Ok(public_key.verify(data, sig).is_ok())
    }
}

/// RFC 3110 wire form: exponent length (1 or 3 bytes), exponent, modulus.
fn parse_rsa_key(key_data: &[u8]) -> Result<(Vec<u8>, Vec<u8>), DomainError> {
    if key_data.is_empty() {
        return Err(DomainError::ValidationBogus(
            "Empty RSA public key".to_string(),
        ));
    }

    let (exp_len, exp_start) = if key_data[0] == 0 {
        if key_data.len() < 3 {
            return Err(DomainError::ValidationBogus(
                "RSA key too short for long-form exponent".to_string(),
            ));
        }
        (
            u16::from_be_bytes([key_data[1], key_data[2]]) as usize,
            3usize,
        )
    } else {
        (key_data[0] as usize, 1usize)
    };

    let exp_end = exp_start + exp_len;
    if exp_end >= key_data.len() {
        return Err(DomainError::ValidationBogus(
            "RSA exponent extends past key data".to_string(),
        ));
    }

    Ok((
        key_data[exp_start..exp_end].to_vec(),
        key_data[exp_end..].to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dnskey(algorithm: u8, public_key: Vec<u8>) -> DnskeyData {
        DnskeyData {
            flags: 256,
            protocol: 3,
            algorithm,
            public_key,
        }
    }

    #[test]
    fn key_tag_is_stable_for_same_key() {
        let key = dnskey(13, vec![0xAB; 64]);
        assert_eq!(key_tag(&key), key_tag(&key.clone()));
    }

    #[test]
    fn key_tag_differs_for_different_keys() {
        let a = dnskey(13, vec![0xAB; 64]);
        let b = dnskey(13, vec![0xAC; 64]);
        assert_ne!(key_tag(&a), key_tag(&b));
    }

    #[test]
    fn garbage_ed25519_signature_is_rejected_not_an_error() {
        let verifier = SignatureVerifier;
        let key = dnskey(15, vec![0u8; 32]);
        let verdict = verifier.verify(15, b"signed data", &[0u8; 64], &key).unwrap();
        assert!(!verdict);
    }

    #[test]
    fn unsupported_algorithm_is_an_error() {
        let verifier = SignatureVerifier;
        let key = dnskey(1, vec![0u8; 32]);
        assert!(verifier.verify(1, b"data", &[0u8; 64], &key).is_err());
    }

    #[test]
    fn short_form_rsa_exponent_parses() {
        // 1-byte length, 3-byte exponent 65537, 4-byte modulus.
        let key = [3u8, 1, 0, 1, 0xDE, 0xAD, 0xBE, 0xEF];
        let (exponent, modulus) = parse_rsa_key(&key).unwrap();
        assert_eq!(exponent, vec![1, 0, 1]);
        assert_eq!(modulus, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn truncated_rsa_key_is_rejected() {
        assert!(parse_rsa_key(&[200u8, 1, 0]).is_err());
    }

    #[test]
    fn ds_digest_mismatch_returns_false() {
        let verifier = SignatureVerifier;
        let key = dnskey(13, vec![0xAB; 64]);
        let ds = DsData {
            key_tag: key_tag(&key),
            algorithm: 13,
            digest_type: 2,
            digest: vec![0u8; 32],
        };
        assert!(!verifier.verify_ds(&ds, &key, "example.com").unwrap());
    }
}
