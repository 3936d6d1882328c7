use super::crypto::key_tag;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cinder_dns_domain::{DnskeyData, DomainError};

/// A trusted DNSKEY for one zone.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    pub zone: String,
    pub dnskey: DnskeyData,
}

impl TrustAnchor {
    pub fn new(zone: &str, dnskey: DnskeyData) -> Self {
        Self {
            zone: normalize_zone(zone),
            dnskey,
        }
    }
}

/// Zone → trusted keys. Anchors are configuration: the built-in root
/// anchor can be replaced from config or injected for tests.
#[derive(Debug, Clone)]
pub struct TrustAnchorStore {
    anchors: Vec<TrustAnchor>,
}

impl TrustAnchorStore {
    pub fn new() -> Self {
        Self {
            anchors: vec![TrustAnchor::new(".", root_ksk_20326())],
        }
    }

    pub fn empty() -> Self {
        Self { anchors: vec![] }
    }

    /// Root anchor replaced with a config-supplied base64 RSA/SHA-256 key.
    pub fn with_root_key_b64(key_b64: &str) -> Result<Self, DomainError> {
        let public_key = STANDARD.decode(key_b64.trim()).map_err(|e| {
            DomainError::ConfigError(format!("Invalid trust anchor base64: {}", e))
        })?;
        Ok(Self {
            anchors: vec![TrustAnchor::new(
                ".",
                DnskeyData {
                    flags: 257,
                    protocol: 3,
                    algorithm: 8,
                    public_key,
                },
            )],
        })
    }

    pub fn add_anchor(&mut self, anchor: TrustAnchor) {
        self.anchors.push(anchor);
    }

    pub fn keys_for_zone(&self, zone: &str) -> Vec<&DnskeyData> {
        let zone = normalize_zone(zone);
        self.anchors
            .iter()
            .filter(|anchor| anchor.zone == zone)
            .map(|anchor| &anchor.dnskey)
            .collect()
    }
}

impl Default for TrustAnchorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_zone(zone: &str) -> String {
    let trimmed = zone.trim_end_matches('.').to_ascii_lowercase();
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed
    }
}

/// Root KSK-2017 (key tag 20326), in service since the 2018 rollover.
fn root_ksk_20326() -> DnskeyData {
    let public_key_b64 = concat!(
        "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3",
        "+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kv",
        "ArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF",
        "0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+e",
        "oZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfd",
        "RUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwN",
        "R1AkUTV74bU="
    );

    let public_key = STANDARD
        .decode(public_key_b64)
        .expect("built-in root KSK is valid base64");

    DnskeyData {
        flags: 257,
        protocol: 3,
        algorithm: 8,
        public_key,
    }
}
