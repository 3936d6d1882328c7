use crate::record_type::{RClass, RecordType};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// SOA rdata. `minimum` doubles as the negative-cache TTL (RFC 2308).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaData {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// RRSIG rdata (RFC 4034 §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RrsigData {
    pub type_covered: RecordType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

/// DNSKEY rdata (RFC 4034 §2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnskeyData {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl DnskeyData {
    /// Secure Entry Point flag: a key signing key.
    pub fn is_ksk(&self) -> bool {
        self.flags & 0x0001 != 0
    }

    pub fn is_zone_key(&self) -> bool {
        self.flags & 0x0100 != 0
    }
}

/// Validation verdict attached to a resolved answer.
///
/// `Bogus` never reaches a client as a positive answer; the resolver
/// converts it to SERVFAIL before responding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DnssecStatus {
    /// Validation disabled or not attempted.
    #[default]
    Unknown,
    /// Signatures present and verified against the trust anchor chain.
    Secure,
    /// Zone is unsigned; nothing to verify.
    Insecure,
    /// Signatures present but verification failed.
    Bogus,
}

impl DnssecStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Secure => "secure",
            Self::Insecure => "insecure",
            Self::Bogus => "bogus",
        }
    }
}

impl fmt::Display for DnssecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DS rdata (RFC 4034 §5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsData {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

/// Type-specific record payload. Types the resolver does not model keep
/// their raw bytes so they re-encode unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    CNAME(String),
    NS(String),
    PTR(String),
    MX { preference: u16, exchange: String },
    TXT(Vec<Vec<u8>>),
    SOA(SoaData),
    RRSIG(RrsigData),
    DNSKEY(DnskeyData),
    DS(DsData),
    Unknown { rtype: u16, data: Vec<u8> },
}

impl RData {
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::A(_) => RecordType::A,
            Self::AAAA(_) => RecordType::AAAA,
            Self::CNAME(_) => RecordType::CNAME,
            Self::NS(_) => RecordType::NS,
            Self::PTR(_) => RecordType::PTR,
            Self::MX { .. } => RecordType::MX,
            Self::TXT(_) => RecordType::TXT,
            Self::SOA(_) => RecordType::SOA,
            Self::RRSIG(_) => RecordType::RRSIG,
            Self::DNSKEY(_) => RecordType::DNSKEY,
            Self::DS(_) => RecordType::DS,
            Self::Unknown { rtype, .. } => RecordType::from_u16(*rtype),
        }
    }
}

/// A single resource record from any message section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: RecordType,
    pub class: RClass,
    pub ttl: u32,
    pub rdata: RData,
}

impl ResourceRecord {
    pub fn new(name: impl Into<String>, ttl: u32, rdata: RData) -> Self {
        let rtype = rdata.record_type();
        Self {
            name: name.into(),
            rtype,
            class: RClass::IN,
            ttl,
            rdata,
        }
    }

    /// Copy with a different TTL. Cache reads use this to serve the
    /// remaining rather than the original TTL.
    pub fn with_ttl(&self, ttl: u32) -> Self {
        let mut copy = self.clone();
        copy.ttl = ttl;
        copy
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.name, self.ttl, self.class, self.rtype)
    }
}
