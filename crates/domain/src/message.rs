use crate::record::{RData, ResourceRecord};
use crate::record_type::{RClass, RecordType};
use std::fmt;

/// DNS opcode (header bits 1..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Query,
    Status,
    Notify,
    Update,
    Unknown(u8),
}

impl Opcode {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Query => 0,
            Self::Status => 2,
            Self::Notify => 4,
            Self::Update => 5,
            Self::Unknown(v) => v & 0x0F,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value & 0x0F {
            0 => Self::Query,
            2 => Self::Status,
            4 => Self::Notify,
            5 => Self::Update,
            other => Self::Unknown(other),
        }
    }
}

/// DNS response code (header bits 12..16).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Unknown(u8),
}

impl Rcode {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoError => 0,
            Self::FormErr => 1,
            Self::ServFail => 2,
            Self::NxDomain => 3,
            Self::NotImp => 4,
            Self::Refused => 5,
            Self::Unknown(v) => v & 0x0F,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value & 0x0F {
            0 => Self::NoError,
            1 => Self::FormErr,
            2 => Self::ServFail,
            3 => Self::NxDomain,
            4 => Self::NotImp,
            5 => Self::Refused,
            other => Self::Unknown(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NxDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded DNS header. Section counts are derived from the message
/// sections at encode time rather than stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub response: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub rcode: Rcode,
}

impl Header {
    pub fn query(id: u16) -> Self {
        Self {
            id,
            response: false,
            opcode: Opcode::Query,
            authoritative: false,
            truncated: false,
            recursion_desired: true,
            recursion_available: false,
            rcode: Rcode::NoError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub rtype: RecordType,
    pub class: RClass,
}

impl Question {
    pub fn new(name: impl Into<String>, rtype: RecordType) -> Self {
        Self {
            name: name.into(),
            rtype,
            class: RClass::IN,
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.class, self.rtype)
    }
}

/// A complete DNS message: header plus the four sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    /// A recursive query with a single question.
    pub fn query(id: u16, name: impl Into<String>, rtype: RecordType) -> Self {
        Self {
            header: Header::query(id),
            questions: vec![Question::new(name, rtype)],
            answers: vec![],
            authorities: vec![],
            additionals: vec![],
        }
    }

    /// An empty response echoing the request id, question, opcode, and RD bit.
    pub fn response_to(request: &Message, rcode: Rcode) -> Self {
        Self {
            header: Header {
                id: request.header.id,
                response: true,
                opcode: request.header.opcode,
                authoritative: false,
                truncated: false,
                recursion_desired: request.header.recursion_desired,
                recursion_available: true,
                rcode,
            },
            questions: request.questions.clone(),
            answers: vec![],
            authorities: vec![],
            additionals: vec![],
        }
    }

    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    pub fn is_nxdomain(&self) -> bool {
        self.header.rcode == Rcode::NxDomain
    }

    /// NOERROR with an empty answer section.
    pub fn is_nodata(&self) -> bool {
        self.header.rcode == Rcode::NoError && self.answers.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.is_nxdomain() || self.is_nodata()
    }

    pub fn is_server_error(&self) -> bool {
        matches!(
            self.header.rcode,
            Rcode::ServFail | Rcode::Refused | Rcode::NotImp
        )
    }

    /// Minimum TTL across the answer section.
    pub fn min_answer_ttl(&self) -> Option<u32> {
        self.answers.iter().map(|r| r.ttl).min()
    }

    /// The SOA minimum from the authority section, capped by the SOA
    /// record's own TTL (RFC 2308 negative-cache TTL).
    pub fn soa_negative_ttl(&self) -> Option<u32> {
        self.authorities.iter().find_map(|r| {
            if let RData::SOA(soa) = &r.rdata {
                Some(soa.minimum.min(r.ttl))
            } else {
                None
            }
        })
    }
}
