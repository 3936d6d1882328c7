//! DNS wire-format codec (RFC 1035).
//!
//! Decoding accepts compressed names but only follows pointers that target
//! a strictly earlier offset, so decompression always terminates. Encoding
//! never emits compression pointers; a round trip reproduces an equivalent
//! message, not identical bytes.

mod decoder;
mod encoder;
mod name;

pub use decoder::decode_message;
pub use encoder::{encode_message, encode_query, encode_record_canonical, encode_response_limited};
pub use name::{encode_name, encode_name_canonical, parse_name};

/// Classic DNS UDP payload bound; larger replies are truncated with TC set.
pub const MAX_UDP_PAYLOAD: usize = 512;

/// Upper bound on a DNS message carried over TCP (2-byte length prefix).
pub const MAX_TCP_MESSAGE_SIZE: usize = 65_535;

/// Fixed DNS header size.
pub const HEADER_LEN: usize = 12;
pub(crate) const MAX_LABEL_LENGTH: usize = 63;
pub(crate) const MAX_NAME_LENGTH: usize = 255;
pub(crate) const MAX_COMPRESSION_HOPS: usize = 32;
