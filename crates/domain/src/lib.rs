//! cinder-dns domain layer: DNS message model, wire codec, configuration.
pub mod config;
pub mod errors;
pub mod message;
pub mod record;
pub mod record_type;
pub mod wire;

pub use config::{CliOverrides, Config, ConfigError, DohMethod};
pub use errors::DomainError;
pub use message::{Header, Message, Opcode, Question, Rcode};
pub use record::{DnskeyData, DnssecStatus, DsData, RData, ResourceRecord, RrsigData, SoaData};
pub use record_type::{RClass, RecordType};
