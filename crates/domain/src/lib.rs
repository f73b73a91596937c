//! DNS Relay Domain Layer
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod dns_request;
pub mod dns_response;
pub mod errors;

pub use config::{CliOverrides, Config, ConfigError};
pub use dns_query::DnsQuery;
pub use dns_record::{DnsRecord, RecordData, RecordType};
pub use dns_request::DnsRequest;
pub use dns_response::{DnsResponse, ResponseCode};
pub use errors::DomainError;
