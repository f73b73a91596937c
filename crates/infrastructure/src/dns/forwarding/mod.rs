pub mod forwarder;
pub mod message_builder;
pub mod record_codec;
pub mod record_type_map;
pub mod response_parser;

pub use forwarder::DnsForwarder;
pub use message_builder::MessageBuilder;
pub use record_codec::RecordCodec;
pub use record_type_map::RecordTypeMapper;
pub use response_parser::{ResponseParser, UpstreamReply};
