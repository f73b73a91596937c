pub mod forwarding;
pub mod listener;
pub mod server;
pub mod wire_response;

pub use forwarding::DnsForwarder;
pub use listener::{DnsListener, ListenerConfig, ListenerHandle};
pub use server::DnsServerHandler;
