//! ICMP echo over a raw IPv4 socket, with the IP header built by hand.

pub mod args;
pub mod checksum;
pub mod error;
pub mod ethernet;
pub mod icmp;
pub mod ipv4;
pub mod server;
pub mod transport;

pub use checksum::checksum;
pub use error::{Error, Result};
pub use icmp::{build_reply, build_request, build_request_with_payload, is_echo_request};
