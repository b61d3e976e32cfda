use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ethernet::strip_ethernet;
use crate::icmp::{self, EchoView, MAX_MTU};
use crate::ipv4::Ipv4Header;
use crate::transport::{self, PacketSink, PacketSource};

/// Result of handling one received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Replied { dst: Ipv4Addr, ident: u16, seq: u16, len: usize },
    Ignored,
    /// The receive timed out before a frame arrived.
    Idle,
}

/// Answers ICMP echo requests seen on `source` with replies sent through `sink`.
pub struct Responder<S, K> {
    source: S,
    sink: K,
}

impl<S: PacketSource, K: PacketSink> Responder<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Responder { source, sink }
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Receives one frame into `buf` and replies to it if it is an echo request.
    pub fn respond_once(&mut self, buf: &mut [u8]) -> Result<Outcome> {
        let n = match self.source.recv_frame(buf) {
            Ok(n) => n,
            Err(e) if transport::is_timeout(&e) => return Ok(Outcome::Idle),
            Err(e) => return Err(Error::Io(e)),
        };

        let Some(packet) = strip_ethernet(&buf[..n]) else {
            return Ok(Outcome::Ignored);
        };
        if !icmp::is_echo_request(packet) {
            return Ok(Outcome::Ignored);
        }

        let reply = match icmp::build_reply(packet) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Dropping echo request: {}", e);
                return Ok(Outcome::Ignored);
            }
        };

        let header = Ipv4Header::new_unchecked(&reply[..]);
        let dst = header.dst();
        let echo = EchoView::new_checked(header.payload())?;
        let (ident, seq) = (echo.ident(), echo.seq());
        debug!("Echo request from {} id={:#06x} seq={}", dst, ident, seq);

        self.sink.send_packet(&reply, dst)?;
        info!("Echo reply to {} id={:#06x} seq={} ({} bytes)", dst, ident, seq, reply.len());

        Ok(Outcome::Replied { dst, ident, seq, len: reply.len() })
    }

    /// Handles frames in arrival order until `running` is cleared or `limit`
    /// replies have been sent. Returns the number of replies sent.
    pub fn run(&mut self, running: &AtomicBool, limit: Option<u64>) -> Result<u64> {
        let mut buf = [0u8; MAX_MTU + crate::ethernet::HEADER_LEN];
        let mut replied = 0u64;

        while running.load(Ordering::SeqCst) {
            if let Some(limit) = limit {
                if replied >= limit {
                    break;
                }
            }
            if let Outcome::Replied { .. } = self.respond_once(&mut buf)? {
                replied += 1;
            }
        }
        Ok(replied)
    }
}
