use std::net::Ipv4Addr;

use log::debug;

use crate::checksum::checksum;
use crate::error::{Error, Result};
use crate::ipv4::{self, Ipv4Header};

pub const ECHO_REPLY: u8 = 0;
pub const ECHO_REQUEST: u8 = 8;

/// Type, code, checksum, identifier and sequence.
pub const HEADER_LEN: usize = 8;

/// Largest packet we build or answer.
pub const MAX_MTU: usize = 1500;

/// Payload size of a default request: 84 bytes on the wire.
pub const DEFAULT_DATA_LEN: usize = 56;

/// Smallest buffer that can hold an IPv4 header and an echo header.
pub const MIN_PACKET_LEN: usize = ipv4::HEADER_LEN + HEADER_LEN;

const REPLY_TTL: u8 = 255;

/// Echo request/reply accessors over an ICMP segment.
#[derive(Debug, Clone)]
pub struct EchoView<T> {
    buf: T,
}

impl<T: AsRef<[u8]>> EchoView<T> {
    pub fn new_checked(buf: T) -> Result<Self> {
        if buf.as_ref().len() < HEADER_LEN {
            return Err(Error::MalformedPacket("buffer shorter than an ICMP echo header"));
        }
        Ok(EchoView { buf })
    }

    pub fn kind(&self) -> u8 {
        self.buf.as_ref()[0]
    }

    pub fn code(&self) -> u8 {
        self.buf.as_ref()[1]
    }

    pub fn checksum(&self) -> u16 {
        let b = self.buf.as_ref();
        u16::from_be_bytes([b[2], b[3]])
    }

    pub fn ident(&self) -> u16 {
        let b = self.buf.as_ref();
        u16::from_be_bytes([b[4], b[5]])
    }

    pub fn seq(&self) -> u16 {
        let b = self.buf.as_ref();
        u16::from_be_bytes([b[6], b[7]])
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf.as_ref()[HEADER_LEN..]
    }

    pub fn is_valid(&self) -> bool {
        crate::checksum::verify(self.buf.as_ref())
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> EchoView<T> {
    /// Writes the echo header fields and the checksum over the whole segment.
    /// The payload must already be in place.
    fn write(&mut self, kind: u8, ident: u16, seq: u16) {
        let b = self.buf.as_mut();
        b[0] = kind;
        b[1] = 0;
        b[2..4].copy_from_slice(&[0, 0]);
        b[4..6].copy_from_slice(&ident.to_be_bytes());
        b[6..8].copy_from_slice(&seq.to_be_bytes());

        let csum = checksum(b);
        b[2..4].copy_from_slice(&csum.to_be_bytes());
    }
}

/// Builds a 84-byte echo request (type=8, code=0) with 56 zero data bytes.
pub fn build_request(src: Ipv4Addr, dst: Ipv4Addr, ident: u16, seq: u16) -> Vec<u8> {
    let mut pkt = vec![0u8; ipv4::HEADER_LEN + HEADER_LEN + DEFAULT_DATA_LEN];
    fill_request(&mut pkt, src, dst, ident, seq);
    pkt
}

/// Builds an echo request carrying `payload`.
pub fn build_request_with_payload(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    ident: u16,
    seq: u16,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let len = MIN_PACKET_LEN + payload.len();
    if len > MAX_MTU {
        return Err(Error::Oversized { len, max: MAX_MTU });
    }

    let mut pkt = vec![0u8; len];
    pkt[MIN_PACKET_LEN..].copy_from_slice(payload);
    fill_request(&mut pkt, src, dst, ident, seq);
    Ok(pkt)
}

// `pkt` is at most MAX_MTU bytes, so its length fits the total length field.
fn fill_request(pkt: &mut [u8], src: Ipv4Addr, dst: Ipv4Addr, ident: u16, seq: u16) {
    let total_len = pkt.len() as u16;
    let (ip, segment) = pkt.split_at_mut(ipv4::HEADER_LEN);

    let mut header = Ipv4Header::new_unchecked(ip);
    header.set_version_ihl(4, 5);
    header.set_tos(0);
    header.set_total_len(total_len);
    header.set_ident(0);
    header.set_frag_off(0);
    header.set_ttl(ipv4::DEFAULT_TTL);
    header.set_protocol(ipv4::PROTO_ICMP);
    header.set_src(src);
    header.set_dst(dst);
    header.fill_checksum();

    EchoView { buf: segment }.write(ECHO_REQUEST, ident, seq);
}

/// Builds the echo reply for `received`, which starts at its IPv4 header.
///
/// IP options are carried over with the rest of the header. Anything past the
/// total length (link-layer padding) is dropped.
pub fn build_reply(received: &[u8]) -> Result<Vec<u8>> {
    if received.len() < MIN_PACKET_LEN {
        return Err(Error::MalformedPacket("shorter than IPv4 + ICMP echo headers"));
    }

    let request = Ipv4Header::new_checked(received)?;
    let header_len = request.header_len();
    let total_len = request.total_len() as usize;
    if header_len + HEADER_LEN > received.len() {
        return Err(Error::MalformedPacket("no room for an ICMP header after IP options"));
    }
    if total_len < header_len + HEADER_LEN {
        return Err(Error::MalformedPacket("total length smaller than the headers"));
    }
    if total_len > received.len() {
        return Err(Error::MalformedPacket("total length exceeds received bytes"));
    }

    let echo = EchoView::new_checked(&received[header_len..total_len])?;

    let mut pkt = received[..total_len].to_vec();
    let (ip, segment) = pkt.split_at_mut(header_len);

    let mut header = Ipv4Header::new_unchecked(ip);
    header.set_frag_off(0);
    header.set_ttl(REPLY_TTL);
    header.set_protocol(ipv4::PROTO_ICMP);
    header.set_src(request.dst());
    header.set_dst(request.src());
    header.fill_checksum();

    // Payload is already in place from the copy.
    EchoView { buf: segment }.write(ECHO_REPLY, echo.ident(), echo.seq());

    debug!(
        "Built echo reply {} -> {} id={:#06x} seq={} ({} bytes)",
        request.dst(),
        request.src(),
        echo.ident(),
        echo.seq(),
        total_len
    );
    Ok(pkt)
}

/// True for an IPv4 packet carrying an ICMP echo request.
pub fn is_echo_request(packet: &[u8]) -> bool {
    let Ok(header) = Ipv4Header::new_checked(packet) else {
        return false;
    };
    header.protocol() == ipv4::PROTO_ICMP
        && header.payload().first() == Some(&ECHO_REQUEST)
}
