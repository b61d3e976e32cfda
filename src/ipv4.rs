use std::net::Ipv4Addr;

use crate::checksum::checksum;
use crate::error::{Error, Result};

/// Length of a header without options.
pub const HEADER_LEN: usize = 20;
pub const DEFAULT_TTL: u8 = 64;
pub const PROTO_ICMP: u8 = 1;

mod field {
    use std::ops::Range;

    pub const VER_IHL: usize = 0;
    pub const TOS: usize = 1;
    pub const TOTAL_LEN: Range<usize> = 2..4;
    pub const IDENT: Range<usize> = 4..6;
    pub const FRAG_OFF: Range<usize> = 6..8;
    pub const TTL: usize = 8;
    pub const PROTO: usize = 9;
    pub const CHECKSUM: Range<usize> = 10..12;
    pub const SRC: Range<usize> = 12..16;
    pub const DST: Range<usize> = 16..20;
}

/// IPv4 header accessors over a byte buffer.
///
/// Fields are read and written at fixed offsets in network byte order. The
/// buffer may extend past the header; `payload` gives whatever follows it.
#[derive(Debug, Clone)]
pub struct Ipv4Header<T> {
    buf: T,
}

impl<T: AsRef<[u8]>> Ipv4Header<T> {
    /// Wraps `buf` without validation. Accessors panic if it is shorter than
    /// `HEADER_LEN`.
    pub fn new_unchecked(buf: T) -> Self {
        Ipv4Header { buf }
    }

    /// Wraps `buf` after checking that the header it describes fits in it.
    pub fn new_checked(buf: T) -> Result<Self> {
        let header = Self::new_unchecked(buf);
        header.check_len()?;
        Ok(header)
    }

    fn check_len(&self) -> Result<()> {
        let len = self.buf.as_ref().len();
        if len < HEADER_LEN {
            return Err(Error::MalformedPacket("buffer shorter than an IPv4 header"));
        }
        if self.version() != 4 {
            return Err(Error::MalformedPacket("IP version is not 4"));
        }
        if self.ihl() < 5 {
            return Err(Error::MalformedPacket("IPv4 header length below 5 words"));
        }
        if self.header_len() > len {
            return Err(Error::MalformedPacket("IPv4 header length exceeds buffer"));
        }
        Ok(())
    }

    pub fn into_inner(self) -> T {
        self.buf
    }

    pub fn version(&self) -> u8 {
        self.buf.as_ref()[field::VER_IHL] >> 4
    }

    pub fn ihl(&self) -> u8 {
        self.buf.as_ref()[field::VER_IHL] & 0x0F
    }

    pub fn header_len(&self) -> usize {
        (self.ihl() as usize) * 4
    }

    pub fn tos(&self) -> u8 {
        self.buf.as_ref()[field::TOS]
    }

    pub fn total_len(&self) -> u16 {
        self.read_u16(field::TOTAL_LEN.start)
    }

    pub fn ident(&self) -> u16 {
        self.read_u16(field::IDENT.start)
    }

    pub fn frag_off(&self) -> u16 {
        self.read_u16(field::FRAG_OFF.start)
    }

    pub fn ttl(&self) -> u8 {
        self.buf.as_ref()[field::TTL]
    }

    pub fn protocol(&self) -> u8 {
        self.buf.as_ref()[field::PROTO]
    }

    pub fn checksum(&self) -> u16 {
        self.read_u16(field::CHECKSUM.start)
    }

    pub fn src(&self) -> Ipv4Addr {
        let b = &self.buf.as_ref()[field::SRC];
        Ipv4Addr::new(b[0], b[1], b[2], b[3])
    }

    pub fn dst(&self) -> Ipv4Addr {
        let b = &self.buf.as_ref()[field::DST];
        Ipv4Addr::new(b[0], b[1], b[2], b[3])
    }

    /// The header bytes, options included.
    pub fn header_bytes(&self) -> &[u8] {
        &self.buf.as_ref()[..self.header_len()]
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf.as_ref()[self.header_len()..]
    }

    /// Whether the stored header checksum is correct.
    pub fn is_valid(&self) -> bool {
        crate::checksum::verify(self.header_bytes())
    }

    fn read_u16(&self, at: usize) -> u16 {
        let b = self.buf.as_ref();
        u16::from_be_bytes([b[at], b[at + 1]])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Ipv4Header<T> {
    pub fn set_version_ihl(&mut self, version: u8, ihl: u8) {
        self.buf.as_mut()[field::VER_IHL] = (version << 4) | (ihl & 0x0F);
    }

    pub fn set_tos(&mut self, tos: u8) {
        self.buf.as_mut()[field::TOS] = tos;
    }

    pub fn set_total_len(&mut self, len: u16) {
        self.buf.as_mut()[field::TOTAL_LEN].copy_from_slice(&len.to_be_bytes());
    }

    pub fn set_ident(&mut self, ident: u16) {
        self.buf.as_mut()[field::IDENT].copy_from_slice(&ident.to_be_bytes());
    }

    pub fn set_frag_off(&mut self, frag_off: u16) {
        self.buf.as_mut()[field::FRAG_OFF].copy_from_slice(&frag_off.to_be_bytes());
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.buf.as_mut()[field::TTL] = ttl;
    }

    pub fn set_protocol(&mut self, proto: u8) {
        self.buf.as_mut()[field::PROTO] = proto;
    }

    pub fn set_checksum(&mut self, csum: u16) {
        self.buf.as_mut()[field::CHECKSUM].copy_from_slice(&csum.to_be_bytes());
    }

    pub fn set_src(&mut self, addr: Ipv4Addr) {
        self.buf.as_mut()[field::SRC].copy_from_slice(&addr.octets());
    }

    pub fn set_dst(&mut self, addr: Ipv4Addr) {
        self.buf.as_mut()[field::DST].copy_from_slice(&addr.octets());
    }

    /// Zeroes the checksum field, sums the header and writes the result back.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let csum = checksum(self.header_bytes());
        self.set_checksum(csum);
    }
}
