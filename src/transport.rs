// Raw socket plumbing. Everything here needs CAP_NET_RAW (or root).
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
#[cfg(target_os = "linux")]
use std::{io::Read, time::Duration};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

/// Accepts complete IPv4 packets (header included) for transmission.
pub trait PacketSink {
    fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize>;
}

/// Delivers received frames, link-layer header included.
pub trait PacketSource {
    fn recv_frame(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Raw IPv4/ICMP socket with `IP_HDRINCL` set: the caller provides the IP header.
pub struct RawIcmpSender {
    sock: Socket,
}

impl RawIcmpSender {
    pub fn open() -> io::Result<Self> {
        let sock = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        sock.set_header_included_v4(true)?;
        Ok(RawIcmpSender { sock })
    }
}

impl PacketSink for RawIcmpSender {
    fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
        // Port is ignored for raw sockets.
        let addr = SockAddr::from(SocketAddrV4::new(dst, 0));
        let sent = self.sock.send_to(packet, &addr)?;
        if sent != packet.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", sent, packet.len()),
            ));
        }
        Ok(sent)
    }
}

/// `AF_PACKET` socket receiving every frame on every interface (`ETH_P_ALL`).
///
/// Reads time out after `poll`, surfacing as `WouldBlock`/`TimedOut`, so a
/// caller can check for shutdown between packets.
#[cfg(target_os = "linux")]
pub struct LinkReceiver {
    sock: Socket,
}

#[cfg(target_os = "linux")]
impl LinkReceiver {
    pub fn open(poll: Duration) -> io::Result<Self> {
        let proto = Protocol::from((libc::ETH_P_ALL as u16).to_be() as i32);
        let sock = Socket::new(Domain::PACKET, Type::RAW, Some(proto))?;
        sock.set_read_timeout(Some(poll))?;
        Ok(LinkReceiver { sock })
    }
}

#[cfg(target_os = "linux")]
impl PacketSource for LinkReceiver {
    fn recv_frame(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.sock.read(buf)
    }
}

/// True for the errors a read timeout produces.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
