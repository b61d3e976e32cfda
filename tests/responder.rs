use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::sync::atomic::AtomicBool;

use rawping::checksum::verify;
use rawping::icmp::{self, EchoView};
use rawping::ipv4::Ipv4Header;
use rawping::server::{Outcome, Responder};
use rawping::transport::{PacketSink, PacketSource};
use rawping::Error;

const CLIENT: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
const SERVER: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);

enum Event {
    Frame(Vec<u8>),
    Timeout,
    Fail,
}

struct ScriptedSource {
    events: VecDeque<Event>,
}

impl ScriptedSource {
    fn new(events: Vec<Event>) -> Self {
        ScriptedSource { events: events.into() }
    }
}

impl PacketSource for ScriptedSource {
    fn recv_frame(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.events.pop_front() {
            Some(Event::Frame(frame)) => {
                buf[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            Some(Event::Timeout) | None => Err(io::Error::from(io::ErrorKind::WouldBlock)),
            Some(Event::Fail) => Err(io::Error::from(io::ErrorKind::PermissionDenied)),
        }
    }
}

#[derive(Default)]
struct CollectingSink {
    sent: Vec<(Vec<u8>, Ipv4Addr)>,
}

impl PacketSink for CollectingSink {
    fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
        self.sent.push((packet.to_vec(), dst));
        Ok(packet.len())
    }
}

fn ethernet(ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; 12];
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn request_frame(seq: u16) -> Vec<u8> {
    ethernet(0x0800, &icmp::build_request(CLIENT, SERVER, 0x0C5B, seq))
}

#[test]
fn replies_to_echo_request() {
    let source = ScriptedSource::new(vec![Event::Frame(request_frame(7))]);
    let mut responder = Responder::new(source, CollectingSink::default());
    let mut buf = [0u8; 1514];

    let outcome = responder.respond_once(&mut buf).unwrap();
    assert_eq!(
        outcome,
        Outcome::Replied { dst: CLIENT, ident: 0x0C5B, seq: 7, len: 84 }
    );

    let (_, sink) = responder.into_parts();
    assert_eq!(sink.sent.len(), 1);
    let (reply, dst) = &sink.sent[0];
    assert_eq!(*dst, CLIENT);

    let header = Ipv4Header::new_checked(&reply[..]).unwrap();
    assert_eq!(header.src(), SERVER);
    assert_eq!(header.dst(), CLIENT);
    assert!(verify(header.header_bytes()));
    let echo = EchoView::new_checked(header.payload()).unwrap();
    assert_eq!(echo.kind(), icmp::ECHO_REPLY);
    assert!(echo.is_valid());
}

#[test]
fn ignores_everything_but_requests() {
    let request = icmp::build_request(CLIENT, SERVER, 1, 1);
    let reply = icmp::build_reply(&request).unwrap();
    let mut truncated = request.clone();
    truncated[2..4].copy_from_slice(&200u16.to_be_bytes());

    let source = ScriptedSource::new(vec![
        Event::Frame(ethernet(0x0806, &[0u8; 28])),
        Event::Frame(ethernet(0x0800, &reply)),
        Event::Frame(ethernet(0x0800, &truncated)),
        Event::Frame(vec![0u8; 6]),
        Event::Timeout,
    ]);
    let mut responder = Responder::new(source, CollectingSink::default());
    let mut buf = [0u8; 1514];

    for _ in 0..4 {
        assert_eq!(responder.respond_once(&mut buf).unwrap(), Outcome::Ignored);
    }
    assert_eq!(responder.respond_once(&mut buf).unwrap(), Outcome::Idle);

    let (_, sink) = responder.into_parts();
    assert!(sink.sent.is_empty());
}

#[test]
fn run_stops_at_limit_in_arrival_order() {
    let source = ScriptedSource::new(vec![
        Event::Frame(request_frame(1)),
        Event::Timeout,
        Event::Frame(request_frame(2)),
        Event::Frame(request_frame(3)),
        Event::Frame(request_frame(4)),
    ]);
    let mut responder = Responder::new(source, CollectingSink::default());
    let running = AtomicBool::new(true);

    let replied = responder.run(&running, Some(3)).unwrap();
    assert_eq!(replied, 3);

    let (mut source, sink) = responder.into_parts();
    let seqs: Vec<u16> = sink
        .sent
        .iter()
        .map(|(pkt, _)| EchoView::new_checked(&pkt[20..]).unwrap().seq())
        .collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    // Fourth request is still queued.
    assert!(matches!(source.events.pop_front(), Some(Event::Frame(_))));
}

#[test]
fn run_returns_when_flag_cleared() {
    let source = ScriptedSource::new(vec![Event::Frame(request_frame(1))]);
    let mut responder = Responder::new(source, CollectingSink::default());
    let running = AtomicBool::new(false);

    assert_eq!(responder.run(&running, None).unwrap(), 0);
}

#[test]
fn receive_errors_propagate() {
    let source = ScriptedSource::new(vec![Event::Frame(request_frame(1)), Event::Fail]);
    let mut responder = Responder::new(source, CollectingSink::default());
    let running = AtomicBool::new(true);

    let err = responder.run(&running, None).unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::PermissionDenied));
}
