use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;

use rawping::args;
use rawping::icmp;
use rawping::transport::{PacketSink, RawIcmpSender};

/// Sends ICMP echo requests with a hand-built IP header. Replies are not
/// awaited; run `pingserver` (or tcpdump) on the other side to see them.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = args::parse_client()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let mut sender = RawIcmpSender::open()
        .context("Failed to create raw socket. CAP_NET_RAW (or root) is required.")?;

    println!(
        "PING {} from {} id={:#06x}: {} data bytes",
        args.dst,
        args.src,
        args.ident,
        icmp::DEFAULT_DATA_LEN
    );

    let mut seq = 1u16;
    let mut sent = 0u64;

    while running.load(Ordering::SeqCst) && sent < args.count {
        let pkt = icmp::build_request(args.src, args.dst, args.ident, seq);
        debug!("Request seq={} ({} bytes)", seq, pkt.len());

        let n = sender
            .send_packet(&pkt, args.dst)
            .with_context(|| format!("Failed to send echo request seq={}", seq))?;
        println!("Sent {} bytes to {}: icmp_seq={}", n, args.dst, seq);
        sent += 1;

        seq = seq.wrapping_add(1);
        if seq == 0 {
            seq = 1;
        }

        // No sleep after the last request.
        if sent < args.count && running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_secs(1));
        }
    }

    println!("\n--- {} ping statistics ---", args.dst);
    println!("{} packets transmitted", sent);

    Ok(())
}
