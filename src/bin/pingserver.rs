use anyhow::Result;

/// Answers every ICMP echo request seen on any interface with a hand-built
/// echo reply. Linux only: capture uses an `AF_PACKET` socket.
#[cfg(target_os = "linux")]
fn main() -> Result<()> {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use anyhow::Context;
    use log::info;

    use rawping::args;
    use rawping::server::Responder;
    use rawping::transport::{LinkReceiver, RawIcmpSender};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = args::parse_server()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    // The read timeout only lets the loop notice Ctrl+C.
    let receiver = LinkReceiver::open(Duration::from_secs(1))
        .context("Failed to create packet socket. CAP_NET_RAW (or root) is required.")?;
    let sender = RawIcmpSender::open()
        .context("Failed to create raw socket. CAP_NET_RAW (or root) is required.")?;

    info!("Listening for ICMP echo requests");
    let mut responder = Responder::new(receiver, sender);
    let replied = responder
        .run(&running, args.count)
        .context("Responder stopped")?;

    println!("\n{} echo replies sent", replied);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() -> Result<()> {
    anyhow::bail!("pingserver needs AF_PACKET sockets and only runs on Linux")
}
