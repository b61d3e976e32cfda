use anyhow::{Context, Result};
use std::net::Ipv4Addr;

/// Identifier used when `-i` is not given.
pub const DEFAULT_IDENT: u16 = 0x0C5B;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientArgs {
    pub dst: Ipv4Addr,
    pub src: Ipv4Addr,
    pub count: u64,
    pub ident: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerArgs {
    pub count: Option<u64>,
}

pub fn parse_client() -> Result<ClientArgs> {
    parse_client_from(std::env::args())
}

pub fn parse_server() -> Result<ServerArgs> {
    parse_server_from(std::env::args())
}

/// `pingclient [<ipv4>] [-s <source>] [-c <count>] [-i <identifier>]`
///
/// The first item is the program name, as with `std::env::args`.
pub fn parse_client_from<I: IntoIterator<Item = String>>(args: I) -> Result<ClientArgs> {
    let args: Vec<String> = args.into_iter().collect();
    let mut dst_str = None;
    let mut src = None;
    let mut count = 1;
    let mut ident = DEFAULT_IDENT;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-s" => {
                let v = value(&args, i, "-s")?;
                src = Some(v.parse::<Ipv4Addr>().context("Invalid source address for -s")?);
                i += 1;
            }
            "-c" => {
                let v = value(&args, i, "-c")?;
                count = v.parse().context("Invalid value for -c")?;
                i += 1;
            }
            "-i" => {
                let v = value(&args, i, "-i")?;
                ident = parse_u16(v).context("Invalid value for -i")?;
                i += 1;
            }
            flag if flag.starts_with('-') => anyhow::bail!("Unknown option {}", flag),
            val => {
                if dst_str.is_none() {
                    dst_str = Some(val);
                }
            }
        }
        i += 1;
    }

    let dst: Ipv4Addr = match dst_str {
        Some(s) => s.parse().context("Invalid IPv4 address. Usage: pingclient [<ipv4>] [-s <source>] [-c <count>] [-i <identifier>]")?,
        None => Ipv4Addr::LOCALHOST,
    };
    // With IP_HDRINCL the kernel fills in an unspecified source.
    let src = src.unwrap_or(if dst.is_loopback() { dst } else { Ipv4Addr::UNSPECIFIED });

    Ok(ClientArgs { dst, src, count, ident })
}

/// `pingserver [-c <count>]`
pub fn parse_server_from<I: IntoIterator<Item = String>>(args: I) -> Result<ServerArgs> {
    let args: Vec<String> = args.into_iter().collect();
    let mut count = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" => {
                let v = value(&args, i, "-c")?;
                count = Some(v.parse().context("Invalid value for -c")?);
                i += 1;
            }
            other => anyhow::bail!("Unexpected argument {}. Usage: pingserver [-c <count>]", other),
        }
        i += 1;
    }

    Ok(ServerArgs { count })
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .with_context(|| format!("Missing value for {}", flag))
}

// Accepts decimal or 0x-prefixed hex.
fn parse_u16(s: &str) -> Result<u16> {
    let v = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16)?,
        None => s.parse()?,
    };
    Ok(v)
}
