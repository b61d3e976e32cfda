use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed packet: {0}")]
    MalformedPacket(&'static str),

    #[error("Packet of {len} bytes exceeds the {max}-byte MTU")]
    Oversized { len: usize, max: usize },

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
