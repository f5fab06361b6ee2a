//! Error types for the SCTP stack

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, SctpError>;

/// Top-level SCTP error
#[derive(Debug, Error)]
pub enum SctpError {
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating a received SCTP packet.
///
/// Individual chunks, parameters and error causes never produce these; they
/// fail to parse by returning `None` so the caller can decide how to react.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("Packet too small: {0} bytes")]
    PacketTooSmall(usize),

    #[error("Packet too large: {0} bytes")]
    PacketTooLarge(usize),

    #[error("Invalid checksum: received 0x{received:08x}, calculated 0x{calculated:08x}")]
    InvalidChecksum { received: u32, calculated: u32 },

    #[error("Chunk too small at offset {offset}")]
    ChunkTooSmall { offset: usize },

    #[error("Chunk too large at offset {offset}: padded length {length}")]
    ChunkTooLarge { offset: usize, length: usize },
}
