//! SCTP chunks (RFC 4960 §3.3, RFC 3758, RFC 6525)
//!
//! Every chunk starts with a 1-byte type, a 1-byte flags field and a 2-byte
//! length. [`Chunk::parse`] dispatches on the type byte; types this stack does
//! not know are kept verbatim as [`UnknownChunk`] so the caller can apply the
//! action encoded in the type's upper two bits.

mod control;
mod data;
mod init;
mod reconfig;
mod sack;

pub use control::{
    AbortChunk, CookieAckChunk, CookieEchoChunk, ErrorChunk, HeartbeatAckChunk,
    HeartbeatRequestChunk, ShutdownAckChunk, ShutdownChunk, ShutdownCompleteChunk,
};
pub use data::DataChunk;
pub use init::{InitAckChunk, InitChunk};
pub use reconfig::{ForwardTsnChunk, ReConfigChunk, SkippedStream};
pub use sack::{GapAckBlock, SackChunk};

use super::tlv::length_field;
use super::{round_up_to_4, TlvRecord};
use bytes::{Bytes, BytesMut};
use std::fmt;
use tracing::debug;

/// Width of the type field of chunks
pub struct ChunkConfig;

impl ChunkConfig {
    pub const TYPE_SIZE_IN_BYTES: usize = 1;
}

const CHUNK_HEADER_SIZE: usize = 4;

/// SCTP chunk type codes
pub mod chunk_type {
    pub const DATA: u8 = 0;
    pub const INIT: u8 = 1;
    pub const INIT_ACK: u8 = 2;
    pub const SACK: u8 = 3;
    pub const HEARTBEAT: u8 = 4;
    pub const HEARTBEAT_ACK: u8 = 5;
    pub const ABORT: u8 = 6;
    pub const SHUTDOWN: u8 = 7;
    pub const SHUTDOWN_ACK: u8 = 8;
    pub const ERROR: u8 = 9;
    pub const COOKIE_ECHO: u8 = 10;
    pub const COOKIE_ACK: u8 = 11;
    pub const SHUTDOWN_COMPLETE: u8 = 14;
    pub const RE_CONFIG: u8 = 130;
    pub const FORWARD_TSN: u8 = 192;
}

/// What to do with a chunk of an unrecognized type (RFC 4960 §3.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnrecognizedChunkAction {
    /// Discard the packet
    Stop,
    /// Discard the packet and report in an ERROR chunk
    StopAndReport,
    /// Skip the chunk and continue with the next one
    Skip,
    /// Skip the chunk and report in an ERROR chunk
    SkipAndReport,
}

/// A chunk of a type this stack does not implement, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChunk {
    pub chunk_type: u8,
    pub flags: u8,
    pub value: Bytes,
}

impl UnknownChunk {
    pub fn action(&self) -> UnrecognizedChunkAction {
        match self.chunk_type >> 6 {
            0b00 => UnrecognizedChunkAction::Stop,
            0b01 => UnrecognizedChunkAction::StopAndReport,
            0b10 => UnrecognizedChunkAction::Skip,
            _ => UnrecognizedChunkAction::SkipAndReport,
        }
    }
}

impl TlvRecord for UnknownChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < CHUNK_HEADER_SIZE {
            return None;
        }
        let length = usize::from(u16::from_be_bytes([data[2], data[3]]));
        if length < CHUNK_HEADER_SIZE || length > data.len() {
            debug!("Unknown chunk {}: invalid length {}", data[0], length);
            return None;
        }
        Some(Self {
            chunk_type: data[0],
            flags: data[1],
            value: Bytes::copy_from_slice(&data[CHUNK_HEADER_SIZE..length]),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let length = CHUNK_HEADER_SIZE + self.value.len();
        out.reserve(round_up_to_4(length));
        out.extend_from_slice(&[self.chunk_type, self.flags]);
        out.extend_from_slice(&length_field(length).to_be_bytes());
        out.extend_from_slice(&self.value);
        out.resize(out.len() + round_up_to_4(length) - length, 0);
    }
}

/// Any chunk that can appear in a packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Data(DataChunk),
    Init(InitChunk),
    InitAck(InitAckChunk),
    Sack(SackChunk),
    Heartbeat(HeartbeatRequestChunk),
    HeartbeatAck(HeartbeatAckChunk),
    Abort(AbortChunk),
    Shutdown(ShutdownChunk),
    ShutdownAck(ShutdownAckChunk),
    Error(ErrorChunk),
    CookieEcho(CookieEchoChunk),
    CookieAck(CookieAckChunk),
    ShutdownComplete(ShutdownCompleteChunk),
    ReConfig(ReConfigChunk),
    ForwardTsn(ForwardTsnChunk),
    Unknown(UnknownChunk),
}

impl Chunk {
    pub fn chunk_type(&self) -> u8 {
        match self {
            Self::Data(_) => chunk_type::DATA,
            Self::Init(_) => chunk_type::INIT,
            Self::InitAck(_) => chunk_type::INIT_ACK,
            Self::Sack(_) => chunk_type::SACK,
            Self::Heartbeat(_) => chunk_type::HEARTBEAT,
            Self::HeartbeatAck(_) => chunk_type::HEARTBEAT_ACK,
            Self::Abort(_) => chunk_type::ABORT,
            Self::Shutdown(_) => chunk_type::SHUTDOWN,
            Self::ShutdownAck(_) => chunk_type::SHUTDOWN_ACK,
            Self::Error(_) => chunk_type::ERROR,
            Self::CookieEcho(_) => chunk_type::COOKIE_ECHO,
            Self::CookieAck(_) => chunk_type::COOKIE_ACK,
            Self::ShutdownComplete(_) => chunk_type::SHUTDOWN_COMPLETE,
            Self::ReConfig(_) => chunk_type::RE_CONFIG,
            Self::ForwardTsn(_) => chunk_type::FORWARD_TSN,
            Self::Unknown(c) => c.chunk_type,
        }
    }
}

impl TlvRecord for Chunk {
    fn parse(data: &[u8]) -> Option<Self> {
        match *data.first()? {
            chunk_type::DATA => DataChunk::parse(data).map(Self::Data),
            chunk_type::INIT => InitChunk::parse(data).map(Self::Init),
            chunk_type::INIT_ACK => InitAckChunk::parse(data).map(Self::InitAck),
            chunk_type::SACK => SackChunk::parse(data).map(Self::Sack),
            chunk_type::HEARTBEAT => HeartbeatRequestChunk::parse(data).map(Self::Heartbeat),
            chunk_type::HEARTBEAT_ACK => HeartbeatAckChunk::parse(data).map(Self::HeartbeatAck),
            chunk_type::ABORT => AbortChunk::parse(data).map(Self::Abort),
            chunk_type::SHUTDOWN => ShutdownChunk::parse(data).map(Self::Shutdown),
            chunk_type::SHUTDOWN_ACK => ShutdownAckChunk::parse(data).map(Self::ShutdownAck),
            chunk_type::ERROR => ErrorChunk::parse(data).map(Self::Error),
            chunk_type::COOKIE_ECHO => CookieEchoChunk::parse(data).map(Self::CookieEcho),
            chunk_type::COOKIE_ACK => CookieAckChunk::parse(data).map(Self::CookieAck),
            chunk_type::SHUTDOWN_COMPLETE => {
                ShutdownCompleteChunk::parse(data).map(Self::ShutdownComplete)
            }
            chunk_type::RE_CONFIG => ReConfigChunk::parse(data).map(Self::ReConfig),
            chunk_type::FORWARD_TSN => ForwardTsnChunk::parse(data).map(Self::ForwardTsn),
            _ => UnknownChunk::parse(data).map(Self::Unknown),
        }
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        match self {
            Self::Data(c) => c.serialize_to(out),
            Self::Init(c) => c.serialize_to(out),
            Self::InitAck(c) => c.serialize_to(out),
            Self::Sack(c) => c.serialize_to(out),
            Self::Heartbeat(c) => c.serialize_to(out),
            Self::HeartbeatAck(c) => c.serialize_to(out),
            Self::Abort(c) => c.serialize_to(out),
            Self::Shutdown(c) => c.serialize_to(out),
            Self::ShutdownAck(c) => c.serialize_to(out),
            Self::Error(c) => c.serialize_to(out),
            Self::CookieEcho(c) => c.serialize_to(out),
            Self::CookieAck(c) => c.serialize_to(out),
            Self::ShutdownComplete(c) => c.serialize_to(out),
            Self::ReConfig(c) => c.serialize_to(out),
            Self::ForwardTsn(c) => c.serialize_to(out),
            Self::Unknown(c) => c.serialize_to(out),
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(c) => fmt::Display::fmt(c, f),
            Self::Init(c) => fmt::Display::fmt(c, f),
            Self::InitAck(c) => fmt::Display::fmt(c, f),
            Self::Sack(c) => fmt::Display::fmt(c, f),
            Self::Heartbeat(c) => fmt::Display::fmt(c, f),
            Self::HeartbeatAck(c) => fmt::Display::fmt(c, f),
            Self::Abort(c) => fmt::Display::fmt(c, f),
            Self::Shutdown(c) => fmt::Display::fmt(c, f),
            Self::ShutdownAck(c) => fmt::Display::fmt(c, f),
            Self::Error(c) => fmt::Display::fmt(c, f),
            Self::CookieEcho(c) => fmt::Display::fmt(c, f),
            Self::CookieAck(c) => fmt::Display::fmt(c, f),
            Self::ShutdownComplete(c) => fmt::Display::fmt(c, f),
            Self::ReConfig(c) => fmt::Display::fmt(c, f),
            Self::ForwardTsn(c) => fmt::Display::fmt(c, f),
            Self::Unknown(c) => write!(f, "Unknown chunk type {}, length={}", c.chunk_type, c.value.len()),
        }
    }
}

/// Describe raw chunk bytes for logs, whether or not they parse.
pub fn debug_convert_chunk_to_string(data: &[u8]) -> String {
    let Some(&chunk_type) = data.first() else {
        return "Empty chunk".to_string();
    };
    match Chunk::parse(data) {
        Some(chunk) => chunk.to_string(),
        None => format!("Failed to parse chunk of type {}", chunk_type),
    }
}
