//! Association control chunks: heartbeat, abort, shutdown, error and cookie
//! handling (RFC 4960 §3.3.5 - §3.3.13)

use super::{chunk_type, ChunkConfig};
use crate::packet::error_cause::error_causes_to_string;
use crate::packet::parameter::HeartbeatInfoParameter;
use crate::packet::{Parameters, Tlv, TlvRecord};
use crate::types::Tsn;
use bytes::{Bytes, BytesMut};
use std::fmt;

/// T bit: the verification tag is reflected rather than the sender's own
const FLAG_T: u8 = 0x01;

/// HEARTBEAT (type 4)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeartbeatRequestChunk {
    pub parameters: Parameters,
}

impl HeartbeatRequestChunk {
    pub fn info(&self) -> Option<HeartbeatInfoParameter> {
        self.parameters.get()
    }
}

impl Tlv for HeartbeatRequestChunk {
    const TYPE: u16 = chunk_type::HEARTBEAT as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for HeartbeatRequestChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            parameters: Parameters::parse(reader.variable_data())?,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let parameters = self.parameters.data();
        Self::allocate_tlv(out, parameters.len()).copy_to_variable_data(parameters);
    }
}

impl fmt::Display for HeartbeatRequestChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HEARTBEAT")
    }
}

/// HEARTBEAT ACK (type 5)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeartbeatAckChunk {
    pub parameters: Parameters,
}

impl HeartbeatAckChunk {
    pub fn info(&self) -> Option<HeartbeatInfoParameter> {
        self.parameters.get()
    }
}

impl Tlv for HeartbeatAckChunk {
    const TYPE: u16 = chunk_type::HEARTBEAT_ACK as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for HeartbeatAckChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            parameters: Parameters::parse(reader.variable_data())?,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let parameters = self.parameters.data();
        Self::allocate_tlv(out, parameters.len()).copy_to_variable_data(parameters);
    }
}

impl fmt::Display for HeartbeatAckChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HEARTBEAT-ACK")
    }
}

/// ABORT (type 6)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortChunk {
    /// False when the T bit is set, i.e. the peer's tag was reflected
    pub filled_in_verification_tag: bool,
    pub error_causes: Parameters,
}

impl Tlv for AbortChunk {
    const TYPE: u16 = chunk_type::ABORT as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for AbortChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            filled_in_verification_tag: reader.load8(1) & FLAG_T == 0,
            error_causes: Parameters::parse(reader.variable_data())?,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let causes = self.error_causes.data();
        let mut writer = Self::allocate_tlv(out, causes.len());
        writer.store8(1, if self.filled_in_verification_tag { 0 } else { FLAG_T });
        writer.copy_to_variable_data(causes);
    }
}

impl fmt::Display for AbortChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ABORT")?;
        if !self.error_causes.is_empty() {
            write!(f, ", error_causes={}", error_causes_to_string(&self.error_causes))?;
        }
        Ok(())
    }
}

/// SHUTDOWN (type 7)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownChunk {
    pub cumulative_tsn_ack: Tsn,
}

impl Tlv for ShutdownChunk {
    const TYPE: u16 = chunk_type::SHUTDOWN as u16;
    const HEADER_SIZE: usize = 8;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ShutdownChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            cumulative_tsn_ack: Tsn(reader.load32(4)),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0).store32(4, self.cumulative_tsn_ack.0);
    }
}

impl fmt::Display for ShutdownChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHUTDOWN, cum_ack_tsn={}", self.cumulative_tsn_ack.0)
    }
}

/// SHUTDOWN ACK (type 8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownAckChunk;

impl Tlv for ShutdownAckChunk {
    const TYPE: u16 = chunk_type::SHUTDOWN_ACK as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ShutdownAckChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        Self::parse_tlv(data)?;
        Some(Self)
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0);
    }
}

impl fmt::Display for ShutdownAckChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHUTDOWN-ACK")
    }
}

/// ERROR (type 9)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorChunk {
    pub error_causes: Parameters,
}

impl Tlv for ErrorChunk {
    const TYPE: u16 = chunk_type::ERROR as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ErrorChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            error_causes: Parameters::parse(reader.variable_data())?,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let causes = self.error_causes.data();
        Self::allocate_tlv(out, causes.len()).copy_to_variable_data(causes);
    }
}

impl fmt::Display for ErrorChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR, error_causes={}", error_causes_to_string(&self.error_causes))
    }
}

/// COOKIE ECHO (type 10)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CookieEchoChunk {
    pub cookie: Bytes,
}

impl Tlv for CookieEchoChunk {
    const TYPE: u16 = chunk_type::COOKIE_ECHO as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for CookieEchoChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            cookie: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.cookie.len()).copy_to_variable_data(&self.cookie);
    }
}

impl fmt::Display for CookieEchoChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "COOKIE-ECHO")
    }
}

/// COOKIE ACK (type 11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CookieAckChunk;

impl Tlv for CookieAckChunk {
    const TYPE: u16 = chunk_type::COOKIE_ACK as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for CookieAckChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        Self::parse_tlv(data)?;
        Some(Self)
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0);
    }
}

impl fmt::Display for CookieAckChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "COOKIE-ACK")
    }
}

/// SHUTDOWN COMPLETE (type 14)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownCompleteChunk {
    pub tag_reflected: bool,
}

impl Tlv for ShutdownCompleteChunk {
    const TYPE: u16 = chunk_type::SHUTDOWN_COMPLETE as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ShutdownCompleteChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            tag_reflected: reader.load8(1) & FLAG_T != 0,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0).store8(1, if self.tag_reflected { FLAG_T } else { 0 });
    }
}

impl fmt::Display for ShutdownCompleteChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHUTDOWN-COMPLETE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::error_cause::{
        OutOfResourceErrorCause, ProtocolViolationCause, UserInitiatedAbortCause,
    };

    #[test]
    fn test_heartbeat_info_survives_round_trip() {
        let chunk = HeartbeatRequestChunk {
            parameters: Parameters::builder()
                .add(&HeartbeatInfoParameter {
                    info: Bytes::from_static(&[1, 2, 3, 4, 5]),
                })
                .build(),
        };
        let parsed = HeartbeatRequestChunk::parse(&chunk.serialize()).unwrap();
        assert_eq!(&parsed.info().unwrap().info[..], &[1, 2, 3, 4, 5]);

        // The ack echoes the same parameters under a different type
        let ack = HeartbeatAckChunk {
            parameters: parsed.parameters.clone(),
        };
        let serialized = ack.serialize();
        assert_eq!(serialized[0], 5);
        assert_eq!(HeartbeatAckChunk::parse(&serialized), Some(ack));
        assert!(HeartbeatRequestChunk::parse(&serialized).is_none());
    }

    #[test]
    fn test_abort_flags_and_causes() {
        let chunk = AbortChunk {
            filled_in_verification_tag: false,
            error_causes: Parameters::builder()
                .add(&UserInitiatedAbortCause::new("Close called"))
                .build(),
        };
        let serialized = chunk.serialize();
        assert_eq!(serialized[1], FLAG_T);

        let parsed = AbortChunk::parse(&serialized).unwrap();
        assert!(!parsed.filled_in_verification_tag);
        let cause: UserInitiatedAbortCause = parsed.error_causes.get().unwrap();
        assert_eq!(cause.reason(), "Close called");
        assert_eq!(
            parsed.to_string(),
            "ABORT, error_causes=User-Initiated Abort, reason=Close called"
        );
    }

    #[test]
    fn test_error_chunk_with_multiple_causes() {
        let chunk = ErrorChunk {
            error_causes: Parameters::builder()
                .add(&OutOfResourceErrorCause)
                .add(&ProtocolViolationCause::new("bad"))
                .build(),
        };
        let parsed = ErrorChunk::parse(&chunk.serialize()).unwrap();
        assert_eq!(parsed.error_causes.descriptors().len(), 2);
        assert_eq!(parsed, chunk);
    }

    #[test]
    fn test_fixed_size_chunks() {
        assert_eq!(&ShutdownAckChunk.serialize()[..], &[0x08, 0x00, 0x00, 0x04]);
        assert_eq!(&CookieAckChunk.serialize()[..], &[0x0b, 0x00, 0x00, 0x04]);

        let shutdown = ShutdownChunk {
            cumulative_tsn_ack: Tsn(0x0a0b_0c0d),
        };
        assert_eq!(
            &shutdown.serialize()[..],
            &[0x07, 0x00, 0x00, 0x08, 0x0a, 0x0b, 0x0c, 0x0d]
        );
        assert_eq!(ShutdownChunk::parse(&shutdown.serialize()), Some(shutdown));

        let complete = ShutdownCompleteChunk { tag_reflected: true };
        assert_eq!(&complete.serialize()[..], &[0x0e, 0x01, 0x00, 0x04]);
        assert_eq!(ShutdownCompleteChunk::parse(&complete.serialize()), Some(complete));
    }

    #[test]
    fn test_cookie_echo_truncation() {
        let chunk = CookieEchoChunk {
            cookie: Bytes::from_static(b"0123456789"),
        };
        let serialized = chunk.serialize();
        for len in 0..14 {
            assert!(CookieEchoChunk::parse(&serialized[..len]).is_none());
        }
        assert_eq!(CookieEchoChunk::parse(&serialized), Some(chunk));
    }
}
