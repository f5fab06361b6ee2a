//! DATA chunk (RFC 4960 §3.3.1, RFC 7053 for the I bit)

use super::{chunk_type, ChunkConfig};
use crate::packet::{Tlv, TlvRecord};
use crate::types::{Ppid, Ssn, StreamId, Tsn};
use bytes::{Bytes, BytesMut};
use std::fmt;

const FLAG_END: u8 = 0x01;
const FLAG_BEGINNING: u8 = 0x02;
const FLAG_UNORDERED: u8 = 0x04;
const FLAG_IMMEDIATE_ACK: u8 = 0x08;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataChunk {
    pub tsn: Tsn,
    pub stream_id: StreamId,
    pub ssn: Ssn,
    pub ppid: Ppid,
    pub payload: Bytes,
    pub is_unordered: bool,
    pub is_beginning: bool,
    pub is_end: bool,
    pub immediate_ack: bool,
}

impl DataChunk {
    /// Calculate flags byte
    pub fn flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.is_end {
            flags |= FLAG_END;
        }
        if self.is_beginning {
            flags |= FLAG_BEGINNING;
        }
        if self.is_unordered {
            flags |= FLAG_UNORDERED;
        }
        if self.immediate_ack {
            flags |= FLAG_IMMEDIATE_ACK;
        }
        flags
    }
}

impl Tlv for DataChunk {
    const TYPE: u16 = chunk_type::DATA as u16;
    const HEADER_SIZE: usize = 16;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for DataChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        let flags = reader.load8(1);
        Some(Self {
            tsn: Tsn(reader.load32(4)),
            stream_id: StreamId(reader.load16(8)),
            ssn: Ssn(reader.load16(10)),
            ppid: Ppid(reader.load32(12)),
            payload: Bytes::copy_from_slice(reader.variable_data()),
            is_unordered: flags & FLAG_UNORDERED != 0,
            is_beginning: flags & FLAG_BEGINNING != 0,
            is_end: flags & FLAG_END != 0,
            immediate_ack: flags & FLAG_IMMEDIATE_ACK != 0,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let mut writer = Self::allocate_tlv(out, self.payload.len());
        writer.store8(1, self.flags());
        writer.store32(4, self.tsn.0);
        writer.store16(8, self.stream_id.0);
        writer.store16(10, self.ssn.0);
        writer.store32(12, self.ppid.0);
        writer.copy_to_variable_data(&self.payload);
    }
}

impl fmt::Display for DataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordering = if self.is_unordered { "unordered" } else { "ordered" };
        let fragment = match (self.is_beginning, self.is_end) {
            (true, true) => "complete",
            (true, false) => "first",
            (false, true) => "last",
            (false, false) => "middle",
        };
        write!(
            f,
            "DATA, type={}::{}, tsn={}, sid={}, ssn={}, ppid={}, length={}",
            ordering,
            fragment,
            self.tsn.0,
            self.stream_id.0,
            self.ssn.0,
            self.ppid.0,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_wire_format() {
        let chunk = DataChunk {
            tsn: Tsn(0x0102_0304),
            stream_id: StreamId(5),
            ssn: Ssn(6),
            ppid: Ppid(51),
            payload: Bytes::from_static(b"hello"),
            is_beginning: true,
            is_end: true,
            ..Default::default()
        };
        let serialized = chunk.serialize();
        assert_eq!(
            &serialized[..],
            &[
                0x00, 0x03, 0x00, 0x15, 0x01, 0x02, 0x03, 0x04, 0x00, 0x05, 0x00, 0x06, 0x00,
                0x00, 0x00, 0x33, b'h', b'e', b'l', b'l', b'o', 0x00, 0x00, 0x00
            ]
        );
        assert_eq!(DataChunk::parse(&serialized), Some(chunk.clone()));
        assert_eq!(
            chunk.to_string(),
            "DATA, type=ordered::complete, tsn=16909060, sid=5, ssn=6, ppid=51, length=5"
        );
    }

    #[test]
    fn test_round_trip_random() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let len = rng.gen_range(0..100);
            let chunk = DataChunk {
                tsn: Tsn(rng.gen()),
                stream_id: StreamId(rng.gen()),
                ssn: Ssn(rng.gen()),
                ppid: Ppid(rng.gen()),
                payload: (0..len).map(|_| rng.gen::<u8>()).collect::<Vec<u8>>().into(),
                is_unordered: rng.gen(),
                is_beginning: rng.gen(),
                is_end: rng.gen(),
                immediate_ack: rng.gen(),
            };
            assert_eq!(DataChunk::parse(&chunk.serialize()), Some(chunk));
        }
    }

    #[test]
    fn test_truncated() {
        let chunk = DataChunk {
            payload: Bytes::from_static(&[1, 2, 3, 4, 5, 6]),
            ..Default::default()
        };
        let serialized = chunk.serialize();
        for len in 0..22 {
            assert!(DataChunk::parse(&serialized[..len]).is_none());
        }
    }
}
