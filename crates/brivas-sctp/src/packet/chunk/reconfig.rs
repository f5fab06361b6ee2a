//! RE-CONFIG (RFC 6525 §3.1) and FORWARD TSN (RFC 3758 §3.2) chunks

use super::{chunk_type, ChunkConfig};
use crate::packet::{Parameters, Tlv, TlvRecord};
use crate::types::{Ssn, StreamId, Tsn};
use bytes::BytesMut;
use std::fmt;

/// RE-CONFIG (type 130): one or two reconfiguration request/response
/// parameters
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReConfigChunk {
    pub parameters: Parameters,
}

impl Tlv for ReConfigChunk {
    const TYPE: u16 = chunk_type::RE_CONFIG as u16;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ReConfigChunk {
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

impl fmt::Display for ReConfigChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RE-CONFIG, parameters={}", self.parameters)
    }
}

/// Stream whose messages up to `ssn` are abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedStream {
    pub stream_id: StreamId,
    pub ssn: Ssn,
}

const SKIPPED_STREAM_SIZE: usize = 4;

/// FORWARD TSN (type 192)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForwardTsnChunk {
    pub new_cumulative_tsn: Tsn,
    pub skipped_streams: Vec<SkippedStream>,
}

impl Tlv for ForwardTsnChunk {
    const TYPE: u16 = chunk_type::FORWARD_TSN as u16;
    const HEADER_SIZE: usize = 8;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 4;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ForwardTsnChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        let count = reader.variable_data_size() / SKIPPED_STREAM_SIZE;
        let mut skipped_streams = Vec::with_capacity(count);
        for i in 0..count {
            let stream = reader.sub_reader(i * SKIPPED_STREAM_SIZE, SKIPPED_STREAM_SIZE)?;
            skipped_streams.push(SkippedStream {
                stream_id: StreamId(stream.load16(0)),
                ssn: Ssn(stream.load16(2)),
            });
        }
        Some(Self {
            new_cumulative_tsn: Tsn(reader.load32(4)),
            skipped_streams,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let mut writer =
            Self::allocate_tlv(out, self.skipped_streams.len() * SKIPPED_STREAM_SIZE);
        writer.store32(4, self.new_cumulative_tsn.0);
        for (i, skipped) in self.skipped_streams.iter().enumerate() {
            let mut sub = writer.sub_writer(i * SKIPPED_STREAM_SIZE, SKIPPED_STREAM_SIZE);
            sub.store16(0, skipped.stream_id.0);
            sub.store16(2, skipped.ssn.0);
        }
    }
}

impl fmt::Display for ForwardTsnChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FORWARD-TSN, new_cumulative_tsn={}", self.new_cumulative_tsn.0)
    }
}
