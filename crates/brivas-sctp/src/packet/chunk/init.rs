//! INIT and INIT ACK chunks (RFC 4960 §3.3.2, §3.3.3)

use super::{chunk_type, ChunkConfig};
use crate::packet::{BoundedByteReader, Parameters, Tlv, TlvRecord};
use crate::types::{Tsn, VerificationTag};
use bytes::BytesMut;
use std::fmt;

/// Fixed fields shared by INIT and INIT ACK
#[derive(Debug, Clone, PartialEq, Eq)]
struct InitFields {
    initiate_tag: VerificationTag,
    a_rwnd: u32,
    nbr_outbound_streams: u16,
    nbr_inbound_streams: u16,
    initial_tsn: Tsn,
    parameters: Parameters,
}

impl InitFields {
    fn read(reader: &BoundedByteReader<'_>) -> Option<Self> {
        Some(Self {
            initiate_tag: VerificationTag(reader.load32(4)),
            a_rwnd: reader.load32(8),
            nbr_outbound_streams: reader.load16(12),
            nbr_inbound_streams: reader.load16(14),
            initial_tsn: Tsn(reader.load32(16)),
            parameters: Parameters::parse(reader.variable_data())?,
        })
    }
}

fn write_init_fields<T: Tlv>(
    out: &mut BytesMut,
    initiate_tag: VerificationTag,
    a_rwnd: u32,
    nbr_outbound_streams: u16,
    nbr_inbound_streams: u16,
    initial_tsn: Tsn,
    parameters: &Parameters,
) {
    let mut writer = T::allocate_tlv(out, parameters.data().len());
    writer.store32(4, initiate_tag.0);
    writer.store32(8, a_rwnd);
    writer.store16(12, nbr_outbound_streams);
    writer.store16(14, nbr_inbound_streams);
    writer.store32(16, initial_tsn.0);
    writer.copy_to_variable_data(parameters.data());
}

/// INIT (type 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitChunk {
    pub initiate_tag: VerificationTag,
    pub a_rwnd: u32,
    pub nbr_outbound_streams: u16,
    pub nbr_inbound_streams: u16,
    pub initial_tsn: Tsn,
    pub parameters: Parameters,
}

impl Tlv for InitChunk {
    const TYPE: u16 = chunk_type::INIT as u16;
    const HEADER_SIZE: usize = 20;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for InitChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let fields = InitFields::read(&Self::parse_tlv(data)?)?;
        Some(Self {
            initiate_tag: fields.initiate_tag,
            a_rwnd: fields.a_rwnd,
            nbr_outbound_streams: fields.nbr_outbound_streams,
            nbr_inbound_streams: fields.nbr_inbound_streams,
            initial_tsn: fields.initial_tsn,
            parameters: fields.parameters,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        write_init_fields::<Self>(
            out,
            self.initiate_tag,
            self.a_rwnd,
            self.nbr_outbound_streams,
            self.nbr_inbound_streams,
            self.initial_tsn,
            &self.parameters,
        );
    }
}

impl fmt::Display for InitChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INIT, initiate_tag={}, initial_tsn={}",
            self.initiate_tag, self.initial_tsn.0
        )
    }
}

/// INIT ACK (type 2). Must carry a State Cookie parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitAckChunk {
    pub initiate_tag: VerificationTag,
    pub a_rwnd: u32,
    pub nbr_outbound_streams: u16,
    pub nbr_inbound_streams: u16,
    pub initial_tsn: Tsn,
    pub parameters: Parameters,
}

impl Tlv for InitAckChunk {
    const TYPE: u16 = chunk_type::INIT_ACK as u16;
    const HEADER_SIZE: usize = 20;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for InitAckChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let fields = InitFields::read(&Self::parse_tlv(data)?)?;
        Some(Self {
            initiate_tag: fields.initiate_tag,
            a_rwnd: fields.a_rwnd,
            nbr_outbound_streams: fields.nbr_outbound_streams,
            nbr_inbound_streams: fields.nbr_inbound_streams,
            initial_tsn: fields.initial_tsn,
            parameters: fields.parameters,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        write_init_fields::<Self>(
            out,
            self.initiate_tag,
            self.a_rwnd,
            self.nbr_outbound_streams,
            self.nbr_inbound_streams,
            self.initial_tsn,
            &self.parameters,
        );
    }
}

impl fmt::Display for InitAckChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INIT_ACK, initiate_tag={}, initial_tsn={}",
            self.initiate_tag, self.initial_tsn.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::parameter::{
        ForwardTsnSupportedParameter, StateCookieParameter, SupportedExtensionsParameter,
    };
    use bytes::Bytes;

    fn parameters() -> Parameters {
        Parameters::builder()
            .add(&ForwardTsnSupportedParameter)
            .add(&SupportedExtensionsParameter {
                chunk_types: vec![chunk_type::RE_CONFIG, chunk_type::FORWARD_TSN, 0x40],
            })
            .build()
    }

    #[test]
    fn test_init_round_trip() {
        let chunk = InitChunk {
            initiate_tag: VerificationTag(0x1234_5678),
            a_rwnd: 131072,
            nbr_outbound_streams: 65535,
            nbr_inbound_streams: 65535,
            initial_tsn: Tsn(0x0000_ffff),
            parameters: parameters(),
        };
        let serialized = chunk.serialize();
        assert_eq!(serialized[0], 1);
        // 20 + 4 + 7, padded
        assert_eq!(u16::from_be_bytes([serialized[2], serialized[3]]), 31);
        assert_eq!(serialized.len(), 32);

        let parsed = InitChunk::parse(&serialized).unwrap();
        assert!(parsed.parameters.get::<ForwardTsnSupportedParameter>().is_some());
        assert_eq!(parsed, chunk);
        assert_eq!(parsed.to_string(), "INIT, initiate_tag=0x12345678, initial_tsn=65535");
    }

    #[test]
    fn test_init_ack_carries_cookie() {
        let chunk = InitAckChunk {
            initiate_tag: VerificationTag(1),
            a_rwnd: 1000,
            nbr_outbound_streams: 2,
            nbr_inbound_streams: 3,
            initial_tsn: Tsn(4),
            parameters: Parameters::builder()
                .add(&StateCookieParameter {
                    data: Bytes::from_static(b"state"),
                })
                .build(),
        };
        let parsed = InitAckChunk::parse(&chunk.serialize()).unwrap();
        let cookie: StateCookieParameter = parsed.parameters.get().unwrap();
        assert_eq!(&cookie.data[..], b"state");

        // An INIT ACK is not an INIT
        assert!(InitChunk::parse(&chunk.serialize()).is_none());
    }

    #[test]
    fn test_rejects_malformed_parameters() {
        let mut data = InitChunk {
            initiate_tag: VerificationTag(1),
            a_rwnd: 0,
            nbr_outbound_streams: 1,
            nbr_inbound_streams: 1,
            initial_tsn: Tsn(1),
            parameters: Parameters::default(),
        }
        .serialize()
        .to_vec();
        // Append a parameter header claiming 2 bytes and fix up the chunk length
        data.extend_from_slice(&[0x00, 0x01, 0x00, 0x02]);
        data[2..4].copy_from_slice(&24u16.to_be_bytes());
        assert!(InitChunk::parse(&data).is_none());

        for len in 0..20 {
            assert!(InitChunk::parse(&data[..len]).is_none());
        }
    }
}
