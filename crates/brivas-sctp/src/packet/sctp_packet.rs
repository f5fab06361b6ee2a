//! SCTP packet: common header, checksum and chunk list (RFC 4960 §3.1)

use super::chunk::{debug_convert_chunk_to_string, Chunk};
use super::{round_down_to_4, round_up_to_4, TlvRecord};
use crate::config::SctpOptions;
use crate::errors::PacketError;
use crate::types::VerificationTag;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, instrument};

const CHUNK_HEADER_SIZE: usize = 4;
const CHECKSUM_OFFSET: usize = 8;

/// CRC32c over a whole packet, with the checksum field taken as zero.
fn calculate_checksum(packet: &[u8]) -> u32 {
    let crc = crc32c::crc32c(&packet[..CHECKSUM_OFFSET]);
    let crc = crc32c::crc32c_append(crc, &[0; 4]);
    crc32c::crc32c_append(crc, &packet[CHECKSUM_OFFSET + 4..])
}

/// SCTP Common Header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub verification_tag: VerificationTag,
    /// Checksum field as it appears on the wire, read big-endian
    pub checksum: u32,
}

impl CommonHeader {
    pub const SIZE: usize = 12;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.source_port);
        buf.put_u16(self.destination_port);
        buf.put_u32(self.verification_tag.0);
        buf.put_u32(self.checksum);
    }

    pub fn decode(mut buf: &[u8]) -> Option<Self> {
        if buf.remaining() < Self::SIZE {
            return None;
        }
        Some(Self {
            source_port: buf.get_u16(),
            destination_port: buf.get_u16(),
            verification_tag: VerificationTag(buf.get_u32()),
            checksum: buf.get_u32(),
        })
    }
}

/// A chunk located inside a received packet, not yet decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub chunk_type: u8,
    pub flags: u8,
    /// The whole chunk, header and trailing padding included
    pub data: Bytes,
}

impl ChunkDescriptor {
    /// Decode into a typed chunk.
    pub fn parse(&self) -> Option<Chunk> {
        Chunk::parse(&self.data)
    }

    pub fn to_debug_string(&self) -> String {
        debug_convert_chunk_to_string(&self.data)
    }
}

/// A validated, received SCTP packet
#[derive(Debug, Clone)]
pub struct SctpPacket {
    common_header: CommonHeader,
    descriptors: Vec<ChunkDescriptor>,
}

impl SctpPacket {
    pub const MAX_PACKET_SIZE: usize = 65535;

    /// Validate size and checksum, then locate every chunk.
    #[instrument(skip_all, fields(len = data.len()))]
    pub fn parse(data: &[u8], options: &SctpOptions) -> Result<Self, PacketError> {
        if data.len() < CommonHeader::SIZE + CHUNK_HEADER_SIZE {
            debug!("Dropping packet of {} bytes: too small", data.len());
            return Err(PacketError::PacketTooSmall(data.len()));
        }
        if data.len() > Self::MAX_PACKET_SIZE {
            debug!("Dropping packet of {} bytes: too large", data.len());
            return Err(PacketError::PacketTooLarge(data.len()));
        }

        let common_header =
            CommonHeader::decode(data).ok_or(PacketError::PacketTooSmall(data.len()))?;

        if !options.disable_checksum_verification {
            let received = u32::from_le_bytes([
                data[CHECKSUM_OFFSET],
                data[CHECKSUM_OFFSET + 1],
                data[CHECKSUM_OFFSET + 2],
                data[CHECKSUM_OFFSET + 3],
            ]);
            let calculated = calculate_checksum(data);
            if received != calculated {
                debug!(
                    "Dropping packet: checksum 0x{:08x}, calculated 0x{:08x}",
                    received, calculated
                );
                return Err(PacketError::InvalidChecksum {
                    received,
                    calculated,
                });
            }
        }

        let packet = Bytes::copy_from_slice(data);
        let mut descriptors = Vec::new();
        let mut offset = CommonHeader::SIZE;
        while offset < packet.len() {
            let remaining = packet.len() - offset;
            if remaining < CHUNK_HEADER_SIZE {
                return Err(PacketError::ChunkTooSmall { offset });
            }
            let length = usize::from(u16::from_be_bytes([packet[offset + 2], packet[offset + 3]]));
            if length < CHUNK_HEADER_SIZE {
                return Err(PacketError::ChunkTooSmall { offset });
            }
            let padded_length = round_up_to_4(length);
            if padded_length > remaining {
                return Err(PacketError::ChunkTooLarge {
                    offset,
                    length: padded_length,
                });
            }
            descriptors.push(ChunkDescriptor {
                chunk_type: packet[offset],
                flags: packet[offset + 1],
                data: packet.slice(offset..offset + padded_length),
            });
            offset += padded_length;
        }

        Ok(Self {
            common_header,
            descriptors,
        })
    }

    pub fn common_header(&self) -> &CommonHeader {
        &self.common_header
    }

    pub fn descriptors(&self) -> &[ChunkDescriptor] {
        &self.descriptors
    }
}

/// Assembles outgoing chunks into a packet no larger than the MTU.
///
/// The common header is written when the first chunk is added and the
/// checksum is filled in by [`build`](Self::build), which also resets the
/// builder for the next packet.
#[derive(Debug)]
pub struct SctpPacketBuilder {
    verification_tag: VerificationTag,
    source_port: u16,
    destination_port: u16,
    max_packet_size: usize,
    write_checksum: bool,
    out: BytesMut,
}

impl SctpPacketBuilder {
    pub fn new(verification_tag: VerificationTag, options: &SctpOptions) -> Self {
        let max_packet_size = round_down_to_4(options.mtu);
        Self {
            verification_tag,
            source_port: options.local_port,
            destination_port: options.remote_port,
            max_packet_size,
            write_checksum: true,
            out: BytesMut::with_capacity(max_packet_size),
        }
    }

    /// Leave the checksum field zero, e.g. when the lower layer already
    /// provides integrity protection.
    pub fn write_checksum(&mut self, write_checksum: bool) -> &mut Self {
        self.write_checksum = write_checksum;
        self
    }

    pub fn verification_tag(&self) -> VerificationTag {
        self.verification_tag
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    pub fn add(&mut self, chunk: &impl TlvRecord) -> &mut Self {
        if self.out.is_empty() {
            CommonHeader {
                source_port: self.source_port,
                destination_port: self.destination_port,
                verification_tag: self.verification_tag,
                checksum: 0,
            }
            .encode(&mut self.out);
        }
        chunk.serialize_to(&mut self.out);
        let padded_len = round_up_to_4(self.out.len());
        self.out.resize(padded_len, 0);
        debug_assert!(
            self.out.len() <= self.max_packet_size,
            "packet of {} bytes exceeds max size {}",
            self.out.len(),
            self.max_packet_size
        );
        self
    }

    /// Space left for chunks, accounting for the header if none was added yet.
    pub fn bytes_remaining(&self) -> usize {
        let used = if self.out.is_empty() {
            CommonHeader::SIZE
        } else {
            self.out.len()
        };
        self.max_packet_size.saturating_sub(used)
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Finish the packet. Returns an empty buffer if no chunk was added.
    pub fn build(&mut self) -> Bytes {
        let mut out = self.out.split();
        if out.is_empty() {
            return Bytes::new();
        }
        if self.write_checksum {
            let checksum = calculate_checksum(&out);
            out[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&checksum.to_le_bytes());
        }
        out.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::chunk::{CookieAckChunk, DataChunk, SackChunk};
    use crate::types::{Ppid, StreamId, Tsn};

    const COOKIE_ACK_AND_SACK: [u8; 32] = [
        0x04, 0xd2, 0x10, 0xe1, 0x69, 0x7e, 0x3a, 0x4e, 0xc0, 0x6e, 0x8b, 0x36, 0x0b, 0x00, 0x00,
        0x04, 0x03, 0x00, 0x00, 0x10, 0xae, 0xa9, 0x52, 0x52, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
    ];

    const SACK_WITH_BAD_CHECKSUM: [u8; 28] = [
        0x13, 0x88, 0x13, 0x88, 0x0e, 0xdd, 0xca, 0x08, 0x2a, 0x81, 0xf5, 0x31, 0x03, 0x00, 0x00,
        0x10, 0x55, 0x08, 0x36, 0x40, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    fn capture_options() -> SctpOptions {
        SctpOptions {
            local_port: 1234,
            remote_port: 4321,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_capture() {
        let packet = SctpPacket::parse(&COOKIE_ACK_AND_SACK, &SctpOptions::default()).unwrap();
        let header = packet.common_header();
        assert_eq!(header.source_port, 1234);
        assert_eq!(header.destination_port, 4321);
        assert_eq!(header.verification_tag, VerificationTag(0x697e_3a4e));
        assert_eq!(header.checksum, 0xc06e_8b36);

        let descriptors = packet.descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].chunk_type, 11);
        assert_eq!(descriptors[0].to_debug_string(), "COOKIE-ACK");
        match descriptors[1].parse() {
            Some(Chunk::Sack(sack)) => {
                assert_eq!(sack.cumulative_tsn_ack, Tsn(0xaea9_5252));
                assert_eq!(sack.a_rwnd, 131072);
            }
            other => panic!("unexpected chunk {:?}", other),
        }
    }

    #[test]
    fn test_build_reproduces_capture() {
        let packet = SctpPacket::parse(&COOKIE_ACK_AND_SACK, &SctpOptions::default()).unwrap();
        let sack = SackChunk::parse(&packet.descriptors()[1].data).unwrap();

        let mut builder = SctpPacketBuilder::new(VerificationTag(0x697e_3a4e), &capture_options());
        builder.add(&CookieAckChunk).add(&sack);
        assert_eq!(&builder.build()[..], &COOKIE_ACK_AND_SACK);
    }

    #[test]
    fn test_invalid_checksum() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("brivas_sctp=debug")
            .with_test_writer()
            .try_init();

        let err = SctpPacket::parse(&SACK_WITH_BAD_CHECKSUM, &SctpOptions::default()).unwrap_err();
        assert!(matches!(err, PacketError::InvalidChecksum { .. }));

        let lenient = SctpOptions {
            disable_checksum_verification: true,
            ..Default::default()
        };
        let packet = SctpPacket::parse(&SACK_WITH_BAD_CHECKSUM, &lenient).unwrap();
        assert_eq!(packet.common_header().source_port, 5000);
        assert_eq!(packet.descriptors().len(), 1);
        assert!(matches!(packet.descriptors()[0].parse(), Some(Chunk::Sack(_))));
    }

    #[test]
    fn test_size_bounds() {
        let options = SctpOptions::default();
        assert_eq!(
            SctpPacket::parse(&COOKIE_ACK_AND_SACK[..15], &options).unwrap_err(),
            PacketError::PacketTooSmall(15)
        );
        let huge = vec![0u8; 65536];
        assert_eq!(
            SctpPacket::parse(&huge, &options).unwrap_err(),
            PacketError::PacketTooLarge(65536)
        );
    }

    #[test]
    fn test_chunk_bounds() {
        let options = SctpOptions {
            disable_checksum_verification: true,
            ..Default::default()
        };

        // SACK cut in half: declared length runs past the packet
        let err = SctpPacket::parse(&COOKIE_ACK_AND_SACK[..24], &options).unwrap_err();
        assert_eq!(err, PacketError::ChunkTooLarge { offset: 16, length: 16 });

        // Two stray bytes after the last chunk
        let mut trailing = COOKIE_ACK_AND_SACK.to_vec();
        trailing.extend_from_slice(&[0, 0]);
        let err = SctpPacket::parse(&trailing, &options).unwrap_err();
        assert_eq!(err, PacketError::ChunkTooSmall { offset: 32 });

        // Zero chunk length must not loop forever
        let mut zero = COOKIE_ACK_AND_SACK[..16].to_vec();
        zero[15] = 0;
        let err = SctpPacket::parse(&zero, &options).unwrap_err();
        assert_eq!(err, PacketError::ChunkTooSmall { offset: 12 });
    }

    #[test]
    fn test_builder_bookkeeping() {
        let options = SctpOptions {
            mtu: 1191,
            ..Default::default()
        };
        let mut builder = SctpPacketBuilder::new(VerificationTag(1), &options);
        assert_eq!(builder.max_packet_size(), 1188);
        assert!(builder.is_empty());
        assert_eq!(builder.bytes_remaining(), 1188 - 12);
        assert!(builder.build().is_empty());

        builder.add(&DataChunk {
            tsn: Tsn(1),
            stream_id: StreamId(1),
            ppid: Ppid(53),
            payload: Bytes::from_static(b"abc"),
            is_beginning: true,
            is_end: true,
            ..Default::default()
        });
        // 12 + 16 + 3, padded
        assert_eq!(builder.bytes_remaining(), 1188 - 32);

        let packet = builder.build();
        assert_eq!(packet.len(), 32);
        assert!(builder.is_empty());

        let parsed = SctpPacket::parse(&packet, &options).unwrap();
        match parsed.descriptors()[0].parse() {
            Some(Chunk::Data(data)) => assert_eq!(&data.payload[..], b"abc"),
            other => panic!("unexpected chunk {:?}", other),
        }
    }

    #[test]
    fn test_builder_without_checksum() {
        let mut builder = SctpPacketBuilder::new(VerificationTag(7), &SctpOptions::default());
        builder.write_checksum(false).add(&CookieAckChunk);
        let packet = builder.build();
        assert_eq!(&packet[8..12], &[0, 0, 0, 0]);
        assert!(SctpPacket::parse(&packet, &SctpOptions::default()).is_err());
    }
}
