//! RTCP common header (RFC 3550 §6.4.1)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|   C/F   |      PT       |             length            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use bytes::Buf;
use tracing::warn;

const VERSION: u8 = 2;

/// A validated RTCP packet inside a (possibly compound) buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonHeader<'a> {
    count_or_format: u8,
    packet_type: u8,
    padding_size: u8,
    payload: &'a [u8],
    packet_size: usize,
}

impl<'a> CommonHeader<'a> {
    pub const HEADER_SIZE: usize = 4;

    /// Parse the first packet in `buffer`. The payload excludes padding.
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < Self::HEADER_SIZE {
            warn!(
                "Too little data ({} bytes) remaining in buffer to parse RTCP header",
                buffer.len()
            );
            return None;
        }

        let mut header = &buffer[..Self::HEADER_SIZE];
        let first = header.get_u8();
        let version = first >> 6;
        if version != VERSION {
            warn!("Invalid RTCP header: version must be {} but was {}", VERSION, version);
            return None;
        }
        let has_padding = first & 0x20 != 0;
        let count_or_format = first & 0x1f;
        let packet_type = header.get_u8();
        let mut payload_size = usize::from(header.get_u16()) * 4;

        if buffer.len() < Self::HEADER_SIZE + payload_size {
            warn!(
                "Buffer too small ({} bytes) to fit an RTCP packet with a header and {} bytes",
                buffer.len(),
                payload_size
            );
            return None;
        }
        let packet_size = Self::HEADER_SIZE + payload_size;

        let mut padding_size = 0;
        if has_padding {
            if payload_size == 0 {
                warn!("Invalid RTCP header: padding bit set but 0 size specified");
                return None;
            }
            padding_size = buffer[Self::HEADER_SIZE + payload_size - 1];
            if padding_size == 0 {
                warn!("Invalid RTCP header: padding bit set but 0 padding size specified");
                return None;
            }
            if usize::from(padding_size) > payload_size {
                warn!(
                    "Invalid RTCP header: too many padding bytes ({}) for a packet payload size of {} bytes",
                    padding_size, payload_size
                );
                return None;
            }
            payload_size -= usize::from(padding_size);
        }

        Some(Self {
            count_or_format,
            packet_type,
            padding_size,
            payload: &buffer[Self::HEADER_SIZE..Self::HEADER_SIZE + payload_size],
            packet_size,
        })
    }

    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    /// Report count, for packet types that use the field that way
    pub fn count(&self) -> u8 {
        self.count_or_format
    }

    /// Feedback message type, for RTPFB/PSFB packets
    pub fn fmt(&self) -> u8 {
        self.count_or_format
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn payload_size_bytes(&self) -> usize {
        self.payload.len()
    }

    pub fn padding_size(&self) -> u8 {
        self.padding_size
    }

    /// Header, payload and padding
    pub fn packet_size(&self) -> usize {
        self.packet_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_small_buffer() {
        assert!(CommonHeader::parse(&[0x80, 0x00, 0x00]).is_none());
    }

    #[test]
    fn test_version() {
        // Version 2 with empty payload
        let mut data = [0x80, 0x00, 0x00, 0x00];
        let header = CommonHeader::parse(&data).unwrap();
        assert_eq!(header.payload_size_bytes(), 0);

        data[0] = 0x40;
        assert!(CommonHeader::parse(&data).is_none());
    }

    #[test]
    fn test_packet_size() {
        let data = [0x8f, 205, 0x00, 0x02, 0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];
        assert!(CommonHeader::parse(&data[..11]).is_none());

        let header = CommonHeader::parse(&data).unwrap();
        assert_eq!(header.packet_type(), 205);
        assert_eq!(header.fmt(), 15);
        assert_eq!(header.payload(), &data[4..]);
        assert_eq!(header.packet_size(), 12);
    }

    #[test]
    fn test_padding_and_payload_size() {
        // Padding bit set with no payload
        let mut data = [0xa0, 0x00, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(CommonHeader::parse(&data).is_none());

        // Padding size byte of zero
        data[3] = 2;
        assert!(CommonHeader::parse(&data).is_none());

        // More padding than payload
        data[11] = 9;
        assert!(CommonHeader::parse(&data).is_none());

        data[11] = 3;
        let header = CommonHeader::parse(&data).unwrap();
        assert_eq!(header.payload_size_bytes(), 5);
        assert_eq!(header.padding_size(), 3);
        assert_eq!(header.packet_size(), 12);

        data[11] = 8;
        let header = CommonHeader::parse(&data).unwrap();
        assert_eq!(header.payload_size_bytes(), 0);
    }
}
