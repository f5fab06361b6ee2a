//! Extended Reports (RFC 3611)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|reserved |   PT=XR=207   |             length            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                              SSRC                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! :                         report blocks                         :
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Only RRTR and DLRR blocks are understood; other block types are skipped.

use crate::common_header::CommonHeader;
use crate::dlrr::{Dlrr, ReceiveTimeInfo};
use crate::rrtr::Rrtr;
use crate::rtcp_packet::{
    create_header, header_length, reserve, PacketReadyCallback, RtcpPacket, HEADER_LENGTH,
};
use bytes::{Buf, BufMut};
use tracing::{debug, warn};

const XR_BASE_LENGTH: usize = 4;
const BLOCK_HEADER_SIZE_BYTES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtendedReports {
    sender_ssrc: u32,
    rrtr_block: Option<Rrtr>,
    dlrr_block: Dlrr,
}

impl ExtendedReports {
    pub const PACKET_TYPE: u8 = 207;
    pub const MAX_NUMBER_OF_DLRR_ITEMS: usize = 50;

    pub fn new(sender_ssrc: u32) -> Self {
        Self {
            sender_ssrc,
            ..Default::default()
        }
    }

    /// Parse a packet whose header was already validated.
    pub fn parse(packet: &CommonHeader<'_>) -> Option<Self> {
        debug_assert_eq!(packet.packet_type(), Self::PACKET_TYPE);

        let payload = packet.payload();
        if payload.len() < XR_BASE_LENGTH {
            warn!(
                "Packet is too small to be an ExtendedReports packet: {} bytes",
                payload.len()
            );
            return None;
        }

        let mut xr = Self::new((&payload[..XR_BASE_LENGTH]).get_u32());
        let mut current_block = XR_BASE_LENGTH;
        while current_block + BLOCK_HEADER_SIZE_BYTES <= payload.len() {
            let mut block_header = &payload[current_block..current_block + BLOCK_HEADER_SIZE_BYTES];
            let block_type = block_header.get_u8();
            block_header.advance(1);
            let block_length = block_header.get_u16();
            let next_block =
                current_block + BLOCK_HEADER_SIZE_BYTES + usize::from(block_length) * 4;
            if next_block > payload.len() {
                warn!(
                    "Report block in extended report packet is too big: {} bytes at offset {}",
                    next_block - current_block,
                    current_block
                );
                return None;
            }

            let block = &payload[current_block..next_block];
            match block_type {
                Rrtr::BLOCK_TYPE => xr.parse_rrtr_block(block, block_length),
                Dlrr::BLOCK_TYPE => xr.parse_dlrr_block(block, block_length),
                _ => debug!("Skipping unknown extended report block type {}", block_type),
            }
            current_block = next_block;
        }

        Some(xr)
    }

    fn parse_rrtr_block(&mut self, block: &[u8], block_length: u16) {
        if block_length != Rrtr::BLOCK_LENGTH {
            warn!(
                "Incorrect rrtr block size {}, should be {}",
                block_length,
                Rrtr::BLOCK_LENGTH
            );
            return;
        }
        if self.rrtr_block.is_some() {
            warn!("Two rrtr blocks found in same extended report packet");
            return;
        }
        self.rrtr_block = Some(Rrtr::parse(block));
    }

    fn parse_dlrr_block(&mut self, block: &[u8], block_length: u16) {
        if !self.dlrr_block.is_empty() {
            warn!("Two dlrr blocks found in same extended report packet");
            return;
        }
        if let Some(dlrr) = Dlrr::parse(block, block_length) {
            self.dlrr_block = dlrr;
        }
    }

    pub fn sender_ssrc(&self) -> u32 {
        self.sender_ssrc
    }

    pub fn set_sender_ssrc(&mut self, ssrc: u32) {
        self.sender_ssrc = ssrc;
    }

    pub fn set_rrtr(&mut self, rrtr: Rrtr) {
        if self.rrtr_block.is_some() {
            warn!("Rrtr already set, overwriting");
        }
        self.rrtr_block = Some(rrtr);
    }

    /// Add a DLRR sub-block. Returns `false`, leaving the report unchanged,
    /// once [`MAX_NUMBER_OF_DLRR_ITEMS`](Self::MAX_NUMBER_OF_DLRR_ITEMS) are
    /// present.
    pub fn add_dlrr_item(&mut self, time_info: ReceiveTimeInfo) -> bool {
        if self.dlrr_block.sub_blocks().len() >= Self::MAX_NUMBER_OF_DLRR_ITEMS {
            warn!(
                "Reached maximum number of DLRR items: {}",
                Self::MAX_NUMBER_OF_DLRR_ITEMS
            );
            return false;
        }
        self.dlrr_block.add_dlrr_item(time_info);
        true
    }

    pub fn rrtr(&self) -> Option<&Rrtr> {
        self.rrtr_block.as_ref()
    }

    pub fn dlrr(&self) -> &Dlrr {
        &self.dlrr_block
    }

    fn rrtr_length(&self) -> usize {
        if self.rrtr_block.is_some() {
            Rrtr::LENGTH
        } else {
            0
        }
    }
}

impl RtcpPacket for ExtendedReports {
    fn block_length(&self) -> usize {
        HEADER_LENGTH + XR_BASE_LENGTH + self.rrtr_length() + self.dlrr_block.block_length()
    }

    fn create(
        &self,
        packet: &mut [u8],
        index: &mut usize,
        max_length: usize,
        callback: &mut PacketReadyCallback<'_>,
    ) -> bool {
        if !reserve(self.block_length(), packet, index, max_length, callback) {
            return false;
        }
        let index_end = *index + self.block_length();
        const RESERVED: u8 = 0;
        create_header(
            RESERVED,
            Self::PACKET_TYPE,
            header_length(self.block_length()),
            packet,
            index,
        );
        (&mut packet[*index..]).put_u32(self.sender_ssrc);
        *index += XR_BASE_LENGTH;
        if let Some(rrtr) = &self.rrtr_block {
            rrtr.create(&mut packet[*index..]);
            *index += Rrtr::LENGTH;
        }
        self.dlrr_block.create(&mut packet[*index..]);
        *index += self.dlrr_block.block_length();
        debug_assert_eq!(*index, index_end);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rrtr::NtpTime;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const SENDER_SSRC: u32 = 0x1234_5678;
    const EMPTY_PACKET: [u8; 8] = [0x80, 207, 0x00, 0x01, 0x12, 0x34, 0x56, 0x78];

    fn parse(data: &[u8]) -> Option<ExtendedReports> {
        ExtendedReports::parse(&CommonHeader::parse(data)?)
    }

    fn random_time_info(rng: &mut StdRng) -> ReceiveTimeInfo {
        ReceiveTimeInfo::new(rng.gen(), rng.gen(), rng.gen())
    }

    fn random_rrtr(rng: &mut StdRng) -> Rrtr {
        Rrtr::new(NtpTime::new(rng.gen(), rng.gen()))
    }

    #[test]
    fn test_create_without_report_blocks() {
        let xr = ExtendedReports::new(SENDER_SSRC);
        assert_eq!(&xr.build()[..], &EMPTY_PACKET);
    }

    #[test]
    fn test_parse_without_report_blocks() {
        let parsed = parse(&EMPTY_PACKET).unwrap();
        assert_eq!(parsed.sender_ssrc(), SENDER_SSRC);
        assert!(parsed.rrtr().is_none());
        assert!(parsed.dlrr().is_empty());
    }

    #[test]
    fn test_with_rrtr_block() {
        let mut rng = StdRng::seed_from_u64(0x1_2345_6789);
        let rrtr = random_rrtr(&mut rng);
        let mut xr = ExtendedReports::new(SENDER_SSRC);
        xr.set_rrtr(rrtr);

        let parsed = parse(&xr.build()).unwrap();
        assert_eq!(parsed.sender_ssrc(), SENDER_SSRC);
        assert_eq!(parsed.rrtr(), Some(&rrtr));
    }

    #[test]
    fn test_with_dlrr_sub_blocks() {
        let mut rng = StdRng::seed_from_u64(0x1_2345_6789);
        let first = random_time_info(&mut rng);
        let second = random_time_info(&mut rng);

        let mut xr = ExtendedReports::new(SENDER_SSRC);
        assert!(xr.add_dlrr_item(first));
        let parsed = parse(&xr.build()).unwrap();
        assert_eq!(parsed.dlrr().sub_blocks(), &[first]);

        assert!(xr.add_dlrr_item(second));
        let parsed = parse(&xr.build()).unwrap();
        assert_eq!(parsed.dlrr().sub_blocks(), &[first, second]);
    }

    #[test]
    fn test_limits_the_number_of_dlrr_sub_blocks() {
        let mut rng = StdRng::seed_from_u64(0x1_2345_6789);
        let time_info = random_time_info(&mut rng);
        let mut xr = ExtendedReports::default();

        for _ in 0..ExtendedReports::MAX_NUMBER_OF_DLRR_ITEMS {
            assert!(xr.add_dlrr_item(time_info));
        }
        assert!(!xr.add_dlrr_item(time_info));
        assert_eq!(
            xr.dlrr().sub_blocks().len(),
            ExtendedReports::MAX_NUMBER_OF_DLRR_ITEMS
        );
    }

    #[test]
    fn test_with_maximum_report_blocks() {
        let mut rng = StdRng::seed_from_u64(0x1_2345_6789);
        let rrtr = random_rrtr(&mut rng);
        let mut xr = ExtendedReports::new(SENDER_SSRC);
        xr.set_rrtr(rrtr);
        for _ in 0..ExtendedReports::MAX_NUMBER_OF_DLRR_ITEMS {
            xr.add_dlrr_item(random_time_info(&mut rng));
        }

        let packet = xr.build();
        assert_eq!(packet.len(), 4 + 4 + 12 + 4 + 12 * 50);
        let parsed = parse(&packet).unwrap();
        assert_eq!(parsed, xr);
    }

    #[test]
    fn test_skips_unknown_and_duplicate_blocks() {
        let mut data = vec![0x80, 207, 0x00, 0x00, 0x12, 0x34, 0x56, 0x78];
        // Unknown block type 42 with one word of content
        data.extend_from_slice(&[42, 0, 0, 1, 0xde, 0xad, 0xbe, 0xef]);
        // Two RRTR blocks; only the first counts
        data.extend_from_slice(&[4, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 2]);
        data.extend_from_slice(&[4, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4]);
        // RRTR with a wrong length is ignored
        data.extend_from_slice(&[4, 0, 0, 1, 0, 0, 0, 5]);
        // Two DLRR blocks; only the first counts
        data.extend_from_slice(&[5, 0, 0, 3, 0, 0, 0, 9, 0, 0, 0, 8, 0, 0, 0, 7]);
        data.extend_from_slice(&[5, 0, 0, 3, 0, 0, 0, 6, 0, 0, 0, 5, 0, 0, 0, 4]);
        let words = (data.len() - 4) / 4;
        data[3] = words as u8;

        let parsed = parse(&data).unwrap();
        assert_eq!(parsed.rrtr().map(|r| r.ntp()), Some(NtpTime::new(1, 2)));
        assert_eq!(parsed.dlrr().sub_blocks(), &[ReceiveTimeInfo::new(9, 8, 7)]);
    }

    #[test]
    fn test_block_past_end_fails() {
        let data = [0x80, 207, 0x00, 0x02, 0x12, 0x34, 0x56, 0x78, 5, 0, 0, 3];
        assert!(parse(&data).is_none());
    }

    #[test]
    fn test_dlrr_with_partial_sub_block_is_ignored() {
        let data = [
            0x80, 207, 0x00, 0x04, 0x12, 0x34, 0x56, 0x78, 5, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 2,
        ];
        let parsed = parse(&data).unwrap();
        assert!(parsed.dlrr().is_empty());
    }
}
