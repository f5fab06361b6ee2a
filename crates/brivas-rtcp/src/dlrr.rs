//! Delay Since Last Receiver Report block (RFC 3611 §4.5)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     BT=5      |   reserved    |         block length          |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! |                 SSRC_1 (SSRC of first receiver)               | sub-
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+ block
//! |                         last RR (LRR)                         |   1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   delay since last RR (DLRR)                  |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! ```

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One DLRR sub-block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReceiveTimeInfo {
    pub ssrc: u32,
    pub last_rr: u32,
    pub delay_since_last_rr: u32,
}

impl ReceiveTimeInfo {
    pub fn new(ssrc: u32, last_rr: u32, delay_since_last_rr: u32) -> Self {
        Self {
            ssrc,
            last_rr,
            delay_since_last_rr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dlrr {
    sub_blocks: Vec<ReceiveTimeInfo>,
}

impl Dlrr {
    pub const BLOCK_TYPE: u8 = 5;
    const BLOCK_HEADER_LENGTH: usize = 4;
    const SUB_BLOCK_LENGTH: usize = 12;

    /// Parse a block whose length field, in 32-bit words, is
    /// `block_length_32bits`. `buffer` spans the whole block.
    pub fn parse(buffer: &[u8], block_length_32bits: u16) -> Option<Self> {
        debug_assert_eq!(buffer[0], Self::BLOCK_TYPE);
        if block_length_32bits % 3 != 0 {
            warn!(
                "Invalid size for dlrr block: {} words",
                block_length_32bits
            );
            return None;
        }
        let blocks_count = usize::from(block_length_32bits / 3);
        let body = &buffer[Self::BLOCK_HEADER_LENGTH..];
        debug_assert!(body.len() >= blocks_count * Self::SUB_BLOCK_LENGTH);

        let sub_blocks = body
            .chunks_exact(Self::SUB_BLOCK_LENGTH)
            .take(blocks_count)
            .map(|mut block| ReceiveTimeInfo {
                ssrc: block.get_u32(),
                last_rr: block.get_u32(),
                delay_since_last_rr: block.get_u32(),
            })
            .collect();
        Some(Self { sub_blocks })
    }

    /// Serialized size; an empty block is omitted entirely.
    pub fn block_length(&self) -> usize {
        if self.sub_blocks.is_empty() {
            return 0;
        }
        Self::BLOCK_HEADER_LENGTH + Self::SUB_BLOCK_LENGTH * self.sub_blocks.len()
    }

    pub fn create(&self, mut buffer: &mut [u8]) {
        if self.sub_blocks.is_empty() {
            return;
        }
        buffer.put_u8(Self::BLOCK_TYPE);
        buffer.put_u8(0);
        buffer.put_u16((3 * self.sub_blocks.len()) as u16);
        for sub_block in &self.sub_blocks {
            buffer.put_u32(sub_block.ssrc);
            buffer.put_u32(sub_block.last_rr);
            buffer.put_u32(sub_block.delay_since_last_rr);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sub_blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.sub_blocks.clear();
    }

    pub fn add_dlrr_item(&mut self, time_info: ReceiveTimeInfo) {
        self.sub_blocks.push(time_info);
    }

    pub fn sub_blocks(&self) -> &[ReceiveTimeInfo] {
        &self.sub_blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: [u8; 28] = [
        0x05, 0x00, 0x00, 0x06, 0x12, 0x34, 0x56, 0x78, 0x23, 0x45, 0x67, 0x89, 0x34, 0x56,
        0x78, 0x9a, 0x45, 0x67, 0x89, 0xab, 0x56, 0x78, 0x9a, 0xbc, 0x67, 0x89, 0xab, 0xcd,
    ];

    fn dlrr() -> Dlrr {
        let mut dlrr = Dlrr::default();
        dlrr.add_dlrr_item(ReceiveTimeInfo::new(0x1234_5678, 0x2345_6789, 0x3456_789a));
        dlrr.add_dlrr_item(ReceiveTimeInfo::new(0x4567_89ab, 0x5678_9abc, 0x6789_abcd));
        dlrr
    }

    #[test]
    fn test_empty_block_is_omitted() {
        let dlrr = Dlrr::default();
        assert_eq!(dlrr.block_length(), 0);
        let mut buffer = [0xffu8; 4];
        dlrr.create(&mut buffer);
        assert_eq!(buffer, [0xff; 4]);
    }

    #[test]
    fn test_create_and_parse() {
        let dlrr = dlrr();
        assert_eq!(dlrr.block_length(), BLOCK.len());
        let mut buffer = [0u8; 28];
        dlrr.create(&mut buffer);
        assert_eq!(buffer, BLOCK);

        assert_eq!(Dlrr::parse(&BLOCK, 6), Some(dlrr));
    }

    #[test]
    fn test_rejects_partial_sub_block() {
        assert!(Dlrr::parse(&BLOCK[..24], 5).is_none());
    }
}
