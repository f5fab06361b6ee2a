//! SACK chunk (RFC 4960 §3.3.4)

use super::{chunk_type, ChunkConfig};
use crate::packet::{Tlv, TlvRecord};
use crate::types::Tsn;
use bytes::BytesMut;
use std::fmt;
use tracing::debug;

const GAP_ACK_BLOCK_SIZE: usize = 4;
const DUP_TSN_SIZE: usize = 4;

/// Received TSN range, as offsets from the cumulative TSN ack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapAckBlock {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SackChunk {
    pub cumulative_tsn_ack: Tsn,
    pub a_rwnd: u32,
    pub gap_ack_blocks: Vec<GapAckBlock>,
    pub duplicate_tsns: Vec<Tsn>,
}

impl Tlv for SackChunk {
    const TYPE: u16 = chunk_type::SACK as u16;
    const HEADER_SIZE: usize = 16;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 4;
    const TYPE_SIZE_IN_BYTES: usize = ChunkConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for SackChunk {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        let nbr_gap_blocks = usize::from(reader.load16(12));
        let nbr_dup_tsns = usize::from(reader.load16(14));
        if reader.variable_data_size()
            != nbr_gap_blocks * GAP_ACK_BLOCK_SIZE + nbr_dup_tsns * DUP_TSN_SIZE
        {
            debug!(
                "SACK: {} gap blocks and {} dup tsns do not fit {} bytes",
                nbr_gap_blocks,
                nbr_dup_tsns,
                reader.variable_data_size()
            );
            return None;
        }

        let mut offset = 0;
        let mut gap_ack_blocks = Vec::with_capacity(nbr_gap_blocks);
        for _ in 0..nbr_gap_blocks {
            let block = reader.sub_reader(offset, GAP_ACK_BLOCK_SIZE)?;
            gap_ack_blocks.push(GapAckBlock {
                start: block.load16(0),
                end: block.load16(2),
            });
            offset += GAP_ACK_BLOCK_SIZE;
        }

        let mut duplicate_tsns = Vec::with_capacity(nbr_dup_tsns);
        for _ in 0..nbr_dup_tsns {
            let tsn = reader.sub_reader(offset, DUP_TSN_SIZE)?;
            duplicate_tsns.push(Tsn(tsn.load32(0)));
            offset += DUP_TSN_SIZE;
        }

        Some(Self {
            cumulative_tsn_ack: Tsn(reader.load32(4)),
            a_rwnd: reader.load32(8),
            gap_ack_blocks,
            duplicate_tsns,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let variable_length = self.gap_ack_blocks.len() * GAP_ACK_BLOCK_SIZE
            + self.duplicate_tsns.len() * DUP_TSN_SIZE;
        let mut writer = Self::allocate_tlv(out, variable_length);
        writer.store32(4, self.cumulative_tsn_ack.0);
        writer.store32(8, self.a_rwnd);
        writer.store16(12, self.gap_ack_blocks.len() as u16);
        writer.store16(14, self.duplicate_tsns.len() as u16);

        let mut offset = 0;
        for block in &self.gap_ack_blocks {
            let mut sub = writer.sub_writer(offset, GAP_ACK_BLOCK_SIZE);
            sub.store16(0, block.start);
            sub.store16(2, block.end);
            offset += GAP_ACK_BLOCK_SIZE;
        }
        for tsn in &self.duplicate_tsns {
            writer.sub_writer(offset, DUP_TSN_SIZE).store32(0, tsn.0);
            offset += DUP_TSN_SIZE;
        }
    }
}

impl fmt::Display for SackChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SACK, cum_ack_tsn={}, a_rwnd={}",
            self.cumulative_tsn_ack.0, self.a_rwnd
        )?;
        for block in &self.gap_ack_blocks {
            let first = self.cumulative_tsn_ack.0.wrapping_add(u32::from(block.start));
            let last = self.cumulative_tsn_ack.0.wrapping_add(u32::from(block.end));
            write!(f, ", gap={}--{}", first, last)?;
        }
        if !self.duplicate_tsns.is_empty() {
            let dups: Vec<String> = self.duplicate_tsns.iter().map(|t| t.0.to_string()).collect();
            write!(f, ", dup_tsns={}", dups.join(","))?;
        }
        Ok(())
    }
}
