//! Temporary Maximum Media Stream Bit Rate Notification (RFC 5104 §4.2.2)

use crate::common_header::CommonHeader;
use crate::rtcp_packet::{
    create_header, header_length, reserve, PacketReadyCallback, RtcpPacket, HEADER_LENGTH,
};
use crate::rtpfb::{self, COMMON_FEEDBACK_LENGTH};
use crate::tmmb_item::TmmbItem;
use tracing::warn;

/// TMMBN: the bounding set of TMMBR tuples the sender currently honors.
///
/// The media SSRC field of the feedback header is unused for TMMBN and is
/// always written as zero, so the type does not carry it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tmmbn {
    sender_ssrc: u32,
    items: Vec<TmmbItem>,
}

impl Tmmbn {
    pub const FEEDBACK_MESSAGE_TYPE: u8 = 4;

    pub fn new(sender_ssrc: u32) -> Self {
        Self {
            sender_ssrc,
            items: Vec::new(),
        }
    }

    /// Parse a packet whose header was already validated.
    pub fn parse(packet: &CommonHeader<'_>) -> Option<Self> {
        debug_assert_eq!(packet.packet_type(), rtpfb::PACKET_TYPE);
        debug_assert_eq!(packet.fmt(), Self::FEEDBACK_MESSAGE_TYPE);

        let payload = packet.payload();
        if payload.len() < COMMON_FEEDBACK_LENGTH {
            warn!(
                "Payload length {} is too small for a TMMBN",
                payload.len()
            );
            return None;
        }
        let items_size_bytes = payload.len() - COMMON_FEEDBACK_LENGTH;
        if items_size_bytes % TmmbItem::LENGTH != 0 {
            warn!(
                "Payload length {} is not valid for a TMMBN",
                payload.len()
            );
            return None;
        }

        let (sender_ssrc, _media_ssrc) = rtpfb::parse_common_feedback(payload);
        let items = payload[COMMON_FEEDBACK_LENGTH..]
            .chunks_exact(TmmbItem::LENGTH)
            .map(TmmbItem::parse)
            .collect::<Option<Vec<_>>>()?;

        Some(Self { sender_ssrc, items })
    }

    pub fn sender_ssrc(&self) -> u32 {
        self.sender_ssrc
    }

    pub fn set_sender_ssrc(&mut self, ssrc: u32) {
        self.sender_ssrc = ssrc;
    }

    pub fn add_tmmbr(&mut self, item: TmmbItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[TmmbItem] {
        &self.items
    }
}

impl RtcpPacket for Tmmbn {
    fn block_length(&self) -> usize {
        HEADER_LENGTH + COMMON_FEEDBACK_LENGTH + TmmbItem::LENGTH * self.items.len()
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
        create_header(
            Self::FEEDBACK_MESSAGE_TYPE,
            rtpfb::PACKET_TYPE,
            header_length(self.block_length()),
            packet,
            index,
        );
        rtpfb::create_common_feedback(self.sender_ssrc, 0, &mut packet[*index..]);
        *index += COMMON_FEEDBACK_LENGTH;
        for item in &self.items {
            item.create(&mut packet[*index..]);
            *index += TmmbItem::LENGTH;
        }
        debug_assert_eq!(*index, index_end);
        true
    }
}
