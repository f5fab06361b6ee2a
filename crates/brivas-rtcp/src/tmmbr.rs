//! Temporary Maximum Media Stream Bit Rate Request (RFC 5104 §4.2.1)

use crate::common_header::CommonHeader;
use crate::rtcp_packet::{
    create_header, header_length, reserve, PacketReadyCallback, RtcpPacket, HEADER_LENGTH,
};
use crate::rtpfb::{self, COMMON_FEEDBACK_LENGTH};
use crate::tmmb_item::TmmbItem;
use tracing::warn;

/// TMMBR: asks media senders to cap their bitrate. Carries at least one item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tmmbr {
    sender_ssrc: u32,
    requests: Vec<TmmbItem>,
}

impl Tmmbr {
    pub const FEEDBACK_MESSAGE_TYPE: u8 = 3;

    pub fn new(sender_ssrc: u32) -> Self {
        Self {
            sender_ssrc,
            requests: Vec::new(),
        }
    }

    /// Parse a packet whose header was already validated.
    pub fn parse(packet: &CommonHeader<'_>) -> Option<Self> {
        debug_assert_eq!(packet.packet_type(), rtpfb::PACKET_TYPE);
        debug_assert_eq!(packet.fmt(), Self::FEEDBACK_MESSAGE_TYPE);

        let payload = packet.payload();
        if payload.len() < COMMON_FEEDBACK_LENGTH + TmmbItem::LENGTH {
            warn!("Payload length {} is too small for a TMMBR", payload.len());
            return None;
        }
        let items_size_bytes = payload.len() - COMMON_FEEDBACK_LENGTH;
        if items_size_bytes % TmmbItem::LENGTH != 0 {
            warn!("Payload length {} is not valid for a TMMBR", payload.len());
            return None;
        }

        let (sender_ssrc, _media_ssrc) = rtpfb::parse_common_feedback(payload);
        let requests = payload[COMMON_FEEDBACK_LENGTH..]
            .chunks_exact(TmmbItem::LENGTH)
            .map(TmmbItem::parse)
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            sender_ssrc,
            requests,
        })
    }

    pub fn sender_ssrc(&self) -> u32 {
        self.sender_ssrc
    }

    pub fn add_tmmbr(&mut self, item: TmmbItem) {
        self.requests.push(item);
    }

    pub fn requests(&self) -> &[TmmbItem] {
        &self.requests
    }
}

impl RtcpPacket for Tmmbr {
    fn block_length(&self) -> usize {
        HEADER_LENGTH + COMMON_FEEDBACK_LENGTH + TmmbItem::LENGTH * self.requests.len()
    }

    fn create(
        &self,
        packet: &mut [u8],
        index: &mut usize,
        max_length: usize,
        callback: &mut PacketReadyCallback<'_>,
    ) -> bool {
        debug_assert!(!self.requests.is_empty(), "TMMBR needs at least one request");
        if !reserve(self.block_length(), packet, index, max_length, callback) {
            return false;
        }
        create_header(
            Self::FEEDBACK_MESSAGE_TYPE,
            rtpfb::PACKET_TYPE,
            header_length(self.block_length()),
            packet,
            index,
        );
        rtpfb::create_common_feedback(self.sender_ssrc, 0, &mut packet[*index..]);
        *index += COMMON_FEEDBACK_LENGTH;
        for request in &self.requests {
            request.create(&mut packet[*index..]);
            *index += TmmbItem::LENGTH;
        }
        true
    }
}
