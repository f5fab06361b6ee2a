//! Several RTCP packets sent back to back (RFC 3550 §6.1)

use crate::rtcp_packet::{PacketReadyCallback, RtcpPacket};

#[derive(Default)]
pub struct CompoundPacket {
    appended_packets: Vec<Box<dyn RtcpPacket>>,
}

impl CompoundPacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, packet: Box<dyn RtcpPacket>) {
        self.appended_packets.push(packet);
    }

    pub fn len(&self) -> usize {
        self.appended_packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appended_packets.is_empty()
    }
}

impl RtcpPacket for CompoundPacket {
    fn block_length(&self) -> usize {
        self.appended_packets.iter().map(|p| p.block_length()).sum()
    }

    fn create(
        &self,
        packet: &mut [u8],
        index: &mut usize,
        max_length: usize,
        callback: &mut PacketReadyCallback<'_>,
    ) -> bool {
        for appended in &self.appended_packets {
            if !appended.create(packet, index, max_length, callback) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_header::CommonHeader;
    use crate::dlrr::ReceiveTimeInfo;
    use crate::extended_reports::ExtendedReports;
    use crate::tmmb_item::TmmbItem;
    use crate::tmmbn::Tmmbn;
    use crate::tmmbr::Tmmbr;

    fn compound() -> CompoundPacket {
        let mut tmmbn = Tmmbn::new(1);
        tmmbn.add_tmmbr(TmmbItem::new(2, 100_000, 40));
        let mut xr = ExtendedReports::new(1);
        xr.add_dlrr_item(ReceiveTimeInfo::new(2, 3, 4));
        let mut tmmbr = Tmmbr::new(1);
        tmmbr.add_tmmbr(TmmbItem::new(3, 200_000, 40));

        let mut compound = CompoundPacket::new();
        compound.append(Box::new(tmmbn));
        compound.append(Box::new(xr));
        compound.append(Box::new(tmmbr));
        compound
    }

    #[test]
    fn test_build_concatenates() {
        let compound = compound();
        assert_eq!(compound.len(), 3);
        assert_eq!(compound.block_length(), 20 + 24 + 20);

        let packet = compound.build();
        let mut types = Vec::new();
        let mut rest = &packet[..];
        while !rest.is_empty() {
            let header = CommonHeader::parse(rest).unwrap();
            types.push((header.packet_type(), header.fmt()));
            rest = &rest[header.packet_size()..];
        }
        assert_eq!(types, vec![(205, 4), (207, 0), (205, 3)]);
    }

    #[test]
    fn test_build_splits_when_buffer_is_full() {
        let compound = compound();
        let mut sizes = Vec::new();
        assert!(compound.build_with(50, &mut |packet: &[u8]| sizes.push(packet.len())));
        assert_eq!(sizes, vec![44, 20]);
    }

    #[test]
    fn test_build_fails_when_a_packet_never_fits() {
        let compound = compound();
        let mut calls = 0;
        assert!(!compound.build_with(16, &mut |_: &[u8]| calls += 1));
        assert_eq!(calls, 0);
    }
}
