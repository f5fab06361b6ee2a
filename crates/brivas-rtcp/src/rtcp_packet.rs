//! Serialization shared by all RTCP packet types

use bytes::{BufMut, Bytes};

/// Largest buffer [`RtcpPacket::build_with`] fills before handing it off
pub const IP_PACKET_SIZE: usize = 1500;

/// RTCP header length in bytes
pub const HEADER_LENGTH: usize = 4;

const VERSION_BITS: u8 = 2 << 6;

/// Receives each filled buffer when a packet is split
pub type PacketReadyCallback<'a> = dyn FnMut(&[u8]) + 'a;

pub trait RtcpPacket {
    /// Serialized size in bytes, header included
    fn block_length(&self) -> usize;

    /// Serialize at `*index` in `packet` and advance the index.
    ///
    /// If the packet does not fit below `max_length`, the filled part of the
    /// buffer is first handed to `callback` and writing restarts at offset
    /// zero. Returns `false` when the packet cannot fit even in an empty
    /// buffer.
    fn create(
        &self,
        packet: &mut [u8],
        index: &mut usize,
        max_length: usize,
        callback: &mut PacketReadyCallback<'_>,
    ) -> bool;

    /// Serialize into a buffer of exactly [`block_length`](Self::block_length) bytes.
    fn build(&self) -> Bytes {
        let length = self.block_length();
        let mut packet = vec![0u8; length];
        let mut index = 0;
        let created = self.create(&mut packet, &mut index, length, &mut |_: &[u8]| {});
        debug_assert!(created, "packet should fit in its own block length");
        debug_assert_eq!(index, length);
        packet.truncate(index);
        Bytes::from(packet)
    }

    /// Serialize into buffers of at most `max_length` bytes, each handed to
    /// `callback` once full and the last one when done.
    fn build_with(&self, max_length: usize, callback: &mut PacketReadyCallback<'_>) -> bool {
        debug_assert!(max_length <= IP_PACKET_SIZE);
        let max_length = max_length.min(IP_PACKET_SIZE);
        let mut buffer = [0u8; IP_PACKET_SIZE];
        let mut index = 0;
        if !self.create(&mut buffer, &mut index, max_length, callback) {
            return false;
        }
        on_buffer_full(&buffer, &mut index, callback)
    }
}

/// Hand the first `*index` bytes of `packet` to `callback` and reset the
/// index. Returns `false` if the buffer was empty.
pub fn on_buffer_full(
    packet: &[u8],
    index: &mut usize,
    callback: &mut PacketReadyCallback<'_>,
) -> bool {
    if *index == 0 {
        return false;
    }
    callback(&packet[..*index]);
    *index = 0;
    true
}

/// Value of the header length field: 32-bit words minus one.
pub fn header_length(block_length: usize) -> u16 {
    debug_assert!(block_length >= HEADER_LENGTH);
    debug_assert_eq!(block_length % 4, 0);
    ((block_length - HEADER_LENGTH) / 4) as u16
}

/// Write an RTCP header without padding at `*index` and advance it.
pub fn create_header(
    count_or_format: u8,
    packet_type: u8,
    length: u16,
    packet: &mut [u8],
    index: &mut usize,
) {
    debug_assert!(count_or_format <= 0x1f);
    let mut header = &mut packet[*index..*index + HEADER_LENGTH];
    header.put_u8(VERSION_BITS | count_or_format);
    header.put_u8(packet_type);
    header.put_u16(length);
    *index += HEADER_LENGTH;
}

/// Make room for a block of `block_length` bytes, flushing the buffer
/// through `callback` as needed.
pub(crate) fn reserve(
    block_length: usize,
    packet: &[u8],
    index: &mut usize,
    max_length: usize,
    callback: &mut PacketReadyCallback<'_>,
) -> bool {
    while *index + block_length > max_length {
        if !on_buffer_full(packet, index, callback) {
            return false;
        }
    }
    true
}
