//! Transport layer feedback messages (RFC 4585 §6.1)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|   FMT   |       PT      |          length               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  SSRC of packet sender                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  SSRC of media source                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! :            Feedback Control Information (FCI)                 :
//! ```

use bytes::{Buf, BufMut};

pub const PACKET_TYPE: u8 = 205;

/// Sender and media SSRC
pub const COMMON_FEEDBACK_LENGTH: usize = 8;

/// Read sender and media SSRC from the start of a feedback payload.
pub(crate) fn parse_common_feedback(mut payload: &[u8]) -> (u32, u32) {
    debug_assert!(payload.len() >= COMMON_FEEDBACK_LENGTH);
    (payload.get_u32(), payload.get_u32())
}

pub(crate) fn create_common_feedback(sender_ssrc: u32, media_ssrc: u32, mut buffer: &mut [u8]) {
    buffer.put_u32(sender_ssrc);
    buffer.put_u32(media_ssrc);
}
