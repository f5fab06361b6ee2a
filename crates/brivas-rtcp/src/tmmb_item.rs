//! TMMBR/TMMBN FCI entry (RFC 5104 §4.2.1.1)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                              SSRC                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | MxTBR Exp |  MxTBR Mantissa                 |Measured Overhead|
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use tracing::warn;

const MAX_MANTISSA: u64 = 0x1ffff;
const MAX_OVERHEAD: u16 = 0x1ff;

/// Maximum bitrate announced for one media sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TmmbItem {
    pub ssrc: u32,
    pub bitrate_bps: u64,
    /// Per-packet overhead in bytes, 9 bits on the wire
    pub packet_overhead: u16,
}

impl TmmbItem {
    pub const LENGTH: usize = 8;

    pub fn new(ssrc: u32, bitrate_bps: u64, packet_overhead: u16) -> Self {
        debug_assert!(packet_overhead <= MAX_OVERHEAD);
        Self {
            ssrc,
            bitrate_bps,
            packet_overhead,
        }
    }

    /// Decode one entry. Fails if the bitrate does not fit in 64 bits.
    pub fn parse(mut buffer: &[u8]) -> Option<Self> {
        if buffer.len() < Self::LENGTH {
            return None;
        }
        let ssrc = buffer.get_u32();
        let compact = buffer.get_u32();
        let exponent = compact >> 26;
        let mantissa = u64::from((compact >> 9) & 0x1ffff);
        let packet_overhead = (compact & 0x1ff) as u16;

        let bitrate_bps = mantissa << exponent;
        if (bitrate_bps >> exponent) != mantissa {
            warn!(
                "Invalid tmmb bitrate value: mantissa={} exponent={}",
                mantissa, exponent
            );
            return None;
        }

        Some(Self {
            ssrc,
            bitrate_bps,
            packet_overhead,
        })
    }

    /// Encode into the first [`LENGTH`](Self::LENGTH) bytes of `buffer`,
    /// dropping low bitrate bits that do not fit the 17-bit mantissa.
    pub fn create(&self, mut buffer: &mut [u8]) {
        let mut exponent = 0u32;
        let mut mantissa = self.bitrate_bps;
        while mantissa > MAX_MANTISSA {
            mantissa >>= 1;
            exponent += 1;
        }
        let compact = (exponent << 26)
            | ((mantissa as u32) << 9)
            | u32::from(self.packet_overhead & MAX_OVERHEAD);
        buffer.put_u32(self.ssrc);
        buffer.put_u32(compact);
    }
}
