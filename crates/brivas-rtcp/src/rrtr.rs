//! Receiver Reference Time Report block (RFC 3611 §4.4)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     BT=4      |   reserved    |       block length = 2        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |              NTP timestamp, most significant word             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |             NTP timestamp, least significant word             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// 64-bit NTP timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NtpTime {
    pub seconds: u32,
    pub fractions: u32,
}

impl NtpTime {
    pub fn new(seconds: u32, fractions: u32) -> Self {
        Self { seconds, fractions }
    }

    /// Middle 32 bits, as echoed in DLRR `last_rr`
    pub fn compact(&self) -> u32 {
        (self.seconds << 16) | (self.fractions >> 16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rrtr {
    ntp: NtpTime,
}

impl Rrtr {
    pub const BLOCK_TYPE: u8 = 4;
    /// Block length field, in 32-bit words
    pub const BLOCK_LENGTH: u16 = 2;
    pub const LENGTH: usize = 4 * (Self::BLOCK_LENGTH as usize + 1);

    pub fn new(ntp: NtpTime) -> Self {
        Self { ntp }
    }

    /// Parse a block of exactly [`LENGTH`](Self::LENGTH) bytes.
    pub fn parse(mut buffer: &[u8]) -> Self {
        debug_assert_eq!(buffer.len(), Self::LENGTH);
        debug_assert_eq!(buffer[0], Self::BLOCK_TYPE);
        buffer.advance(4);
        let seconds = buffer.get_u32();
        let fractions = buffer.get_u32();
        Self {
            ntp: NtpTime::new(seconds, fractions),
        }
    }

    pub fn create(&self, mut buffer: &mut [u8]) {
        buffer.put_u8(Self::BLOCK_TYPE);
        buffer.put_u8(0);
        buffer.put_u16(Self::BLOCK_LENGTH);
        buffer.put_u32(self.ntp.seconds);
        buffer.put_u32(self.ntp.fractions);
    }

    pub fn ntp(&self) -> NtpTime {
        self.ntp
    }

    pub fn set_ntp(&mut self, ntp: NtpTime) {
        self.ntp = ntp;
    }
}
