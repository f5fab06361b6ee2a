//! Common types used across the SCTP stack

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::Duration;

/// Verification tag carried in every packet's common header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VerificationTag(pub u32);

impl VerificationTag {
    /// Get raw value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for VerificationTag {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for VerificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Transmission Sequence Number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tsn(pub u32);

impl Tsn {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Tsn {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Stream identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct StreamId(pub u16);

impl StreamId {
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl From<u16> for StreamId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Stream Sequence Number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ssn(pub u16);

/// Payload Protocol Identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ppid(pub u32);

/// Sequence number of a stream reconfiguration request (RFC 6525)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ReconfigRequestSn(pub u32);

/// Identifies an outgoing message whose lifecycle the client wants to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifecycleId(pub u64);

/// Identifies one started timeout: timer id in the upper half, generation in
/// the lower half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeoutId(pub u64);

/// Milliseconds on the embedder's monotonic clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TimeMs(pub u64);

impl Add<Duration> for TimeMs {
    type Output = TimeMs;

    fn add(self, rhs: Duration) -> TimeMs {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        TimeMs(self.0.saturating_add(millis))
    }
}

/// A complete user message, reassembled from DATA chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SctpMessage {
    pub stream_id: StreamId,
    pub ppid: Ppid,
    pub payload: Vec<u8>,
}

impl SctpMessage {
    pub fn new(stream_id: StreamId, ppid: Ppid, payload: Vec<u8>) -> Self {
        Self {
            stream_id,
            ppid,
            payload,
        }
    }
}
