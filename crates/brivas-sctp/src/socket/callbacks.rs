//! Interface between the SCTP stack and the embedding client

use crate::types::{LifecycleId, SctpMessage, StreamId, TimeMs, TimeoutId};
use std::fmt;
use std::time::Duration;

/// Outcome of handing a packet to the lower layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPacketStatus {
    /// Packet was sent
    Success,
    /// Packet was dropped but may be retried later (e.g. socket would block)
    TemporaryFailure,
    /// Packet was dropped and retrying will not help
    Error,
}

/// Errors reported through [`SctpSocketCallbacks::on_error`] and
/// [`SctpSocketCallbacks::on_aborted`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoError,
    TooManyRetries,
    NotConnected,
    ParseFailed,
    WrongSequence,
    PeerReported,
    ProtocolViolation,
    ResourceExhaustion,
    UnsupportedOperation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoError => "NO_ERROR",
            ErrorKind::TooManyRetries => "TOO_MANY_RETRIES",
            ErrorKind::NotConnected => "NOT_CONNECTED",
            ErrorKind::ParseFailed => "PARSE_FAILED",
            ErrorKind::WrongSequence => "WRONG_SEQUENCE",
            ErrorKind::PeerReported => "PEER_REPORTED",
            ErrorKind::ProtocolViolation => "PROTOCOL_VIOLATION",
            ErrorKind::ResourceExhaustion => "RESOURCE_EXHAUSTION",
            ErrorKind::UnsupportedOperation => "UNSUPPORTED_OPERATION",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How closely a timeout must honor its requested duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayPrecision {
    #[default]
    Low,
    High,
}

/// A one-shot timeout owned by a timer.
///
/// On expiry the embedder calls back into the socket with the `TimeoutId`
/// passed to [`start`](Timeout::start). A timeout is started at most once at
/// a time and is stopped before being restarted.
pub trait Timeout {
    fn start(&mut self, duration: Duration, timeout_id: TimeoutId);
    fn stop(&mut self);
}

/// Callbacks the SCTP socket uses to reach its embedder.
///
/// Every method takes `&self`: implementations that need to mutate state use
/// interior mutability, since the socket may call several of them while
/// handling one operation.
pub trait SctpSocketCallbacks {
    /// Send a packet to the peer. Called synchronously; never deferred.
    fn send_packet_with_status(&self, data: &[u8]) -> SendPacketStatus;

    /// Create a timeout, to be started and stopped by the socket's timers.
    fn create_timeout(&self, precision: DelayPrecision) -> Box<dyn Timeout>;

    /// Current time on a monotonic clock.
    fn now(&self) -> TimeMs;

    /// Random integer in `[low, high)`.
    fn get_random_int(&self, low: u32, high: u32) -> u32;

    fn on_message_received(&self, message: SctpMessage);

    /// A message is ready to be read with the socket's receive call.
    fn on_message_ready(&self) {}

    /// A non-fatal error. The association is still usable.
    fn on_error(&self, error: ErrorKind, message: &str);

    /// The association was aborted, by the peer or locally.
    fn on_aborted(&self, error: ErrorKind, message: &str);

    fn on_connected(&self);

    fn on_closed(&self);

    /// The peer restarted the association. Queued messages may be lost.
    fn on_connection_restarted(&self);

    fn on_streams_reset_failed(&self, outgoing_streams: &[StreamId], reason: &str);

    fn on_streams_reset_performed(&self, outgoing_streams: &[StreamId]);

    fn on_incoming_streams_reset(&self, incoming_streams: &[StreamId]);

    fn on_buffered_amount_low(&self, _stream_id: StreamId) {}

    fn on_total_buffered_amount_low(&self) {}

    // Message lifecycle events. Delivered directly, never deferred.

    fn on_lifecycle_message_fully_sent(&self, _lifecycle_id: LifecycleId) {}

    fn on_lifecycle_message_expired(&self, _lifecycle_id: LifecycleId, _maybe_delivered: bool) {}

    fn on_lifecycle_message_delivered(&self, _lifecycle_id: LifecycleId) {}

    fn on_lifecycle_end(&self, _lifecycle_id: LifecycleId) {}
}
