//! Deferral of client notifications until the socket call that raised them
//! has returned.
//!
//! The socket state machine must finish handling one operation before the
//! client observes any of its effects, otherwise a client calling back into
//! the socket from a notification would see half-updated state. Every socket
//! entry point therefore runs as:
//!
//! ```text
//! prepare() -> state machine work (on_* calls are queued) -> trigger_deferred()
//! ```
//!
//! Queries and packet transmission are passed through immediately.

use super::callbacks::{DelayPrecision, ErrorKind, SctpSocketCallbacks, SendPacketStatus, Timeout};
use crate::types::{LifecycleId, SctpMessage, StreamId, TimeMs};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

/// A queued notification and its captured arguments
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeferredCallback {
    MessageReceived(SctpMessage),
    MessageReady,
    Error(ErrorKind, String),
    Aborted(ErrorKind, String),
    Connected,
    Closed,
    ConnectionRestarted,
    StreamsResetFailed(Vec<StreamId>, String),
    StreamsResetPerformed(Vec<StreamId>),
    IncomingStreamsReset(Vec<StreamId>),
    BufferedAmountLow(StreamId),
    TotalBufferedAmountLow,
}

impl DeferredCallback {
    fn dispatch(self, callbacks: &dyn SctpSocketCallbacks) {
        match self {
            DeferredCallback::MessageReceived(message) => callbacks.on_message_received(message),
            DeferredCallback::MessageReady => callbacks.on_message_ready(),
            DeferredCallback::Error(kind, message) => callbacks.on_error(kind, &message),
            DeferredCallback::Aborted(kind, message) => callbacks.on_aborted(kind, &message),
            DeferredCallback::Connected => callbacks.on_connected(),
            DeferredCallback::Closed => callbacks.on_closed(),
            DeferredCallback::ConnectionRestarted => callbacks.on_connection_restarted(),
            DeferredCallback::StreamsResetFailed(streams, reason) => {
                callbacks.on_streams_reset_failed(&streams, &reason)
            }
            DeferredCallback::StreamsResetPerformed(streams) => {
                callbacks.on_streams_reset_performed(&streams)
            }
            DeferredCallback::IncomingStreamsReset(streams) => {
                callbacks.on_incoming_streams_reset(&streams)
            }
            DeferredCallback::BufferedAmountLow(stream_id) => {
                callbacks.on_buffered_amount_low(stream_id)
            }
            DeferredCallback::TotalBufferedAmountLow => callbacks.on_total_buffered_amount_low(),
        }
    }
}

/// Queues client notifications between [`prepare`](Self::prepare) and
/// [`trigger_deferred`](Self::trigger_deferred).
pub struct CallbackDeferrer {
    underlying: Rc<dyn SctpSocketCallbacks>,
    prepared: Cell<bool>,
    deferred: RefCell<Vec<DeferredCallback>>,
}

impl CallbackDeferrer {
    pub fn new(underlying: Rc<dyn SctpSocketCallbacks>) -> Self {
        Self {
            underlying,
            prepared: Cell::new(false),
            deferred: RefCell::new(Vec::new()),
        }
    }

    /// Start collecting notifications. Must not already be prepared.
    pub fn prepare(&self) {
        debug_assert!(!self.prepared.get(), "deferrer prepared twice");
        self.prepared.set(true);
    }

    /// Deliver every queued notification in order.
    ///
    /// The queue is swapped out before delivery, so notifications raised by
    /// the client while being notified land in a fresh queue and are
    /// delivered by the next call instead.
    pub fn trigger_deferred(&self) {
        debug_assert!(self.prepared.get(), "trigger_deferred without prepare");
        self.prepared.set(false);
        if self.deferred.borrow().is_empty() {
            return;
        }
        let deferred = std::mem::take(&mut *self.deferred.borrow_mut());
        debug!("Delivering {} deferred callbacks", deferred.len());
        for callback in deferred {
            callback.dispatch(self.underlying.as_ref());
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.get()
    }

    fn defer(&self, callback: DeferredCallback) {
        debug_assert!(self.prepared.get(), "callback raised outside of prepare");
        self.deferred.borrow_mut().push(callback);
    }
}

impl SctpSocketCallbacks for CallbackDeferrer {
    fn send_packet_with_status(&self, data: &[u8]) -> SendPacketStatus {
        self.underlying.send_packet_with_status(data)
    }

    fn create_timeout(&self, precision: DelayPrecision) -> Box<dyn Timeout> {
        self.underlying.create_timeout(precision)
    }

    fn now(&self) -> TimeMs {
        self.underlying.now()
    }

    fn get_random_int(&self, low: u32, high: u32) -> u32 {
        self.underlying.get_random_int(low, high)
    }

    fn on_message_received(&self, message: SctpMessage) {
        self.defer(DeferredCallback::MessageReceived(message));
    }

    fn on_message_ready(&self) {
        self.defer(DeferredCallback::MessageReady);
    }

    fn on_error(&self, error: ErrorKind, message: &str) {
        self.defer(DeferredCallback::Error(error, message.to_string()));
    }

    fn on_aborted(&self, error: ErrorKind, message: &str) {
        self.defer(DeferredCallback::Aborted(error, message.to_string()));
    }

    fn on_connected(&self) {
        self.defer(DeferredCallback::Connected);
    }

    fn on_closed(&self) {
        self.defer(DeferredCallback::Closed);
    }

    fn on_connection_restarted(&self) {
        self.defer(DeferredCallback::ConnectionRestarted);
    }

    fn on_streams_reset_failed(&self, outgoing_streams: &[StreamId], reason: &str) {
        self.defer(DeferredCallback::StreamsResetFailed(
            outgoing_streams.to_vec(),
            reason.to_string(),
        ));
    }

    fn on_streams_reset_performed(&self, outgoing_streams: &[StreamId]) {
        self.defer(DeferredCallback::StreamsResetPerformed(outgoing_streams.to_vec()));
    }

    fn on_incoming_streams_reset(&self, incoming_streams: &[StreamId]) {
        self.defer(DeferredCallback::IncomingStreamsReset(incoming_streams.to_vec()));
    }

    fn on_buffered_amount_low(&self, stream_id: StreamId) {
        self.defer(DeferredCallback::BufferedAmountLow(stream_id));
    }

    fn on_total_buffered_amount_low(&self) {
        self.defer(DeferredCallback::TotalBufferedAmountLow);
    }

    fn on_lifecycle_message_fully_sent(&self, lifecycle_id: LifecycleId) {
        self.underlying.on_lifecycle_message_fully_sent(lifecycle_id);
    }

    fn on_lifecycle_message_expired(&self, lifecycle_id: LifecycleId, maybe_delivered: bool) {
        self.underlying
            .on_lifecycle_message_expired(lifecycle_id, maybe_delivered);
    }

    fn on_lifecycle_message_delivered(&self, lifecycle_id: LifecycleId) {
        self.underlying.on_lifecycle_message_delivered(lifecycle_id);
    }

    fn on_lifecycle_end(&self, lifecycle_id: LifecycleId) {
        self.underlying.on_lifecycle_end(lifecycle_id);
    }
}

/// Prepares a deferrer for the lifetime of one socket operation and
/// delivers its notifications when dropped.
pub struct ScopedDeferrer<'a> {
    deferrer: &'a CallbackDeferrer,
}

impl<'a> ScopedDeferrer<'a> {
    pub fn new(deferrer: &'a CallbackDeferrer) -> Self {
        deferrer.prepare();
        Self { deferrer }
    }
}

impl Drop for ScopedDeferrer<'_> {
    fn drop(&mut self) {
        self.deferrer.trigger_deferred();
    }
}
