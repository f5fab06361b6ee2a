//! Socket plumbing: the client callback interface, deferred notification
//! delivery and packet transmission.

mod callback_deferrer;
mod callbacks;
mod packet_sender;

pub use callback_deferrer::{CallbackDeferrer, ScopedDeferrer};
pub use callbacks::{
    DelayPrecision, ErrorKind, SctpSocketCallbacks, SendPacketStatus, Timeout,
};
pub use packet_sender::{OnSentPacket, PacketSender};

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::types::{LifecycleId, SctpMessage, StreamId, TimeMs, TimeoutId};
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    struct NoopTimeout;

    impl Timeout for NoopTimeout {
        fn start(&mut self, _duration: Duration, _timeout_id: TimeoutId) {}
        fn stop(&mut self) {}
    }

    fn join(streams: &[StreamId]) -> String {
        let ids: Vec<String> = streams.iter().map(|s| s.0.to_string()).collect();
        format!("[{}]", ids.join(", "))
    }

    /// Records every notification as a short string
    pub struct RecordingCallbacks {
        events: RefCell<Vec<String>>,
        sent: RefCell<Vec<Vec<u8>>>,
        send_status: Cell<SendPacketStatus>,
    }

    impl Default for RecordingCallbacks {
        fn default() -> Self {
            Self {
                events: RefCell::new(Vec::new()),
                sent: RefCell::new(Vec::new()),
                send_status: Cell::new(SendPacketStatus::Success),
            }
        }
    }

    impl RecordingCallbacks {
        pub fn events(&self) -> Vec<String> {
            self.events.borrow().clone()
        }

        pub fn sent_packets(&self) -> Vec<Vec<u8>> {
            self.sent.borrow().clone()
        }

        pub fn set_send_status(&self, status: SendPacketStatus) {
            self.send_status.set(status);
        }

        fn record(&self, event: String) {
            self.events.borrow_mut().push(event);
        }
    }

    impl SctpSocketCallbacks for RecordingCallbacks {
        fn send_packet_with_status(&self, data: &[u8]) -> SendPacketStatus {
            self.sent.borrow_mut().push(data.to_vec());
            self.send_status.get()
        }

        fn create_timeout(&self, _precision: DelayPrecision) -> Box<dyn Timeout> {
            Box::new(NoopTimeout)
        }

        fn now(&self) -> TimeMs {
            TimeMs(0)
        }

        fn get_random_int(&self, low: u32, _high: u32) -> u32 {
            low
        }

        fn on_message_received(&self, message: SctpMessage) {
            self.record(format!(
                "message_received({}, {}, {} bytes)",
                message.stream_id.0,
                message.ppid.0,
                message.payload.len()
            ));
        }

        fn on_message_ready(&self) {
            self.record("message_ready".to_string());
        }

        fn on_error(&self, error: ErrorKind, message: &str) {
            self.record(format!("error({}, {})", error, message));
        }

        fn on_aborted(&self, error: ErrorKind, message: &str) {
            self.record(format!("aborted({}, {})", error, message));
        }

        fn on_connected(&self) {
            self.record("connected".to_string());
        }

        fn on_closed(&self) {
            self.record("closed".to_string());
        }

        fn on_connection_restarted(&self) {
            self.record("connection_restarted".to_string());
        }

        fn on_streams_reset_failed(&self, outgoing_streams: &[StreamId], reason: &str) {
            self.record(format!(
                "streams_reset_failed({}, {})",
                join(outgoing_streams),
                reason
            ));
        }

        fn on_streams_reset_performed(&self, outgoing_streams: &[StreamId]) {
            self.record(format!("streams_reset_performed({})", join(outgoing_streams)));
        }

        fn on_incoming_streams_reset(&self, incoming_streams: &[StreamId]) {
            self.record(format!("incoming_streams_reset({})", join(incoming_streams)));
        }

        fn on_buffered_amount_low(&self, stream_id: StreamId) {
            self.record(format!("buffered_amount_low({})", stream_id.0));
        }

        fn on_total_buffered_amount_low(&self) {
            self.record("total_buffered_amount_low".to_string());
        }

        fn on_lifecycle_message_delivered(&self, lifecycle_id: LifecycleId) {
            self.record(format!("delivered({})", lifecycle_id.0));
        }

        fn on_lifecycle_end(&self, lifecycle_id: LifecycleId) {
            self.record(format!("end({})", lifecycle_id.0));
        }
    }
}
