//! Hands finished packets to the embedder

use super::callbacks::{SctpSocketCallbacks, SendPacketStatus};
use crate::packet::SctpPacketBuilder;
use std::rc::Rc;
use tracing::{debug, warn};

/// Observer told about every packet handed to the embedder, successful or not
pub type OnSentPacket = Box<dyn Fn(&[u8], SendPacketStatus)>;

/// Builds and sends packets. Never retries: a failed packet is the
/// retransmission logic's concern.
pub struct PacketSender {
    callbacks: Rc<dyn SctpSocketCallbacks>,
    on_sent_packet: OnSentPacket,
}

impl PacketSender {
    pub fn new(callbacks: Rc<dyn SctpSocketCallbacks>, on_sent_packet: OnSentPacket) -> Self {
        Self {
            callbacks,
            on_sent_packet,
        }
    }

    /// Build the packet and send it. Returns `true` only if the embedder
    /// reported success. An empty builder sends nothing and returns `false`.
    pub fn send(&self, builder: &mut SctpPacketBuilder) -> bool {
        if builder.is_empty() {
            return false;
        }

        let payload = builder.build();
        let status = self.callbacks.send_packet_with_status(&payload);
        (self.on_sent_packet)(&payload, status);

        match status {
            SendPacketStatus::Success => true,
            SendPacketStatus::TemporaryFailure => {
                debug!("Packet of {} bytes dropped: temporary failure", payload.len());
                false
            }
            SendPacketStatus::Error => {
                warn!("Packet of {} bytes dropped: send error", payload.len());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SctpOptions;
    use crate::packet::chunk::CookieAckChunk;
    use crate::socket::testing::RecordingCallbacks;
    use crate::types::VerificationTag;
    use std::cell::RefCell;

    fn sender() -> (
        Rc<RecordingCallbacks>,
        Rc<RefCell<Vec<(usize, SendPacketStatus)>>>,
        PacketSender,
    ) {
        let callbacks = Rc::new(RecordingCallbacks::default());
        let observed = Rc::new(RefCell::new(Vec::new()));
        let sink = observed.clone();
        let sender = PacketSender::new(
            callbacks.clone(),
            Box::new(move |data: &[u8], status: SendPacketStatus| {
                sink.borrow_mut().push((data.len(), status))
            }),
        );
        (callbacks, observed, sender)
    }

    fn builder() -> SctpPacketBuilder {
        SctpPacketBuilder::new(VerificationTag(123), &SctpOptions::default())
    }

    #[test]
    fn test_send_reports_status_to_observer() {
        let (callbacks, observed, sender) = sender();

        let mut packet = builder();
        packet.add(&CookieAckChunk);
        assert!(sender.send(&mut packet));
        assert!(packet.is_empty());

        callbacks.set_send_status(SendPacketStatus::Error);
        packet.add(&CookieAckChunk);
        assert!(!sender.send(&mut packet));

        callbacks.set_send_status(SendPacketStatus::TemporaryFailure);
        packet.add(&CookieAckChunk);
        assert!(!sender.send(&mut packet));

        assert_eq!(
            *observed.borrow(),
            vec![
                (16, SendPacketStatus::Success),
                (16, SendPacketStatus::Error),
                (16, SendPacketStatus::TemporaryFailure),
            ]
        );
        assert_eq!(callbacks.sent_packets().len(), 3);
    }

    #[test]
    fn test_empty_builder_sends_nothing() {
        let (callbacks, observed, sender) = sender();
        assert!(!sender.send(&mut builder()));
        assert!(callbacks.sent_packets().is_empty());
        assert!(observed.borrow().is_empty());
    }
}
