//! # Brivas RTCP
//!
//! RTCP packets used for rate control feedback in the media pipeline:
//!
//! - **TMMBR/TMMBN** - temporary maximum media bitrate request and
//!   notification (RFC 5104)
//! - **Extended Reports** - RRTR and DLRR blocks for receiver-side RTT
//!   (RFC 3611)
//! - **Compound packets** - several packets serialized back to back, split
//!   across buffers when they do not fit
//!
//! Parsing takes a [`CommonHeader`] that was already validated and returns
//! `None` on malformed input. Serialization goes through the [`RtcpPacket`]
//! trait.

pub mod common_header;
pub mod compound_packet;
pub mod dlrr;
pub mod extended_reports;
pub mod rrtr;
pub mod rtcp_packet;
pub mod rtpfb;
pub mod tmmb_item;
pub mod tmmbn;
pub mod tmmbr;

// Re-exports
pub use common_header::CommonHeader;
pub use compound_packet::CompoundPacket;
pub use dlrr::{Dlrr, ReceiveTimeInfo};
pub use extended_reports::ExtendedReports;
pub use rrtr::{NtpTime, Rrtr};
pub use rtcp_packet::{RtcpPacket, IP_PACKET_SIZE};
pub use tmmb_item::TmmbItem;
pub use tmmbn::Tmmbn;
pub use tmmbr::Tmmbr;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
