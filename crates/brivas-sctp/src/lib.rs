//! # Brivas SCTP
//!
//! SCTP packet codec and socket plumbing used by WebRTC data channels:
//!
//! - **packet** - TLV primitives, parameters, error causes, chunks and the
//!   packet builder/parser
//! - **socket** - client callback interface, callback deferral and the packet
//!   sender
//! - **timer** - generation-tagged timers driven by externally created timeouts
//!
//! Everything here runs on a single logical sequence. The socket-side types
//! hold `Rc`/`RefCell` state and are therefore `!Send`.
//!
//! ## Example
//! ```rust,ignore
//! use brivas_sctp::{SctpOptions, VerificationTag};
//! use brivas_sctp::packet::{SctpPacketBuilder, chunk::CookieAckChunk};
//!
//! let options = SctpOptions::default();
//! let mut builder = SctpPacketBuilder::new(VerificationTag(0x697e_3a4e), &options);
//! builder.add(&CookieAckChunk);
//! let bytes = builder.build();
//! ```

pub mod config;
pub mod errors;
pub mod packet;
pub mod socket;
pub mod timer;
pub mod types;

// Re-exports
pub use config::SctpOptions;
pub use errors::{PacketError, Result, SctpError};
pub use types::*;

pub use packet::{ChunkDescriptor, SctpPacket, SctpPacketBuilder};
pub use socket::{CallbackDeferrer, PacketSender, SctpSocketCallbacks, SendPacketStatus};
pub use timer::{Timer, TimerManager, TimerOptions};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// IANA registered port used by WebRTC data channels over DTLS.
pub const DEFAULT_SCTP_PORT: u16 = 5000;
