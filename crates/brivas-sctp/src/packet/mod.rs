//! SCTP wire format
//!
//! Every record on the wire (chunk, parameter, error cause) is a TLV whose
//! length field covers the header and value but not the trailing padding to
//! a 4-byte boundary. Parsing never panics on hostile input: typed records
//! return `None` and whole packets return a [`PacketError`](crate::PacketError).

mod bounded_byte_reader;
mod bounded_byte_writer;
pub mod chunk;
pub mod error_cause;
pub mod parameter;
mod sctp_packet;
mod tlv;

pub use bounded_byte_reader::BoundedByteReader;
pub use bounded_byte_writer::BoundedByteWriter;
pub use chunk::{debug_convert_chunk_to_string, Chunk, ChunkConfig};
pub use error_cause::ErrorCause;
pub use parameter::{Parameter, ParameterDescriptor, Parameters, ParametersBuilder};
pub use sctp_packet::{ChunkDescriptor, CommonHeader, SctpPacket, SctpPacketBuilder};
pub use tlv::{Tlv, TlvRecord};

/// Round a length up to the next 4-byte boundary.
pub const fn round_up_to_4(len: usize) -> usize {
    (len + 3) & !3
}

/// Round a length down to the previous 4-byte boundary.
pub const fn round_down_to_4(len: usize) -> usize {
    len & !3
}
