//! Stream reconfiguration parameters carried in RE-CONFIG chunks (RFC 6525 §4)

use super::ParameterConfig;
use crate::packet::{Tlv, TlvRecord};
use crate::types::{ReconfigRequestSn, StreamId, Tsn};
use bytes::BytesMut;
use std::fmt;
use tracing::debug;

fn parse_stream_ids(data: &[u8]) -> Vec<StreamId> {
    data.chunks_exact(2)
        .map(|pair| StreamId(u16::from_be_bytes([pair[0], pair[1]])))
        .collect()
}

fn stream_id_bytes(stream_ids: &[StreamId]) -> Vec<u8> {
    stream_ids.iter().flat_map(|sid| sid.0.to_be_bytes()).collect()
}

/// Outgoing SSN Reset Request (type 13)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingSsnResetRequestParameter {
    pub request_sequence_number: ReconfigRequestSn,
    pub response_sequence_number: ReconfigRequestSn,
    pub sender_last_assigned_tsn: Tsn,
    /// Empty means all streams
    pub stream_ids: Vec<StreamId>,
}

impl Tlv for OutgoingSsnResetRequestParameter {
    const TYPE: u16 = 13;
    const HEADER_SIZE: usize = 16;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 2;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for OutgoingSsnResetRequestParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            request_sequence_number: ReconfigRequestSn(reader.load32(4)),
            response_sequence_number: ReconfigRequestSn(reader.load32(8)),
            sender_last_assigned_tsn: Tsn(reader.load32(12)),
            stream_ids: parse_stream_ids(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let ids = stream_id_bytes(&self.stream_ids);
        let mut writer = Self::allocate_tlv(out, ids.len());
        writer.store32(4, self.request_sequence_number.0);
        writer.store32(8, self.response_sequence_number.0);
        writer.store32(12, self.sender_last_assigned_tsn.0);
        writer.copy_to_variable_data(&ids);
    }
}

impl fmt::Display for OutgoingSsnResetRequestParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Outgoing SSN Reset Request, req_seq_nbr={}",
            self.request_sequence_number.0
        )
    }
}

/// Incoming SSN Reset Request (type 14)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingSsnResetRequestParameter {
    pub request_sequence_number: ReconfigRequestSn,
    pub stream_ids: Vec<StreamId>,
}

impl Tlv for IncomingSsnResetRequestParameter {
    const TYPE: u16 = 14;
    const HEADER_SIZE: usize = 8;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 2;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for IncomingSsnResetRequestParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            request_sequence_number: ReconfigRequestSn(reader.load32(4)),
            stream_ids: parse_stream_ids(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let ids = stream_id_bytes(&self.stream_ids);
        let mut writer = Self::allocate_tlv(out, ids.len());
        writer.store32(4, self.request_sequence_number.0);
        writer.copy_to_variable_data(&ids);
    }
}

impl fmt::Display for IncomingSsnResetRequestParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Incoming SSN Reset Request, req_seq_nbr={}",
            self.request_sequence_number.0
        )
    }
}

/// SSN/TSN Reset Request (type 15)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsnTsnResetRequestParameter {
    pub request_sequence_number: ReconfigRequestSn,
}

impl Tlv for SsnTsnResetRequestParameter {
    const TYPE: u16 = 15;
    const HEADER_SIZE: usize = 8;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for SsnTsnResetRequestParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            request_sequence_number: ReconfigRequestSn(reader.load32(4)),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0).store32(4, self.request_sequence_number.0);
    }
}

impl fmt::Display for SsnTsnResetRequestParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SSN/TSN Reset Request, req_seq_nbr={}",
            self.request_sequence_number.0
        )
    }
}

/// Outcome reported in a Re-configuration Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ReconfigResult {
    SuccessNothingToDo = 0,
    SuccessPerformed = 1,
    Denied = 2,
    ErrorWrongSsn = 3,
    ErrorRequestAlreadyInProgress = 4,
    ErrorBadSequenceNumber = 5,
    InProgress = 6,
}

impl ReconfigResult {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::SuccessNothingToDo),
            1 => Some(Self::SuccessPerformed),
            2 => Some(Self::Denied),
            3 => Some(Self::ErrorWrongSsn),
            4 => Some(Self::ErrorRequestAlreadyInProgress),
            5 => Some(Self::ErrorBadSequenceNumber),
            6 => Some(Self::InProgress),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuccessNothingToDo => "Success: nothing to do",
            Self::SuccessPerformed => "Success: performed",
            Self::Denied => "Denied",
            Self::ErrorWrongSsn => "Error: wrong ssn",
            Self::ErrorRequestAlreadyInProgress => "Error: request already in progress",
            Self::ErrorBadSequenceNumber => "Error: bad sequence number",
            Self::InProgress => "In progress",
        }
    }
}

/// Re-configuration Response (type 16)
///
/// The two TSN fields are either both present or both absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconfigurationResponseParameter {
    pub response_sequence_number: ReconfigRequestSn,
    pub result: ReconfigResult,
    pub next_tsns: Option<(Tsn, Tsn)>,
}

impl ReconfigurationResponseParameter {
    pub fn sender_next_tsn(&self) -> Option<Tsn> {
        self.next_tsns.map(|(sender, _)| sender)
    }

    pub fn receiver_next_tsn(&self) -> Option<Tsn> {
        self.next_tsns.map(|(_, receiver)| receiver)
    }
}

impl Tlv for ReconfigurationResponseParameter {
    const TYPE: u16 = 16;
    const HEADER_SIZE: usize = 12;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 4;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ReconfigurationResponseParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        let raw_result = reader.load32(8);
        let Some(result) = ReconfigResult::from_u32(raw_result) else {
            debug!("Invalid reconfig response result {}", raw_result);
            return None;
        };

        let next_tsns = match reader.variable_data_size() {
            0 => None,
            8 => {
                let tsns = reader.sub_reader(0, 8)?;
                Some((Tsn(tsns.load32(0)), Tsn(tsns.load32(4))))
            }
            other => {
                debug!("Invalid reconfig response variable length {}", other);
                return None;
            }
        };

        Some(Self {
            response_sequence_number: ReconfigRequestSn(reader.load32(4)),
            result,
            next_tsns,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let variable_length = if self.next_tsns.is_some() { 8 } else { 0 };
        let mut writer = Self::allocate_tlv(out, variable_length);
        writer.store32(4, self.response_sequence_number.0);
        writer.store32(8, self.result as u32);
        if let Some((sender, receiver)) = self.next_tsns {
            let mut tsns = writer.sub_writer(0, 8);
            tsns.store32(0, sender.0);
            tsns.store32(4, receiver.0);
        }
    }
}

impl fmt::Display for ReconfigurationResponseParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Re-configuration Response, resp_seq_nbr={}, result={}",
            self.response_sequence_number.0,
            self.result.as_str()
        )
    }
}

/// Add Outgoing Streams Request (type 17)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutgoingStreamsRequestParameter {
    pub request_sequence_number: ReconfigRequestSn,
    pub nbr_of_new_streams: u16,
}

impl Tlv for AddOutgoingStreamsRequestParameter {
    const TYPE: u16 = 17;
    const HEADER_SIZE: usize = 12;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for AddOutgoingStreamsRequestParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            request_sequence_number: ReconfigRequestSn(reader.load32(4)),
            nbr_of_new_streams: reader.load16(8),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let mut writer = Self::allocate_tlv(out, 0);
        writer.store32(4, self.request_sequence_number.0);
        writer.store16(8, self.nbr_of_new_streams);
    }
}

impl fmt::Display for AddOutgoingStreamsRequestParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Add Outgoing Streams Request, req_seq_nbr={}",
            self.request_sequence_number.0
        )
    }
}

/// Add Incoming Streams Request (type 18)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddIncomingStreamsRequestParameter {
    pub request_sequence_number: ReconfigRequestSn,
    pub nbr_of_new_streams: u16,
}

impl Tlv for AddIncomingStreamsRequestParameter {
    const TYPE: u16 = 18;
    const HEADER_SIZE: usize = 12;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for AddIncomingStreamsRequestParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            request_sequence_number: ReconfigRequestSn(reader.load32(4)),
            nbr_of_new_streams: reader.load16(8),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let mut writer = Self::allocate_tlv(out, 0);
        writer.store32(4, self.request_sequence_number.0);
        writer.store16(8, self.nbr_of_new_streams);
    }
}

impl fmt::Display for AddIncomingStreamsRequestParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Add Incoming Streams Request, req_seq_nbr={}",
            self.request_sequence_number.0
        )
    }
}
