//! Error causes carried by ABORT and ERROR chunks (RFC 4960 §3.3.10)

use super::parameter::{ParameterConfig, ParameterDescriptor};
use super::{Tlv, TlvRecord};
use crate::types::{StreamId, Tsn};
use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

/// Invalid Stream Identifier (cause 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStreamIdentifierCause {
    pub stream_id: StreamId,
}

impl Tlv for InvalidStreamIdentifierCause {
    const TYPE: u16 = 1;
    const HEADER_SIZE: usize = 8;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for InvalidStreamIdentifierCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            stream_id: StreamId(reader.load16(4)),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0).store16(4, self.stream_id.0);
    }
}

impl fmt::Display for InvalidStreamIdentifierCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid Stream Identifier, stream_id={}", self.stream_id.0)
    }
}

/// Missing Mandatory Parameter (cause 2)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MissingMandatoryParameterCause {
    pub missing_parameter_types: Vec<u16>,
}

impl Tlv for MissingMandatoryParameterCause {
    const TYPE: u16 = 2;
    const HEADER_SIZE: usize = 8;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 2;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for MissingMandatoryParameterCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        let count = reader.load32(4) as usize;
        if count * 2 != reader.variable_data_size() {
            debug!(
                "Missing mandatory parameter count {} does not match {} bytes",
                count,
                reader.variable_data_size()
            );
            return None;
        }
        let missing_parameter_types = reader
            .variable_data()
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Some(Self {
            missing_parameter_types,
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let types: Vec<u8> = self
            .missing_parameter_types
            .iter()
            .flat_map(|t| t.to_be_bytes())
            .collect();
        let mut writer = Self::allocate_tlv(out, types.len());
        writer.store32(4, self.missing_parameter_types.len() as u32);
        writer.copy_to_variable_data(&types);
    }
}

impl fmt::Display for MissingMandatoryParameterCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<String> = self
            .missing_parameter_types
            .iter()
            .map(|t| t.to_string())
            .collect();
        write!(f, "Missing Mandatory Parameter, missing_types=[{}]", types.join(","))
    }
}

/// Stale Cookie Error (cause 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleCookieErrorCause {
    pub staleness_us: u32,
}

impl Tlv for StaleCookieErrorCause {
    const TYPE: u16 = 3;
    const HEADER_SIZE: usize = 8;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for StaleCookieErrorCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            staleness_us: reader.load32(4),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0).store32(4, self.staleness_us);
    }
}

impl fmt::Display for StaleCookieErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stale Cookie Error, staleness_us={}", self.staleness_us)
    }
}

/// Out of Resource (cause 4). Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutOfResourceErrorCause;

impl Tlv for OutOfResourceErrorCause {
    const TYPE: u16 = 4;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for OutOfResourceErrorCause {
    fn parse(data: &[u8]) -> Option<Self> {
        Self::parse_tlv(data)?;
        Some(Self)
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0);
    }
}

impl fmt::Display for OutOfResourceErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Out Of Resource")
    }
}

/// Unresolvable Address (cause 5): the offending address parameter, verbatim
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnresolvableAddressCause {
    pub unresolvable_address: Bytes,
}

impl Tlv for UnresolvableAddressCause {
    const TYPE: u16 = 5;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for UnresolvableAddressCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            unresolvable_address: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.unresolvable_address.len())
            .copy_to_variable_data(&self.unresolvable_address);
    }
}

impl fmt::Display for UnresolvableAddressCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unresolvable Address")
    }
}

/// Unrecognized Chunk Type (cause 6): the offending chunk, header included
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnrecognizedChunkTypeCause {
    pub unrecognized_chunk: Bytes,
}

impl Tlv for UnrecognizedChunkTypeCause {
    const TYPE: u16 = 6;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for UnrecognizedChunkTypeCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            unrecognized_chunk: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.unrecognized_chunk.len())
            .copy_to_variable_data(&self.unrecognized_chunk);
    }
}

impl fmt::Display for UnrecognizedChunkTypeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unrecognized_chunk.first() {
            Some(chunk_type) => write!(f, "Unrecognized Chunk Type, chunk_type={}", chunk_type),
            None => write!(f, "Unrecognized Chunk Type"),
        }
    }
}

/// Invalid Mandatory Parameter (cause 7). Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvalidMandatoryParameterCause;

impl Tlv for InvalidMandatoryParameterCause {
    const TYPE: u16 = 7;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for InvalidMandatoryParameterCause {
    fn parse(data: &[u8]) -> Option<Self> {
        Self::parse_tlv(data)?;
        Some(Self)
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0);
    }
}

impl fmt::Display for InvalidMandatoryParameterCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid Mandatory Parameter")
    }
}

/// Unrecognized Parameters (cause 8)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnrecognizedParametersCause {
    pub unrecognized_parameters: Bytes,
}

impl Tlv for UnrecognizedParametersCause {
    const TYPE: u16 = 8;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for UnrecognizedParametersCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            unrecognized_parameters: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.unrecognized_parameters.len())
            .copy_to_variable_data(&self.unrecognized_parameters);
    }
}

impl fmt::Display for UnrecognizedParametersCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unrecognized Parameters")
    }
}

/// No User Data (cause 9): a DATA chunk with an empty payload was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoUserDataCause {
    pub tsn: Tsn,
}

impl Tlv for NoUserDataCause {
    const TYPE: u16 = 9;
    const HEADER_SIZE: usize = 8;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for NoUserDataCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            tsn: Tsn(reader.load32(4)),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0).store32(4, self.tsn.0);
    }
}

impl fmt::Display for NoUserDataCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No User Data, tsn={}", self.tsn.0)
    }
}

/// Cookie Received While Shutting Down (cause 10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CookieReceivedWhileShuttingDownCause;

impl Tlv for CookieReceivedWhileShuttingDownCause {
    const TYPE: u16 = 10;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for CookieReceivedWhileShuttingDownCause {
    fn parse(data: &[u8]) -> Option<Self> {
        Self::parse_tlv(data)?;
        Some(Self)
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0);
    }
}

impl fmt::Display for CookieReceivedWhileShuttingDownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cookie Received While Shutting Down")
    }
}

/// Restart of an Association with New Addresses (cause 11): the new address
/// parameters, verbatim
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestartOfAnAssociationWithNewAddressesCause {
    pub new_address_tlvs: Bytes,
}

impl Tlv for RestartOfAnAssociationWithNewAddressesCause {
    const TYPE: u16 = 11;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for RestartOfAnAssociationWithNewAddressesCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            new_address_tlvs: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.new_address_tlvs.len())
            .copy_to_variable_data(&self.new_address_tlvs);
    }
}

impl fmt::Display for RestartOfAnAssociationWithNewAddressesCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Restart of an Association with New Addresses")
    }
}

/// User-Initiated Abort (cause 12)
///
/// The reason is not NUL terminated on the wire; an empty reason is valid.
/// Peers may send any bytes, so they are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInitiatedAbortCause {
    pub upper_layer_abort_reason: Bytes,
}

impl UserInitiatedAbortCause {
    pub fn new(reason: impl Into<Bytes>) -> Self {
        Self {
            upper_layer_abort_reason: reason.into(),
        }
    }

    /// The reason as text, with invalid UTF-8 replaced
    pub fn reason(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.upper_layer_abort_reason)
    }
}

impl Tlv for UserInitiatedAbortCause {
    const TYPE: u16 = 12;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for UserInitiatedAbortCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            upper_layer_abort_reason: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let reason = &self.upper_layer_abort_reason;
        Self::allocate_tlv(out, reason.len()).copy_to_variable_data(reason);
    }
}

impl fmt::Display for UserInitiatedAbortCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User-Initiated Abort, reason={}", self.reason())
    }
}

/// Protocol Violation (cause 13)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolViolationCause {
    pub additional_information: Bytes,
}

impl ProtocolViolationCause {
    pub fn new(additional_information: impl Into<Bytes>) -> Self {
        Self {
            additional_information: additional_information.into(),
        }
    }

    pub fn information(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.additional_information)
    }
}

impl Tlv for ProtocolViolationCause {
    const TYPE: u16 = 13;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ProtocolViolationCause {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            additional_information: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        let information = &self.additional_information;
        Self::allocate_tlv(out, information.len()).copy_to_variable_data(information);
    }
}

impl fmt::Display for ProtocolViolationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Protocol Violation, additional_information={}",
            self.information()
        )
    }
}

/// All error causes defined by RFC 4960
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCause {
    InvalidStreamIdentifier(InvalidStreamIdentifierCause),
    MissingMandatoryParameter(MissingMandatoryParameterCause),
    StaleCookie(StaleCookieErrorCause),
    OutOfResource(OutOfResourceErrorCause),
    UnresolvableAddress(UnresolvableAddressCause),
    UnrecognizedChunkType(UnrecognizedChunkTypeCause),
    InvalidMandatoryParameter(InvalidMandatoryParameterCause),
    UnrecognizedParameters(UnrecognizedParametersCause),
    NoUserData(NoUserDataCause),
    CookieReceivedWhileShuttingDown(CookieReceivedWhileShuttingDownCause),
    RestartOfAnAssociationWithNewAddresses(RestartOfAnAssociationWithNewAddressesCause),
    UserInitiatedAbort(UserInitiatedAbortCause),
    ProtocolViolation(ProtocolViolationCause),
}

impl ErrorCause {
    /// Dispatch on the cause code. Unknown codes yield `None`.
    pub fn parse(descriptor: &ParameterDescriptor<'_>) -> Option<Self> {
        let data = descriptor.data;
        match descriptor.param_type {
            InvalidStreamIdentifierCause::TYPE => {
                InvalidStreamIdentifierCause::parse(data).map(Self::InvalidStreamIdentifier)
            }
            MissingMandatoryParameterCause::TYPE => {
                MissingMandatoryParameterCause::parse(data).map(Self::MissingMandatoryParameter)
            }
            StaleCookieErrorCause::TYPE => StaleCookieErrorCause::parse(data).map(Self::StaleCookie),
            OutOfResourceErrorCause::TYPE => {
                OutOfResourceErrorCause::parse(data).map(Self::OutOfResource)
            }
            UnresolvableAddressCause::TYPE => {
                UnresolvableAddressCause::parse(data).map(Self::UnresolvableAddress)
            }
            UnrecognizedChunkTypeCause::TYPE => {
                UnrecognizedChunkTypeCause::parse(data).map(Self::UnrecognizedChunkType)
            }
            InvalidMandatoryParameterCause::TYPE => {
                InvalidMandatoryParameterCause::parse(data).map(Self::InvalidMandatoryParameter)
            }
            UnrecognizedParametersCause::TYPE => {
                UnrecognizedParametersCause::parse(data).map(Self::UnrecognizedParameters)
            }
            NoUserDataCause::TYPE => NoUserDataCause::parse(data).map(Self::NoUserData),
            CookieReceivedWhileShuttingDownCause::TYPE => {
                CookieReceivedWhileShuttingDownCause::parse(data)
                    .map(Self::CookieReceivedWhileShuttingDown)
            }
            RestartOfAnAssociationWithNewAddressesCause::TYPE => {
                RestartOfAnAssociationWithNewAddressesCause::parse(data)
                    .map(Self::RestartOfAnAssociationWithNewAddresses)
            }
            UserInitiatedAbortCause::TYPE => {
                UserInitiatedAbortCause::parse(data).map(Self::UserInitiatedAbort)
            }
            ProtocolViolationCause::TYPE => {
                ProtocolViolationCause::parse(data).map(Self::ProtocolViolation)
            }
            other => {
                debug!("Unknown error cause code {}", other);
                None
            }
        }
    }

    pub fn serialize_to(&self, out: &mut BytesMut) {
        match self {
            Self::InvalidStreamIdentifier(c) => c.serialize_to(out),
            Self::MissingMandatoryParameter(c) => c.serialize_to(out),
            Self::StaleCookie(c) => c.serialize_to(out),
            Self::OutOfResource(c) => c.serialize_to(out),
            Self::UnresolvableAddress(c) => c.serialize_to(out),
            Self::UnrecognizedChunkType(c) => c.serialize_to(out),
            Self::InvalidMandatoryParameter(c) => c.serialize_to(out),
            Self::UnrecognizedParameters(c) => c.serialize_to(out),
            Self::NoUserData(c) => c.serialize_to(out),
            Self::CookieReceivedWhileShuttingDown(c) => c.serialize_to(out),
            Self::RestartOfAnAssociationWithNewAddresses(c) => c.serialize_to(out),
            Self::UserInitiatedAbort(c) => c.serialize_to(out),
            Self::ProtocolViolation(c) => c.serialize_to(out),
        }
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStreamIdentifier(c) => fmt::Display::fmt(c, f),
            Self::MissingMandatoryParameter(c) => fmt::Display::fmt(c, f),
            Self::StaleCookie(c) => fmt::Display::fmt(c, f),
            Self::OutOfResource(c) => fmt::Display::fmt(c, f),
            Self::UnresolvableAddress(c) => fmt::Display::fmt(c, f),
            Self::UnrecognizedChunkType(c) => fmt::Display::fmt(c, f),
            Self::InvalidMandatoryParameter(c) => fmt::Display::fmt(c, f),
            Self::UnrecognizedParameters(c) => fmt::Display::fmt(c, f),
            Self::NoUserData(c) => fmt::Display::fmt(c, f),
            Self::CookieReceivedWhileShuttingDown(c) => fmt::Display::fmt(c, f),
            Self::RestartOfAnAssociationWithNewAddresses(c) => fmt::Display::fmt(c, f),
            Self::UserInitiatedAbort(c) => fmt::Display::fmt(c, f),
            Self::ProtocolViolation(c) => fmt::Display::fmt(c, f),
        }
    }
}

/// Render every cause in an error-cause list, `;` separated.
pub fn error_causes_to_string(causes: &super::Parameters) -> String {
    causes
        .descriptors()
        .iter()
        .map(|d| match ErrorCause::parse(d) {
            Some(cause) => cause.to_string(),
            None => format!("Unknown error cause {}", d.param_type),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
