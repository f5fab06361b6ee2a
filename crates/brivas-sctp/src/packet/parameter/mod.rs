//! Chunk parameters (RFC 4960 §3.2.1, RFC 3758, RFC 5061, RFC 6525)
//!
//! Parameters travel in a [`Parameters`] list, which is also used for the
//! error causes carried by ABORT and ERROR chunks: both share the same 2-byte
//! type/2-byte length framing.

mod reconfig;

pub use reconfig::{
    AddIncomingStreamsRequestParameter, AddOutgoingStreamsRequestParameter,
    IncomingSsnResetRequestParameter, OutgoingSsnResetRequestParameter, ReconfigResult,
    ReconfigurationResponseParameter, SsnTsnResetRequestParameter,
};

use super::{round_up_to_4, Tlv, TlvRecord};
use bytes::{Bytes, BytesMut};
use std::fmt;
use tracing::debug;

/// Width of the type field of parameters and error causes
pub struct ParameterConfig;

impl ParameterConfig {
    pub const TYPE_SIZE_IN_BYTES: usize = 2;
}

const PARAMETER_HEADER_SIZE: usize = 4;

/// One TLV inside a [`Parameters`] list, without trailing padding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDescriptor<'a> {
    pub param_type: u16,
    pub data: &'a [u8],
}

/// Validated sequence of parameters or error causes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameters {
    data: Bytes,
}

impl Parameters {
    pub fn builder() -> ParametersBuilder {
        ParametersBuilder::default()
    }

    /// Validate the framing of every record in `data`.
    ///
    /// The last record is allowed to omit its padding.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut offset = 0;
        while offset < data.len() {
            let remaining = &data[offset..];
            if remaining.len() < PARAMETER_HEADER_SIZE {
                debug!("Parameters: truncated header at offset {}", offset);
                return None;
            }
            let length = usize::from(u16::from_be_bytes([remaining[2], remaining[3]]));
            if length < PARAMETER_HEADER_SIZE || length > remaining.len() {
                debug!("Parameters: invalid length {} at offset {}", length, offset);
                return None;
            }
            let padded_length = round_up_to_4(length);
            if padded_length > remaining.len() {
                break;
            }
            offset += padded_length;
        }
        Some(Self {
            data: Bytes::copy_from_slice(data),
        })
    }

    /// Serialized form, without trailing padding after the last record.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn descriptors(&self) -> Vec<ParameterDescriptor<'_>> {
        let mut descriptors = Vec::new();
        let mut offset = 0;
        while offset + PARAMETER_HEADER_SIZE <= self.data.len() {
            let header = &self.data[offset..];
            let param_type = u16::from_be_bytes([header[0], header[1]]);
            let length = usize::from(u16::from_be_bytes([header[2], header[3]]));
            if length < PARAMETER_HEADER_SIZE || offset + length > self.data.len() {
                break;
            }
            descriptors.push(ParameterDescriptor {
                param_type,
                data: &self.data[offset..offset + length],
            });
            offset += round_up_to_4(length);
        }
        descriptors
    }

    /// Decode the first record of type `P`.
    pub fn get<P: Tlv + TlvRecord>(&self) -> Option<P> {
        self.descriptors()
            .into_iter()
            .find(|d| d.param_type == P::TYPE)
            .and_then(|d| P::parse(d.data))
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .descriptors()
            .iter()
            .map(|d| match Parameter::parse(d) {
                Some(parameter) => parameter.to_string(),
                None => format!("Unknown parameter 0x{:04x}", d.param_type),
            })
            .collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Accumulates serialized records into a [`Parameters`] list
#[derive(Debug, Default)]
pub struct ParametersBuilder {
    data: BytesMut,
    unpadded_len: usize,
}

impl ParametersBuilder {
    pub fn add(mut self, parameter: &impl TlvRecord) -> Self {
        let start = self.data.len();
        parameter.serialize_to(&mut self.data);
        let length = usize::from(u16::from_be_bytes([self.data[start + 2], self.data[start + 3]]));
        self.unpadded_len = start + length;
        self
    }

    /// RFC 4960 §3.2: the padding of the final parameter is not counted in
    /// the enclosing chunk's length, so it is dropped here.
    pub fn build(self) -> Parameters {
        let mut data = self.data;
        data.truncate(self.unpadded_len);
        Parameters {
            data: data.freeze(),
        }
    }
}

/// All parameter types understood by this stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    HeartbeatInfo(HeartbeatInfoParameter),
    StateCookie(StateCookieParameter),
    UnrecognizedParameter(UnrecognizedParameter),
    OutgoingSsnResetRequest(OutgoingSsnResetRequestParameter),
    IncomingSsnResetRequest(IncomingSsnResetRequestParameter),
    SsnTsnResetRequest(SsnTsnResetRequestParameter),
    ReconfigurationResponse(ReconfigurationResponseParameter),
    AddOutgoingStreamsRequest(AddOutgoingStreamsRequestParameter),
    AddIncomingStreamsRequest(AddIncomingStreamsRequestParameter),
    SupportedExtensions(SupportedExtensionsParameter),
    ForwardTsnSupported(ForwardTsnSupportedParameter),
}

impl Parameter {
    /// Dispatch on the descriptor's type tag. Unknown types yield `None`.
    pub fn parse(descriptor: &ParameterDescriptor<'_>) -> Option<Self> {
        let data = descriptor.data;
        match descriptor.param_type {
            HeartbeatInfoParameter::TYPE => HeartbeatInfoParameter::parse(data).map(Self::HeartbeatInfo),
            StateCookieParameter::TYPE => StateCookieParameter::parse(data).map(Self::StateCookie),
            UnrecognizedParameter::TYPE => {
                UnrecognizedParameter::parse(data).map(Self::UnrecognizedParameter)
            }
            OutgoingSsnResetRequestParameter::TYPE => {
                OutgoingSsnResetRequestParameter::parse(data).map(Self::OutgoingSsnResetRequest)
            }
            IncomingSsnResetRequestParameter::TYPE => {
                IncomingSsnResetRequestParameter::parse(data).map(Self::IncomingSsnResetRequest)
            }
            SsnTsnResetRequestParameter::TYPE => {
                SsnTsnResetRequestParameter::parse(data).map(Self::SsnTsnResetRequest)
            }
            ReconfigurationResponseParameter::TYPE => {
                ReconfigurationResponseParameter::parse(data).map(Self::ReconfigurationResponse)
            }
            AddOutgoingStreamsRequestParameter::TYPE => {
                AddOutgoingStreamsRequestParameter::parse(data).map(Self::AddOutgoingStreamsRequest)
            }
            AddIncomingStreamsRequestParameter::TYPE => {
                AddIncomingStreamsRequestParameter::parse(data).map(Self::AddIncomingStreamsRequest)
            }
            SupportedExtensionsParameter::TYPE => {
                SupportedExtensionsParameter::parse(data).map(Self::SupportedExtensions)
            }
            ForwardTsnSupportedParameter::TYPE => {
                ForwardTsnSupportedParameter::parse(data).map(Self::ForwardTsnSupported)
            }
            other => {
                debug!("Unknown parameter type 0x{:04x}", other);
                None
            }
        }
    }

    pub fn serialize_to(&self, out: &mut BytesMut) {
        match self {
            Self::HeartbeatInfo(p) => p.serialize_to(out),
            Self::StateCookie(p) => p.serialize_to(out),
            Self::UnrecognizedParameter(p) => p.serialize_to(out),
            Self::OutgoingSsnResetRequest(p) => p.serialize_to(out),
            Self::IncomingSsnResetRequest(p) => p.serialize_to(out),
            Self::SsnTsnResetRequest(p) => p.serialize_to(out),
            Self::ReconfigurationResponse(p) => p.serialize_to(out),
            Self::AddOutgoingStreamsRequest(p) => p.serialize_to(out),
            Self::AddIncomingStreamsRequest(p) => p.serialize_to(out),
            Self::SupportedExtensions(p) => p.serialize_to(out),
            Self::ForwardTsnSupported(p) => p.serialize_to(out),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeartbeatInfo(p) => fmt::Display::fmt(p, f),
            Self::StateCookie(p) => fmt::Display::fmt(p, f),
            Self::UnrecognizedParameter(p) => fmt::Display::fmt(p, f),
            Self::OutgoingSsnResetRequest(p) => fmt::Display::fmt(p, f),
            Self::IncomingSsnResetRequest(p) => fmt::Display::fmt(p, f),
            Self::SsnTsnResetRequest(p) => fmt::Display::fmt(p, f),
            Self::ReconfigurationResponse(p) => fmt::Display::fmt(p, f),
            Self::AddOutgoingStreamsRequest(p) => fmt::Display::fmt(p, f),
            Self::AddIncomingStreamsRequest(p) => fmt::Display::fmt(p, f),
            Self::SupportedExtensions(p) => fmt::Display::fmt(p, f),
            Self::ForwardTsnSupported(p) => fmt::Display::fmt(p, f),
        }
    }
}

/// Heartbeat Info (type 1): opaque sender-specific data echoed by the peer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeartbeatInfoParameter {
    pub info: Bytes,
}

impl Tlv for HeartbeatInfoParameter {
    const TYPE: u16 = 1;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for HeartbeatInfoParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            info: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.info.len()).copy_to_variable_data(&self.info);
    }
}

impl fmt::Display for HeartbeatInfoParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Heartbeat Info, length={}", self.info.len())
    }
}

/// State Cookie (type 7), sent in INIT ACK
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateCookieParameter {
    pub data: Bytes,
}

impl Tlv for StateCookieParameter {
    const TYPE: u16 = 7;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for StateCookieParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            data: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.data.len()).copy_to_variable_data(&self.data);
    }
}

impl fmt::Display for StateCookieParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State Cookie, length={}", self.data.len())
    }
}

/// Unrecognized Parameter (type 8): echoes a parameter the sender could not
/// process, header included
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnrecognizedParameter {
    pub data: Bytes,
}

impl Tlv for UnrecognizedParameter {
    const TYPE: u16 = 8;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for UnrecognizedParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            data: Bytes::copy_from_slice(reader.variable_data()),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.data.len()).copy_to_variable_data(&self.data);
    }
}

impl fmt::Display for UnrecognizedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unrecognized Parameter")
    }
}

/// Supported Extensions (type 0x8008, RFC 5061 §4.2.7): chunk types the
/// sender understands beyond the RFC 4960 base set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SupportedExtensionsParameter {
    pub chunk_types: Vec<u8>,
}

impl SupportedExtensionsParameter {
    pub fn supports(&self, chunk_type: u8) -> bool {
        self.chunk_types.contains(&chunk_type)
    }
}

impl Tlv for SupportedExtensionsParameter {
    const TYPE: u16 = 0x8008;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 1;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for SupportedExtensionsParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        let reader = Self::parse_tlv(data)?;
        Some(Self {
            chunk_types: reader.variable_data().to_vec(),
        })
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, self.chunk_types.len()).copy_to_variable_data(&self.chunk_types);
    }
}

impl fmt::Display for SupportedExtensionsParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<String> = self.chunk_types.iter().map(|t| t.to_string()).collect();
        write!(f, "Supported Extensions ({})", types.join(", "))
    }
}

/// Forward-TSN-Supported (type 0xC000, RFC 3758 §3.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForwardTsnSupportedParameter;

impl Tlv for ForwardTsnSupportedParameter {
    const TYPE: u16 = 0xC000;
    const HEADER_SIZE: usize = 4;
    const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
    const TYPE_SIZE_IN_BYTES: usize = ParameterConfig::TYPE_SIZE_IN_BYTES;
}

impl TlvRecord for ForwardTsnSupportedParameter {
    fn parse(data: &[u8]) -> Option<Self> {
        Self::parse_tlv(data)?;
        Some(Self)
    }

    fn serialize_to(&self, out: &mut BytesMut) {
        Self::allocate_tlv(out, 0);
    }
}

impl fmt::Display for ForwardTsnSupportedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Forward TSN Supported")
    }
}
