//! Type-Length-Value framing shared by chunks, parameters and error causes

use super::{round_up_to_4, BoundedByteReader, BoundedByteWriter};
use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

/// Wire framing of one record type.
///
/// Chunks use a 1-byte type followed by a flags byte, parameters and error
/// causes a 2-byte type. In both cases the 16-bit length sits at offset 2.
pub trait Tlv {
    const TYPE: u16;
    const HEADER_SIZE: usize;
    /// Granularity of the variable-length part, or 0 for fixed-size records
    const VARIABLE_LENGTH_ALIGNMENT: usize;
    const TYPE_SIZE_IN_BYTES: usize;

    /// Validate the framing of `data` and return a reader limited to the
    /// declared length (trailing padding excluded).
    fn parse_tlv(data: &[u8]) -> Option<BoundedByteReader<'_>> {
        let name = std::any::type_name::<Self>();
        if data.len() < Self::HEADER_SIZE {
            debug!("{}: too short ({} bytes)", name, data.len());
            return None;
        }

        let actual_type = if Self::TYPE_SIZE_IN_BYTES == 1 {
            u16::from(data[0])
        } else {
            u16::from_be_bytes([data[0], data[1]])
        };
        if actual_type != Self::TYPE {
            debug!("{}: invalid type {} (expected {})", name, actual_type, Self::TYPE);
            return None;
        }

        let length = usize::from(u16::from_be_bytes([data[2], data[3]]));
        if Self::VARIABLE_LENGTH_ALIGNMENT == 0 {
            if length != Self::HEADER_SIZE || data.len() != Self::HEADER_SIZE {
                debug!("{}: invalid fixed length field {}", name, length);
                return None;
            }
        } else {
            if length < Self::HEADER_SIZE || length > data.len() {
                debug!("{}: invalid length field {} for {} bytes", name, length, data.len());
                return None;
            }
            if data.len() - length > 3 {
                debug!("{}: too much padding ({} bytes)", name, data.len() - length);
                return None;
            }
            if (length - Self::HEADER_SIZE) % Self::VARIABLE_LENGTH_ALIGNMENT != 0 {
                debug!("{}: variable length {} not aligned", name, length - Self::HEADER_SIZE);
                return None;
            }
        }

        BoundedByteReader::new(&data[..length], Self::HEADER_SIZE)
    }

    /// Append a zeroed record with room for `variable_length` bytes of value,
    /// padded to 4 bytes, with the type and length fields filled in.
    fn allocate_tlv(out: &mut BytesMut, variable_length: usize) -> BoundedByteWriter<'_> {
        let offset = out.len();
        let size = Self::HEADER_SIZE + variable_length;
        debug_assert!(Self::VARIABLE_LENGTH_ALIGNMENT != 0 || variable_length == 0);

        out.resize(offset + round_up_to_4(size), 0);
        let record = &mut out[offset..offset + size];
        if Self::TYPE_SIZE_IN_BYTES == 1 {
            record[0] = Self::TYPE as u8;
        } else {
            record[..2].copy_from_slice(&Self::TYPE.to_be_bytes());
        }
        record[2..4].copy_from_slice(&length_field(size).to_be_bytes());

        BoundedByteWriter::new(record, Self::HEADER_SIZE)
    }
}

/// Value of a 16-bit TLV length field for a record of `size` bytes.
///
/// Records longer than 65535 bytes cannot be framed. Their length saturates
/// at `u16::MAX`, which no receiver will accept for that many bytes.
pub(crate) fn length_field(size: usize) -> u16 {
    u16::try_from(size).unwrap_or_else(|_| {
        warn!("Record of {} bytes does not fit a TLV length field", size);
        u16::MAX
    })
}

/// A typed record that can be decoded from and appended to a byte buffer.
pub trait TlvRecord: Sized {
    /// Decode one record. Malformed input yields `None`, never a panic.
    fn parse(data: &[u8]) -> Option<Self>;

    /// Append the record, including trailing padding, to `out`.
    fn serialize_to(&self, out: &mut BytesMut);

    fn serialize(&self) -> Bytes {
        let mut out = BytesMut::new();
        self.serialize_to(&mut out);
        out.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;
    impl Tlv for Fixed {
        const TYPE: u16 = 0x4242;
        const HEADER_SIZE: usize = 8;
        const VARIABLE_LENGTH_ALIGNMENT: usize = 0;
        const TYPE_SIZE_IN_BYTES: usize = 2;
    }

    struct Variable;
    impl Tlv for Variable {
        const TYPE: u16 = 0x49;
        const HEADER_SIZE: usize = 4;
        const VARIABLE_LENGTH_ALIGNMENT: usize = 2;
        const TYPE_SIZE_IN_BYTES: usize = 1;
    }

    #[test]
    fn test_fixed_size_allocate_and_parse() {
        let mut out = BytesMut::new();
        Fixed::allocate_tlv(&mut out, 0).store32(4, 0x0102_0304);
        assert_eq!(&out[..], &[0x42, 0x42, 0x00, 0x08, 0x01, 0x02, 0x03, 0x04]);

        let reader = Fixed::parse_tlv(&out).unwrap();
        assert_eq!(reader.load32(4), 0x0102_0304);
    }

    #[test]
    fn test_fixed_size_rejects_trailing_data() {
        let data = [0x42, 0x42, 0x00, 0x08, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(Fixed::parse_tlv(&data).is_none());
    }

    #[test]
    fn test_rejects_wrong_type() {
        let data = [0x42, 0x43, 0x00, 0x08, 0, 0, 0, 0];
        assert!(Fixed::parse_tlv(&data).is_none());
    }

    #[test]
    fn test_variable_size_is_padded() {
        let mut out = BytesMut::from(&[0xffu8, 0xff][..]);
        Variable::allocate_tlv(&mut out, 6).copy_to_variable_data(&[1, 2, 3, 4, 5, 6]);
        // Appended after existing bytes, length excludes the 2 bytes of padding
        assert_eq!(
            &out[..],
            &[0xff, 0xff, 0x49, 0x00, 0x00, 0x0a, 1, 2, 3, 4, 5, 6, 0, 0]
        );

        let reader = Variable::parse_tlv(&out[2..]).unwrap();
        assert_eq!(reader.variable_data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_oversized_record_length_saturates() {
        assert_eq!(length_field(65535), 65535);
        assert_eq!(length_field(65536), u16::MAX);

        let mut out = BytesMut::new();
        Variable::allocate_tlv(&mut out, 70_000);
        assert_eq!(&out[2..4], &[0xff, 0xff]);
        // The declared length no longer covers the value, so it does not parse back
        assert!(Variable::parse_tlv(&out).is_none());
    }

    #[test]
    fn test_variable_size_validation() {
        // Length shorter than header
        assert!(Variable::parse_tlv(&[0x49, 0, 0x00, 0x02]).is_none());
        // Length past the end
        assert!(Variable::parse_tlv(&[0x49, 0, 0x00, 0x08, 1, 2]).is_none());
        // Misaligned variable part
        assert!(Variable::parse_tlv(&[0x49, 0, 0x00, 0x05, 1, 0, 0, 0]).is_none());
        // Four bytes of padding
        assert!(Variable::parse_tlv(&[0x49, 0, 0x00, 0x04, 0, 0, 0, 0]).is_none());
        // Empty value is fine
        let reader = Variable::parse_tlv(&[0x49, 0, 0x00, 0x04]).unwrap();
        assert_eq!(reader.variable_data_size(), 0);
    }
}
