//! Fixed-header view over a validated byte range

use bytes::Buf;

/// Read-only view over one record.
///
/// The first `header_size` bytes form the fixed header, which is guaranteed
/// to be present at construction. Everything after it is the variable-length
/// data. Fixed-offset loads are big-endian and must lie inside the header.
#[derive(Debug, Clone, Copy)]
pub struct BoundedByteReader<'a> {
    data: &'a [u8],
    header_size: usize,
}

impl<'a> BoundedByteReader<'a> {
    /// Wrap `data`, or `None` if it cannot hold the fixed header.
    pub fn new(data: &'a [u8], header_size: usize) -> Option<Self> {
        if data.len() < header_size {
            return None;
        }
        Some(Self { data, header_size })
    }

    pub fn load8(&self, offset: usize) -> u8 {
        debug_assert!(offset + 1 <= self.header_size);
        self.data[offset]
    }

    pub fn load16(&self, offset: usize) -> u16 {
        debug_assert!(offset + 2 <= self.header_size);
        let mut field = &self.data[offset..];
        field.get_u16()
    }

    pub fn load32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.header_size);
        let mut field = &self.data[offset..];
        field.get_u32()
    }

    /// Bytes following the fixed header.
    pub fn variable_data(&self) -> &'a [u8] {
        &self.data[self.header_size..]
    }

    pub fn variable_data_size(&self) -> usize {
        self.data.len() - self.header_size
    }

    /// Reader for a `size`-byte sub-record starting `variable_offset` bytes
    /// into the variable data. Only the sub-record's own bytes are visible.
    pub fn sub_reader(&self, variable_offset: usize, size: usize) -> Option<BoundedByteReader<'a>> {
        let start = self.header_size.checked_add(variable_offset)?;
        let end = start.checked_add(size)?;
        BoundedByteReader::new(self.data.get(start..end)?, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_are_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0xaa];
        let reader = BoundedByteReader::new(&data, 8).unwrap();
        assert_eq!(reader.load8(0), 0x01);
        assert_eq!(reader.load16(2), 0x0304);
        assert_eq!(reader.load32(4), 0x0506_0708);
        assert_eq!(reader.variable_data(), &[0xaa]);
        assert_eq!(reader.variable_data_size(), 1);
    }

    #[test]
    fn test_rejects_short_header() {
        assert!(BoundedByteReader::new(&[0, 0, 0], 4).is_none());
    }

    #[test]
    fn test_sub_reader_bounds() {
        let data = [0, 0, 0, 0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
        let reader = BoundedByteReader::new(&data, 4).unwrap();

        let sub = reader.sub_reader(2, 4).unwrap();
        assert_eq!(sub.load32(0), 0x3344_5566);
        assert_eq!(sub.variable_data_size(), 0);

        assert!(reader.sub_reader(3, 4).is_none());
    }
}
