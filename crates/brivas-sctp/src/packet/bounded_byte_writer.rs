//! Fixed-header writer over a pre-allocated byte range

use bytes::BufMut;

/// Mutable view over one record that has already been allocated in an output
/// buffer. Mirrors [`BoundedByteReader`](super::BoundedByteReader): stores
/// into the fixed header are big-endian; the rest is variable data.
#[derive(Debug)]
pub struct BoundedByteWriter<'a> {
    data: &'a mut [u8],
    header_size: usize,
}

impl<'a> BoundedByteWriter<'a> {
    pub fn new(data: &'a mut [u8], header_size: usize) -> Self {
        debug_assert!(data.len() >= header_size);
        Self { data, header_size }
    }

    pub fn store8(&mut self, offset: usize, value: u8) {
        debug_assert!(offset + 1 <= self.header_size);
        self.data[offset] = value;
    }

    pub fn store16(&mut self, offset: usize, value: u16) {
        debug_assert!(offset + 2 <= self.header_size);
        let mut field = &mut self.data[offset..offset + 2];
        field.put_u16(value);
    }

    pub fn store32(&mut self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.header_size);
        let mut field = &mut self.data[offset..offset + 4];
        field.put_u32(value);
    }

    /// Copy `source` to the start of the variable data.
    pub fn copy_to_variable_data(&mut self, source: &[u8]) {
        let start = self.header_size;
        self.data[start..start + source.len()].copy_from_slice(source);
    }

    /// Writer for a `size`-byte sub-record `variable_offset` bytes into the
    /// variable data.
    pub fn sub_writer(&mut self, variable_offset: usize, size: usize) -> BoundedByteWriter<'_> {
        let start = self.header_size + variable_offset;
        BoundedByteWriter::new(&mut self.data[start..start + size], size)
    }
}
