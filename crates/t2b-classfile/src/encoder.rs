//! Class file encoding and decoding utilities
//!
//! Class files are big-endian throughout. [`ClassWriter`] and [`ClassReader`]
//! provide the primitive operations every structure in this crate is built on.

use thiserror::Error;

/// Errors that can occur while decoding a class file
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Unexpected end of the input
    #[error("Unexpected end of class file at offset {0}")]
    UnexpectedEnd(usize),

    /// Invalid modified UTF-8 sequence
    #[error("Invalid modified UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// Unknown constant pool tag
    #[error("Invalid constant pool tag {0} at offset {1}")]
    InvalidConstantTag(u8, usize),

    /// Unknown annotation element value tag
    #[error("Invalid element value tag {0:?} at offset {1}")]
    InvalidElementTag(char, usize),

    /// Attribute body did not match its declared length
    #[error("Attribute '{name}' declared {declared} bytes but {consumed} were decoded")]
    AttributeLength {
        /// Attribute name
        name: String,
        /// `attribute_length` from the file
        declared: usize,
        /// Bytes actually decoded
        consumed: usize,
    },
}

/// Writer for class file structures
pub struct ClassWriter {
    /// Internal buffer containing the encoded bytes
    pub(crate) buffer: Vec<u8>,
}

impl ClassWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new writer with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Get the current buffer
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get the current offset
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Emit a raw byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a 16-bit unsigned integer (big-endian)
    pub fn emit_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Emit a 32-bit unsigned integer (big-endian)
    pub fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Emit a 64-bit unsigned integer (big-endian)
    pub fn emit_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Emit raw bytes
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Reserve a u32 slot and return its offset for later patching
    pub fn reserve_u32(&mut self) -> usize {
        let offset = self.offset();
        self.emit_u32(0);
        offset
    }

    /// Patch a previously reserved u32 slot
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buffer[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }
}

impl Default for ClassWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader for class file structures
pub struct ClassReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ClassReader<'a> {
    /// Create a new reader
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Get the current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the remaining bytes in the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there are more bytes to read
    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if count > self.remaining() {
            return Err(DecodeError::UnexpectedEnd(self.position));
        }
        let slice = &self.buffer[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Read a 16-bit unsigned integer (big-endian)
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a 32-bit unsigned integer (big-endian)
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a 64-bit unsigned integer (big-endian)
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let high = self.read_u32()? as u64;
        let low = self.read_u32()? as u64;
        Ok((high << 32) | low)
    }

    /// Read `count` raw bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, DecodeError> {
        Ok(self.take(count)?.to_vec())
    }

    /// Read `count` raw bytes without copying
    pub fn read_slice(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        self.take(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_is_big_endian() {
        let mut writer = ClassWriter::new();
        writer.emit_u16(0xCAFE);
        writer.emit_u32(0xDEADBEEF);
        assert_eq!(writer.buffer(), &[0xCA, 0xFE, 0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_reserve_and_patch() {
        let mut writer = ClassWriter::new();
        writer.emit_u8(7);
        let slot = writer.reserve_u32();
        writer.emit_u8(9);
        writer.patch_u32(slot, 2);
        assert_eq!(writer.into_bytes(), vec![7, 0, 0, 0, 2, 9]);
    }

    #[test]
    fn test_reader_primitives() {
        let data = [0x00, 0x2A, 0x00, 0x00, 0x01, 0x00, 0xFF];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_u16().unwrap(), 42);
        assert_eq!(reader.read_u32().unwrap(), 256);
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
        assert!(!reader.has_more());
    }

    #[test]
    fn test_reader_u64() {
        let data = [0, 0, 0, 1, 0, 0, 0, 2];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_u64().unwrap(), (1u64 << 32) | 2);
    }

    #[test]
    fn test_reader_bounds_checking() {
        let data = [0x01];
        let mut reader = ClassReader::new(&data);
        assert!(matches!(reader.read_u16(), Err(DecodeError::UnexpectedEnd(0))));
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert!(matches!(reader.read_u8(), Err(DecodeError::UnexpectedEnd(1))));
    }
}
