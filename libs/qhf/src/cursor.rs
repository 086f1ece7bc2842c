use byteorder::ByteOrder;

use crate::error::CursorError;

/// Bounds-checked sequential reader over an in-memory buffer.
///
/// All multi-byte reads are big-endian, as the QHF format specifies.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current read position (in bytes)
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes left in the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Read the next byte
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Read the next two bytes as a big-endian unsigned integer
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        let bytes = self.read_bytes(2)?;
        Ok(byteorder::BigEndian::read_u16(bytes))
    }

    /// Read the next four bytes as a big-endian unsigned integer
    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        let bytes = self.read_bytes(4)?;
        Ok(byteorder::BigEndian::read_u32(bytes))
    }

    /// Read the next `wanted` bytes verbatim
    pub fn read_bytes(&mut self, wanted: usize) -> Result<&'a [u8], CursorError> {
        if wanted > self.remaining() {
            return Err(CursorError::OutOfBounds {
                offset: self.position,
                wanted,
                length: self.buffer.len(),
            });
        }

        let bytes = &self.buffer[self.position..self.position + wanted];
        self.position += wanted;
        Ok(bytes)
    }

    /// Read a 16-bit length prefix followed by that many bytes, decoded as UTF-8
    pub fn read_length_prefixed_string(&mut self) -> Result<String, CursorError> {
        let prefix_offset = self.position;
        let length = usize::from(self.read_u16()?);

        if length > self.remaining() {
            return Err(CursorError::InvalidLength {
                offset: prefix_offset,
                received: length as u32,
                remaining: self.remaining(),
            });
        }

        let offset = self.position;
        let bytes = self.read_bytes(length)?;

        match std::str::from_utf8(bytes) {
            Err(_) => Err(CursorError::InvalidEncoding { offset }),
            Ok(value) => Ok(value.to_string()),
        }
    }

    /// Move the read position forward by `count` bytes
    pub fn skip(&mut self, count: usize) -> Result<(), CursorError> {
        if count > self.remaining() {
            return Err(CursorError::OutOfBounds {
                offset: self.position,
                wanted: count,
                length: self.buffer.len(),
            });
        }

        self.position += count;
        Ok(())
    }

    /// Move the read position to an absolute offset within `[0, len]`
    pub fn seek(&mut self, offset: usize) -> Result<(), CursorError> {
        if offset > self.buffer.len() {
            return Err(CursorError::OutOfBounds {
                offset,
                wanted: 0,
                length: self.buffer.len(),
            });
        }

        self.position = offset;
        Ok(())
    }
}
