//! Bounds-checked read position over an immutable byte buffer
//!
//! Every multi-byte read validates the remaining length before advancing, so
//! a malformed length field or count byte can never index past the end of
//! the buffer. All multi-byte integers on the wire are big-endian.

use byteorder::{BigEndian, ByteOrder};

use crate::types::{DecodeError, Result};

/// A forward-only reader over a byte slice
#[derive(Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn require(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(DecodeError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read the byte `ahead` positions past the cursor without advancing
    pub fn peek(&self, ahead: usize) -> Result<u8> {
        self.require(ahead + 1)?;
        Ok(self.buf[self.pos + ahead])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        let value = self.buf[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.require(2)?;
        let value = BigEndian::read_u16(&self.buf[self.pos..]);
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        let value = BigEndian::read_u32(&self.buf[self.pos..]);
        self.pos += 4;
        Ok(value)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Skip `n` bytes without inspecting them
    pub fn advance(&mut self, n: usize) -> Result<()> {
        self.require(n)?;
        self.pos += n;
        Ok(())
    }
}
