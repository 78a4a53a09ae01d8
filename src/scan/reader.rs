//! Bounded, endian-aware cursor over a byte buffer.
//!
//! Every read validates `position + width <= len` before touching the
//! buffer, so the reader can be pointed at arbitrary hostile input without
//! out-of-bounds access or panics.

use crate::core::dex::Endian;
use crate::error::{DexProbeError, Result};

/// Cursor over a fixed byte buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Move the cursor to an absolute offset. The offset may equal the
    /// buffer length (cursor at end); anything beyond fails.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.buf.len() {
            return Err(DexProbeError::TruncatedInput { offset, width: 0 });
        }
        self.pos = offset;
        Ok(())
    }

    fn take(&mut self, width: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(width).ok_or(DexProbeError::TruncatedInput {
            offset: self.pos,
            width,
        })?;
        if end > self.buf.len() {
            return Err(DexProbeError::TruncatedInput {
                offset: self.pos,
                width,
            });
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self, endian: Endian) -> Result<u16> {
        let b: [u8; 2] = self.take(2)?.try_into().unwrap();
        Ok(match endian {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        })
    }

    pub fn read_u32(&mut self, endian: Endian) -> Result<u32> {
        let b: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(match endian {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        })
    }

    pub fn read_u64(&mut self, endian: Endian) -> Result<u64> {
        let b: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(match endian {
            Endian::Little => u64::from_le_bytes(b),
            Endian::Big => u64::from_be_bytes(b),
        })
    }
}
