//! Sequential, bounds-checked access to byte buffers.
//!
//! [`Reader`] walks a borrowed input slice and hands out sub-slices that live as long as the
//! input. [`Writer`] builds an owned buffer that can be patched after the fact.

use crate::error::{Error, Result};

/// Maximum number of bytes a variable-length quantity is read from.
pub const VARLEN_MAX_BYTES: usize = 4;

/// Largest value that fits into [`VARLEN_MAX_BYTES`].
pub const VARLEN_MAX: u32 = 0x0FFF_FFFF;

pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn out_of_bounds(&self, distance: isize) -> Error {
        Error::OutOfBounds {
            position: self.pos,
            distance,
        }
    }

    /// Borrows the next `count` bytes and moves past them.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.out_of_bounds(count as isize))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u24_be(&mut self) -> Result<u32> {
        let b = self.read_bytes(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Reads a MIDI variable-length quantity.
    ///
    /// Stops after [`VARLEN_MAX_BYTES`] even if the last byte still has its continuation bit
    /// set, so malformed input can't make the value grow without bounds.
    pub fn read_varlen(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        for _ in 0..VARLEN_MAX_BYTES {
            let byte = self.read_u8()?;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(value)
    }

    /// Moves to the start of the next occurrence of `pattern`, searching from the current
    /// position. The position is left untouched if there is none.
    pub fn scan_to(&mut self, pattern: &[u8]) -> Result<()> {
        if pattern.is_empty() {
            return Ok(());
        }
        let offset = self.data[self.pos..]
            .windows(pattern.len())
            .position(|window| window == pattern)
            .ok_or(Error::PatternNotFound)?;
        self.pos += offset;
        Ok(())
    }

    pub fn skip(&mut self, distance: isize) -> Result<()> {
        let target = if distance < 0 {
            self.pos.checked_sub(distance.unsigned_abs())
        } else {
            self.pos.checked_add(distance.unsigned_abs())
        };
        self.pos = target
            .filter(|&target| target <= self.data.len())
            .ok_or_else(|| self.out_of_bounds(distance))?;
        Ok(())
    }
}

#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
    pos: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Repositions the cursor within the bytes written so far.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.buf.len() {
            return Err(Error::OutOfBounds {
                position: self.pos,
                distance: position as isize - self.pos as isize,
            });
        }
        self.pos = position;
        Ok(())
    }

    fn grow_to(&mut self, len: usize) -> Result<()> {
        if len > self.buf.capacity() {
            let target = len.max(self.buf.capacity() * 2);
            self.buf.try_reserve_exact(target - self.buf.len())?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos.checked_add(bytes.len()).ok_or(Error::OutOfBounds {
            position: self.pos,
            distance: bytes.len() as isize,
        })?;
        if end > self.buf.len() {
            self.grow_to(end)?;
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_u16_be(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u32_be(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Writes `value` as a MIDI variable-length quantity, using as many 7-bit groups as it
    /// needs.
    pub fn write_varlen(&mut self, value: u32) -> Result<()> {
        let mut groups = [0u8; 5];
        let mut start = groups.len() - 1;
        groups[start] = (value & 0x7F) as u8;
        let mut rest = value >> 7;
        while rest != 0 {
            start -= 1;
            groups[start] = 0x80 | (rest & 0x7F) as u8;
            rest >>= 7;
        }
        self.write_bytes(&groups[start..])
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
