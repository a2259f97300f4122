//! Byte-level save stream.
//!
//! Every multi-byte value goes out least significant byte first, one byte at
//! a time, so the format does not depend on the host. Both ends keep a
//! sticky error flag instead of failing fast: a short read yields `0xff` and
//! the caller checks [`SaveReader::failed`] once the whole load has run.

use std::io::{self, Write};

use log::error;

use crate::numeric::{low16, low8, Fixed};

/// Padding needed to bring `pos` up to a multiple of four.
const fn pad_len(pos: usize) -> usize {
    (4 - (pos & 3)) & 3
}

/// Writes archive fields to any byte sink.
pub struct SaveWriter<W: Write> {
    inner: W,
    pos: usize,
    error: Option<io::Error>,
}

impl<W: Write> SaveWriter<W> {
    /// A writer at offset zero of `inner`.
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            pos: 0,
            error: None,
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Whether a write has failed.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// Writes one byte.
    pub fn write8(&mut self, value: u8) {
        if let Err(err) = self.inner.write_all(&[value]) {
            if self.error.is_none() {
                error!("error while writing save game at byte {}: {err}", self.pos);
                self.error = Some(err);
            }
        }
        self.pos += 1;
    }

    /// Writes a 16-bit value, low byte first.
    pub fn write16(&mut self, value: i16) {
        let word = i32::from(value);
        self.write8(low8(word));
        self.write8(low8(word >> 8));
    }

    /// Writes a 32-bit value, low byte first.
    pub fn write32(&mut self, value: i32) {
        for shift in [0, 8, 16, 24] {
            self.write8(low8(value >> shift));
        }
    }

    /// Writes the raw 16.16 word.
    pub fn write_fixed(&mut self, value: Fixed) {
        self.write32(value.raw());
    }

    /// Writes a flag as a 32-bit 0 or 1.
    pub fn write_bool(&mut self, value: bool) {
        self.write32(i32::from(value));
    }

    /// Writes zero bytes up to the next 4-byte boundary.
    pub fn write_pad(&mut self) {
        for _ in 0..pad_len(self.pos) {
            self.write8(0);
        }
    }

    /// Writes `text` into a zero-filled field of `width` bytes, truncating
    /// when it does not fit.
    pub fn write_str_field(&mut self, text: &str, width: usize) {
        let bytes = text.as_bytes();
        for i in 0..width {
            self.write8(bytes.get(i).copied().unwrap_or(0));
        }
    }

    /// Flushes and hands back the sink, or the first write error.
    ///
    /// # Errors
    /// Returns the first I/O error seen by any write, or by the flush.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads archive fields from an in-memory stream.
#[derive(Debug)]
pub struct SaveReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    error: bool,
}

impl<'a> SaveReader<'a> {
    /// A reader at the start of `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            error: false,
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Whether a read ran past the end of the stream.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.error
    }

    /// Next byte, or `0xff` once the stream is exhausted.
    pub fn read8(&mut self) -> u8 {
        if let Some(&byte) = self.bytes.get(self.pos) {
            self.pos += 1;
            return byte;
        }
        if !self.error {
            error!("unexpected end of file while reading save game at byte {}", self.pos);
            self.error = true;
        }
        0xff
    }

    /// Reads a 16-bit value stored low byte first.
    pub fn read16(&mut self) -> i16 {
        let low = i32::from(self.read8());
        let high = i32::from(self.read8());
        low16(low | (high << 8))
    }

    /// Reads a 32-bit value stored low byte first.
    pub fn read32(&mut self) -> i32 {
        [0, 8, 16, 24]
            .into_iter()
            .fold(0, |word, shift| word | (i32::from(self.read8()) << shift))
    }

    /// Reads a raw 16.16 word.
    pub fn read_fixed(&mut self) -> Fixed {
        Fixed(self.read32())
    }

    /// Reads a 32-bit flag; anything but zero is set.
    pub fn read_bool(&mut self) -> bool {
        self.read32() != 0
    }

    /// Skips to the next 4-byte boundary.
    pub fn read_pad(&mut self) {
        for _ in 0..pad_len(self.pos) {
            self.read8();
        }
    }

    /// Reads a fixed-width, zero-terminated text field.
    pub fn read_str_field(&mut self, width: usize) -> String {
        let raw: Vec<u8> = (0..width).map(|_| self.read8()).collect();
        let text: Vec<u8> = raw.into_iter().take_while(|b| *b != 0).collect();
        String::from_utf8_lossy(&text).into_owned()
    }
}
