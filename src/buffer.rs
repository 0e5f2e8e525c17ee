//! Bounded byte reader used by every region parser.
//!
//! All regions of a YXDB file parse inside a byte-exact window: the header
//! is exactly 512 bytes, the schema occupies exactly `metaInfoLength * 2`
//! bytes, and so on. `ByteReader` carries a region label so truncation
//! errors name the region and the expected/actual sizes, and `isolate`
//! enforces that a nested parser consumes its window exactly.

use crate::error::{Error, Result};
use bytes::{Buf, Bytes};

/// A bounded little-endian reader over an in-memory byte region.
#[derive(Debug, Clone)]
pub struct ByteReader {
    buf: Bytes,
    label: &'static str,
}

impl ByteReader {
    /// Create a reader over `data` with the default region label.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_label(data, "input")
    }

    /// Create a reader over `data` labeled `label` for diagnostics.
    pub fn with_label(data: impl Into<Bytes>, label: &'static str) -> Self {
        Self { buf: data.into(), label }
    }

    /// Number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// True when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.buf.len() < n {
            return Err(Error::corruption(format!(
                "{}: need {} bytes, {} available",
                self.label,
                n,
                self.buf.len()
            )));
        }
        Ok(())
    }

    /// Read one byte.
    pub fn get_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    /// Read a little-endian u16.
    pub fn get_u16_le(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(self.buf.get_u16_le())
    }

    /// Read a little-endian u32.
    pub fn get_u32_le(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    /// Read a little-endian u64.
    pub fn get_u64_le(&mut self) -> Result<u64> {
        self.need(8)?;
        Ok(self.buf.get_u64_le())
    }

    /// Read exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<Bytes> {
        self.need(n)?;
        Ok(self.buf.split_to(n))
    }

    /// Consume and return everything through end of input.
    pub fn take_remaining(&mut self) -> Bytes {
        self.buf.split_to(self.buf.len())
    }

    /// Run `f` over exactly the next `n` bytes.
    ///
    /// The inner parser sees a fresh reader labeled `label` holding `n`
    /// bytes and nothing else. Consuming fewer than `n` bytes fails with
    /// the consumed/expected counts; consuming more fails inside `f` as a
    /// truncation of the isolated window.
    pub fn isolate<T>(
        &mut self,
        n: usize,
        label: &'static str,
        f: impl FnOnce(&mut ByteReader) -> Result<T>,
    ) -> Result<T> {
        self.need(n)?;
        let mut inner = ByteReader::with_label(self.buf.split_to(n), label);
        let value = f(&mut inner)?;
        if !inner.is_empty() {
            return Err(Error::corruption(format!(
                "{}: parser consumed {} of {} bytes",
                label,
                n - inner.remaining(),
                n
            )));
        }
        Ok(value)
    }
}

/// Encode `text` as UTF-16LE bytes.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Decode UTF-16LE bytes into a string.
///
/// Fails on an odd byte count or invalid surrogate pairs.
pub fn decode_utf16le(bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::corruption(format!(
            "UTF-16 text has odd byte length {}",
            bytes.len()
        )));
    }
    let units: Vec<u16> =
        bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
    String::from_utf16(&units)
        .map_err(|_| Error::corruption("UTF-16 text contains an invalid surrogate"))
}
