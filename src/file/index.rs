//! Trailing block index codec.
//!
//! The last region of a file: a u32 LE count followed by that many u64 LE
//! absolute offsets, one per record block.

use crate::buffer::ByteReader;
use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Dense array of record-block start offsets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockIndex {
    /// Absolute file offsets of each record block's first miniblock.
    pub offsets: Vec<u64>,
}

impl BlockIndex {
    /// Create an index from block offsets.
    pub fn new(offsets: Vec<u64>) -> Self {
        Self { offsets }
    }

    /// Number of indexed blocks.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when no blocks are indexed.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Encode the index region.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + self.offsets.len() * 8);
        buf.put_u32_le(self.offsets.len() as u32);
        for offset in &self.offsets {
            buf.put_u64_le(*offset);
        }
        buf.freeze()
    }

    /// Decode the index region, consuming `data` exactly.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::with_label(data.to_vec(), "block index");
        let count = r.get_u32_le()? as u64;
        if r.remaining() as u64 != count * 8 {
            return Err(Error::corruption(format!(
                "block index declares {} entries ({} bytes) but carries {}",
                count,
                count * 8,
                r.remaining()
            )));
        }

        let mut offsets = Vec::with_capacity(count as usize);
        for _ in 0..count {
            offsets.push(r.get_u64_le()?);
        }
        Ok(Self { offsets })
    }
}
