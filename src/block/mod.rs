//! Block stream codec.
//!
//! A block is a logical byte stream carried as a sequence of miniblocks:
//!
//! ```text
//! [Miniblock 1]
//! [Miniblock 2]
//! ...
//! [Miniblock N]
//! ```
//!
//! Decoding concatenates the miniblock payloads; the split points chosen by
//! an encoder are not observable, so block equality is over the
//! concatenation only. The file layer always decodes a block inside a
//! window whose size it computed from the header.

pub mod miniblock;

use crate::buffer::ByteReader;
use crate::error::Result;
use bytes::{Bytes, BytesMut};
use std::io::Write;

/// Split threshold for encoded miniblocks (64KB).
pub const MINIBLOCK_THRESHOLD: usize = 65_536;

/// Fixed output capacity for LZF decompression (256KB).
pub const LZF_BUFFER_SIZE: usize = 262_144;

/// Decode miniblocks until `r` is exhausted, concatenating their payloads.
pub fn decode(r: &mut ByteReader) -> Result<Bytes> {
    let mut out = BytesMut::new();
    while !r.is_empty() {
        out.extend_from_slice(&miniblock::decode(r)?);
    }
    Ok(out.freeze())
}

/// Encode `payload` as a miniblock sequence, appending to `out`.
///
/// The payload is split at [`MINIBLOCK_THRESHOLD`] boundaries; an empty
/// payload becomes exactly one empty miniblock.
pub fn encode(payload: &[u8], out: &mut BytesMut) -> Result<()> {
    if payload.is_empty() {
        return miniblock::encode(payload, out);
    }
    for chunk in payload.chunks(MINIBLOCK_THRESHOLD) {
        miniblock::encode(chunk, out)?;
    }
    Ok(())
}

/// Streaming block encoder.
///
/// Bytes are buffered until a miniblock's worth is available, then
/// compressed and written through to the sink, so at most one miniblock of
/// payload is ever resident. `flush` forces a miniblock boundary; the file
/// writer uses it so block-index offsets land on miniblock starts.
pub struct BlockWriter<W: Write> {
    sink: W,
    pending: BytesMut,
    emitted_bytes: u64,
    emitted_miniblocks: u64,
}

impl<W: Write> BlockWriter<W> {
    /// Create a block encoder writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            pending: BytesMut::with_capacity(MINIBLOCK_THRESHOLD),
            emitted_bytes: 0,
            emitted_miniblocks: 0,
        }
    }

    /// Append payload bytes, emitting miniblocks at the split threshold.
    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(data);
        while self.pending.len() >= MINIBLOCK_THRESHOLD {
            let chunk = self.pending.split_to(MINIBLOCK_THRESHOLD);
            self.emit(&chunk)?;
        }
        Ok(())
    }

    /// Emit any buffered bytes as a miniblock, forcing a split boundary.
    pub fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            let chunk = self.pending.split_to(self.pending.len());
            self.emit(&chunk)?;
        }
        Ok(())
    }

    /// Encoded bytes written to the sink so far (buffered bytes excluded).
    pub fn emitted_bytes(&self) -> u64 {
        self.emitted_bytes
    }

    /// Flush the tail and return the sink with the total encoded size.
    ///
    /// A stream that never produced a miniblock still gets exactly one,
    /// carrying an empty payload, so the block region is never zero bytes.
    pub fn finish(mut self) -> Result<(W, u64)> {
        self.flush()?;
        if self.emitted_miniblocks == 0 {
            self.emit(&[])?;
        }
        Ok((self.sink, self.emitted_bytes))
    }

    fn emit(&mut self, payload: &[u8]) -> Result<()> {
        let mut buf = BytesMut::new();
        miniblock::encode(payload, &mut buf)?;
        self.sink.write_all(&buf)?;
        self.emitted_bytes += buf.len() as u64;
        self.emitted_miniblocks += 1;
        Ok(())
    }
}
