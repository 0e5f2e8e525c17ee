//! Fixed 512-byte file header codec.
//!
//! Layout, offsets from file start:
//!
//! ```text
//! 0x000  description          64 bytes, UTF-8, zero-padded
//! 0x040  fileId               u32 LE
//! 0x044  creationDate         u32 LE, POSIX seconds
//! 0x048  flags1               u32 LE
//! 0x04C  flags2               u32 LE
//! 0x050  metaInfoLength       u32 LE, in UTF-16 code units
//! 0x054  mystery              u32 LE, preserved verbatim
//! 0x058  spatialIndexPos      u64 LE
//! 0x060  recordBlockIndexPos  u64 LE
//! 0x068  numRecords           u64 LE
//! 0x070  compressionVersion   u32 LE
//! 0x074  reservedSpace        396 bytes, preserved verbatim
//! ```

use crate::buffer::ByteReader;
use crate::error::{Error, Result};
use crate::file::{COMPRESSION_VERSION, DESCRIPTION_SIZE, FILE_ID, HEADER_SIZE, RESERVED_SIZE};
use bytes::{BufMut, Bytes, BytesMut};

/// The decoded 512-byte header page.
///
/// `mystery` and `reserved` have unknown semantics and round-trip
/// byte-for-byte; `num_records` is advisory on read (the writer stamps the
/// true count).
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Human-readable description, at most 64 UTF-8 bytes on the wire.
    pub description: String,
    /// Format identifier, [`FILE_ID`] or [`crate::file::FILE_ID_SPATIAL`].
    pub file_id: u32,
    /// Creation time as truncated POSIX seconds.
    pub creation_date: u32,
    /// First flag word.
    pub flags1: u32,
    /// Second flag word.
    pub flags2: u32,
    /// Schema region length in UTF-16 code units (half its byte size).
    pub meta_info_len: u32,
    /// Opaque word preserved verbatim.
    pub mystery: u32,
    /// Offset of the legacy spatial index, preserved verbatim.
    pub spatial_index_pos: u64,
    /// Offset of the trailing block index.
    pub record_block_index_pos: u64,
    /// Declared record count.
    pub num_records: u64,
    /// Block-stream compression version.
    pub compression_version: u32,
    /// Remainder of the 512-byte page, preserved verbatim.
    pub reserved: Bytes,
}

impl Header {
    /// Create a header with default pointers and an all-zero reserved page.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            file_id: FILE_ID,
            creation_date: 0,
            flags1: 0,
            flags2: 0,
            meta_info_len: 0,
            mystery: 0,
            spatial_index_pos: 0,
            record_block_index_pos: 0,
            num_records: 0,
            compression_version: COMPRESSION_VERSION,
            reserved: Bytes::from_static(&[0u8; RESERVED_SIZE]),
        }
    }

    /// Encode the header page; the result is always exactly 512 bytes.
    pub fn encode(&self) -> Result<Bytes> {
        if self.reserved.len() != RESERVED_SIZE {
            return Err(Error::invalid_argument(format!(
                "reserved space must be {} bytes, got {}",
                RESERVED_SIZE,
                self.reserved.len()
            )));
        }

        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        let desc = truncated_description(&self.description);
        buf.put_slice(desc);
        buf.put_bytes(0, DESCRIPTION_SIZE - desc.len());
        buf.put_u32_le(self.file_id);
        buf.put_u32_le(self.creation_date);
        buf.put_u32_le(self.flags1);
        buf.put_u32_le(self.flags2);
        buf.put_u32_le(self.meta_info_len);
        buf.put_u32_le(self.mystery);
        buf.put_u64_le(self.spatial_index_pos);
        buf.put_u64_le(self.record_block_index_pos);
        buf.put_u64_le(self.num_records);
        buf.put_u32_le(self.compression_version);
        buf.put_slice(&self.reserved);

        debug_assert_eq!(buf.len(), HEADER_SIZE);
        Ok(buf.freeze())
    }

    /// Decode a header page; `data` must be exactly 512 bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != HEADER_SIZE {
            return Err(Error::corruption(format!(
                "header must be {} bytes, got {}",
                HEADER_SIZE,
                data.len()
            )));
        }

        let mut r = ByteReader::with_label(data.to_vec(), "header");
        let desc_bytes = r.take(DESCRIPTION_SIZE)?;
        let end = desc_bytes.iter().position(|&b| b == 0).unwrap_or(DESCRIPTION_SIZE);
        let description = std::str::from_utf8(&desc_bytes[..end])
            .map_err(|_| Error::corruption("header description is not valid UTF-8"))?
            .to_string();

        let header = Header {
            description,
            file_id: r.get_u32_le()?,
            creation_date: r.get_u32_le()?,
            flags1: r.get_u32_le()?,
            flags2: r.get_u32_le()?,
            meta_info_len: r.get_u32_le()?,
            mystery: r.get_u32_le()?,
            spatial_index_pos: r.get_u64_le()?,
            record_block_index_pos: r.get_u64_le()?,
            num_records: r.get_u64_le()?,
            compression_version: r.get_u32_le()?,
            reserved: r.take(RESERVED_SIZE)?,
        };
        debug_assert!(r.is_empty());
        Ok(header)
    }

    /// Byte size of the schema region this header points at.
    pub fn meta_bytes(&self) -> u64 {
        self.meta_info_len as u64 * 2
    }
}

fn truncated_description(text: &str) -> &[u8] {
    if text.len() <= DESCRIPTION_SIZE {
        return text.as_bytes();
    }
    let mut end = DESCRIPTION_SIZE;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].as_bytes()
}
