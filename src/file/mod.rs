//! File-level composition.
//!
//! A YXDB file lays out its regions in a fixed order:
//!
//! ```text
//! [Header: 512B]         fixed page, pointers into the tail
//! [Schema]               UTF-16LE XML, metaInfoLength * 2 bytes
//! [Block stream]         miniblocks carrying the record stream
//! [Block index]          u32 count + count * u64 offsets
//! ```
//!
//! The streaming [`YxdbReader`] / [`YxdbWriter`] pair is the primary
//! interface; [`YxdbFile`] collects everything in memory as a convenience
//! and is the slow path for large files.

pub mod header;
pub mod index;
pub mod reader;
pub mod writer;

pub use header::Header;
pub use index::BlockIndex;
pub use reader::{Records, YxdbReader};
pub use writer::YxdbWriter;

use crate::error::Result;
use crate::record::Record;
use crate::schema::RecordInfo;
use std::io::Cursor;

/// Size of the fixed header page.
pub const HEADER_SIZE: usize = 512;

/// Wire width of the header's description field.
pub const DESCRIPTION_SIZE: usize = 64;

/// Bytes of the header page after the last fixed field.
pub const RESERVED_SIZE: usize = 396;

/// File identifier for files without a spatial index.
pub const FILE_ID: u32 = 0x0044_0204;

/// File identifier for files carrying a legacy spatial index.
pub const FILE_ID_SPATIAL: u32 = 0x0044_0205;

/// Records per block on the write path; each block gets an index entry.
pub const RECORDS_PER_BLOCK: usize = 65_536;

/// Block-stream compression version stamped by the writer.
pub const COMPRESSION_VERSION: u32 = 1;

/// Record block size of the legacy spatial index region.
pub const SPATIAL_INDEX_RECORD_BLOCK_SIZE: usize = 32;

/// A fully decoded file held in memory.
///
/// Collecting every record is the slow path; prefer streaming through
/// [`YxdbReader`] when the record count is large.
#[derive(Debug, Clone, PartialEq)]
pub struct YxdbFile {
    /// The decoded header page.
    pub header: Header,
    /// The decoded schema.
    pub record_info: RecordInfo,
    /// Every record, in write order.
    pub records: Vec<Record>,
    /// The trailing block index.
    pub block_index: BlockIndex,
}

impl YxdbFile {
    /// Decode a complete file image.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = YxdbReader::new(Cursor::new(data))?;
        let header = reader.header().clone();
        let record_info = reader.record_info().clone();

        let mut records = Vec::new();
        while let Some(record) = reader.next_record()? {
            records.push(record);
        }
        let block_index = reader.into_block_index()?;

        Ok(Self { header, record_info, records, block_index })
    }

    /// Encode to a complete file image.
    ///
    /// The header's opaque fields (mystery, reserved, flags, spatial
    /// pointer) are carried through; the computed pointers and the record
    /// count are stamped fresh.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = YxdbWriter::with_header(
            Cursor::new(Vec::new()),
            self.record_info.clone(),
            self.header.clone(),
        )?;
        for record in &self.records {
            writer.write_record(record)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::schema::{Field, FieldType};
    use bytes::Bytes;

    #[test]
    fn test_file_round_trip_preserves_opaque_fields() {
        let record_info = RecordInfo::new(vec![
            Field::new("n", FieldType::Int32),
            Field::sized("s", FieldType::String, 6),
        ]);
        let records = vec![
            Record::new(vec![FieldValue::Int32(Some(1)), FieldValue::String(Some("one".into()))]),
            Record::new(vec![FieldValue::Int32(None), FieldValue::String(None)]),
        ];

        let mut writer =
            YxdbWriter::new(Cursor::new(Vec::new()), record_info.clone(), "fixture").unwrap();
        for record in &records {
            writer.write_record(record).unwrap();
        }
        let image = writer.finish().unwrap().into_inner();

        let mut file = YxdbFile::decode(&image).unwrap();
        assert_eq!(file.record_info, record_info);
        assert_eq!(file.records, records);

        // Scribble over the opaque fields and re-encode.
        file.header.mystery = 0xabad_1dea;
        file.header.reserved = Bytes::from(vec![0x42; RESERVED_SIZE]);
        let reencoded = file.encode().unwrap();

        let decoded = YxdbFile::decode(&reencoded).unwrap();
        assert_eq!(decoded.header.mystery, 0xabad_1dea);
        assert_eq!(decoded.header.reserved, file.header.reserved);
        assert_eq!(decoded.records, records);
        assert_eq!(decoded.block_index, file.block_index);
    }
}
