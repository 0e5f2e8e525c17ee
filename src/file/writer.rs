//! Streaming file writer.
//!
//! The header's `metaInfoLength`, `recordBlockIndexPos` and `numRecords`
//! are not known until the schema and block stream exist, so the writer
//! puts down a placeholder page, streams the tail, and rewrites the page
//! in [`finish`](YxdbWriter::finish). The sink therefore needs `Seek`;
//! callers with a non-seekable destination stage through an
//! [`std::io::Cursor`].

use crate::block::BlockWriter;
use crate::error::{Error, Result};
use crate::file::header::Header;
use crate::file::index::BlockIndex;
use crate::file::{HEADER_SIZE, RECORDS_PER_BLOCK};
use crate::record::Record;
use crate::schema::RecordInfo;
use bytes::BytesMut;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Writes a YXDB file record by record.
pub struct YxdbWriter<W: Write + Seek> {
    block: BlockWriter<W>,
    template: Header,
    record_info: RecordInfo,
    meta_bytes: u64,
    block_offsets: Vec<u64>,
    num_records: u64,
}

impl YxdbWriter<BufWriter<File>> {
    /// Create a file on disk and write its header and schema regions.
    pub fn create<P: AsRef<Path>>(
        path: P,
        record_info: RecordInfo,
        description: &str,
    ) -> Result<Self> {
        Self::new(BufWriter::new(File::create(path)?), record_info, description)
    }
}

impl<W: Write + Seek> YxdbWriter<W> {
    /// Start a file with a default header carrying `description`.
    pub fn new(sink: W, record_info: RecordInfo, description: &str) -> Result<Self> {
        let mut template = Header::new(description);
        template.creation_date = unix_now();
        Self::with_header(sink, record_info, template)
    }

    /// Start a file from a header template.
    ///
    /// Description, flags, mystery, spatial pointer, compression version
    /// and reserved bytes are taken from the template, which is how a
    /// decoded file re-encodes with its opaque fields intact. The computed
    /// fields (metaInfoLength, recordBlockIndexPos, numRecords) are
    /// overwritten in `finish`.
    pub fn with_header(mut sink: W, record_info: RecordInfo, template: Header) -> Result<Self> {
        let meta = record_info.encode_meta()?;
        sink.write_all(&[0u8; HEADER_SIZE])?;
        sink.write_all(&meta)?;

        Ok(Self {
            block: BlockWriter::new(sink),
            template,
            record_info,
            meta_bytes: meta.len() as u64,
            block_offsets: Vec::new(),
            num_records: 0,
        })
    }

    /// The schema this writer encodes against.
    pub fn record_info(&self) -> &RecordInfo {
        &self.record_info
    }

    /// Records written so far.
    pub fn num_records(&self) -> u64 {
        self.num_records
    }

    /// Append one record to the block stream.
    ///
    /// Fails with the variable-data error, before emitting any bytes for
    /// the record, when the schema declares a variable-width field.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        if self.record_info.has_variable_data() {
            return Err(Error::not_implemented("variable data unimplemented"));
        }

        // A new record block starts here: force a miniblock boundary so
        // the index offset lands on a miniblock start.
        if self.num_records % RECORDS_PER_BLOCK as u64 == 0 {
            self.block.flush()?;
            self.block_offsets
                .push(HEADER_SIZE as u64 + self.meta_bytes + self.block.emitted_bytes());
        }

        let mut scratch = BytesMut::new();
        record.encode(&self.record_info, &mut scratch)?;
        self.block.push(&scratch)?;
        self.num_records += 1;
        Ok(())
    }

    /// Flush the block stream, write the block index, and stamp the real
    /// header. Returns the sink positioned at end of file.
    pub fn finish(self) -> Result<W> {
        let Self { block, mut template, meta_bytes, block_offsets, num_records, .. } = self;
        let (mut sink, emitted) = block.finish()?;

        sink.write_all(&BlockIndex::new(block_offsets).encode())?;

        template.meta_info_len = (meta_bytes / 2) as u32;
        template.record_block_index_pos = HEADER_SIZE as u64 + meta_bytes + emitted;
        template.num_records = num_records;

        let page = template.encode()?;
        sink.seek(SeekFrom::Start(0))?;
        sink.write_all(&page)?;
        sink.seek(SeekFrom::End(0))?;
        sink.flush()?;
        Ok(sink)
    }
}

fn unix_now() -> u32 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as u32).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::file::reader::YxdbReader;
    use crate::file::FILE_ID;
    use crate::schema::{Field, FieldType};
    use std::io::Cursor;

    fn int32_schema() -> RecordInfo {
        RecordInfo::new(vec![Field::new("x", FieldType::Int32)])
    }

    fn int32_record(v: i32) -> Record {
        Record::new(vec![FieldValue::Int32(Some(v))])
    }

    #[test]
    fn test_write_then_read_back() {
        let info = int32_schema();
        let mut writer = YxdbWriter::new(Cursor::new(Vec::new()), info.clone(), "t").unwrap();
        for v in [1, 2, 3] {
            writer.write_record(&int32_record(v)).unwrap();
        }
        let data = writer.finish().unwrap().into_inner();

        let mut reader = YxdbReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.header().description, "t");
        assert_eq!(reader.header().file_id, FILE_ID);
        assert_eq!(reader.header().num_records, 3);
        assert_eq!(reader.record_info(), &info);

        let records: Vec<Record> = reader.records().collect::<Result<_>>().unwrap();
        assert_eq!(records, vec![int32_record(1), int32_record(2), int32_record(3)]);

        // Three records fit one block.
        let index = reader.into_block_index().unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_header_pointers_consistent() {
        let info = int32_schema();
        let mut writer = YxdbWriter::new(Cursor::new(Vec::new()), info, "t").unwrap();
        writer.write_record(&int32_record(9)).unwrap();
        let data = writer.finish().unwrap().into_inner();

        let header = Header::decode(&data[..HEADER_SIZE]).unwrap();
        let index_pos = header.record_block_index_pos as usize;
        let index = BlockIndex::decode(&data[index_pos..]).unwrap();

        assert_eq!(header.meta_bytes() as usize + HEADER_SIZE, index.offsets[0] as usize);
        assert!(index_pos > HEADER_SIZE + header.meta_bytes() as usize);
        assert_eq!(data.len(), index_pos + 4 + 8 * index.len());
    }

    #[test]
    fn test_empty_stream_single_empty_miniblock() {
        let info = int32_schema();
        let writer = YxdbWriter::new(Cursor::new(Vec::new()), info, "").unwrap();
        let data = writer.finish().unwrap().into_inner();

        let header = Header::decode(&data[..HEADER_SIZE]).unwrap();
        let block_start = HEADER_SIZE + header.meta_bytes() as usize;
        let block_end = header.record_block_index_pos as usize;

        // The block region is exactly one empty raw miniblock.
        assert_eq!(block_end - block_start, 4);
        assert_eq!(&data[block_start..block_end], &0x8000_0000u32.to_le_bytes());

        let mut reader = YxdbReader::new(Cursor::new(data)).unwrap();
        assert!(reader.next_record().unwrap().is_none());
        assert!(reader.into_block_index().unwrap().is_empty());
    }

    #[test]
    fn test_variable_schema_write_fails() {
        let info = RecordInfo::new(vec![
            Field::new("x", FieldType::Int32),
            Field::new("v", FieldType::VString),
        ]);
        let mut writer = YxdbWriter::new(Cursor::new(Vec::new()), info, "").unwrap();

        let record = Record::new(vec![FieldValue::Int32(Some(1)), FieldValue::Var(0)]);
        let err = writer.write_record(&record).unwrap_err();
        assert_eq!(err.to_string(), "Not implemented: variable data unimplemented");
        assert_eq!(writer.num_records(), 0);
    }

    #[test]
    fn test_template_preserves_opaque_fields() {
        let info = int32_schema();
        let mut template = Header::new("kept");
        template.mystery = 0xfeed_f00d;
        template.flags1 = 5;
        template.spatial_index_pos = 777;

        let mut writer =
            YxdbWriter::with_header(Cursor::new(Vec::new()), info, template).unwrap();
        writer.write_record(&int32_record(1)).unwrap();
        let data = writer.finish().unwrap().into_inner();

        let header = Header::decode(&data[..HEADER_SIZE]).unwrap();
        assert_eq!(header.description, "kept");
        assert_eq!(header.mystery, 0xfeed_f00d);
        assert_eq!(header.flags1, 5);
        assert_eq!(header.spatial_index_pos, 777);
        assert_eq!(header.num_records, 1);
    }
}
