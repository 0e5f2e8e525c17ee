//! Streaming file reader.
//!
//! Regions are consumed in file order: the 512-byte header, the schema,
//! then the block stream decoded miniblock-by-miniblock into a record
//! stream, and finally the trailing block index. Records are served as a
//! pull-based stream so at most one decompressed miniblock plus one
//! partial record window is resident; the collected [`crate::YxdbFile`]
//! form is a convenience over this reader.

use crate::block::miniblock;
use crate::buffer::ByteReader;
use crate::error::{Error, Result};
use crate::file::header::Header;
use crate::file::index::BlockIndex;
use crate::file::HEADER_SIZE;
use crate::record::Record;
use crate::schema::RecordInfo;
use bytes::BytesMut;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Reads a YXDB file as a lazy record stream.
#[derive(Debug)]
pub struct YxdbReader<R: Read> {
    source: R,
    header: Header,
    record_info: RecordInfo,
    fixed_record_size: usize,
    has_variable_data: bool,
    block_bytes_left: u64,
    buf: BytesMut,
    records_read: u64,
}

impl YxdbReader<BufReader<File>> {
    /// Open a file on disk for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> YxdbReader<R> {
    /// Start reading from `source`: decodes the header and schema and
    /// positions the stream at the first record.
    pub fn new(mut source: R) -> Result<Self> {
        let mut page = [0u8; HEADER_SIZE];
        source.read_exact(&mut page)?;
        let header = Header::decode(&page)?;

        let meta_bytes = header.meta_bytes();
        let mut meta = vec![0u8; meta_bytes as usize];
        source.read_exact(&mut meta)?;
        let record_info = RecordInfo::decode_meta(&meta)?;

        let block_start = HEADER_SIZE as u64 + meta_bytes;
        if header.record_block_index_pos < block_start {
            return Err(Error::corruption(format!(
                "recordBlockIndexPos {} overlaps the schema region ending at {}",
                header.record_block_index_pos, block_start
            )));
        }
        let block_bytes_left = header.record_block_index_pos - block_start;

        let fixed_record_size = record_info.fixed_record_size()?;
        let has_variable_data = record_info.has_variable_data();

        Ok(Self {
            source,
            header,
            record_info,
            fixed_record_size,
            has_variable_data,
            block_bytes_left,
            buf: BytesMut::new(),
            records_read: 0,
        })
    }

    /// The decoded header. Its `num_records` is advisory; compare against
    /// [`records_read`](Self::records_read) after draining the stream.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The decoded schema.
    pub fn record_info(&self) -> &RecordInfo {
        &self.record_info
    }

    /// Records decoded so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Pull the next record, or `None` once the block stream is exhausted.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        // Drain miniblocks until a byte shows up or the region ends, so
        // trailing empty miniblocks still terminate the stream cleanly.
        self.fill(1)?;
        if self.buf.is_empty() {
            return Ok(None);
        }
        if self.record_info.fields.is_empty() {
            return Err(Error::corruption(
                "block stream carries bytes but the schema has no fields",
            ));
        }

        self.fill(self.fixed_record_size)?;
        if self.buf.len() < self.fixed_record_size {
            return Err(Error::corruption(format!(
                "block stream ends mid-record: {} of {} fixed bytes",
                self.buf.len(),
                self.fixed_record_size
            )));
        }

        let mut total = self.fixed_record_size;
        if self.has_variable_data {
            self.fill(total + 4)?;
            if self.buf.len() < total + 4 {
                return Err(Error::corruption(
                    "block stream ends before a record's variable-data length",
                ));
            }
            let var_len =
                u32::from_le_bytes(self.buf[total..total + 4].try_into().unwrap()) as usize;
            total += 4 + var_len;
            self.fill(total)?;
            if self.buf.len() < total {
                return Err(Error::corruption(format!(
                    "block stream ends inside a {}-byte variable-data tail",
                    var_len
                )));
            }
        }

        let record_bytes = self.buf.split_to(total).freeze();
        let mut r = ByteReader::new(record_bytes);
        let record = r.isolate(total, "record", |r| Record::decode(r, &self.record_info))?;
        self.records_read += 1;
        Ok(Some(record))
    }

    /// Iterate the remaining records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { reader: self }
    }

    /// Read the trailing block index, consuming the reader.
    ///
    /// Any records not yet pulled are drained (and validated) first.
    pub fn into_block_index(mut self) -> Result<BlockIndex> {
        while self.next_record()?.is_some() {}

        let mut rest = Vec::new();
        self.source.read_to_end(&mut rest)?;
        BlockIndex::decode(&rest)
    }

    /// Decode miniblocks until `need` payload bytes are buffered or the
    /// block region is exhausted.
    fn fill(&mut self, need: usize) -> Result<()> {
        while self.buf.len() < need && self.block_bytes_left > 0 {
            self.read_miniblock()?;
        }
        Ok(())
    }

    fn read_miniblock(&mut self) -> Result<()> {
        if self.block_bytes_left < 4 {
            return Err(Error::corruption(format!(
                "block stream: {} trailing bytes cannot hold a miniblock prefix",
                self.block_bytes_left
            )));
        }
        let mut prefix = [0u8; 4];
        self.source.read_exact(&mut prefix)?;
        self.block_bytes_left -= 4;

        let (compressed, len) = miniblock::unpack_prefix(u32::from_le_bytes(prefix));
        if len as u64 > self.block_bytes_left {
            return Err(Error::corruption(format!(
                "miniblock payload of {} bytes overruns the block region ({} left)",
                len, self.block_bytes_left
            )));
        }
        let mut payload = vec![0u8; len];
        self.source.read_exact(&mut payload)?;
        self.block_bytes_left -= len as u64;

        if compressed {
            self.buf.extend_from_slice(&miniblock::decompress(&payload)?);
        } else {
            self.buf.extend_from_slice(&payload);
        }
        Ok(())
    }
}

/// Iterator over the remaining records of a [`YxdbReader`].
pub struct Records<'a, R: Read> {
    reader: &'a mut YxdbReader<R>,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record().transpose()
    }
}
