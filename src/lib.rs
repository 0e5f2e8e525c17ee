//! # yxdb - YXDB table file codec
//!
//! A reader and writer for the YXDB file format: a binary,
//! block-compressed, record-oriented table format whose schema travels
//! inside the file as UTF-16LE XML.
//!
//! ## File Format
//!
//! ```text
//! [Header: 512B]     fixed page: description, file id, region pointers
//! [Schema]           <MetaInfo><RecordInfo>... as UTF-16LE + '\n' '\0'
//! [Block stream]     miniblocks: u32 length-and-flag prefix, LZF or raw
//! [Block index]      u32 count, then count * u64 block offsets
//! ```
//!
//! The block stream decodes to a concatenated payload that is itself a
//! stream of fixed-layout records driven by the schema. Records with
//! variable-width fields (`V_String`, `V_WString`, `Blob`, `SpatialObj`)
//! can be read (their tails are consumed and discarded) but not written.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use yxdb::{Field, FieldType, FieldValue, Record, RecordInfo, YxdbReader, YxdbWriter};
//!
//! # fn main() -> yxdb::Result<()> {
//! let schema = RecordInfo::new(vec![Field::new("x", FieldType::Int32)]);
//!
//! let mut writer = YxdbWriter::create("counts.yxdb", schema, "counts")?;
//! writer.write_record(&Record::new(vec![FieldValue::Int32(Some(1))]))?;
//! writer.finish()?;
//!
//! let mut reader = YxdbReader::open("counts.yxdb")?;
//! while let Some(record) = reader.next_record()? {
//!     println!("{:?}", record.values);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod block;
pub mod buffer;
pub mod error;
pub mod field;
pub mod file;
pub mod record;
pub mod schema;

pub use error::{Error, Result};
pub use field::FieldValue;
pub use file::{BlockIndex, Header, YxdbFile, YxdbReader, YxdbWriter};
pub use record::Record;
pub use schema::{Field, FieldType, RecordInfo};
