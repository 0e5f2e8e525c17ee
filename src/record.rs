//! Record codec.
//!
//! A record is one row: a value per schema field, in schema order. The
//! fixed portion concatenates each field's fixed encoding; when the schema
//! declares any variable-width field, a u32 LE tail length and that many
//! tail bytes follow. The tail's wire form is undocumented, so the decoder
//! consumes and discards it and the encoder refuses such schemas outright.

use crate::buffer::ByteReader;
use crate::error::{Error, Result};
use crate::field::{self, FieldValue};
use crate::schema::RecordInfo;
use bytes::BytesMut;

/// One decoded row, parallel to the schema's field sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Field values in schema order.
    pub values: Vec<FieldValue>,
}

impl Record {
    /// Create a record from values in schema order.
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }

    /// Decode one record under `info`.
    pub fn decode(r: &mut ByteReader, info: &RecordInfo) -> Result<Self> {
        let mut values = Vec::with_capacity(info.fields.len());
        for f in &info.fields {
            values.push(field::read(r, f)?);
        }
        if info.has_variable_data() {
            let len = r.get_u32_le()? as usize;
            r.take(len)?;
        }
        Ok(Record { values })
    }

    /// Encode this record under `info`, appending to `buf`.
    ///
    /// Fails before emitting anything when the schema declares a
    /// variable-width field or the value count does not match.
    pub fn encode(&self, info: &RecordInfo, buf: &mut BytesMut) -> Result<()> {
        if info.has_variable_data() {
            return Err(Error::not_implemented("variable data unimplemented"));
        }
        if self.values.len() != info.fields.len() {
            return Err(Error::invalid_argument(format!(
                "record has {} values for a {}-field schema",
                self.values.len(),
                info.fields.len()
            )));
        }
        for (f, v) in info.fields.iter().zip(&self.values) {
            field::write(buf, f, v)?;
        }
        Ok(())
    }
}

/// Parse records until `r` is exhausted.
///
/// Requires no record count; trailing bytes that do not form a complete
/// record are fatal.
pub fn decode_all(r: &mut ByteReader, info: &RecordInfo) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    while !r.is_empty() {
        records.push(Record::decode(r, info)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType};
    use bytes::BufMut;

    fn test_schema() -> RecordInfo {
        RecordInfo::new(vec![
            Field::new("id", FieldType::Int32),
            Field::sized("name", FieldType::String, 8),
            Field::new("score", FieldType::Double),
        ])
    }

    fn sample_record(id: i32, name: &str, score: f64) -> Record {
        Record::new(vec![
            FieldValue::Int32(Some(id)),
            FieldValue::String(Some(name.into())),
            FieldValue::Double(Some(score)),
        ])
    }

    #[test]
    fn test_record_round_trip() {
        let info = test_schema();
        let record = sample_record(7, "seven", 7.5);

        let mut buf = BytesMut::new();
        record.encode(&info, &mut buf).unwrap();
        assert_eq!(buf.len(), info.fixed_record_size().unwrap());

        let mut r = ByteReader::new(buf.freeze());
        assert_eq!(Record::decode(&mut r, &info).unwrap(), record);
        assert!(r.is_empty());
    }

    #[test]
    fn test_decode_all_preserves_order() {
        let info = test_schema();
        let records =
            vec![sample_record(1, "a", 0.1), sample_record(2, "b", 0.2), sample_record(3, "c", 0.3)];

        let mut buf = BytesMut::new();
        for record in &records {
            record.encode(&info, &mut buf).unwrap();
        }

        let mut r = ByteReader::new(buf.freeze());
        assert_eq!(decode_all(&mut r, &info).unwrap(), records);
    }

    #[test]
    fn test_partial_record_is_fatal() {
        let info = test_schema();
        let mut buf = BytesMut::new();
        sample_record(1, "a", 0.1).encode(&info, &mut buf).unwrap();
        buf.truncate(buf.len() - 3);

        let mut r = ByteReader::new(buf.freeze());
        assert!(matches!(decode_all(&mut r, &info), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_variable_tail_consumed_and_discarded() {
        let info = RecordInfo::new(vec![
            Field::new("id", FieldType::Int32),
            Field::new("v", FieldType::VString),
        ]);

        let mut buf = BytesMut::new();
        // Fixed portion: Int32 value 9, then the opaque var word.
        buf.put_i32_le(9);
        buf.put_u8(0);
        buf.put_u32_le(0xdead_beef);
        // Tail: 3 opaque bytes.
        buf.put_u32_le(3);
        buf.put_slice(&[0xaa, 0xbb, 0xcc]);

        let mut r = ByteReader::new(buf.freeze());
        let record = Record::decode(&mut r, &info).unwrap();
        assert!(r.is_empty());
        assert_eq!(
            record.values,
            vec![FieldValue::Int32(Some(9)), FieldValue::Var(0xdead_beef)]
        );
    }

    #[test]
    fn test_truncated_variable_tail_is_fatal() {
        let info = RecordInfo::new(vec![Field::new("v", FieldType::Blob)]);

        let mut buf = BytesMut::new();
        buf.put_u32_le(0);
        buf.put_u32_le(10); // claims 10 tail bytes
        buf.put_slice(&[1, 2]);

        let mut r = ByteReader::new(buf.freeze());
        assert!(matches!(Record::decode(&mut r, &info), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_encode_variable_schema_rejected() {
        let info = RecordInfo::new(vec![
            Field::new("id", FieldType::Int32),
            Field::new("v", FieldType::VString),
        ]);
        let record = Record::new(vec![FieldValue::Int32(Some(1)), FieldValue::Var(0)]);

        let mut buf = BytesMut::new();
        let err = record.encode(&info, &mut buf).unwrap_err();
        assert_eq!(err.to_string(), "Not implemented: variable data unimplemented");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_value_count_mismatch_rejected() {
        let info = test_schema();
        let record = Record::new(vec![FieldValue::Int32(Some(1))]);

        let mut buf = BytesMut::new();
        assert!(matches!(record.encode(&info, &mut buf), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_null_values_round_trip() {
        let info = test_schema();
        let record = Record::new(vec![
            FieldValue::Int32(None),
            FieldValue::String(None),
            FieldValue::Double(None),
        ]);

        let mut buf = BytesMut::new();
        record.encode(&info, &mut buf).unwrap();
        let mut r = ByteReader::new(buf.freeze());
        assert_eq!(Record::decode(&mut r, &info).unwrap(), record);
    }
}
