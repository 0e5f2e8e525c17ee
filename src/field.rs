//! Scalar field-value codec.
//!
//! The record codec delegates each field's fixed portion here. Every
//! non-variable type except `Bool` trails a one-byte null flag (0 =
//! present, nonzero = null); `Bool` packs null as the byte value 2.
//!
//! Fixed widths, including the flag byte:
//!
//! ```text
//! Bool 1   Byte 2   Int16 3   Int32 5   Int64 9   Float 5   Double 9
//! FixedDecimal size+1   String size+1   WString size*2+1
//! Date 11   Time 9   DateTime 20
//! V_String / V_WString / Blob / SpatialObj: 4 (opaque word into the tail)
//! ```
//!
//! Narrow strings (String, FixedDecimal, Date, Time, DateTime) are latin-1
//! and NUL-padded to their width; WString is NUL-padded UTF-16LE units.

use crate::buffer::ByteReader;
use crate::error::{Error, Result};
use crate::schema::{Field, FieldType};
use bytes::{BufMut, BytesMut};

/// One decoded field value, parallel to a schema [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Boolean value.
    Bool(Option<bool>),
    /// Unsigned 8-bit value.
    Byte(Option<u8>),
    /// Signed 16-bit value.
    Int16(Option<i16>),
    /// Signed 32-bit value.
    Int32(Option<i32>),
    /// Signed 64-bit value.
    Int64(Option<i64>),
    /// Fixed-decimal value in its string rendering.
    FixedDecimal(Option<String>),
    /// 32-bit float value.
    Float(Option<f32>),
    /// 64-bit float value.
    Double(Option<f64>),
    /// Narrow string value.
    String(Option<String>),
    /// Wide string value.
    WString(Option<String>),
    /// Date value, "YYYY-MM-DD".
    Date(Option<String>),
    /// Time value, "HH:MM:SS".
    Time(Option<String>),
    /// Date-time value, "YYYY-MM-DD HH:MM:SS".
    DateTime(Option<String>),
    /// The opaque fixed portion of a variable-width field.
    Var(u32),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "Bool",
            FieldValue::Byte(_) => "Byte",
            FieldValue::Int16(_) => "Int16",
            FieldValue::Int32(_) => "Int32",
            FieldValue::Int64(_) => "Int64",
            FieldValue::FixedDecimal(_) => "FixedDecimal",
            FieldValue::Float(_) => "Float",
            FieldValue::Double(_) => "Double",
            FieldValue::String(_) => "String",
            FieldValue::WString(_) => "WString",
            FieldValue::Date(_) => "Date",
            FieldValue::Time(_) => "Time",
            FieldValue::DateTime(_) => "DateTime",
            FieldValue::Var(_) => "variable",
        }
    }
}

/// Byte width of `field`'s fixed portion.
pub fn fixed_size(field: &Field) -> Result<usize> {
    Ok(match field.field_type {
        FieldType::Bool => 1,
        FieldType::Byte => 2,
        FieldType::Int16 => 3,
        FieldType::Int32 => 5,
        FieldType::Int64 => 9,
        FieldType::Float => 5,
        FieldType::Double => 9,
        FieldType::Date => 11,
        FieldType::Time => 9,
        FieldType::DateTime => 20,
        FieldType::FixedDecimal | FieldType::String => declared_size(field)? + 1,
        FieldType::WString => declared_size(field)? * 2 + 1,
        FieldType::VString | FieldType::VWString | FieldType::Blob | FieldType::SpatialObj => 4,
    })
}

fn declared_size(field: &Field) -> Result<usize> {
    match field.size {
        Some(size) => Ok(size as usize),
        None => Err(Error::schema(format!(
            "field {:?} of type {} requires a size attribute",
            field.name,
            field.field_type.name()
        ))),
    }
}

/// Read one field's fixed portion.
pub fn read(r: &mut ByteReader, field: &Field) -> Result<FieldValue> {
    match field.field_type {
        FieldType::Bool => {
            let byte = r.get_u8()?;
            Ok(FieldValue::Bool(if byte == 2 { None } else { Some(byte != 0) }))
        }
        FieldType::Byte => {
            let data = r.get_u8()?;
            let present = r.get_u8()? == 0;
            Ok(FieldValue::Byte(present.then_some(data)))
        }
        FieldType::Int16 => {
            let data = r.get_u16_le()? as i16;
            let present = r.get_u8()? == 0;
            Ok(FieldValue::Int16(present.then_some(data)))
        }
        FieldType::Int32 => {
            let data = r.get_u32_le()? as i32;
            let present = r.get_u8()? == 0;
            Ok(FieldValue::Int32(present.then_some(data)))
        }
        FieldType::Int64 => {
            let data = r.get_u64_le()? as i64;
            let present = r.get_u8()? == 0;
            Ok(FieldValue::Int64(present.then_some(data)))
        }
        FieldType::Float => {
            let data = f32::from_bits(r.get_u32_le()?);
            let present = r.get_u8()? == 0;
            Ok(FieldValue::Float(present.then_some(data)))
        }
        FieldType::Double => {
            let data = f64::from_bits(r.get_u64_le()?);
            let present = r.get_u8()? == 0;
            Ok(FieldValue::Double(present.then_some(data)))
        }
        FieldType::FixedDecimal => {
            let (text, present) = read_narrow(r, declared_size(field)?)?;
            Ok(FieldValue::FixedDecimal(present.then_some(text)))
        }
        FieldType::String => {
            let (text, present) = read_narrow(r, declared_size(field)?)?;
            Ok(FieldValue::String(present.then_some(text)))
        }
        FieldType::Date => {
            let (text, present) = read_narrow(r, 10)?;
            Ok(FieldValue::Date(present.then_some(text)))
        }
        FieldType::Time => {
            let (text, present) = read_narrow(r, 8)?;
            Ok(FieldValue::Time(present.then_some(text)))
        }
        FieldType::DateTime => {
            let (text, present) = read_narrow(r, 19)?;
            Ok(FieldValue::DateTime(present.then_some(text)))
        }
        FieldType::WString => {
            let (text, present) = read_wide(r, field, declared_size(field)?)?;
            Ok(FieldValue::WString(present.then_some(text)))
        }
        FieldType::VString | FieldType::VWString | FieldType::Blob | FieldType::SpatialObj => {
            Ok(FieldValue::Var(r.get_u32_le()?))
        }
    }
}

fn read_narrow(r: &mut ByteReader, width: usize) -> Result<(String, bool)> {
    let data = r.take(width)?;
    let present = r.get_u8()? == 0;
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let text = data[..end].iter().map(|&b| b as char).collect();
    Ok((text, present))
}

fn read_wide(r: &mut ByteReader, field: &Field, units: usize) -> Result<(String, bool)> {
    let data = r.take(units * 2)?;
    let present = r.get_u8()? == 0;

    let mut decoded: Vec<u16> =
        data.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
    if let Some(pos) = decoded.iter().position(|&u| u == 0) {
        decoded.truncate(pos);
    }
    let text = String::from_utf16(&decoded)
        .map_err(|_| Error::corruption(format!("field {:?}: invalid UTF-16 value", field.name)))?;
    Ok((text, present))
}

/// Write one field's fixed portion.
///
/// The value's variant must match the field's type; variable-width fields
/// have no write path and fail with the variable-data error.
pub fn write(buf: &mut BytesMut, field: &Field, value: &FieldValue) -> Result<()> {
    match (field.field_type, value) {
        (FieldType::Bool, FieldValue::Bool(v)) => buf.put_u8(match v {
            None => 2,
            Some(true) => 1,
            Some(false) => 0,
        }),
        (FieldType::Byte, FieldValue::Byte(v)) => {
            buf.put_u8(v.unwrap_or(0));
            buf.put_u8(null_flag(v));
        }
        (FieldType::Int16, FieldValue::Int16(v)) => {
            buf.put_i16_le(v.unwrap_or(0));
            buf.put_u8(null_flag(v));
        }
        (FieldType::Int32, FieldValue::Int32(v)) => {
            buf.put_i32_le(v.unwrap_or(0));
            buf.put_u8(null_flag(v));
        }
        (FieldType::Int64, FieldValue::Int64(v)) => {
            buf.put_i64_le(v.unwrap_or(0));
            buf.put_u8(null_flag(v));
        }
        (FieldType::Float, FieldValue::Float(v)) => {
            buf.put_u32_le(v.unwrap_or(0.0).to_bits());
            buf.put_u8(null_flag(v));
        }
        (FieldType::Double, FieldValue::Double(v)) => {
            buf.put_u64_le(v.unwrap_or(0.0).to_bits());
            buf.put_u8(null_flag(v));
        }
        (FieldType::FixedDecimal, FieldValue::FixedDecimal(v)) => {
            write_narrow(buf, field, declared_size(field)?, v)?
        }
        (FieldType::String, FieldValue::String(v)) => {
            write_narrow(buf, field, declared_size(field)?, v)?
        }
        (FieldType::Date, FieldValue::Date(v)) => write_narrow(buf, field, 10, v)?,
        (FieldType::Time, FieldValue::Time(v)) => write_narrow(buf, field, 8, v)?,
        (FieldType::DateTime, FieldValue::DateTime(v)) => write_narrow(buf, field, 19, v)?,
        (FieldType::WString, FieldValue::WString(v)) => {
            write_wide(buf, field, declared_size(field)?, v)?
        }
        (ty, _) if ty.is_variable() => {
            return Err(Error::not_implemented("variable data unimplemented"));
        }
        (ty, value) => {
            return Err(Error::invalid_argument(format!(
                "field {:?} of type {} cannot hold a {} value",
                field.name,
                ty.name(),
                value.kind()
            )));
        }
    }
    Ok(())
}

fn null_flag<T>(v: &Option<T>) -> u8 {
    if v.is_some() {
        0
    } else {
        1
    }
}

fn write_narrow(
    buf: &mut BytesMut,
    field: &Field,
    width: usize,
    value: &Option<String>,
) -> Result<()> {
    match value {
        Some(text) => {
            let mut encoded = Vec::with_capacity(width);
            for ch in text.chars() {
                let code = ch as u32;
                if code > 0xFF {
                    return Err(Error::invalid_argument(format!(
                        "field {:?}: {:?} is not a latin-1 string",
                        field.name, text
                    )));
                }
                encoded.push(code as u8);
            }
            if encoded.len() > width {
                return Err(Error::invalid_argument(format!(
                    "field {:?}: value of {} bytes exceeds width {}",
                    field.name,
                    encoded.len(),
                    width
                )));
            }
            buf.put_slice(&encoded);
            buf.put_bytes(0, width - encoded.len());
            buf.put_u8(0);
        }
        None => {
            buf.put_bytes(0, width);
            buf.put_u8(1);
        }
    }
    Ok(())
}

fn write_wide(
    buf: &mut BytesMut,
    field: &Field,
    units: usize,
    value: &Option<String>,
) -> Result<()> {
    match value {
        Some(text) => {
            let encoded: Vec<u16> = text.encode_utf16().collect();
            if encoded.len() > units {
                return Err(Error::invalid_argument(format!(
                    "field {:?}: value of {} UTF-16 units exceeds width {}",
                    field.name,
                    encoded.len(),
                    units
                )));
            }
            for unit in &encoded {
                buf.put_u16_le(*unit);
            }
            buf.put_bytes(0, (units - encoded.len()) * 2);
            buf.put_u8(0);
        }
        None => {
            buf.put_bytes(0, units * 2);
            buf.put_u8(1);
        }
    }
    Ok(())
}
