//! Schema (RecordInfo) codec.
//!
//! The schema region of a file is an XML document carried as UTF-16LE text
//! with a `'\n'` `'\0'` trailer (two trailing code units):
//!
//! ```text
//! <MetaInfo><RecordInfo><Field name="..." type="..." [size="..."] [scale="..."]/>...</RecordInfo></MetaInfo>
//! ```
//!
//! Field order is significant and preserved across round trips. Unknown
//! attributes are ignored on decode and not regenerated on encode; the
//! emitted document carries no XML declaration.

use crate::buffer::{decode_utf16le, encode_utf16le};
use crate::error::{Error, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Scalar and variable-width column types understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Single-byte boolean; the value 2 marks null.
    Bool,
    /// Unsigned 8-bit integer.
    Byte,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Decimal number rendered as a fixed-width string.
    FixedDecimal,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Fixed-width single-byte string.
    String,
    /// Fixed-width wide (UTF-16) string.
    WString,
    /// Variable-width single-byte string.
    VString,
    /// Variable-width wide string.
    VWString,
    /// Calendar date, "YYYY-MM-DD".
    Date,
    /// Time of day, "HH:MM:SS".
    Time,
    /// Date and time, "YYYY-MM-DD HH:MM:SS".
    DateTime,
    /// Variable-width binary object.
    Blob,
    /// Variable-width spatial object.
    SpatialObj,
}

impl FieldType {
    /// Look up a type by its XML name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Bool" => Some(FieldType::Bool),
            "Byte" => Some(FieldType::Byte),
            "Int16" => Some(FieldType::Int16),
            "Int32" => Some(FieldType::Int32),
            "Int64" => Some(FieldType::Int64),
            "FixedDecimal" => Some(FieldType::FixedDecimal),
            "Float" => Some(FieldType::Float),
            "Double" => Some(FieldType::Double),
            "String" => Some(FieldType::String),
            "WString" => Some(FieldType::WString),
            "V_String" => Some(FieldType::VString),
            "V_WString" => Some(FieldType::VWString),
            "Date" => Some(FieldType::Date),
            "Time" => Some(FieldType::Time),
            "DateTime" => Some(FieldType::DateTime),
            "Blob" => Some(FieldType::Blob),
            "SpatialObj" => Some(FieldType::SpatialObj),
            _ => None,
        }
    }

    /// The XML name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "Bool",
            FieldType::Byte => "Byte",
            FieldType::Int16 => "Int16",
            FieldType::Int32 => "Int32",
            FieldType::Int64 => "Int64",
            FieldType::FixedDecimal => "FixedDecimal",
            FieldType::Float => "Float",
            FieldType::Double => "Double",
            FieldType::String => "String",
            FieldType::WString => "WString",
            FieldType::VString => "V_String",
            FieldType::VWString => "V_WString",
            FieldType::Date => "Date",
            FieldType::Time => "Time",
            FieldType::DateTime => "DateTime",
            FieldType::Blob => "Blob",
            FieldType::SpatialObj => "SpatialObj",
        }
    }

    /// True for types whose value lives in the record's variable-data tail.
    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            FieldType::VString | FieldType::VWString | FieldType::Blob | FieldType::SpatialObj
        )
    }

    /// True for types whose fixed width depends on the field's `size`.
    pub fn requires_size(&self) -> bool {
        matches!(self, FieldType::FixedDecimal | FieldType::String | FieldType::WString)
    }
}

/// A named column in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Column type.
    pub field_type: FieldType,
    /// Declared width, for types that carry one.
    pub size: Option<u32>,
    /// Decimal scale, for fixed-decimal fields.
    pub scale: Option<u32>,
}

impl Field {
    /// Create a field with no size or scale.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type, size: None, scale: None }
    }

    /// Create a field with a declared width.
    pub fn sized(name: impl Into<String>, field_type: FieldType, size: u32) -> Self {
        Self { name: name.into(), field_type, size: Some(size), scale: None }
    }

    /// Create a fixed-decimal field with a width and scale.
    pub fn fixed_decimal(name: impl Into<String>, size: u32, scale: u32) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::FixedDecimal,
            size: Some(size),
            scale: Some(scale),
        }
    }
}

/// The ordered field schema of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInfo {
    /// Fields in document order.
    pub fields: Vec<Field>,
}

impl RecordInfo {
    /// Create a schema from an ordered field list.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// True when any field's value lives in the variable-data tail.
    pub fn has_variable_data(&self) -> bool {
        self.fields.iter().any(|f| f.field_type.is_variable())
    }

    /// Byte width of a record's fixed portion under this schema.
    pub fn fixed_record_size(&self) -> Result<usize> {
        self.fields.iter().map(crate::field::fixed_size).sum()
    }

    /// Render the schema as an XML document without a declaration.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Start(BytesStart::new("MetaInfo")))?;
        writer.write_event(Event::Start(BytesStart::new("RecordInfo")))?;

        for field in &self.fields {
            let mut elem = BytesStart::new("Field");
            elem.push_attribute(("name", field.name.as_str()));
            elem.push_attribute(("type", field.field_type.name()));
            if let Some(size) = field.size {
                elem.push_attribute(("size", size.to_string().as_str()));
            }
            if let Some(scale) = field.scale {
                elem.push_attribute(("scale", scale.to_string().as_str()));
            }
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new("RecordInfo")))?;
        writer.write_event(Event::End(BytesEnd::new("MetaInfo")))?;

        String::from_utf8(writer.into_inner())
            .map_err(|_| Error::schema("schema XML is not valid UTF-8"))
    }

    /// Parse a schema from XML text.
    ///
    /// Exactly one `RecordInfo` element must be present; its `Field`
    /// children are read in document order.
    pub fn from_xml(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        let mut record_infos = 0usize;
        let mut in_record_info = false;
        let mut fields = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"RecordInfo" => {
                        record_infos += 1;
                        in_record_info = true;
                    }
                    b"Field" if in_record_info => fields.push(parse_field(&e)?),
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"RecordInfo" => record_infos += 1,
                    b"Field" if in_record_info => fields.push(parse_field(&e)?),
                    _ => {}
                },
                Event::End(e) if e.name().as_ref() == b"RecordInfo" => in_record_info = false,
                Event::Eof => break,
                _ => {}
            }
        }

        match record_infos {
            0 => Err(Error::schema("no RecordInfo entries found")),
            1 => Ok(RecordInfo::new(fields)),
            _ => Err(Error::schema("too many RecordInfo entries found")),
        }
    }

    /// Encode the schema region: XML, `'\n'` `'\0'` trailer, UTF-16LE.
    ///
    /// The returned length in bytes is always even; halved, it is the
    /// header's `metaInfoLength`.
    pub fn encode_meta(&self) -> Result<Vec<u8>> {
        let mut text = self.to_xml()?;
        text.push('\n');
        text.push('\0');
        Ok(encode_utf16le(&text))
    }

    /// Decode the schema region read from a file.
    pub fn decode_meta(bytes: &[u8]) -> Result<Self> {
        // The two-code-unit trailer alone takes 4 bytes.
        if bytes.len() < 4 {
            return Err(Error::corruption(format!(
                "schema region of {} bytes is too short for its trailer",
                bytes.len()
            )));
        }
        let text = decode_utf16le(&bytes[..bytes.len() - 4])?;
        Self::from_xml(&text)
    }
}

fn parse_field(elem: &BytesStart<'_>) -> Result<Field> {
    let mut name = None;
    let mut type_name = None;
    let mut size = None;
    let mut scale = None;

    for attr in elem.attributes() {
        let attr = attr.map_err(|e| Error::schema(format!("bad Field attribute: {}", e)))?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"name" => name = Some(value.into_owned()),
            b"type" => type_name = Some(value.into_owned()),
            b"size" => size = Some(parse_attr_int(&value, "size")?),
            b"scale" => scale = Some(parse_attr_int(&value, "scale")?),
            // Unknown attributes (e.g. description) are ignored.
            _ => {}
        }
    }

    let name = name.ok_or_else(|| Error::schema("Field element is missing a name attribute"))?;
    let type_name =
        type_name.ok_or_else(|| Error::schema("Field element is missing a type attribute"))?;
    let field_type = FieldType::from_name(&type_name)
        .ok_or_else(|| Error::schema(format!("unknown field type {:?}", type_name)))?;

    Ok(Field { name, field_type, size, scale })
}

fn parse_attr_int(value: &str, label: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| Error::schema(format!("malformed {} attribute {:?}", label, value)))
}
