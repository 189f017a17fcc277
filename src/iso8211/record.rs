//! Data records: tag → decoded payload, shaped by the file's descriptors.
//!
//! A record never decodes from the continuing file stream. Its leader gives
//! the record's full byte range, the directory indexes that range, and each
//! field decodes from its own bounded slice, so a malformed length cannot
//! bleed one field's bytes into the next.

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Result, S57Error};
use crate::iso8211::descriptor::{is_control_tag, DescriptorKind, FieldDescriptor};
use crate::iso8211::format::Value;
use crate::iso8211::metadata::{assemble_record, decode_frame, slice_field, Leader, Metadata};
use crate::iso8211::stream::{
    strip_field_terminator, StreamReader, StreamWriter, FIELD_TERMINATOR,
};

// ---------------------------------------------------------------------------
// SubfieldRow
// ---------------------------------------------------------------------------

/// One decoded row of an array field, in declared subfield order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubfieldRow {
    values: IndexMap<String, Value>,
}

impl SubfieldRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subfield values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Set one subfield value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Look up a subfield value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// (name, value) pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Integer subfield, failing when absent or differently typed.
    pub fn int(&self, name: &str) -> Result<i64> {
        self.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| missing(name))
    }

    /// Text subfield, failing when absent or differently typed.
    pub fn text(&self, name: &str) -> Result<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(name))
    }

    /// Numeric subfield (integer or decimal), failing when absent.
    pub fn float(&self, name: &str) -> Result<f64> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| missing(name))
    }

    /// Raw-byte subfield, failing when absent or differently typed.
    pub fn bytes(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .and_then(Value::as_bytes)
            .ok_or_else(|| missing(name))
    }
}

fn missing(name: &str) -> S57Error {
    S57Error::StructuralMismatch(format!("subfield {} absent or wrongly typed", name))
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// Decoded payload of one field, shaped by its descriptor kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A single-value field.
    Single(Value),
    /// A non-repeating array field: exactly one row.
    Row(SubfieldRow),
    /// A repeating array field: zero or more rows.
    Rows(Vec<SubfieldRow>),
}

impl FieldValue {
    /// The value of a single-value field.
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => Some(value),
            _ => None,
        }
    }

    /// The one row of a non-repeating array field.
    pub fn as_row(&self) -> Option<&SubfieldRow> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    /// All rows, whatever the shape: one for `Row`, none for `Single`.
    pub fn rows(&self) -> &[SubfieldRow] {
        match self {
            Self::Single(_) => &[],
            Self::Row(row) => std::slice::from_ref(row),
            Self::Rows(rows) => rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One data record: its leader plus tag → decoded payload in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub leader: Leader,
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Start an empty record for tags of `tag_width` characters.
    pub fn new(tag_width: usize) -> Self {
        Self {
            leader: Leader::data(tag_width),
            fields: IndexMap::new(),
        }
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the record carries `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.fields.contains_key(tag)
    }

    /// Look up one field's payload.
    pub fn field(&self, tag: &str) -> Option<&FieldValue> {
        self.fields.get(tag)
    }

    /// (tag, payload) pairs in file order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(tag, value)| (tag.as_str(), value))
    }

    /// Set one field's payload, replacing any previous value under `tag`.
    pub fn insert(&mut self, tag: impl Into<String>, value: FieldValue) {
        self.fields.insert(tag.into(), value);
    }

    /// Decode the next record, advancing `reader` past it.
    pub fn decode(metadata: &Metadata, reader: &mut StreamReader<'_>) -> Result<Self> {
        let frame = decode_frame(reader)?;
        let mut record = Self {
            leader: frame.leader.clone(),
            fields: IndexMap::new(),
        };
        for entry in &frame.entries {
            if is_control_tag(&entry.tag) {
                continue;
            }
            let descriptor = metadata.field(&entry.tag).ok_or_else(|| {
                S57Error::StructuralMismatch(format!("no descriptor for tag {}", entry.tag))
            })?;
            let value = decode_body(descriptor, slice_field(frame.area, entry)?)?;
            if record.fields.contains_key(&entry.tag) {
                warn!(
                    "tag {} appears twice in one record, keeping the later payload",
                    entry.tag
                );
            }
            record.fields.insert(entry.tag.clone(), value);
        }
        Ok(record)
    }

    /// Encode the record against the descriptors in `metadata`.
    pub fn encode(&self, metadata: &Metadata) -> Result<Vec<u8>> {
        let mut bodies = Vec::with_capacity(self.fields.len());
        for (tag, value) in &self.fields {
            let descriptor = metadata.field(tag).ok_or_else(|| {
                S57Error::StructuralMismatch(format!("no descriptor for tag {}", tag))
            })?;
            bodies.push((tag.clone(), encode_body(descriptor, value)?));
        }
        assemble_record(&self.leader, &bodies)
    }
}

// ---------------------------------------------------------------------------
// Field payload codec
// ---------------------------------------------------------------------------

fn decode_body(descriptor: &FieldDescriptor, body: &[u8]) -> Result<FieldValue> {
    let body = strip_field_terminator(body)?;
    let mut reader = StreamReader::new(body);
    match &descriptor.kind {
        DescriptorKind::SingleValue(format) => Ok(FieldValue::Single(format.decode(&mut reader)?)),
        DescriptorKind::Array {
            subfields,
            repeating,
        } => {
            let mut rows = Vec::new();
            while !reader.is_empty() {
                let start = reader.position();
                let mut row = SubfieldRow::new();
                for subfield in subfields {
                    row.set(subfield.name.clone(), subfield.format.decode(&mut reader)?);
                }
                if reader.position() == start {
                    return Err(S57Error::StructuralMismatch(format!(
                        "field {} subfield row consumed no bytes",
                        descriptor.tag
                    )));
                }
                rows.push(row);
            }
            if *repeating {
                return Ok(FieldValue::Rows(rows));
            }
            if rows.len() != 1 {
                return Err(S57Error::StructuralMismatch(format!(
                    "field {} decoded {} rows but does not repeat",
                    descriptor.tag,
                    rows.len()
                )));
            }
            Ok(FieldValue::Row(rows.remove(0)))
        }
        DescriptorKind::Control(_) => Err(S57Error::StructuralMismatch(format!(
            "control descriptor {} used for record data",
            descriptor.tag
        ))),
    }
}

fn encode_body(descriptor: &FieldDescriptor, value: &FieldValue) -> Result<Vec<u8>> {
    let mut writer = StreamWriter::new();
    let mut unbounded_last = false;
    match (&descriptor.kind, value) {
        (DescriptorKind::SingleValue(format), FieldValue::Single(value)) => {
            format.encode(value, &mut writer)?;
            unbounded_last = format.is_unbounded();
        }
        (
            DescriptorKind::Array {
                subfields,
                repeating,
            },
            value @ (FieldValue::Row(_) | FieldValue::Rows(_)),
        ) => {
            let rows = value.rows();
            if !*repeating && rows.len() != 1 {
                return Err(S57Error::StructuralMismatch(format!(
                    "field {} holds {} rows but does not repeat",
                    descriptor.tag,
                    rows.len()
                )));
            }
            for row in rows {
                for subfield in subfields {
                    let value = row.get(&subfield.name).ok_or_else(|| {
                        S57Error::StructuralMismatch(format!(
                            "row for field {} lacks subfield {}",
                            descriptor.tag, subfield.name
                        ))
                    })?;
                    subfield.format.encode(value, &mut writer)?;
                    unbounded_last = subfield.format.is_unbounded();
                }
            }
        }
        (_, value) => {
            return Err(S57Error::StructuralMismatch(format!(
                "payload {:?} does not match the shape of field {}",
                value, descriptor.tag
            )))
        }
    }

    // Unbounded values terminate themselves; the last terminator of the
    // body is the field's, not the value's.
    let mut body = writer.into_bytes();
    if unbounded_last {
        body.pop();
    }
    body.push(FIELD_TERMINATOR);
    Ok(body)
}
