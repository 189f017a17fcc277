//! Record leaders, directories, and the per-file descriptor set.
//!
//! Every record opens with a 24-byte leader and a directory of
//! (tag, length, position) triples. The first record of a file is the data
//! descriptive record: its payload is the [`FieldDescriptor`] for every tag
//! the file uses, collected here as [`Metadata`]. Encoding never copies
//! decoded lengths, positions, or widths; they are recomputed from the
//! encoded bodies, so edits to any field re-derive a consistent directory.

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Result, S57Error};
use crate::iso8211::descriptor::{is_control_tag, DescriptorKind, FieldDescriptor, TagTree};
use crate::iso8211::stream::{StreamReader, StreamWriter, FIELD_TERMINATOR};

// ---------------------------------------------------------------------------
// Leader
// ---------------------------------------------------------------------------

/// The fixed-size header opening every record.
///
/// Text markers (interchange level, identifiers, charset) are carried
/// verbatim from decode to encode; the numeric entries are recomputed from
/// the record's content whenever it is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leader {
    pub record_length: usize,
    pub interchange_level: u8,
    pub leader_identifier: u8,
    pub inline_code: u8,
    pub version: u8,
    pub application_indicator: u8,
    pub field_control_length: [u8; 2],
    pub base_address: usize,
    pub charset: [u8; 3],
    pub length_width: usize,
    pub position_width: usize,
    pub reserved: u8,
    pub tag_width: usize,
}

impl Leader {
    /// Encoded size of a leader.
    pub const LENGTH: usize = 24;

    /// Leader template for a data descriptive record.
    pub fn descriptive(tag_width: usize) -> Self {
        Self {
            record_length: 0,
            interchange_level: b'3',
            leader_identifier: b'L',
            inline_code: b'E',
            version: b'1',
            application_indicator: b' ',
            field_control_length: *b"09",
            base_address: 0,
            charset: *b" ! ",
            length_width: 0,
            position_width: 0,
            reserved: b'0',
            tag_width,
        }
    }

    /// Leader template for a data record.
    pub fn data(tag_width: usize) -> Self {
        Self {
            record_length: 0,
            interchange_level: b' ',
            leader_identifier: b'D',
            inline_code: b' ',
            version: b' ',
            application_indicator: b' ',
            field_control_length: *b"  ",
            base_address: 0,
            charset: *b"   ",
            length_width: 0,
            position_width: 0,
            reserved: b'0',
            tag_width,
        }
    }

    /// Decode a leader from exactly [`Self::LENGTH`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = StreamReader::new(bytes);
        let leader = Self {
            record_length: read_size(&mut reader, 5)?,
            interchange_level: read_byte(&mut reader)?,
            leader_identifier: read_byte(&mut reader)?,
            inline_code: read_byte(&mut reader)?,
            version: read_byte(&mut reader)?,
            application_indicator: read_byte(&mut reader)?,
            field_control_length: {
                let bytes = reader.read_fixed(2)?;
                [bytes[0], bytes[1]]
            },
            base_address: read_size(&mut reader, 5)?,
            charset: {
                let bytes = reader.read_fixed(3)?;
                [bytes[0], bytes[1], bytes[2]]
            },
            length_width: read_size(&mut reader, 1)?,
            position_width: read_size(&mut reader, 1)?,
            reserved: read_byte(&mut reader)?,
            tag_width: read_size(&mut reader, 1)?,
        };
        Ok(leader)
    }

    /// Append the leader's 24 bytes.
    pub fn encode(&self, writer: &mut StreamWriter) -> Result<()> {
        writer.write_int(self.record_length as i64, Some(5))?;
        writer.write_byte(self.interchange_level);
        writer.write_byte(self.leader_identifier);
        writer.write_byte(self.inline_code);
        writer.write_byte(self.version);
        writer.write_byte(self.application_indicator);
        writer.write_bytes(&self.field_control_length);
        writer.write_int(self.base_address as i64, Some(5))?;
        writer.write_bytes(&self.charset);
        writer.write_int(self.length_width as i64, Some(1))?;
        writer.write_int(self.position_width as i64, Some(1))?;
        writer.write_byte(self.reserved);
        writer.write_int(self.tag_width as i64, Some(1))?;
        Ok(())
    }
}

fn read_byte(reader: &mut StreamReader<'_>) -> Result<u8> {
    Ok(reader.read_fixed(1)?[0])
}

fn read_size(reader: &mut StreamReader<'_>, n: usize) -> Result<usize> {
    let value = reader.read_int(n)?;
    usize::try_from(value).map_err(|_| S57Error::InvalidNumber(value.to_string()))
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// One directory triple: where a tag's payload sits in the data area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub tag: String,
    pub length: usize,
    pub position: usize,
}

/// Read directory triples up to and including the terminator.
fn decode_directory(reader: &mut StreamReader<'_>, leader: &Leader) -> Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    loop {
        match reader.peek() {
            Some(FIELD_TERMINATOR) => {
                reader.read_fixed(1)?;
                return Ok(entries);
            }
            Some(_) => entries.push(DirectoryEntry {
                tag: reader.read_str(leader.tag_width)?,
                length: read_size(reader, leader.length_width)?,
                position: read_size(reader, leader.position_width)?,
            }),
            None => {
                return Err(S57Error::MissingTerminator {
                    terminator: FIELD_TERMINATOR,
                })
            }
        }
    }
}

/// Decoded framing shared by every record kind: the leader, its directory,
/// and the data area the directory indexes.
pub(crate) struct RecordFrame<'a> {
    pub leader: Leader,
    pub entries: Vec<DirectoryEntry>,
    pub area: &'a [u8],
}

/// Read one record's framing, advancing `reader` past the whole record.
pub(crate) fn decode_frame<'a>(reader: &mut StreamReader<'a>) -> Result<RecordFrame<'a>> {
    let leader = Leader::decode(reader.read_fixed(Leader::LENGTH)?)?;
    let body_len = leader.record_length.checked_sub(Leader::LENGTH).ok_or_else(|| {
        S57Error::StructuralMismatch(format!(
            "record length {} is shorter than its leader",
            leader.record_length
        ))
    })?;
    let body = reader.read_fixed(body_len)?;

    let mut directory = StreamReader::new(body);
    let entries = decode_directory(&mut directory, &leader)?;
    let area_start = leader.base_address.checked_sub(Leader::LENGTH).ok_or_else(|| {
        S57Error::StructuralMismatch(format!(
            "base address {} points inside the leader",
            leader.base_address
        ))
    })?;
    let area = body.get(area_start..).ok_or(S57Error::TruncatedData {
        needed: area_start,
        remaining: body.len(),
    })?;
    Ok(RecordFrame {
        leader,
        entries,
        area,
    })
}

/// Slice one field's payload out of a record's data area.
pub(crate) fn slice_field<'a>(area: &'a [u8], entry: &DirectoryEntry) -> Result<&'a [u8]> {
    let end = entry.position.saturating_add(entry.length);
    if end > area.len() {
        return Err(S57Error::TruncatedData {
            needed: end,
            remaining: area.len(),
        });
    }
    Ok(&area[entry.position..end])
}

/// Serialize a full record from its leader template and encoded field
/// bodies.
///
/// Lengths, positions, directory widths, the base address, and the record
/// length are all derived here; nothing is taken from the template beyond
/// the verbatim text markers and the tag width.
pub(crate) fn assemble_record(leader: &Leader, bodies: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut positions = Vec::with_capacity(bodies.len());
    let mut position = 0usize;
    let mut max_length = 0usize;
    for (_, body) in bodies {
        positions.push(position);
        position += body.len();
        max_length = max_length.max(body.len());
    }
    let data_length = position;
    let max_position = positions.last().copied().unwrap_or(0);

    let length_width = digit_count(max_length);
    let position_width = digit_count(max_position);
    let entry_size = leader.tag_width + length_width + position_width;
    // The directory's own terminator byte sits before the data area.
    let base_address = Leader::LENGTH + entry_size * bodies.len() + 1;

    let mut leader = leader.clone();
    leader.record_length = base_address + data_length;
    leader.base_address = base_address;
    leader.length_width = length_width;
    leader.position_width = position_width;

    let mut writer = StreamWriter::new();
    leader.encode(&mut writer)?;
    for ((tag, body), position) in bodies.iter().zip(&positions) {
        writer.write_str(tag)?;
        writer.write_int(body.len() as i64, Some(length_width))?;
        writer.write_int(*position as i64, Some(position_width))?;
    }
    writer.write_byte(FIELD_TERMINATOR);
    for (_, body) in bodies {
        writer.write_bytes(body);
    }
    Ok(writer.into_bytes())
}

fn digit_count(mut value: usize) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// The data descriptive record: one [`FieldDescriptor`] per tag, in file
/// order, plus the leader the descriptors were read under.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub leader: Leader,
    fields: IndexMap<String, FieldDescriptor>,
}

impl Metadata {
    /// Start an empty descriptor set for tags of `tag_width` characters.
    pub fn new(tag_width: usize) -> Self {
        Self {
            leader: Leader::descriptive(tag_width),
            fields: IndexMap::new(),
        }
    }

    /// Width every tag in this file must have.
    pub fn tag_width(&self) -> usize {
        self.leader.tag_width
    }

    /// Number of registered descriptors, the Control one included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no descriptor has been registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up the descriptor for `tag`.
    pub fn field(&self, tag: &str) -> Option<&FieldDescriptor> {
        self.fields.get(tag)
    }

    /// Descriptors in file order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// The Control descriptor.
    pub fn control(&self) -> Result<&FieldDescriptor> {
        self.fields
            .values()
            .find(|f| f.is_control())
            .ok_or_else(|| S57Error::StructuralMismatch("no control descriptor".to_string()))
    }

    /// Register `field`, replacing any previous descriptor under its tag.
    pub fn add_field(&mut self, field: FieldDescriptor) -> Result<()> {
        if field.tag.len() != self.leader.tag_width {
            return Err(S57Error::StructuralMismatch(format!(
                "tag {:?} is not {} characters wide",
                field.tag, self.leader.tag_width
            )));
        }
        if self.fields.contains_key(&field.tag) {
            warn!(
                "descriptor {} declared more than once, keeping the later definition",
                field.tag
            );
        }
        self.fields.insert(field.tag.clone(), field);
        Ok(())
    }

    /// Register the Control descriptor carrying the external file `title`.
    pub fn add_control(&mut self, title: impl Into<String>) -> Result<()> {
        self.add_field(FieldDescriptor::control(self.leader.tag_width, title))
    }

    /// Decode the data descriptive record, advancing `reader` past it.
    pub fn decode(reader: &mut StreamReader<'_>) -> Result<Self> {
        let frame = decode_frame(reader)?;
        let tag_width = frame.leader.tag_width;

        // Data descriptors resolve their parent through the Control tree,
        // so it decodes ahead of directory order.
        let control_entry = frame
            .entries
            .iter()
            .find(|e| is_control_tag(&e.tag))
            .ok_or_else(|| {
                S57Error::StructuralMismatch("no control descriptor in the directory".to_string())
            })?;
        let control = FieldDescriptor::decode(
            &control_entry.tag,
            slice_field(frame.area, control_entry)?,
            tag_width,
        )?;
        let tree = control.tree().cloned().unwrap_or_default();

        let mut metadata = Self {
            leader: frame.leader.clone(),
            fields: IndexMap::new(),
        };
        for entry in &frame.entries {
            let body = slice_field(frame.area, entry)?;
            let mut field = FieldDescriptor::decode(&entry.tag, body, tag_width)?;
            if !field.is_control() {
                field.parent = tree.parent_of(&entry.tag).map(str::to_string);
            }
            metadata.add_field(field)?;
        }
        Ok(metadata)
    }

    /// Encode the data descriptive record.
    ///
    /// The Control tree is rebuilt from each field's resolved parent before
    /// serializing, so programmatic edits to the field set need no manual
    /// tree maintenance.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.control()?;
        let tree = self.rebuild_tree();
        let mut bodies = Vec::with_capacity(self.fields.len());
        for (tag, field) in &self.fields {
            let body = if field.is_control() {
                let mut control = field.clone();
                control.kind = DescriptorKind::Control(tree.clone());
                control.encode()?
            } else {
                field.encode()?
            };
            bodies.push((tag.clone(), body));
        }
        assemble_record(&self.leader, &bodies)
    }

    fn rebuild_tree(&self) -> TagTree {
        let mut tree = TagTree::new();
        if let Some(root) = self.root_candidate() {
            tree.set_root(root);
        }
        for (tag, field) in &self.fields {
            if let Some(parent) = &field.parent {
                tree.insert(parent, tag);
            }
        }
        tree
    }

    /// Root for the rebuilt tree: the decoded root while still in use,
    /// otherwise the first parent tag that is itself parentless.
    fn root_candidate(&self) -> Option<String> {
        if let Some(root) = self
            .fields
            .values()
            .find_map(FieldDescriptor::tree)
            .and_then(TagTree::root)
        {
            if self
                .fields
                .values()
                .any(|f| f.parent.as_deref() == Some(root))
            {
                return Some(root.to_string());
            }
        }
        self.fields
            .values()
            .filter_map(|f| f.parent.as_deref())
            .find(|parent| self.fields.get(*parent).map_or(true, |f| f.parent.is_none()))
            .map(str::to_string)
    }
}
