//! Field descriptors: the declared shape of one tag's payload.
//!
//! A data descriptive record carries one descriptor per field tag. Three
//! shapes exist: the all-zero Control tag (external file title plus the
//! parent/child tag tree), single-value fields, and arrays of named
//! subfields that may repeat. The nine leading control bytes are preserved
//! verbatim so a decoded file re-encodes byte for byte.

use indexmap::IndexMap;

use crate::error::{Result, S57Error};
use crate::iso8211::format::{collapse_format_list, parse_format_list, FieldFormat};
use crate::iso8211::stream::{
    decode_text, strip_field_terminator, StreamReader, StreamWriter, FIELD_TERMINATOR,
    UNIT_TERMINATOR,
};

/// Whether `tag` is the reserved all-zero Control tag.
pub fn is_control_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.bytes().all(|b| b == b'0')
}

// ---------------------------------------------------------------------------
// FieldControls
// ---------------------------------------------------------------------------

/// The nine structural bytes opening every descriptor body.
///
/// Decoded values are carried through untouched; the constructors only
/// matter when a descriptor is built programmatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldControls {
    pub structure: u8,
    pub data_type: u8,
    pub auxiliary: [u8; 2],
    pub printable_graphics: [u8; 2],
    pub escape_sequence: [u8; 3],
}

impl FieldControls {
    /// Encoded length of the control bytes.
    pub const LENGTH: usize = 9;

    fn with_codes(structure: u8, data_type: u8) -> Self {
        Self {
            structure,
            data_type,
            auxiliary: *b"00",
            printable_graphics: *b";&",
            escape_sequence: *b"   ",
        }
    }

    /// Controls for the Control field.
    pub fn control() -> Self {
        Self::with_codes(b'0', b'0')
    }

    /// Controls for a single-value field.
    pub fn single(format: &FieldFormat) -> Self {
        Self::with_codes(b'0', type_code(std::slice::from_ref(format)))
    }

    /// Controls for an array field.
    pub fn array(formats: &[FieldFormat], repeating: bool) -> Self {
        let structure = if repeating { b'2' } else { b'1' };
        Self::with_codes(structure, type_code(formats))
    }

    fn decode(reader: &mut StreamReader<'_>) -> Result<Self> {
        let bytes = reader.read_fixed(Self::LENGTH)?;
        Ok(Self {
            structure: bytes[0],
            data_type: bytes[1],
            auxiliary: [bytes[2], bytes[3]],
            printable_graphics: [bytes[4], bytes[5]],
            escape_sequence: [bytes[6], bytes[7], bytes[8]],
        })
    }

    fn encode(&self, writer: &mut StreamWriter) {
        writer.write_byte(self.structure);
        writer.write_byte(self.data_type);
        writer.write_bytes(&self.auxiliary);
        writer.write_bytes(&self.printable_graphics);
        writer.write_bytes(&self.escape_sequence);
    }
}

fn type_code(formats: &[FieldFormat]) -> u8 {
    let code_of = |format: &FieldFormat| match format {
        FieldFormat::Text(_) => b'0',
        FieldFormat::Integer(_) => b'1',
        FieldFormat::Decimal(_) => b'2',
        _ => b'5',
    };
    let mut codes = formats.iter().map(code_of);
    match codes.next() {
        Some(first) if codes.all(|c| c == first) => first,
        Some(_) => b'6',
        None => b'0',
    }
}

// ---------------------------------------------------------------------------
// TagTree
// ---------------------------------------------------------------------------

/// Parent → ordered-children tree from the Control field's tag pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagTree {
    children: IndexMap<String, Vec<String>>,
    root: Option<String>,
}

impl TagTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tree holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The root tag: the first parent ever inserted.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Pin the root tag ahead of inserting pairs.
    pub fn set_root(&mut self, root: impl Into<String>) {
        self.root = Some(root.into());
    }

    /// Ordered children of `tag`.
    pub fn children_of(&self, tag: &str) -> &[String] {
        self.children.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The parent listing `tag` as a child, if any.
    pub fn parent_of(&self, tag: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|(_, children)| children.iter().any(|c| c == tag))
            .map(|(parent, _)| parent.as_str())
    }

    /// Append one parent/child pair, grouping by first-seen parent.
    pub fn insert(&mut self, parent: &str, child: &str) {
        if self.root.is_none() {
            self.root = Some(parent.to_string());
        }
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
    }

    fn pair_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// Depth-first (parent, child) pairs starting at the root, the order the
    /// Control field serializes them in.
    pub fn pairs(&self) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        if let Some(root) = self.root.clone() {
            let mut visited = Vec::new();
            self.walk(&root, &mut pairs, &mut visited);
        }
        if pairs.len() != self.pair_count() {
            return Err(S57Error::StructuralMismatch(
                "control tag pairs do not form a single tree".to_string(),
            ));
        }
        Ok(pairs)
    }

    fn walk(&self, node: &str, pairs: &mut Vec<(String, String)>, visited: &mut Vec<String>) {
        if visited.iter().any(|v| v == node) {
            return;
        }
        visited.push(node.to_string());
        for child in self.children_of(node).to_vec() {
            pairs.push((node.to_string(), child.clone()));
            self.walk(&child, pairs, visited);
        }
    }

    fn decode(block: &[u8], tag_width: usize) -> Result<Self> {
        if block.len() % (2 * tag_width) != 0 {
            return Err(S57Error::StructuralMismatch(format!(
                "control tag-pair block of {} bytes is not a whole number of pairs",
                block.len()
            )));
        }
        let mut tree = Self::new();
        for pair in block.chunks(2 * tag_width) {
            let parent = decode_text(&pair[..tag_width]);
            let child = decode_text(&pair[tag_width..]);
            tree.insert(&parent, &child);
        }
        Ok(tree)
    }
}

// ---------------------------------------------------------------------------
// FieldDescriptor
// ---------------------------------------------------------------------------

/// One named subfield of an array field.
#[derive(Debug, Clone, PartialEq)]
pub struct Subfield {
    pub name: String,
    pub format: FieldFormat,
}

/// Shape-specific payload of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorKind {
    /// The all-zero tag: tag-pair tree (the long name holds the external
    /// file title).
    Control(TagTree),
    /// A field holding exactly one value.
    SingleValue(FieldFormat),
    /// Named subfields decoded as one row, or many when `repeating`.
    Array {
        subfields: Vec<Subfield>,
        repeating: bool,
    },
}

/// Declared shape of one field tag.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub tag: String,
    pub controls: FieldControls,
    pub long_name: String,
    pub kind: DescriptorKind,
    /// Resolved from the Control tree when decoding; drives the tree
    /// rebuild when encoding.
    pub parent: Option<String>,
}

impl FieldDescriptor {
    /// Build a Control descriptor with an all-zero tag of `tag_width`.
    pub fn control(tag_width: usize, title: impl Into<String>) -> Self {
        Self {
            tag: "0".repeat(tag_width),
            controls: FieldControls::control(),
            long_name: title.into(),
            kind: DescriptorKind::Control(TagTree::new()),
            parent: None,
        }
    }

    /// Build a single-value descriptor.
    pub fn single(
        tag: impl Into<String>,
        long_name: impl Into<String>,
        format: FieldFormat,
    ) -> Self {
        Self {
            tag: tag.into(),
            controls: FieldControls::single(&format),
            long_name: long_name.into(),
            kind: DescriptorKind::SingleValue(format),
            parent: None,
        }
    }

    /// Build an array descriptor from (name, format) pairs.
    pub fn array(
        tag: impl Into<String>,
        long_name: impl Into<String>,
        subfields: Vec<(&str, FieldFormat)>,
        repeating: bool,
    ) -> Self {
        let formats: Vec<FieldFormat> = subfields.iter().map(|(_, f)| f.clone()).collect();
        Self {
            tag: tag.into(),
            controls: FieldControls::array(&formats, repeating),
            long_name: long_name.into(),
            kind: DescriptorKind::Array {
                subfields: subfields
                    .into_iter()
                    .map(|(name, format)| Subfield {
                        name: name.to_string(),
                        format,
                    })
                    .collect(),
                repeating,
            },
            parent: None,
        }
    }

    /// Set the parent tag, consuming and returning the descriptor.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Whether this is the Control descriptor.
    pub fn is_control(&self) -> bool {
        matches!(self.kind, DescriptorKind::Control(_))
    }

    /// The Control tree, when this is the Control descriptor.
    pub fn tree(&self) -> Option<&TagTree> {
        match &self.kind {
            DescriptorKind::Control(tree) => Some(tree),
            _ => None,
        }
    }

    /// Decode one descriptor body (directory slice, field terminator
    /// included).
    pub fn decode(tag: &str, body: &[u8], tag_width: usize) -> Result<Self> {
        let body = strip_field_terminator(body)?;
        let mut reader = StreamReader::new(body);
        let controls = FieldControls::decode(&mut reader)?;
        let long_name = reader.read_str_until(UNIT_TERMINATOR)?;

        if is_control_tag(tag) {
            let block = reader.read_fixed(reader.remaining())?;
            let tree = TagTree::decode(block, tag_width)?;
            return Ok(Self {
                tag: tag.to_string(),
                controls,
                long_name,
                kind: DescriptorKind::Control(tree),
                parent: None,
            });
        }

        let subfield_section = reader.read_str_until(UNIT_TERMINATOR)?;
        let format_section = decode_text(reader.read_fixed(reader.remaining())?);
        let format_list = format_section
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| {
                S57Error::StructuralMismatch(format!(
                    "format list {:?} is not parenthesized",
                    format_section
                ))
            })?;
        let formats = parse_format_list(format_list)?;

        let kind = if subfield_section.is_empty() {
            if formats.len() != 1 {
                return Err(S57Error::StructuralMismatch(format!(
                    "field {} declares no subfields but {} formats",
                    tag,
                    formats.len()
                )));
            }
            DescriptorKind::SingleValue(formats.into_iter().next().unwrap())
        } else {
            let (names, repeating) = match subfield_section.strip_prefix('*') {
                Some(rest) => (rest, true),
                None => (subfield_section.as_str(), false),
            };
            let names: Vec<&str> = names.split('!').collect();
            if names.len() != formats.len() {
                return Err(S57Error::StructuralMismatch(format!(
                    "field {} declares {} subfields but {} formats",
                    tag,
                    names.len(),
                    formats.len()
                )));
            }
            let subfields = names
                .iter()
                .zip(formats)
                .enumerate()
                .map(|(i, (name, format))| Subfield {
                    name: if name.is_empty() {
                        format!("ITEM{}", i)
                    } else {
                        (*name).to_string()
                    },
                    format,
                })
                .collect();
            DescriptorKind::Array {
                subfields,
                repeating,
            }
        };

        Ok(Self {
            tag: tag.to_string(),
            controls,
            long_name,
            kind,
            parent: None,
        })
    }

    /// Encode the descriptor body, field terminator included.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = StreamWriter::new();
        self.controls.encode(&mut writer);
        writer.write_str(&self.long_name)?;
        writer.write_byte(UNIT_TERMINATOR);

        match &self.kind {
            DescriptorKind::Control(tree) => {
                for (parent, child) in tree.pairs()? {
                    writer.write_str(&parent)?;
                    writer.write_str(&child)?;
                }
            }
            DescriptorKind::SingleValue(format) => {
                writer.write_byte(UNIT_TERMINATOR);
                writer.write_str(&format!("({})", format.to_code()))?;
            }
            DescriptorKind::Array {
                subfields,
                repeating,
            } => {
                if *repeating {
                    writer.write_byte(b'*');
                }
                let names: Vec<&str> = subfields.iter().map(|s| s.name.as_str()).collect();
                writer.write_str(&names.join("!"))?;
                writer.write_byte(UNIT_TERMINATOR);
                let formats: Vec<FieldFormat> =
                    subfields.iter().map(|s| s.format.clone()).collect();
                writer.write_str(&format!("({})", collapse_format_list(&formats)))?;
            }
        }

        writer.write_byte(FIELD_TERMINATOR);
        Ok(writer.into_bytes())
    }
}
