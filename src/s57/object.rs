//! Shared building blocks of the S-57 object model.
//!
//! Everything features and vector geometries have in common lives here:
//! the update-instruction and pointer-code enums, spatial and feature
//! references, the list patch carried by update records, and the attribute
//! decoding shared by feature inserts and feature updates.

use indexmap::IndexMap;

use crate::error::{Result, S57Error};
use crate::iso8211::{Record, SubfieldRow};
use crate::notification::NotificationCollection;
use crate::s57::standard::{resolve_or_code, Lookup, LookupKind};
use crate::types::{FeatureId, GeometryId};

/// Attribute value that marks the attribute for removal during an update.
pub const DELETED_ATTRIBUTE: &str = "\u{7f}";

/// RUIN: how a record participates in update replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateInstruction {
    /// The record introduces a new object.
    Insert,
    /// The record patches an existing object in place.
    Update,
    /// The record removes an existing object by identifier.
    Delete,
}

impl UpdateInstruction {
    /// Map a RUIN code, rejecting anything outside the standard domain.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Insert),
            2 => Ok(Self::Update),
            3 => Ok(Self::Delete),
            other => Err(S57Error::StructuralMismatch(format!(
                "unrecognized update instruction {other}"
            ))),
        }
    }
}

/// Mode of a list patch (FSPC/FFPC/VRPC/SGCC control rows).
///
/// Distinct from [`UpdateInstruction`]: patch code 2 deletes and 3
/// replaces, while RUIN code 2 updates and 3 deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    Insert,
    Delete,
    Replace,
}

impl PatchMode {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Insert),
            2 => Ok(Self::Delete),
            3 => Ok(Self::Replace),
            other => Err(S57Error::StructuralMismatch(format!(
                "unrecognized patch mode {other}"
            ))),
        }
    }
}

/// ORNT: direction in which a referenced edge's points are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Forward,
    Reverse,
    Null,
}

impl Orientation {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Forward),
            2 => Ok(Self::Reverse),
            255 => Ok(Self::Null),
            other => Err(S57Error::StructuralMismatch(format!(
                "unrecognized orientation code {other}"
            ))),
        }
    }
}

/// USAG: role of a referenced edge within an area boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Exterior,
    Interior,
    /// Exterior boundary truncated at the dataset limit.
    ExteriorTruncated,
    Null,
}

impl Usage {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Exterior),
            2 => Ok(Self::Interior),
            3 => Ok(Self::ExteriorTruncated),
            255 => Ok(Self::Null),
            other => Err(S57Error::StructuralMismatch(format!(
                "unrecognized usage code {other}"
            ))),
        }
    }
}

/// MASK: display suppression flag on a spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    Mask,
    Show,
    Null,
}

impl Mask {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Mask),
            2 => Ok(Self::Show),
            255 => Ok(Self::Null),
            other => Err(S57Error::StructuralMismatch(format!(
                "unrecognized mask code {other}"
            ))),
        }
    }
}

/// TOPI: topology role of a referenced node relative to an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Beginning,
    End,
    LeftFace,
    RightFace,
    ContainingFace,
    Null,
}

impl Topology {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Beginning),
            2 => Ok(Self::End),
            3 => Ok(Self::LeftFace),
            4 => Ok(Self::RightFace),
            5 => Ok(Self::ContainingFace),
            255 => Ok(Self::Null),
            other => Err(S57Error::StructuralMismatch(format!(
                "unrecognized topology code {other}"
            ))),
        }
    }
}

/// PRIM: geometric primitive of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Point,
    Line,
    Area,
    Null,
}

impl Primitive {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Point),
            2 => Ok(Self::Line),
            3 => Ok(Self::Area),
            255 => Ok(Self::Null),
            other => Err(S57Error::StructuralMismatch(format!(
                "unrecognized primitive code {other}"
            ))),
        }
    }
}

/// RIND: relationship of a feature reference to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Master,
    Slave,
    Peer,
}

impl Relationship {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Master),
            2 => Ok(Self::Slave),
            3 => Ok(Self::Peer),
            other => Err(S57Error::StructuralMismatch(format!(
                "unrecognized relationship code {other}"
            ))),
        }
    }
}

/// One FSPT or VRPT row: a pointer to a vector geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialReference {
    pub target: GeometryId,
    pub orientation: Orientation,
    pub usage: Usage,
    /// Only present on vector-to-vector pointers (VRPT rows).
    pub topology: Option<Topology>,
    pub mask: Mask,
}

impl SpatialReference {
    /// Build a reference from one FSPT or VRPT row.
    pub fn from_row(
        row: &SubfieldRow,
        lookup: &dyn Lookup,
        notifications: &mut NotificationCollection,
    ) -> Result<Self> {
        let (rcnm, rcid) = GeometryId::split_name(row.bytes("NAME")?)?;
        let class = resolve_or_code(lookup, LookupKind::RecordClass, rcnm, notifications);
        let topology = match row.get("TOPI") {
            Some(value) => {
                let code = value.as_i64().ok_or_else(|| {
                    S57Error::StructuralMismatch("subfield TOPI is not numeric".to_string())
                })?;
                Some(Topology::from_code(code)?)
            }
            None => None,
        };
        Ok(Self {
            target: GeometryId::new(class, rcid),
            orientation: Orientation::from_code(row.int("ORNT")?)?,
            usage: Usage::from_code(row.int("USAG")?)?,
            topology,
            mask: Mask::from_code(row.int("MASK")?)?,
        })
    }
}

/// One FFPT row: a pointer to another feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureReference {
    pub target: FeatureId,
    pub relationship: Relationship,
    pub comment: String,
}

impl FeatureReference {
    /// Build a reference from one FFPT row.
    pub fn from_row(
        row: &SubfieldRow,
        lookup: &dyn Lookup,
        notifications: &mut NotificationCollection,
    ) -> Result<Self> {
        let (agency, fidn, fids) = FeatureId::split_lnam(row.bytes("LNAM")?)?;
        let agency = resolve_or_code(lookup, LookupKind::Agency, u32::from(agency), notifications);
        Ok(Self {
            target: FeatureId::new(agency, fidn, fids),
            relationship: Relationship::from_code(row.int("RIND")?)?,
            comment: row.text("COMT")?.to_string(),
        })
    }
}

/// A list patch carried by one update record.
///
/// `index` is 1-based. Insert splices the new rows in front of position
/// `index`; Delete removes `length` rows starting there; Replace removes
/// `length` rows there and splices the new rows in. A patch is consumed by
/// application so the same rows cannot be replayed twice.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch<T> {
    pub mode: PatchMode,
    pub index: usize,
    pub length: usize,
    pub rows: Vec<T>,
}

impl<T> Patch<T> {
    /// Apply the patch to `target` in place.
    pub fn apply(self, target: &mut Vec<T>) -> Result<()> {
        let at = self.index.checked_sub(1).ok_or_else(|| {
            S57Error::StructuralMismatch("patch index must be 1-based".to_string())
        })?;
        match self.mode {
            PatchMode::Insert => {
                if at > target.len() {
                    return Err(Self::out_of_range(self.index, self.length, target.len()));
                }
                let tail = target.split_off(at);
                target.extend(self.rows);
                target.extend(tail);
            }
            PatchMode::Delete => {
                if at + self.length > target.len() {
                    return Err(Self::out_of_range(self.index, self.length, target.len()));
                }
                target.drain(at..at + self.length);
            }
            PatchMode::Replace => {
                if at + self.length > target.len() {
                    return Err(Self::out_of_range(self.index, self.length, target.len()));
                }
                let tail = target.split_off(at + self.length);
                target.truncate(at);
                target.extend(self.rows);
                target.extend(tail);
            }
        }
        Ok(())
    }

    fn out_of_range(index: usize, length: usize, have: usize) -> S57Error {
        S57Error::StructuralMismatch(format!(
            "patch range {index}+{length} exceeds the {have} rows present"
        ))
    }
}

/// Decode a patch control row, naming its mode/index/length subfields, and
/// map the accompanying rows through `build`.
pub(crate) fn decode_patch<T>(
    control: &SubfieldRow,
    names: [&str; 3],
    rows: &[SubfieldRow],
    mut build: impl FnMut(&SubfieldRow) -> Result<T>,
) -> Result<Patch<T>> {
    let mode = PatchMode::from_code(control.int(names[0])?)?;
    let index = subfield_index(control, names[1])?;
    let length = subfield_index(control, names[2])?;
    let rows = rows.iter().map(&mut build).collect::<Result<Vec<_>>>()?;
    Ok(Patch {
        mode,
        index,
        length,
        rows,
    })
}

/// Merge the ATTF and NATF rows of a record into one name-keyed map.
///
/// Keys are resolved attribute names; a narrow-character row with the same
/// resolved name as a normal row replaces it.
pub(crate) fn decode_attributes(
    record: &Record,
    lookup: &dyn Lookup,
    notifications: &mut NotificationCollection,
) -> Result<IndexMap<String, String>> {
    let mut attributes = IndexMap::new();
    for tag in ["ATTF", "NATF"] {
        for row in optional_rows(record, tag) {
            let name = resolve_or_code(
                lookup,
                LookupKind::Attribute,
                subfield_code(row, "ATTL")?,
                notifications,
            );
            attributes.insert(name, row.text("ATVL")?.to_string());
        }
    }
    Ok(attributes)
}

/// The single row of a field that appears exactly once per record.
pub(crate) fn required_row<'a>(record: &'a Record, tag: &str) -> Result<&'a SubfieldRow> {
    let field = record
        .field(tag)
        .ok_or_else(|| S57Error::StructuralMismatch(format!("record has no {tag} field")))?;
    field
        .as_row()
        .ok_or_else(|| S57Error::StructuralMismatch(format!("{tag} is not a single row")))
}

/// All rows of an optional repeating field; absent means no rows.
pub(crate) fn optional_rows<'a>(record: &'a Record, tag: &str) -> &'a [SubfieldRow] {
    record.field(tag).map(|field| field.rows()).unwrap_or(&[])
}

/// Read a numeric subfield as an unsigned code.
pub(crate) fn subfield_code(row: &SubfieldRow, name: &str) -> Result<u32> {
    let value = row.int(name)?;
    u32::try_from(value).map_err(|_| {
        S57Error::StructuralMismatch(format!("subfield {name} holds {value}, not a code"))
    })
}

/// Read a numeric subfield as a list index or row count.
pub(crate) fn subfield_index(row: &SubfieldRow, name: &str) -> Result<usize> {
    let value = row.int(name)?;
    usize::try_from(value).map_err(|_| {
        S57Error::StructuralMismatch(format!("subfield {name} holds {value}, not an index"))
    })
}
