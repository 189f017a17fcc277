//! Vector geometry records and their updates.
//!
//! A vector record is an isolated node, a connected node, or an edge. Its
//! stored coordinates are integers divided by the dataset's multiplication
//! factors; an edge additionally points at the connected nodes bounding it,
//! which are folded into its point list on demand.

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::error::{Result, S57Error};
use crate::iso8211::{Record, SubfieldRow};
use crate::notification::NotificationCollection;
use crate::s57::object::{
    decode_patch, optional_rows, required_row, subfield_code, Patch, SpatialReference, Topology,
};
use crate::s57::standard::{resolve_or_code, Lookup, LookupKind};
use crate::types::{Coordinate, GeometryId, RecordClass};

/// Per-dataset multiplication factors dividing stored coordinate integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingFactors {
    /// COMF: divisor for XCOO/YCOO values.
    pub coordinate: f64,
    /// SOMF: divisor for VE3D sounding values.
    pub depth: f64,
}

impl ScalingFactors {
    /// Create factors from already-known divisors.
    pub fn new(coordinate: f64, depth: f64) -> Self {
        Self { coordinate, depth }
    }

    /// Read both factors from a DSPM row.
    pub(crate) fn from_dspm(row: &SubfieldRow) -> Result<Self> {
        Ok(Self {
            coordinate: row.float("COMF")?,
            depth: row.float("SOMF")?,
        })
    }
}

/// Decode one SG2D/SG3D row into a real-valued coordinate.
fn decode_coordinate(
    row: &SubfieldRow,
    three_d: bool,
    factors: ScalingFactors,
) -> Result<Coordinate> {
    let x = row.int("XCOO")? as f64 / factors.coordinate;
    let y = row.int("YCOO")? as f64 / factors.coordinate;
    if three_d {
        let depth = row.int("VE3D")? as f64 / factors.depth;
        Ok(Coordinate::with_depth(x, y, depth))
    } else {
        Ok(Coordinate::new(x, y))
    }
}

/// The coordinate rows of a record, if it carries any.
///
/// A 3-D sounding field takes precedence over the 2-D field; decoding
/// either without known factors is fatal, since the stored integers are
/// meaningless without their divisors.
fn coordinate_rows<'a>(
    record: &'a Record,
    factors: Option<ScalingFactors>,
) -> Result<Option<(&'a [SubfieldRow], bool, ScalingFactors)>> {
    let (rows, three_d) = if let Some(field) = record.field("SG3D") {
        (field.rows(), true)
    } else if let Some(field) = record.field("SG2D") {
        (field.rows(), false)
    } else {
        return Ok(None);
    };
    let factors = factors.ok_or_else(|| {
        S57Error::StructuralMismatch(
            "coordinate rows precede the dataset parameter record".to_string(),
        )
    })?;
    Ok(Some((rows, three_d, factors)))
}

/// Identifier and class from a VRID row.
pub(crate) fn vector_id(
    vrid: &SubfieldRow,
    lookup: &dyn Lookup,
    notifications: &mut NotificationCollection,
) -> Result<(GeometryId, RecordClass)> {
    let rcnm = subfield_code(vrid, "RCNM")?;
    let class = RecordClass::from_code(rcnm).ok_or_else(|| {
        S57Error::StructuralMismatch(format!("unrecognized record class code {rcnm}"))
    })?;
    let name = resolve_or_code(lookup, LookupKind::RecordClass, rcnm, notifications);
    Ok((GeometryId::new(name, subfield_code(vrid, "RCID")?), class))
}

/// One vector geometry.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub id: GeometryId,
    pub class: RecordClass,
    pub version: u32,
    /// Rows decoded from this record's own coordinate field.
    pub coordinates: Vec<Coordinate>,
    /// VRPT pointers; for an edge these select its bounding nodes.
    pub spatial_references: Vec<SpatialReference>,
    points_cache: OnceCell<Vec<Coordinate>>,
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.class == other.class
            && self.version == other.version
            && self.coordinates == other.coordinates
            && self.spatial_references == other.spatial_references
    }
}

impl Geometry {
    /// Create a geometry from already-decoded parts.
    pub fn new(
        id: GeometryId,
        class: RecordClass,
        version: u32,
        coordinates: Vec<Coordinate>,
        spatial_references: Vec<SpatialReference>,
    ) -> Self {
        Self {
            id,
            class,
            version,
            coordinates,
            spatial_references,
            points_cache: OnceCell::new(),
        }
    }

    /// Decode an Insert-usage vector record.
    pub fn from_record(
        record: &Record,
        lookup: &dyn Lookup,
        factors: Option<ScalingFactors>,
        notifications: &mut NotificationCollection,
    ) -> Result<Self> {
        let vrid = required_row(record, "VRID")?;
        let (id, class) = vector_id(vrid, lookup, notifications)?;
        let version = subfield_code(vrid, "RVER")?;

        let coordinates = match coordinate_rows(record, factors)? {
            Some((rows, three_d, factors)) => rows
                .iter()
                .map(|row| decode_coordinate(row, three_d, factors))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        let spatial_references = optional_rows(record, "VRPT")
            .iter()
            .map(|row| SpatialReference::from_row(row, lookup, notifications))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            class,
            version,
            coordinates,
            spatial_references,
            points_cache: OnceCell::new(),
        })
    }

    /// The effective point list, resolved against the other geometries of
    /// the cell and cached for the life of the object.
    ///
    /// Nodes yield their own coordinate rows and must not carry spatial
    /// references. Edges are extended with the point of every referenced
    /// connected node, prepended or appended by its topology role.
    pub fn points(&self, geometries: &IndexMap<GeometryId, Geometry>) -> Result<&[Coordinate]> {
        self.points_cache
            .get_or_try_init(|| self.assemble_points(geometries))
            .map(Vec::as_slice)
    }

    fn assemble_points(
        &self,
        geometries: &IndexMap<GeometryId, Geometry>,
    ) -> Result<Vec<Coordinate>> {
        match self.class {
            RecordClass::IsolatedNode | RecordClass::ConnectedNode => {
                if !self.spatial_references.is_empty() {
                    return Err(S57Error::StructuralMismatch(format!(
                        "node {} carries spatial references",
                        self.id
                    )));
                }
                Ok(self.coordinates.clone())
            }
            RecordClass::Edge => {
                let mut points = self.coordinates.clone();
                for reference in &self.spatial_references {
                    let node = geometries.get(&reference.target).ok_or_else(|| {
                        S57Error::UnresolvedReference(reference.target.to_string())
                    })?;
                    if node.class != RecordClass::ConnectedNode {
                        return Err(S57Error::StructuralMismatch(format!(
                            "edge {} references {}, which is not a connected node",
                            self.id, node.id
                        )));
                    }
                    let node_points = node.points(geometries)?;
                    match reference.topology {
                        Some(Topology::Beginning) => {
                            let mut joined = node_points.to_vec();
                            joined.append(&mut points);
                            points = joined;
                        }
                        Some(Topology::End) => points.extend_from_slice(node_points),
                        other => {
                            return Err(S57Error::StructuralMismatch(format!(
                                "edge {} bounding node {} has topology {:?}, expected beginning or end",
                                self.id, node.id, other
                            )))
                        }
                    }
                }
                Ok(points)
            }
            other => Err(S57Error::StructuralMismatch(format!(
                "geometry {} has non-vector class {:?}",
                self.id, other
            ))),
        }
    }
}

/// An Update-usage vector record: patches against an existing geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryUpdate {
    pub id: GeometryId,
    pub version: u32,
    reference_patch: Option<Patch<SpatialReference>>,
    coordinate_patch: Option<Patch<Coordinate>>,
}

impl GeometryUpdate {
    /// Decode an Update-usage vector record.
    pub fn from_record(
        record: &Record,
        lookup: &dyn Lookup,
        factors: Option<ScalingFactors>,
        notifications: &mut NotificationCollection,
    ) -> Result<Self> {
        let vrid = required_row(record, "VRID")?;
        let (id, _) = vector_id(vrid, lookup, notifications)?;
        let version = subfield_code(vrid, "RVER")?;

        let reference_patch = if record.contains("VRPC") {
            let control = required_row(record, "VRPC")?;
            Some(decode_patch(
                control,
                ["VPUI", "VPIX", "NVPT"],
                optional_rows(record, "VRPT"),
                |row| SpatialReference::from_row(row, lookup, notifications),
            )?)
        } else {
            None
        };
        let coordinate_patch = if record.contains("SGCC") {
            let control = required_row(record, "SGCC")?;
            match coordinate_rows(record, factors)? {
                Some((rows, three_d, factors)) => Some(decode_patch(
                    control,
                    ["CCUI", "CCIX", "CCNC"],
                    rows,
                    |row| decode_coordinate(row, three_d, factors),
                )?),
                None => Some(decode_patch(
                    control,
                    ["CCUI", "CCIX", "CCNC"],
                    &[],
                    |_| {
                        Err(S57Error::StructuralMismatch(
                            "coordinate patch without coordinate rows".to_string(),
                        ))
                    },
                )?),
            }
        } else {
            None
        };

        Ok(Self {
            id,
            version,
            reference_patch,
            coordinate_patch,
        })
    }

    /// Apply this update to its target geometry.
    ///
    /// References are patched before coordinates, matching the order the
    /// fields appear in an update record. Consumes the update, so a patch
    /// cannot be replayed.
    pub fn apply(self, geometry: &mut Geometry) -> Result<()> {
        geometry.version = self.version;
        if let Some(patch) = self.reference_patch {
            patch.apply(&mut geometry.spatial_references)?;
        }
        if let Some(patch) = self.coordinate_patch {
            patch.apply(&mut geometry.coordinates)?;
        }
        geometry.points_cache = OnceCell::new();
        Ok(())
    }
}
