//! Feature records, their assembled shapes, and feature updates.
//!
//! A feature owns attributes and ordered references to vector geometries;
//! its shape is assembled on demand by walking those references against the
//! cell's geometry map and classifying the accumulated points by the
//! feature's primitive code.

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::error::{Result, S57Error};
use crate::iso8211::{Record, SubfieldRow};
use crate::notification::NotificationCollection;
use crate::s57::geometry::Geometry;
use crate::s57::object::{
    decode_attributes, decode_patch, optional_rows, required_row, subfield_code, FeatureReference,
    Orientation, Patch, Primitive, SpatialReference, Usage, DELETED_ATTRIBUTE,
};
use crate::s57::standard::{resolve_or_code, Lookup, LookupKind};
use crate::types::{Coordinate, FeatureId, GeometryId};

/// Assembled geometry of one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// No geometry: a null primitive, or no resolvable outer points.
    None,
    Point(Coordinate),
    MultiPoint(Vec<Coordinate>),
    LineString(Vec<Coordinate>),
    Polygon {
        outer: Vec<Coordinate>,
        inner: Vec<Vec<Coordinate>>,
    },
}

fn join_pairs(points: &[Coordinate]) -> String {
    points
        .iter()
        .map(Coordinate::wkt_pair)
        .collect::<Vec<_>>()
        .join(",")
}

impl Shape {
    /// The Well-Known-Text rendering; a shapeless feature has none.
    pub fn to_wkt(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Point(point) => Some(format!("POINT ({})", point.wkt_pair())),
            Self::MultiPoint(points) => Some(format!(
                "MULTIPOINT ({})",
                points
                    .iter()
                    .map(|point| format!("({})", point.wkt_pair()))
                    .collect::<Vec<_>>()
                    .join(",")
            )),
            Self::LineString(points) => Some(format!("LINESTRING ({})", join_pairs(points))),
            Self::Polygon { outer, inner } => {
                let mut sections = vec![format!("({})", join_pairs(outer))];
                sections.extend(inner.iter().map(|ring| format!("({})", join_pairs(ring))));
                Some(format!("POLYGON ({})", sections.join(",")))
            }
        }
    }
}

/// One cartographic feature.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: FeatureId,
    /// Resolved object-class name; the chart layer the feature belongs to.
    pub layer: String,
    pub primitive: Primitive,
    pub group: u32,
    pub version: u32,
    /// Merged ATTF/NATF attributes keyed by resolved name.
    pub attributes: IndexMap<String, String>,
    pub spatial_references: Vec<SpatialReference>,
    pub feature_references: Vec<FeatureReference>,
    shape_cache: OnceCell<Shape>,
    wkt_cache: OnceCell<Option<String>>,
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.layer == other.layer
            && self.primitive == other.primitive
            && self.group == other.group
            && self.version == other.version
            && self.attributes == other.attributes
            && self.spatial_references == other.spatial_references
            && self.feature_references == other.feature_references
    }
}

impl Feature {
    /// Decode an Insert-usage feature record.
    pub fn from_record(
        record: &Record,
        lookup: &dyn Lookup,
        notifications: &mut NotificationCollection,
    ) -> Result<Self> {
        let frid = required_row(record, "FRID")?;
        let foid = required_row(record, "FOID")?;
        let id = feature_id(foid, lookup, notifications)?;
        let layer = resolve_or_code(
            lookup,
            LookupKind::ObjectType,
            subfield_code(frid, "OBJL")?,
            notifications,
        );

        let spatial_references = optional_rows(record, "FSPT")
            .iter()
            .map(|row| SpatialReference::from_row(row, lookup, notifications))
            .collect::<Result<Vec<_>>>()?;
        let feature_references = optional_rows(record, "FFPT")
            .iter()
            .map(|row| FeatureReference::from_row(row, lookup, notifications))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            layer,
            primitive: Primitive::from_code(frid.int("PRIM")?)?,
            group: subfield_code(frid, "GRUP")?,
            version: subfield_code(frid, "RVER")?,
            attributes: decode_attributes(record, lookup, notifications)?,
            spatial_references,
            feature_references,
            shape_cache: OnceCell::new(),
            wkt_cache: OnceCell::new(),
        })
    }

    /// Look up an attribute by resolved name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Assemble this feature's shape, resolving spatial references against
    /// the cell's geometry map. Cached for the life of the object.
    pub fn shape(&self, geometries: &IndexMap<GeometryId, Geometry>) -> Result<&Shape> {
        self.shape_cache
            .get_or_try_init(|| self.assemble_shape(geometries))
    }

    /// The feature's Well-Known-Text geometry, if it has one.
    pub fn wkt(&self, geometries: &IndexMap<GeometryId, Geometry>) -> Result<Option<&str>> {
        let wkt = self
            .wkt_cache
            .get_or_try_init(|| Ok::<_, S57Error>(self.shape(geometries)?.to_wkt()))?;
        Ok(wkt.as_deref())
    }

    fn assemble_shape(&self, geometries: &IndexMap<GeometryId, Geometry>) -> Result<Shape> {
        if self.primitive == Primitive::Null {
            return Ok(Shape::None);
        }
        let mut outer = Vec::new();
        let mut inner = Vec::new();
        let mut saw_node = false;
        let mut saw_edge = false;
        for reference in &self.spatial_references {
            let geometry = geometries
                .get(&reference.target)
                .ok_or_else(|| S57Error::UnresolvedReference(reference.target.to_string()))?;
            let mut points = geometry.points(geometries)?.to_vec();
            if reference.orientation == Orientation::Reverse {
                points.reverse();
            }
            if geometry.class.is_node() {
                saw_node = true;
            } else if geometry.class.is_edge() {
                saw_edge = true;
            }
            if saw_node && saw_edge {
                return Err(S57Error::StructuralMismatch(format!(
                    "feature {} mixes node and edge references",
                    self.id
                )));
            }
            if geometry.class.is_edge() && reference.usage == Usage::Interior {
                inner.extend(points);
            } else {
                outer.extend(points);
            }
        }
        if outer.is_empty() {
            return Ok(Shape::None);
        }
        Ok(match self.primitive {
            Primitive::Point => {
                if outer.len() == 1 {
                    Shape::Point(outer[0])
                } else {
                    Shape::MultiPoint(outer)
                }
            }
            Primitive::Line => Shape::LineString(outer),
            Primitive::Area => Shape::Polygon {
                outer,
                inner: if inner.is_empty() {
                    Vec::new()
                } else {
                    vec![inner]
                },
            },
            Primitive::Null => Shape::None,
        })
    }
}

/// Read the identifier triple from a FOID row.
pub(crate) fn feature_id(
    foid: &SubfieldRow,
    lookup: &dyn Lookup,
    notifications: &mut NotificationCollection,
) -> Result<FeatureId> {
    let agency = resolve_or_code(
        lookup,
        LookupKind::Agency,
        subfield_code(foid, "AGEN")?,
        notifications,
    );
    let fids = subfield_code(foid, "FIDS")?;
    let fids = u16::try_from(fids).map_err(|_| {
        S57Error::StructuralMismatch(format!("subfield FIDS holds {fids}, not a subdivision"))
    })?;
    Ok(FeatureId::new(agency, subfield_code(foid, "FIDN")?, fids))
}

/// An Update-usage feature record: patches against an existing feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureUpdate {
    pub id: FeatureId,
    pub version: u32,
    /// New or deleted attribute values keyed by resolved name.
    pub attributes: IndexMap<String, String>,
    spatial_patch: Option<Patch<SpatialReference>>,
    reference_patch: Option<Patch<FeatureReference>>,
}

impl FeatureUpdate {
    /// Decode an Update-usage feature record.
    pub fn from_record(
        record: &Record,
        lookup: &dyn Lookup,
        notifications: &mut NotificationCollection,
    ) -> Result<Self> {
        let frid = required_row(record, "FRID")?;
        let foid = required_row(record, "FOID")?;

        let spatial_patch = if record.contains("FSPC") {
            let control = required_row(record, "FSPC")?;
            Some(decode_patch(
                control,
                ["FSUI", "FSIX", "NSPT"],
                optional_rows(record, "FSPT"),
                |row| SpatialReference::from_row(row, lookup, notifications),
            )?)
        } else {
            None
        };
        let reference_patch = if record.contains("FFPC") {
            let control = required_row(record, "FFPC")?;
            Some(decode_patch(
                control,
                ["FFUI", "FFIX", "NFPT"],
                optional_rows(record, "FFPT"),
                |row| FeatureReference::from_row(row, lookup, notifications),
            )?)
        } else {
            None
        };

        Ok(Self {
            id: feature_id(foid, lookup, notifications)?,
            version: subfield_code(frid, "RVER")?,
            attributes: decode_attributes(record, lookup, notifications)?,
            spatial_patch,
            reference_patch,
        })
    }

    /// Apply this update to its target feature.
    ///
    /// Reference patches come first, then the attribute merge; an
    /// attribute valued [`DELETED_ATTRIBUTE`] removes its key. Consumes
    /// the update, so a patch cannot be replayed.
    pub fn apply(self, feature: &mut Feature) -> Result<()> {
        feature.version = self.version;
        if let Some(patch) = self.spatial_patch {
            patch.apply(&mut feature.spatial_references)?;
        }
        if let Some(patch) = self.reference_patch {
            patch.apply(&mut feature.feature_references)?;
        }
        for (name, value) in self.attributes {
            if value == DELETED_ATTRIBUTE {
                feature.attributes.shift_remove(&name);
            } else {
                feature.attributes.insert(name, value);
            }
        }
        feature.shape_cache = OnceCell::new();
        feature.wkt_cache = OnceCell::new();
        Ok(())
    }
}
