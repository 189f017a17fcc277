//! S-57 Electronic Navigational Chart object model.
//!
//! This module interprets decoded ISO/IEC 8211 records as chart objects:
//!
//! - [`standard`] - code-to-name lookup tables and the [`Lookup`] trait
//! - [`object`] - record-level building blocks: references, patches,
//!   and the coded enumerations
//! - [`geometry`] - vector records, coordinate scaling, and point assembly
//! - [`feature`] - feature records, attributes, shapes, and WKT output
//! - [`data_file`] - classification of one file's records by usage
//! - [`cell`] - the base-plus-updates state machine and its queries
//!
//! Everything here is keyed by resolved identifiers: a vector record is a
//! [`GeometryId`](crate::types::GeometryId) such as `VC_42`, a feature a
//! [`FeatureId`](crate::types::FeatureId) such as `US_12345_3`. Update
//! files never introduce new keys silently; the cell replays them against
//! the objects the base file inserted.

pub mod cell;
pub mod data_file;
pub mod feature;
pub mod geometry;
pub mod object;
pub mod standard;

pub use cell::{Cell, CellConfiguration, CellState};
pub use data_file::{DatasetMetadata, ObjectUpdate, S57DataFile};
pub use feature::{Feature, FeatureUpdate, Shape};
pub use geometry::{Geometry, GeometryUpdate, ScalingFactors};
pub use object::{
    FeatureReference, Mask, Orientation, Patch, PatchMode, Primitive, Relationship,
    SpatialReference, Topology, UpdateInstruction, Usage, DELETED_ATTRIBUTE,
};
pub use standard::{Lookup, LookupKind, S57Standard};
