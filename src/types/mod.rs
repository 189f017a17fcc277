//! Shared value types: coordinates and object identifiers

pub mod coordinate;
pub mod identifier;

pub use coordinate::Coordinate;
pub use identifier::{FeatureId, GeometryId, RecordClass};
