//! # s57rust
//!
//! A pure Rust library for reading IHO S-57 Electronic Navigational Charts
//! and the ISO/IEC 8211 interchange files they ship in.
//!
//! ## Features
//!
//! - Byte-exact ISO/IEC 8211 decode and re-encode
//! - S-57 feature and vector records with resolved identifiers
//! - Sequential update replay (`.001`, `.002`, ...) over a base cell
//! - Well-Known-Text output for assembled feature geometry
//! - Exchange-set catalog (`CATALOG.031`) with CRC verification
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use s57rust::{Cell, S57Standard};
//!
//! // Load a base cell and replay its updates
//! let mut cell = Cell::new("US5TEST1.000", Arc::new(S57Standard::new()))?;
//! cell.load_updates()?;
//!
//! // Walk the features
//! for (id, feature) in cell.features() {
//!     println!("{id}: {}", feature.layer);
//! }
//! # Ok::<(), s57rust::error::S57Error>(())
//! ```
//!
//! ## Architecture
//!
//! Two layers with a narrow seam, plus the registry that ties an exchange
//! set together:
//!
//! - [`iso8211`] - the generic binary codec: leaders, directories,
//!   descriptors, records
//! - [`s57`] - the chart object model: features, geometries, update
//!   replay, WKT output
//! - [`catalog`] - the exchange-set file registry on top of the codec
//!
//! The codec is byte-exact: re-encoding any file it fully decodes
//! reproduces the input byte for byte.

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod catalog;
pub mod error;
pub mod iso8211;
pub mod notification;
pub mod s57;
pub mod types;

// Re-export commonly used types
pub use error::{Result, S57Error};
pub use notification::{Notification, NotificationCollection, NotificationType};
pub use types::{Coordinate, FeatureId, GeometryId, RecordClass};

// Re-export codec types
pub use iso8211::{DataFile, FieldValue, Metadata, Record, SubfieldRow, Value};

// Re-export chart types
pub use s57::{
    Cell, CellConfiguration, CellState, Feature, Geometry, Lookup, S57DataFile, S57Standard, Shape,
};

// Re-export catalog types
pub use catalog::{Catalog, CatalogEntry, Implementation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
