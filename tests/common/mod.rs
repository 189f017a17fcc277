//! Shared fixtures for the integration tests.
//!
//! Chart files are synthesized through the crate's own encoder (see
//! [`builders`]) and written to temporary directories, so every test runs
//! against real on-disk bytes rather than pre-decoded structures.

#![allow(dead_code)]

pub mod builders;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use s57rust::iso8211::Record;
use s57rust::{Cell, Lookup, S57Standard};

// ===========================================================================
// Environment
// ===========================================================================

/// The built-in lookup standard, shared the way `Cell` expects it.
pub fn standard() -> Arc<dyn Lookup + Send + Sync> {
    Arc::new(S57Standard::new())
}

/// Encode `records` over the chart descriptor set and write them to
/// `dir/name`.
pub fn write_chart_file(dir: &Path, name: &str, records: Vec<Record>) -> PathBuf {
    let path = dir.join(name);
    builders::chart_file(records)
        .write_to_file(&path)
        .unwrap_or_else(|e| panic!("cannot write chart file {name}: {e:?}"));
    path
}

/// Open the cell at `path` and replay its base and every update file.
pub fn load_cell(path: &Path) -> Cell {
    let mut cell = Cell::new(path, standard())
        .unwrap_or_else(|e| panic!("cannot open cell {}: {e:?}", path.display()));
    cell.load_updates()
        .unwrap_or_else(|e| panic!("cannot load cell {}: {e:?}", path.display()));
    cell
}
