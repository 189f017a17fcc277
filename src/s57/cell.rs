//! Cell loading: one base file plus its numbered update files.
//!
//! A cell moves through three states. Opening it validates the `.000`
//! extension but reads nothing; `load_base` decodes the base file into the
//! feature/geometry maps; `load_updates` finds every contiguously numbered
//! update file next to the base and replays each one exactly once, in
//! ascending order. Queries resolve lazily against the loaded maps.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, S57Error};
use crate::notification::{NotificationCollection, NotificationType};
use crate::s57::data_file::{DatasetMetadata, ObjectUpdate, S57DataFile};
use crate::s57::feature::{Feature, Shape};
use crate::s57::geometry::{Geometry, ScalingFactors};
use crate::s57::standard::Lookup;
use crate::types::{FeatureId, GeometryId};

/// Load progress of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Nothing decoded yet.
    Unloaded,
    /// The base file's records are in the maps.
    BaseLoaded,
    /// Every contiguous update file has been applied.
    UpdatesApplied,
}

/// Tuning knobs for cell loading.
#[derive(Debug, Clone, Copy)]
pub struct CellConfiguration {
    /// Highest update-file number probed for; the three-digit extension
    /// space allows at most 999.
    pub max_update_files: usize,
}

impl Default for CellConfiguration {
    fn default() -> Self {
        Self {
            max_update_files: 999,
        }
    }
}

/// One S-57 dataset: a base cell file and its numbered updates.
pub struct Cell {
    path: PathBuf,
    lookup: Arc<dyn Lookup + Send + Sync>,
    config: CellConfiguration,
    state: CellState,
    factors: Option<ScalingFactors>,
    features: IndexMap<FeatureId, Feature>,
    geometries: IndexMap<GeometryId, Geometry>,
    metadata: DatasetMetadata,
    applied_updates: usize,
    notifications: NotificationCollection,
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("features", &self.features.len())
            .field("geometries", &self.geometries.len())
            .finish()
    }
}

impl Cell {
    /// Open a base cell by path. Nothing is read until
    /// [`load_base`](Self::load_base).
    pub fn new(path: impl Into<PathBuf>, lookup: Arc<dyn Lookup + Send + Sync>) -> Result<Self> {
        Self::with_config(path, lookup, CellConfiguration::default())
    }

    /// Open a base cell with explicit configuration.
    pub fn with_config(
        path: impl Into<PathBuf>,
        lookup: Arc<dyn Lookup + Send + Sync>,
        config: CellConfiguration,
    ) -> Result<Self> {
        let path = path.into();
        if path.extension().and_then(|extension| extension.to_str()) != Some("000") {
            return Err(S57Error::InvalidCellName(path.display().to_string()));
        }
        Ok(Self {
            path,
            lookup,
            config,
            state: CellState::Unloaded,
            factors: None,
            features: IndexMap::new(),
            geometries: IndexMap::new(),
            metadata: DatasetMetadata::default(),
            applied_updates: 0,
            notifications: NotificationCollection::new(),
        })
    }

    /// Discover every base cell under a directory, recursively.
    pub fn find_cells(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let mut cells = Vec::new();
        collect_cells(root.as_ref(), &mut cells)?;
        cells.sort();
        Ok(cells)
    }

    // --- Loading ---

    /// Decode the base file and populate the object maps.
    pub fn load_base(&mut self) -> Result<()> {
        if self.state != CellState::Unloaded {
            return Ok(());
        }
        let data = S57DataFile::from_file(&self.path, self.lookup.as_ref(), None)?;
        self.factors = data.factors;
        self.apply_file(data)?;
        self.state = CellState::BaseLoaded;
        Ok(())
    }

    /// Apply every contiguously numbered update file, in ascending order.
    ///
    /// Loads the base first if needed. The scan starts at `.001` and stops
    /// at the first missing number; each found file is applied exactly
    /// once. Update files decode with the base file's multiplication
    /// factors.
    pub fn load_updates(&mut self) -> Result<()> {
        if self.state == CellState::UpdatesApplied {
            return Ok(());
        }
        self.load_base()?;
        for path in self.update_files() {
            let data = S57DataFile::from_file(&path, self.lookup.as_ref(), self.factors)?;
            self.apply_file(data)?;
            self.applied_updates += 1;
        }
        self.state = CellState::UpdatesApplied;
        Ok(())
    }

    /// The contiguous update files currently present next to the base.
    pub fn update_files(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for number in 1..=self.config.max_update_files {
            let path = self.path.with_extension(format!("{number:03}"));
            if !path.exists() {
                break;
            }
            paths.push(path);
        }
        paths
    }

    /// Merge one classified file into the cell's maps.
    ///
    /// Order within the file: inserted features, inserted geometries,
    /// deletes, metadata rows, then Update-usage records in file order.
    /// Deleting or updating an identifier that is not present is fatal;
    /// inserting one that is present replaces it with a notification.
    fn apply_file(&mut self, data: S57DataFile) -> Result<()> {
        let S57DataFile {
            features,
            geometries,
            feature_deletes,
            geometry_deletes,
            updates,
            metadata,
            mut notifications,
            ..
        } = data;

        for (id, feature) in features {
            if self.features.insert(id.clone(), feature).is_some() {
                tracing::warn!("feature {id} already present; replaced by a newer insert");
                self.notifications.notify(
                    NotificationType::Duplicate,
                    format!("feature {id} replaced by a newer insert"),
                );
            }
        }
        for (id, geometry) in geometries {
            if self.geometries.insert(id.clone(), geometry).is_some() {
                tracing::warn!("geometry {id} already present; replaced by a newer insert");
                self.notifications.notify(
                    NotificationType::Duplicate,
                    format!("geometry {id} replaced by a newer insert"),
                );
            }
        }
        for id in feature_deletes {
            if self.features.shift_remove(&id).is_none() {
                return Err(S57Error::UnresolvedReference(id.to_string()));
            }
        }
        for id in geometry_deletes {
            if self.geometries.shift_remove(&id).is_none() {
                return Err(S57Error::UnresolvedReference(id.to_string()));
            }
        }
        self.metadata.merge(metadata);
        for update in updates {
            match update {
                ObjectUpdate::Feature(update) => {
                    let feature = self
                        .features
                        .get_mut(&update.id)
                        .ok_or_else(|| S57Error::UnresolvedReference(update.id.to_string()))?;
                    update.apply(feature)?;
                }
                ObjectUpdate::Geometry(update) => {
                    let geometry = self
                        .geometries
                        .get_mut(&update.id)
                        .ok_or_else(|| S57Error::UnresolvedReference(update.id.to_string()))?;
                    update.apply(geometry)?;
                }
            }
        }
        self.notifications.append(&mut notifications);
        Ok(())
    }

    // --- Queries ---

    /// All features, in insertion order.
    pub fn features(&self) -> &IndexMap<FeatureId, Feature> {
        &self.features
    }

    /// All vector geometries, in insertion order.
    pub fn geometries(&self) -> &IndexMap<GeometryId, Geometry> {
        &self.geometries
    }

    /// Look up one feature.
    pub fn feature(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.get(id)
    }

    /// Look up one geometry.
    pub fn geometry(&self, id: &GeometryId) -> Option<&Geometry> {
        self.geometries.get(id)
    }

    /// Features belonging to one object class.
    pub fn features_in_layer<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Feature> {
        self.features
            .values()
            .filter(move |feature| feature.layer == layer)
    }

    /// Assembled shape of one feature.
    pub fn feature_shape(&self, id: &FeatureId) -> Result<&Shape> {
        let feature = self
            .feature(id)
            .ok_or_else(|| S57Error::UnresolvedReference(id.to_string()))?;
        feature.shape(&self.geometries)
    }

    /// Well-Known-Text geometry of one feature, if it has one.
    pub fn feature_wkt(&self, id: &FeatureId) -> Result<Option<&str>> {
        let feature = self
            .feature(id)
            .ok_or_else(|| S57Error::UnresolvedReference(id.to_string()))?;
        feature.wkt(&self.geometries)
    }

    /// Names of the textual support files referenced through TXTDSC and
    /// NTXTDS attributes, sorted and deduplicated.
    pub fn support_files(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for feature in self.features.values() {
            for attribute in ["TXTDSC", "NTXTDS"] {
                if let Some(value) = feature.attribute(attribute) {
                    names.insert(value.to_string());
                }
            }
        }
        names.into_iter().collect()
    }

    /// Find a support file by name, searching recursively from the base
    /// file's directory.
    pub fn support_file_path(&self, name: &str) -> Option<PathBuf> {
        find_file_named(self.path.parent()?, name)
    }

    // --- Metadata ---

    /// The cell name: the base file's stem.
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
    }

    /// The base file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dataset name from the replayed metadata.
    pub fn dataset_name(&self) -> Option<&str> {
        self.metadata.dataset_name()
    }

    /// Edition number from the replayed metadata.
    pub fn edition(&self) -> Option<u32> {
        self.metadata.edition()
    }

    /// Update number from the replayed metadata.
    pub fn update_number(&self) -> Option<u32> {
        self.metadata.update_number()
    }

    /// The replayed dataset metadata rows.
    pub fn dataset_metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// How many update files have been applied.
    pub fn applied_update_count(&self) -> usize {
        self.applied_updates
    }

    /// The current load state.
    pub fn state(&self) -> CellState {
        self.state
    }

    /// Everything non-fatal the loads encountered.
    pub fn notifications(&self) -> &NotificationCollection {
        &self.notifications
    }
}

fn collect_cells(dir: &Path, cells: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_cells(&path, cells)?;
        } else if path.extension().and_then(|extension| extension.to_str()) == Some("000") {
            cells.push(path);
        }
    }
    Ok(())
}

fn find_file_named(root: &Path, name: &str) -> Option<PathBuf> {
    for entry in fs::read_dir(root).ok()?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_named(&path, name) {
                return Some(found);
            }
        } else if path.file_name().and_then(|file| file.to_str()) == Some(name) {
            return Some(path);
        }
    }
    None
}
