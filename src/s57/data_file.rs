//! Classification of one decoded data file into S-57 objects.
//!
//! Every record of a base or update file is sorted by its classifying tag
//! and usage indicator: vector and feature inserts, deferred updates,
//! delete lists, and the dataset metadata rows. The result feeds cell
//! loading, which merges one classified file at a time.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::Result;
use crate::iso8211::{DataFile, Record, SubfieldRow};
use crate::notification::{NotificationCollection, NotificationType};
use crate::s57::feature::{feature_id, Feature, FeatureUpdate};
use crate::s57::geometry::{vector_id, Geometry, GeometryUpdate, ScalingFactors};
use crate::s57::object::{required_row, UpdateInstruction};
use crate::s57::standard::Lookup;
use crate::types::{FeatureId, GeometryId};

/// Dataset metadata rows carried by a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetMetadata {
    /// DSID: dataset identification.
    pub identification: Option<SubfieldRow>,
    /// DSPM: dataset parameters.
    pub parameters: Option<SubfieldRow>,
    /// DSSI: dataset structure information.
    pub structure: Option<SubfieldRow>,
}

fn row_number(row: Option<&SubfieldRow>, name: &str) -> Option<u32> {
    let value = row?.get(name)?;
    if let Some(number) = value.as_i64() {
        return u32::try_from(number).ok();
    }
    value.as_str()?.trim().parse().ok()
}

impl DatasetMetadata {
    /// Overlay the rows another file carries onto this set.
    pub fn merge(&mut self, other: DatasetMetadata) {
        if other.identification.is_some() {
            self.identification = other.identification;
        }
        if other.parameters.is_some() {
            self.parameters = other.parameters;
        }
        if other.structure.is_some() {
            self.structure = other.structure;
        }
    }

    /// The dataset name (DSNM).
    pub fn dataset_name(&self) -> Option<&str> {
        self.identification
            .as_ref()?
            .get("DSNM")?
            .as_str()
            .map(str::trim)
    }

    /// The edition number (EDTN).
    pub fn edition(&self) -> Option<u32> {
        row_number(self.identification.as_ref(), "EDTN")
    }

    /// The update number (UPDN).
    pub fn update_number(&self) -> Option<u32> {
        row_number(self.identification.as_ref(), "UPDN")
    }
}

/// A deferred Update-usage record, applied in file order.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectUpdate {
    Feature(FeatureUpdate),
    Geometry(GeometryUpdate),
}

/// The classified contents of one base or update file.
#[derive(Debug, Default)]
pub struct S57DataFile {
    pub features: IndexMap<FeatureId, Feature>,
    pub geometries: IndexMap<GeometryId, Geometry>,
    pub feature_deletes: Vec<FeatureId>,
    pub geometry_deletes: Vec<GeometryId>,
    /// Update-usage records in the order the file carries them.
    pub updates: Vec<ObjectUpdate>,
    pub metadata: DatasetMetadata,
    /// Multiplication factors in effect: inherited from the caller, or
    /// captured from this file's own DSPM row.
    pub factors: Option<ScalingFactors>,
    pub notifications: NotificationCollection,
}

impl S57DataFile {
    /// Classify every record of a decoded file.
    ///
    /// `factors` carries the multiplication factors inherited from the
    /// base file; an update file decoded on its own starts without them.
    pub fn load(
        file: &DataFile,
        lookup: &dyn Lookup,
        factors: Option<ScalingFactors>,
    ) -> Result<Self> {
        let mut data = Self {
            factors,
            ..Self::default()
        };
        for (index, record) in file.records().iter().enumerate() {
            data.classify(index, record, lookup)?;
        }
        Ok(data)
    }

    /// Decode and classify a file from disk.
    pub fn from_file(
        path: impl AsRef<Path>,
        lookup: &dyn Lookup,
        factors: Option<ScalingFactors>,
    ) -> Result<Self> {
        let file = DataFile::from_file(path)?;
        Self::load(&file, lookup, factors)
    }

    fn classify(&mut self, index: usize, record: &Record, lookup: &dyn Lookup) -> Result<()> {
        if record.contains("VRID") {
            self.classify_vector(record, lookup)
        } else if record.contains("FOID") {
            self.classify_feature(record, lookup)
        } else if ["DSID", "DSPM", "DSSI"]
            .iter()
            .any(|tag| record.contains(tag))
        {
            self.capture_metadata(record)
        } else {
            tracing::warn!("record {index} carries no classifying tag; skipped");
            self.notifications.notify(
                NotificationType::Skipped,
                format!("record {index} carries no classifying tag"),
            );
            Ok(())
        }
    }

    fn classify_vector(&mut self, record: &Record, lookup: &dyn Lookup) -> Result<()> {
        let vrid = required_row(record, "VRID")?;
        match UpdateInstruction::from_code(vrid.int("RUIN")?)? {
            UpdateInstruction::Insert => {
                let geometry =
                    Geometry::from_record(record, lookup, self.factors, &mut self.notifications)?;
                if self.geometries.contains_key(&geometry.id) {
                    tracing::warn!(
                        "geometry {} inserted twice; keeping the newer record",
                        geometry.id
                    );
                    self.notifications.notify(
                        NotificationType::Duplicate,
                        format!("geometry {} inserted twice", geometry.id),
                    );
                }
                self.geometries.insert(geometry.id.clone(), geometry);
            }
            UpdateInstruction::Update => {
                self.updates.push(ObjectUpdate::Geometry(GeometryUpdate::from_record(
                    record,
                    lookup,
                    self.factors,
                    &mut self.notifications,
                )?));
            }
            UpdateInstruction::Delete => {
                let (id, _) = vector_id(vrid, lookup, &mut self.notifications)?;
                self.geometry_deletes.push(id);
            }
        }
        Ok(())
    }

    fn classify_feature(&mut self, record: &Record, lookup: &dyn Lookup) -> Result<()> {
        let frid = required_row(record, "FRID")?;
        match UpdateInstruction::from_code(frid.int("RUIN")?)? {
            UpdateInstruction::Insert => {
                let feature = Feature::from_record(record, lookup, &mut self.notifications)?;
                if self.features.contains_key(&feature.id) {
                    tracing::warn!(
                        "feature {} inserted twice; keeping the newer record",
                        feature.id
                    );
                    self.notifications.notify(
                        NotificationType::Duplicate,
                        format!("feature {} inserted twice", feature.id),
                    );
                }
                self.features.insert(feature.id.clone(), feature);
            }
            UpdateInstruction::Update => {
                self.updates.push(ObjectUpdate::Feature(FeatureUpdate::from_record(
                    record,
                    lookup,
                    &mut self.notifications,
                )?));
            }
            UpdateInstruction::Delete => {
                let foid = required_row(record, "FOID")?;
                self.feature_deletes
                    .push(feature_id(foid, lookup, &mut self.notifications)?);
            }
        }
        Ok(())
    }

    fn capture_metadata(&mut self, record: &Record) -> Result<()> {
        if record.contains("DSID") {
            self.metadata.identification = Some(required_row(record, "DSID")?.clone());
        }
        if record.contains("DSPM") {
            let parameters = required_row(record, "DSPM")?;
            if self.factors.is_none() {
                self.factors = Some(ScalingFactors::from_dspm(parameters)?);
            }
            self.metadata.parameters = Some(parameters.clone());
        }
        if record.contains("DSSI") {
            self.metadata.structure = Some(required_row(record, "DSSI")?.clone());
        }
        Ok(())
    }
}
