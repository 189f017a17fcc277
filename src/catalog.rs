//! Exchange-set catalog: the `CATALOG.031` file registry.
//!
//! Every file an exchange set ships is listed in `CATALOG.031` as one CATD
//! row: an exchange-set-relative path, an implementation kind, an optional
//! bounding box, volume placement, and a CRC-32 of the file's bytes. The
//! catalog decodes with the same ISO/IEC 8211 codec as the cells; this
//! module only interprets the rows.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, S57Error};
use crate::iso8211::{DataFile, SubfieldRow, Value};
use crate::notification::{NotificationCollection, NotificationType};
use crate::s57::cell::Cell;
use crate::s57::object::{required_row, subfield_code};
use crate::s57::standard::Lookup;

/// How a catalogued file's content is encoded, from the CATD IMPL subfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implementation {
    /// `TXT`: plain-text support file.
    Text,
    /// `ASC`: ASCII data, the catalog itself included.
    Ascii,
    /// `TIF`: raster image.
    Tif,
    /// `BIN`: ISO 8211 binary, the cell and update files.
    Binary,
}

impl Implementation {
    fn from_text(text: &str) -> Result<Self> {
        match text {
            "TXT" => Ok(Self::Text),
            "ASC" => Ok(Self::Ascii),
            "TIF" => Ok(Self::Tif),
            "BIN" => Ok(Self::Binary),
            other => Err(S57Error::StructuralMismatch(format!(
                "unsupported implementation value {other}"
            ))),
        }
    }

    /// Whether [`read_text`](CatalogEntry::read_text) applies to this kind.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Ascii)
    }
}

/// One catalogued file.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// CATD record identifier.
    pub record_id: u32,
    /// Exchange-set-relative path exactly as recorded, separators included.
    pub file: String,
    /// Descriptive long name, when the producer filled one in.
    pub long_file: Option<String>,
    /// Content kind of the referenced file.
    pub implementation: Implementation,
    /// Southernmost latitude of the covered area.
    pub south: Option<f64>,
    /// Westernmost longitude of the covered area.
    pub west: Option<f64>,
    /// Northernmost latitude of the covered area.
    pub north: Option<f64>,
    /// Easternmost longitude of the covered area.
    pub east: Option<f64>,
    /// (volume, total volumes) parsed from `VnnXmm`.
    pub volume: Option<(u32, u32)>,
    /// CRC-32 of the file's bytes as recorded, 8 uppercase hex digits.
    pub crc: Option<String>,
    /// Free-form comment.
    pub comment: Option<String>,
}

impl CatalogEntry {
    fn from_row(row: &SubfieldRow) -> Result<Self> {
        let volume = match text_or_none(row, "VOLM") {
            Some(volume) => Some(parse_volume(&volume)?),
            None => None,
        };
        Ok(Self {
            record_id: subfield_code(row, "RCID")?,
            file: row.text("FILE")?.trim_end().to_string(),
            long_file: text_or_none(row, "LFIL"),
            implementation: Implementation::from_text(row.text("IMPL")?.trim())?,
            south: decimal_or_none(row, "SLAT"),
            west: decimal_or_none(row, "WLON"),
            north: decimal_or_none(row, "NLAT"),
            east: decimal_or_none(row, "ELON"),
            volume,
            crc: text_or_none(row, "CRCS"),
            comment: text_or_none(row, "COMT"),
        })
    }

    /// The file name: the last component of the recorded path.
    pub fn name(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }

    /// The recorded path joined to a caller-supplied exchange-set root.
    ///
    /// Catalogs written on DOS-era systems separate components with `\`;
    /// both separators are accepted.
    pub fn path(&self, root: impl AsRef<Path>) -> PathBuf {
        let mut path = root.as_ref().to_path_buf();
        for component in self
            .file
            .split(['/', '\\'])
            .filter(|component| !component.is_empty())
        {
            path.push(component);
        }
        path
    }

    /// (south, west, north, east), when all four limits are recorded.
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        Some((self.south?, self.west?, self.north?, self.east?))
    }

    /// CRC-32 of the referenced file's bytes, as 8 uppercase hex digits.
    pub fn computed_crc(&self, root: impl AsRef<Path>) -> Result<String> {
        let bytes = fs::read(self.path(root))?;
        let mut crc = flate2::Crc::new();
        crc.update(&bytes);
        Ok(format!("{:08X}", crc.sum()))
    }

    /// Whether the referenced file's bytes match the recorded CRC.
    ///
    /// An entry without a recorded CRC never verifies.
    pub fn verify(&self, root: impl AsRef<Path>) -> Result<bool> {
        match &self.crc {
            Some(stored) => Ok(*stored == self.computed_crc(root)?),
            None => Ok(false),
        }
    }

    /// Read a Text/Ascii entry's content.
    ///
    /// Candidate encodings are tried in a fixed order: a byte-order mark
    /// wins if present, then strict UTF-8, then Windows-1252.
    pub fn read_text(&self, root: impl AsRef<Path>) -> Result<String> {
        if !self.implementation.is_textual() {
            return Err(S57Error::Encoding(format!(
                "{} is not a text entry",
                self.name()
            )));
        }
        let bytes = fs::read(self.path(root))?;
        decode_text(&bytes).ok_or_else(|| {
            S57Error::Encoding(format!("{} matches no candidate encoding", self.name()))
        })
    }

    /// Whether this entry is a base cell file.
    pub fn is_base_cell(&self) -> bool {
        self.name().ends_with(".000")
    }

    /// Whether this entry is a numbered update file.
    pub fn is_update(&self) -> bool {
        match self.name().rsplit_once('.') {
            Some((_, extension)) => {
                extension.len() == 3
                    && extension != "000"
                    && extension.bytes().all(|byte| byte.is_ascii_digit())
            }
            None => false,
        }
    }

    /// Open a base-cell entry as a [`Cell`]; `None` for any other entry.
    pub fn to_cell(
        &self,
        root: impl AsRef<Path>,
        lookup: Arc<dyn Lookup + Send + Sync>,
    ) -> Result<Option<Cell>> {
        if !self.is_base_cell() {
            return Ok(None);
        }
        Cell::new(self.path(root), lookup).map(Some)
    }
}

/// A decoded `CATALOG.031`, keyed by file name.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    entries: IndexMap<String, CatalogEntry>,
    notifications: NotificationCollection,
}

impl Catalog {
    /// Decode a catalog from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = DataFile::from_file(&path)?;
        Self::load(path.as_ref(), &file)
    }

    /// Build a catalog from an already-decoded file.
    pub fn load(path: impl Into<PathBuf>, file: &DataFile) -> Result<Self> {
        let mut catalog = Self {
            path: path.into(),
            entries: IndexMap::new(),
            notifications: NotificationCollection::new(),
        };
        for (index, record) in file.records().iter().enumerate() {
            if !record.contains("CATD") {
                tracing::warn!("catalog record {index} has no CATD field; skipped");
                catalog.notifications.notify(
                    NotificationType::Skipped,
                    format!("catalog record {index} has no CATD field"),
                );
                continue;
            }
            let entry = CatalogEntry::from_row(required_row(record, "CATD")?)?;
            catalog.insert(entry);
        }
        Ok(catalog)
    }

    fn insert(&mut self, entry: CatalogEntry) {
        let name = entry.name().to_string();
        if self.entries.insert(name.clone(), entry).is_some() {
            tracing::warn!("duplicate catalog entry for {name}; keeping the newer one");
            self.notifications.notify(
                NotificationType::Duplicate,
                format!("catalog entry {name} replaced by a newer one"),
            );
        }
    }

    /// The catalog file's own path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The exchange-set root: the catalog file's directory.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Number of catalogued files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog lists no files.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by file name.
    pub fn entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    /// Entries in install order: the catalog itself first, then numbered
    /// cell files by ascending extension so every base precedes the first
    /// update, then the rest by name.
    pub fn entries(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<&CatalogEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| install_rank(entry.name()));
        entries
    }

    /// Everything non-fatal the decode encountered.
    pub fn notifications(&self) -> &NotificationCollection {
        &self.notifications
    }
}

fn install_rank(name: &str) -> String {
    if name.ends_with("CATALOG.031") {
        return format!("0_{name}");
    }
    match name.get(name.len().saturating_sub(3)..) {
        Some(tail) if tail.len() == 3 && tail.bytes().all(|byte| byte.is_ascii_digit()) => {
            format!("1_{tail}_{name}")
        }
        _ => format!("2_{name}"),
    }
}

fn text_or_none(row: &SubfieldRow, name: &str) -> Option<String> {
    let text = row.get(name).and_then(Value::as_str)?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn decimal_or_none(row: &SubfieldRow, name: &str) -> Option<f64> {
    row.get(name).and_then(Value::as_f64)
}

fn parse_volume(text: &str) -> Result<(u32, u32)> {
    let invalid = || S57Error::InvalidNumber(text.to_string());
    let volume = text.get(1..3).ok_or_else(invalid)?;
    let total = text.get(4..6).ok_or_else(invalid)?;
    Ok((
        volume.parse().map_err(|_| invalid())?,
        total.parse().map_err(|_| invalid())?,
    ))
}

fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, _, malformed) = encoding.decode(bytes);
        if !malformed {
            return Some(text.into_owned());
        }
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_string());
    }
    let (text, _, malformed) = encoding_rs::WINDOWS_1252.decode(bytes);
    (!malformed).then(|| text.into_owned())
}
