//! Identifier types for features and vector geometries.
//!
//! S-57 records reference each other through packed byte identifiers: a
//! 5-byte NAME selects a vector geometry (record class + record id) and an
//! 8-byte LNAM selects a feature (agency + id number + id subdivision).
//! Both arrive through the raw-bytes codec, which already reverses the
//! little-endian storage order, so the splitters here work on the logical
//! (big-endian) form.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, S57Error};

/// Identifier of a feature: producing agency plus the FIDN/FIDS pair.
///
/// The agency is the resolved text of the AGEN code, so identifiers built
/// against the same lookup standard always compare consistently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureId {
    pub agency: String,
    pub fidn: u32,
    pub fids: u16,
}

impl FeatureId {
    /// Create a feature identifier from its resolved parts.
    pub fn new(agency: impl Into<String>, fidn: u32, fids: u16) -> Self {
        Self {
            agency: agency.into(),
            fidn,
            fids,
        }
    }

    /// Split a logical LNAM blob into (agency code, FIDN, FIDS).
    pub fn split_lnam(logical: &[u8]) -> Result<(u16, u32, u16)> {
        if logical.len() != 8 {
            return Err(S57Error::StructuralMismatch(format!(
                "LNAM reference must be 8 bytes, got {}",
                logical.len()
            )));
        }
        let fids = BigEndian::read_u16(&logical[0..2]);
        let fidn = BigEndian::read_u32(&logical[2..6]);
        let agency = BigEndian::read_u16(&logical[6..8]);
        Ok((agency, fidn, fids))
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.agency, self.fidn, self.fids)
    }
}

/// Identifier of a vector geometry: record-class text plus the record id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeometryId {
    pub class: String,
    pub rcid: u32,
}

impl GeometryId {
    /// Create a geometry identifier from its resolved parts.
    pub fn new(class: impl Into<String>, rcid: u32) -> Self {
        Self {
            class: class.into(),
            rcid,
        }
    }

    /// Split a logical NAME blob into (record class code, record id).
    pub fn split_name(logical: &[u8]) -> Result<(u32, u32)> {
        if logical.len() != 5 {
            return Err(S57Error::StructuralMismatch(format!(
                "NAME reference must be 5 bytes, got {}",
                logical.len()
            )));
        }
        let rcid = BigEndian::read_u32(&logical[0..4]);
        let rcnm = u32::from(logical[4]);
        Ok((rcnm, rcid))
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.class, self.rcid)
    }
}

/// Record class (RCNM) of an S-57 record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    /// DS: data set general information.
    DataSetGeneral,
    /// DP: data set geographic reference.
    DataSetGeographic,
    /// DH: data set history.
    DataSetHistory,
    /// DA: data set accuracy.
    DataSetAccuracy,
    /// CD: catalogue directory.
    CatalogDirectory,
    /// CR: catalogue cross reference.
    CatalogCrossReference,
    /// FE: feature.
    Feature,
    /// VI: isolated node.
    IsolatedNode,
    /// VC: connected node.
    ConnectedNode,
    /// VE: edge.
    Edge,
    /// VF: face.
    Face,
}

impl RecordClass {
    /// Map an RCNM code to its record class.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            10 => Some(Self::DataSetGeneral),
            20 => Some(Self::DataSetGeographic),
            30 => Some(Self::DataSetHistory),
            40 => Some(Self::DataSetAccuracy),
            50 => Some(Self::CatalogDirectory),
            60 => Some(Self::CatalogCrossReference),
            100 => Some(Self::Feature),
            110 => Some(Self::IsolatedNode),
            120 => Some(Self::ConnectedNode),
            130 => Some(Self::Edge),
            140 => Some(Self::Face),
            _ => None,
        }
    }

    /// The numeric RCNM code.
    pub fn code(self) -> u32 {
        match self {
            Self::DataSetGeneral => 10,
            Self::DataSetGeographic => 20,
            Self::DataSetHistory => 30,
            Self::DataSetAccuracy => 40,
            Self::CatalogDirectory => 50,
            Self::CatalogCrossReference => 60,
            Self::Feature => 100,
            Self::IsolatedNode => 110,
            Self::ConnectedNode => 120,
            Self::Edge => 130,
            Self::Face => 140,
        }
    }

    /// Whether this class is a point-carrying node (VI or VC).
    pub fn is_node(self) -> bool {
        matches!(self, Self::IsolatedNode | Self::ConnectedNode)
    }

    /// Whether this class is an edge (VE).
    pub fn is_edge(self) -> bool {
        matches!(self, Self::Edge)
    }
}
