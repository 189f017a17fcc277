//! Numeric-code lookup standard.
//!
//! S-57 stores producers, object classes, attributes, and record classes as
//! numeric codes. The `Lookup` trait turns a code into its catalogue name;
//! `S57Standard` is the built-in implementation carrying partial tables for
//! the common codes. A table miss is never fatal: `resolve_or_code` degrades
//! to the stringified code, logs a warning, and records a notification.

use std::fmt;

use ahash::AHashMap;
use once_cell::sync::Lazy;

use crate::notification::{NotificationCollection, NotificationType};

/// Which code table a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// Producing-agency codes (AGEN).
    Agency,
    /// Object-class codes (OBJL).
    ObjectType,
    /// Attribute-label codes (ATTL).
    Attribute,
    /// Record-class codes (RCNM).
    RecordClass,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agency => write!(f, "agency"),
            Self::ObjectType => write!(f, "object type"),
            Self::Attribute => write!(f, "attribute"),
            Self::RecordClass => write!(f, "record class"),
        }
    }
}

/// Resolves numeric codes to catalogue names.
///
/// Components that need names take this capability explicitly; there is no
/// global registry. Implementations return `None` for codes they do not
/// know and leave degradation to the caller.
pub trait Lookup {
    /// The catalogue name for `code` in the given table, if known.
    fn resolve(&self, kind: LookupKind, code: u32) -> Option<&str>;
}

/// Resolve `code`, degrading to its decimal text when the table has no entry.
///
/// The degradation is recorded both through the `log` facade and in the
/// given notification collection, so identifiers stay printable even for
/// codes outside the built-in tables.
pub fn resolve_or_code(
    lookup: &dyn Lookup,
    kind: LookupKind,
    code: u32,
    notifications: &mut NotificationCollection,
) -> String {
    match lookup.resolve(kind, code) {
        Some(name) => name.to_string(),
        None => {
            tracing::warn!("unrecognized {} code {}", kind, code);
            notifications.notify(
                NotificationType::UnknownCode,
                format!("unrecognized {} code {}", kind, code),
            );
            code.to_string()
        }
    }
}

/// RCNM code -> record-class abbreviation (complete table).
static RECORD_CLASSES: Lazy<AHashMap<u32, &'static str>> = Lazy::new(|| {
    [
        (10, "DS"),
        (20, "DP"),
        (30, "DH"),
        (40, "DA"),
        (50, "CD"),
        (60, "CR"),
        (100, "FE"),
        (110, "VI"),
        (120, "VC"),
        (130, "VE"),
        (140, "VF"),
    ]
    .into_iter()
    .collect()
});

/// AGEN code -> producing-agency abbreviation.
static AGENCIES: Lazy<AHashMap<u32, &'static str>> =
    Lazy::new(|| [(540, "GB"), (550, "US")].into_iter().collect());

/// OBJL code -> object-class acronym.
static OBJECT_TYPES: Lazy<AHashMap<u32, &'static str>> = Lazy::new(|| {
    [
        (4, "ACHARE"),
        (17, "BOYLAT"),
        (30, "COALNE"),
        (42, "DEPARE"),
        (43, "DEPCNT"),
        (71, "LNDARE"),
        (75, "LIGHTS"),
        (86, "OBSTRN"),
        (129, "SOUNDG"),
        (159, "WRECKS"),
    ]
    .into_iter()
    .collect()
});

/// ATTL code -> attribute acronym.
static ATTRIBUTES: Lazy<AHashMap<u32, &'static str>> = Lazy::new(|| {
    [
        (75, "COLOUR"),
        (87, "DRVAL1"),
        (88, "DRVAL2"),
        (90, "ELEVAT"),
        (102, "INFORM"),
        (116, "OBJNAM"),
        (133, "SCAMIN"),
        (171, "TXTDSC"),
        (174, "VALDCO"),
        (179, "VALSOU"),
        (187, "WATLEV"),
        (300, "NOBJNM"),
        (301, "NINFOM"),
        (302, "NTXTDS"),
    ]
    .into_iter()
    .collect()
});

/// The built-in lookup standard.
///
/// The record-class table is complete; the agency, object-class, and
/// attribute tables carry only the codes common in practice. Anything else
/// degrades through [`resolve_or_code`].
#[derive(Debug, Clone, Copy, Default)]
pub struct S57Standard;

impl S57Standard {
    /// Create the built-in standard.
    pub fn new() -> Self {
        Self
    }
}

impl Lookup for S57Standard {
    fn resolve(&self, kind: LookupKind, code: u32) -> Option<&str> {
        let table = match kind {
            LookupKind::Agency => &AGENCIES,
            LookupKind::ObjectType => &OBJECT_TYPES,
            LookupKind::Attribute => &ATTRIBUTES,
            LookupKind::RecordClass => &RECORD_CLASSES,
        };
        table.get(&code).copied()
    }
}
