//! ISO/IEC 8211 binary interchange codec.
//!
//! This module contains the generic codec underneath the chart layer:
//!
//! - [`stream`] - byte-cursor reader/writer and the numeric codecs
//! - [`format`] - subfield formats, the format-list grammar, and [`Value`]
//! - [`descriptor`] - field descriptors and the Control tag tree
//! - [`metadata`] - leaders, directories, and the per-file descriptor set
//! - [`record`] - data records decoded against the descriptor set
//! - [`file`] - whole-file decode and encode
//!
//! The codec is byte-exact: for any file it fully decodes,
//! re-encoding reproduces the input byte for byte, with every length,
//! position, and width recomputed from content rather than copied.

pub mod descriptor;
pub mod file;
pub mod format;
pub mod metadata;
pub mod record;
pub mod stream;

pub use descriptor::{DescriptorKind, FieldControls, FieldDescriptor, Subfield, TagTree};
pub use file::DataFile;
pub use format::{Decimal, FieldFormat, Value};
pub use metadata::{DirectoryEntry, Leader, Metadata};
pub use record::{FieldValue, Record, SubfieldRow};
pub use stream::{StreamReader, StreamWriter, FIELD_TERMINATOR, UNIT_TERMINATOR};
