//! Whole-file decode and encode.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::iso8211::metadata::Metadata;
use crate::iso8211::record::Record;
use crate::iso8211::stream::StreamReader;

/// One interchange file: the descriptor set plus its records in file order.
///
/// Decoding is strict. A record that fails to decode aborts the whole file,
/// because the next record's offset is only known once the current one has
/// been fully consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    pub metadata: Metadata,
    records: Vec<Record>,
}

impl DataFile {
    /// Start an empty file over `metadata`.
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            records: Vec::new(),
        }
    }

    /// Records in file order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Append a record.
    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Decode a complete file image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = StreamReader::new(bytes);
        let metadata = Metadata::decode(&mut reader)?;
        let mut records = Vec::new();
        while !reader.is_empty() {
            records.push(Record::decode(&metadata, &mut reader)?);
        }
        Ok(Self { metadata, records })
    }

    /// Read and decode a file by path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Encode the whole file image.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = self.metadata.encode()?;
        for record in &self.records {
            bytes.extend(record.encode(&self.metadata)?);
        }
        Ok(bytes)
    }

    /// Encode and write the file to `path`.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.encode()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::S57Error;
    use crate::iso8211::descriptor::FieldDescriptor;
    use crate::iso8211::format::{FieldFormat, Value};
    use crate::iso8211::record::FieldValue;

    fn minimal_file() -> DataFile {
        let mut metadata = Metadata::new(4);
        metadata.add_control("").unwrap();
        metadata
            .add_field(
                FieldDescriptor::single("DATA", "Demo field", FieldFormat::Text(Some(5)))
                    .with_parent("0000"),
            )
            .unwrap();

        let mut file = DataFile::new(metadata);
        let mut record = Record::new(4);
        record.insert("DATA", FieldValue::Single(Value::Text("HELLO".into())));
        file.add_record(record);
        file
    }

    #[test]
    fn test_minimal_file_round_trip() {
        let bytes = minimal_file().encode().unwrap();
        let decoded = DataFile::decode(&bytes).unwrap();

        assert_eq!(decoded.records().len(), 1);
        let value = decoded.records()[0].field("DATA").unwrap();
        assert_eq!(value.as_single().unwrap().as_str(), Some("HELLO"));

        let tree = decoded.metadata.control().unwrap().tree().unwrap();
        assert_eq!(tree.root(), Some("0000"));
        assert_eq!(tree.children_of("0000"), ["DATA"]);

        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn test_multiple_records_round_trip() {
        let mut file = minimal_file();
        for word in ["WORLD", "AGAIN"] {
            let mut record = Record::new(4);
            record.insert("DATA", FieldValue::Single(Value::Text(word.into())));
            file.add_record(record);
        }

        let bytes = file.encode().unwrap();
        let decoded = DataFile::decode(&bytes).unwrap();
        assert_eq!(decoded.records().len(), 3);
        assert_eq!(
            decoded.records()[2].field("DATA").unwrap().as_single().unwrap(),
            &Value::Text("AGAIN".to_string())
        );
        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn test_trailing_bytes_abort_decode() {
        let mut bytes = minimal_file().encode().unwrap();
        bytes.extend_from_slice(b"00");
        assert!(matches!(
            DataFile::decode(&bytes),
            Err(S57Error::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_file_io_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MINIMAL.000");

        let file = minimal_file();
        file.write_to_file(&path).unwrap();
        let reloaded = DataFile::from_file(&path).unwrap();
        assert_eq!(reloaded.encode().unwrap(), file.encode().unwrap());
    }
}
