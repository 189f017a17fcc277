//! Byte-exact round trips of synthesized chart files.
//!
//! The encoder recomputes every leader width, directory entry, and field
//! length from content, so any file the decoder fully accepts must encode
//! back to the very bytes it came from. These tests pin that property on
//! full files, on awkward payloads, and on randomized inputs.

#[allow(dead_code)]
mod common;

use common::builders::{
    self, base_cell_records, dataset_identification, dataset_parameters, FeatureBuilder,
    VectorBuilder, EDGE, ISOLATED_NODE,
};
use common::write_chart_file;
use proptest::prelude::*;
use s57rust::iso8211::DataFile;

// ===========================================================================
// Deterministic round trips
// ===========================================================================

#[test]
fn test_cell_file_round_trips_byte_exact() {
    let bytes = builders::chart_file(base_cell_records("US5TEST1"))
        .encode()
        .unwrap();
    let decoded = DataFile::decode(&bytes).unwrap();
    assert_eq!(decoded.records().len(), 7);
    assert_eq!(decoded.encode().unwrap(), bytes);
}

#[test]
fn test_reencode_is_stable_across_passes() {
    let bytes = builders::chart_file(base_cell_records("US5TEST1"))
        .encode()
        .unwrap();
    let once = DataFile::decode(&bytes).unwrap().encode().unwrap();
    let twice = DataFile::decode(&once).unwrap().encode().unwrap();
    assert_eq!(once, bytes);
    assert_eq!(twice, bytes);
}

#[test]
fn test_disk_round_trip_preserves_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_chart_file(dir.path(), "US5TEST1.000", base_cell_records("US5TEST1"));

    let bytes = std::fs::read(&path).unwrap();
    let decoded = DataFile::from_file(&path).unwrap();
    assert_eq!(decoded.encode().unwrap(), bytes);
}

#[test]
fn test_descriptor_tree_survives_decode() {
    let bytes = builders::chart_file(base_cell_records("US5TEST1"))
        .encode()
        .unwrap();
    let decoded = DataFile::decode(&bytes).unwrap();

    let tree = decoded.metadata.control().unwrap().tree().unwrap();
    assert_eq!(tree.root(), Some("0001"));
    let children = tree.children_of("0001");
    assert!(children.iter().any(|tag| tag == "VRID"));
    assert!(children.iter().any(|tag| tag == "FFPC"));
}

#[test]
fn test_signed_coordinates_round_trip() {
    let records = vec![
        dataset_identification("US5NEG1", "1", "0"),
        dataset_parameters(10, 10),
        VectorBuilder::new(ISOLATED_NODE, 4, 1)
            .points(&[(-1, -128), (i64::from(i32::MIN), i64::from(i32::MAX))])
            .build(),
    ];
    let bytes = builders::chart_file(records).encode().unwrap();
    let decoded = DataFile::decode(&bytes).unwrap();

    let rows = decoded.records()[2].field("SG2D").unwrap().rows();
    assert_eq!(rows[0].int("XCOO").unwrap(), -1);
    assert_eq!(rows[0].int("YCOO").unwrap(), -128);
    assert_eq!(rows[1].int("XCOO").unwrap(), i64::from(i32::MIN));
    assert_eq!(rows[1].int("YCOO").unwrap(), i64::from(i32::MAX));
    assert_eq!(decoded.encode().unwrap(), bytes);
}

#[test]
fn test_pointer_bytes_keep_logical_order() {
    let bytes = builders::chart_file(base_cell_records("US5TEST1"))
        .encode()
        .unwrap();
    let decoded = DataFile::decode(&bytes).unwrap();

    // The edge's first pointer targets connected node 1: record id in
    // big-endian order, class code last.
    let vrpt = decoded.records()[4].field("VRPT").unwrap().rows();
    assert_eq!(vrpt[0].bytes("NAME").unwrap(), [0, 0, 0, 1, 120]);
    assert_eq!(decoded.encode().unwrap(), bytes);
}

// ===========================================================================
// Randomized round trips
// ===========================================================================

proptest! {
    /// Any printable-ASCII attribute value survives decode and re-encode
    /// byte for byte, and reads back verbatim.
    #[test]
    fn attribute_text_round_trips(values in proptest::collection::vec("[ -~]{0,16}", 1..6)) {
        let pairs: Vec<(i64, &str)> = values
            .iter()
            .enumerate()
            .map(|(index, value)| (100 + index as i64, value.as_str()))
            .collect();
        let records = vec![
            dataset_identification("US5PROP1", "1", "0"),
            FeatureBuilder::new(42, 255, 550, 700, 1, 1)
                .attributes(&pairs)
                .build(),
        ];
        let bytes = builders::chart_file(records).encode().unwrap();
        let decoded = DataFile::decode(&bytes).unwrap();

        let rows = decoded.records()[1].field("ATTF").unwrap().rows();
        for (index, value) in values.iter().enumerate() {
            prop_assert_eq!(rows[index].text("ATVL").unwrap(), value);
        }
        prop_assert_eq!(decoded.encode().unwrap(), bytes);
    }

    /// Any two's-complement coordinate vector survives byte-exactly.
    #[test]
    fn coordinate_rows_round_trip(
        points in proptest::collection::vec((any::<i32>(), any::<i32>()), 1..12),
    ) {
        let stored: Vec<(i64, i64)> = points
            .iter()
            .map(|&(x, y)| (i64::from(x), i64::from(y)))
            .collect();
        let records = vec![
            dataset_identification("US5PROP2", "1", "0"),
            dataset_parameters(10, 10),
            VectorBuilder::new(EDGE, 7, 1).points(&stored).build(),
        ];
        let bytes = builders::chart_file(records).encode().unwrap();
        let decoded = DataFile::decode(&bytes).unwrap();

        let rows = decoded.records()[2].field("SG2D").unwrap().rows();
        prop_assert_eq!(rows.len(), stored.len());
        for (row, &(x, y)) in rows.iter().zip(&stored) {
            prop_assert_eq!(row.int("XCOO").unwrap(), x);
            prop_assert_eq!(row.int("YCOO").unwrap(), y);
        }
        prop_assert_eq!(decoded.encode().unwrap(), bytes);
    }
}
