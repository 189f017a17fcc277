//! Synthetic chart-file builders.
//!
//! Everything here goes through the crate's own encoder: a builder
//! assembles records over a canonical descriptor set, and the test writes
//! the encoded bytes to disk before loading them back through the public
//! API. The descriptor formats mirror the ones production cells declare
//! (binary subfields for codes and coordinates, raw-byte pointers,
//! unbounded text for attribute values).

#![allow(dead_code)]

use s57rust::iso8211::{
    DataFile, Decimal, FieldDescriptor, FieldFormat, FieldValue, Metadata, Record, SubfieldRow,
    Value,
};

/// Tag width every synthetic file uses.
pub const TAG_WIDTH: usize = 4;

/// RCNM code of an isolated node.
pub const ISOLATED_NODE: u32 = 110;
/// RCNM code of a connected node.
pub const CONNECTED_NODE: u32 = 120;
/// RCNM code of an edge.
pub const EDGE: u32 = 130;

// ===========================================================================
// Descriptor sets
// ===========================================================================

fn unsigned(width: usize) -> FieldFormat {
    FieldFormat::UnsignedBinary(width)
}

fn signed(width: usize) -> FieldFormat {
    FieldFormat::SignedBinary(width)
}

fn text() -> FieldFormat {
    FieldFormat::Text(None)
}

/// The descriptor set of a synthetic cell file: every tag the chart layer
/// consumes, declared with production-shaped formats.
pub fn chart_metadata() -> Metadata {
    let mut metadata = Metadata::new(TAG_WIDTH);
    metadata.add_control("").unwrap();
    metadata
        .add_field(FieldDescriptor::single(
            "0001",
            "ISO 8211 Record Identifier",
            FieldFormat::Integer(Some(5)),
        ))
        .unwrap();

    let fields = vec![
        FieldDescriptor::array(
            "DSID",
            "Data set identification",
            vec![
                ("RCNM", unsigned(1)),
                ("RCID", unsigned(4)),
                ("DSNM", text()),
                ("EDTN", text()),
                ("UPDN", text()),
            ],
            false,
        ),
        FieldDescriptor::array(
            "DSPM",
            "Data set parameter",
            vec![
                ("RCNM", unsigned(1)),
                ("RCID", unsigned(4)),
                ("COMF", unsigned(4)),
                ("SOMF", unsigned(4)),
            ],
            false,
        ),
        FieldDescriptor::array(
            "VRID",
            "Vector record identifier",
            vec![
                ("RCNM", unsigned(1)),
                ("RCID", unsigned(4)),
                ("RVER", unsigned(2)),
                ("RUIN", unsigned(1)),
            ],
            false,
        ),
        FieldDescriptor::array(
            "VRPT",
            "Vector record pointer",
            vec![
                ("NAME", FieldFormat::RawBytes(5)),
                ("ORNT", unsigned(1)),
                ("USAG", unsigned(1)),
                ("TOPI", unsigned(1)),
                ("MASK", unsigned(1)),
            ],
            true,
        ),
        FieldDescriptor::array(
            "SG2D",
            "2-D coordinate",
            vec![("YCOO", signed(4)), ("XCOO", signed(4))],
            true,
        ),
        FieldDescriptor::array(
            "SG3D",
            "3-D coordinate",
            vec![("YCOO", signed(4)), ("XCOO", signed(4)), ("VE3D", signed(4))],
            true,
        ),
        FieldDescriptor::array(
            "VRPC",
            "Vector record pointer control",
            vec![("VPUI", unsigned(1)), ("VPIX", unsigned(2)), ("NVPT", unsigned(2))],
            false,
        ),
        FieldDescriptor::array(
            "SGCC",
            "Coordinate control",
            vec![("CCUI", unsigned(1)), ("CCIX", unsigned(2)), ("CCNC", unsigned(2))],
            false,
        ),
        FieldDescriptor::array(
            "FRID",
            "Feature record identifier",
            vec![
                ("RCNM", unsigned(1)),
                ("RCID", unsigned(4)),
                ("PRIM", unsigned(1)),
                ("GRUP", unsigned(1)),
                ("OBJL", unsigned(2)),
                ("RVER", unsigned(2)),
                ("RUIN", unsigned(1)),
            ],
            false,
        ),
        FieldDescriptor::array(
            "FOID",
            "Feature object identifier",
            vec![("AGEN", unsigned(2)), ("FIDN", unsigned(4)), ("FIDS", unsigned(2))],
            false,
        ),
        FieldDescriptor::array(
            "ATTF",
            "Feature record attribute",
            vec![("ATTL", unsigned(2)), ("ATVL", text())],
            true,
        ),
        FieldDescriptor::array(
            "NATF",
            "Feature record national attribute",
            vec![("ATTL", unsigned(2)), ("ATVL", text())],
            true,
        ),
        FieldDescriptor::array(
            "FSPT",
            "Feature record to spatial record pointer",
            vec![
                ("NAME", FieldFormat::RawBytes(5)),
                ("ORNT", unsigned(1)),
                ("USAG", unsigned(1)),
                ("MASK", unsigned(1)),
            ],
            true,
        ),
        FieldDescriptor::array(
            "FFPT",
            "Feature record to feature object pointer",
            vec![
                ("LNAM", FieldFormat::RawBytes(8)),
                ("RIND", unsigned(1)),
                ("COMT", text()),
            ],
            true,
        ),
        FieldDescriptor::array(
            "FSPC",
            "Feature record to spatial record pointer control",
            vec![("FSUI", unsigned(1)), ("FSIX", unsigned(2)), ("NSPT", unsigned(2))],
            false,
        ),
        FieldDescriptor::array(
            "FFPC",
            "Feature record to feature object pointer control",
            vec![("FFUI", unsigned(1)), ("FFIX", unsigned(2)), ("NFPT", unsigned(2))],
            false,
        ),
    ];
    for field in fields {
        metadata.add_field(field.with_parent("0001")).unwrap();
    }
    metadata
}

/// The descriptor set of a synthetic `CATALOG.031`.
pub fn catalog_metadata() -> Metadata {
    let mut metadata = Metadata::new(TAG_WIDTH);
    metadata.add_control("").unwrap();
    metadata
        .add_field(FieldDescriptor::single(
            "0001",
            "ISO 8211 Record Identifier",
            FieldFormat::Integer(Some(5)),
        ))
        .unwrap();
    metadata
        .add_field(
            FieldDescriptor::array(
                "CATD",
                "Catalogue directory",
                vec![
                    ("RCNM", FieldFormat::Text(Some(2))),
                    ("RCID", FieldFormat::Integer(Some(10))),
                    ("FILE", text()),
                    ("LFIL", text()),
                    ("VOLM", text()),
                    ("IMPL", FieldFormat::Text(Some(3))),
                    ("SLAT", FieldFormat::Decimal(None)),
                    ("WLON", FieldFormat::Decimal(None)),
                    ("NLAT", FieldFormat::Decimal(None)),
                    ("ELON", FieldFormat::Decimal(None)),
                    ("CRCS", text()),
                    ("COMT", text()),
                ],
                false,
            )
            .with_parent("0001"),
        )
        .unwrap();
    metadata
}

// ===========================================================================
// Pointer encoding
// ===========================================================================

/// A NAME pointer in logical byte order: record id, then class code.
pub fn name_value(class_code: u32, rcid: u32) -> Value {
    let mut bytes = rcid.to_be_bytes().to_vec();
    bytes.push(class_code as u8);
    Value::Bytes(bytes)
}

/// An LNAM pointer in logical byte order: subdivision, id number, agency.
pub fn lnam_value(agency: u16, fidn: u32, fids: u16) -> Value {
    let mut bytes = fids.to_be_bytes().to_vec();
    bytes.extend_from_slice(&fidn.to_be_bytes());
    bytes.extend_from_slice(&agency.to_be_bytes());
    Value::Bytes(bytes)
}

/// One VRPT row. Orientation, usage, and mask are null; `topology` is the
/// TOPI code (1 beginning node, 2 end node).
pub fn vrpt_row(class_code: u32, rcid: u32, topology: i64) -> SubfieldRow {
    SubfieldRow::new()
        .with("NAME", name_value(class_code, rcid))
        .with("ORNT", Value::Integer(255))
        .with("USAG", Value::Integer(255))
        .with("TOPI", Value::Integer(topology))
        .with("MASK", Value::Integer(255))
}

/// One FSPT row with explicit ORNT and USAG codes (255 for null).
pub fn fspt_row(class_code: u32, rcid: u32, orientation: i64, usage: i64) -> SubfieldRow {
    SubfieldRow::new()
        .with("NAME", name_value(class_code, rcid))
        .with("ORNT", Value::Integer(orientation))
        .with("USAG", Value::Integer(usage))
        .with("MASK", Value::Integer(255))
}

/// One FFPT row. `relationship` is the RIND code (1 master, 2 slave,
/// 3 peer).
pub fn ffpt_row(agency: u16, fidn: u32, fids: u16, relationship: i64) -> SubfieldRow {
    SubfieldRow::new()
        .with("LNAM", lnam_value(agency, fidn, fids))
        .with("RIND", Value::Integer(relationship))
        .with("COMT", Value::Text(String::new()))
}

fn coordinate_rows(points: &[(i64, i64)]) -> Vec<SubfieldRow> {
    points
        .iter()
        .map(|&(x, y)| {
            SubfieldRow::new()
                .with("YCOO", Value::Integer(y))
                .with("XCOO", Value::Integer(x))
        })
        .collect()
}

fn attribute_rows(attributes: &[(i64, &str)]) -> Vec<SubfieldRow> {
    attributes
        .iter()
        .map(|&(code, value)| {
            SubfieldRow::new()
                .with("ATTL", Value::Integer(code))
                .with("ATVL", Value::Text(value.to_string()))
        })
        .collect()
}

// ===========================================================================
// Metadata records
// ===========================================================================

/// The DSID record naming the dataset and its edition/update numbers.
pub fn dataset_identification(name: &str, edition: &str, update_number: &str) -> Record {
    let mut record = Record::new(TAG_WIDTH);
    record.insert("0001", FieldValue::Single(Value::Integer(1)));
    record.insert(
        "DSID",
        FieldValue::Row(
            SubfieldRow::new()
                .with("RCNM", Value::Integer(10))
                .with("RCID", Value::Integer(1))
                .with("DSNM", Value::Text(name.to_string()))
                .with("EDTN", Value::Text(edition.to_string()))
                .with("UPDN", Value::Text(update_number.to_string())),
        ),
    );
    record
}

/// The DSPM record carrying both multiplication factors.
pub fn dataset_parameters(coordinate_factor: i64, depth_factor: i64) -> Record {
    let mut record = Record::new(TAG_WIDTH);
    record.insert("0001", FieldValue::Single(Value::Integer(2)));
    record.insert(
        "DSPM",
        FieldValue::Row(
            SubfieldRow::new()
                .with("RCNM", Value::Integer(20))
                .with("RCID", Value::Integer(1))
                .with("COMF", Value::Integer(coordinate_factor))
                .with("SOMF", Value::Integer(depth_factor)),
        ),
    );
    record
}

// ===========================================================================
// Vector records
// ===========================================================================

/// Chainable builder for one vector record.
pub struct VectorBuilder {
    record: Record,
}

impl VectorBuilder {
    /// Start a vector record. `instruction` is the RUIN code (1 insert,
    /// 2 update, 3 delete).
    pub fn new(class_code: u32, rcid: u32, instruction: i64) -> Self {
        let mut record = Record::new(TAG_WIDTH);
        record.insert("0001", FieldValue::Single(Value::Integer(i64::from(rcid))));
        record.insert(
            "VRID",
            FieldValue::Row(
                SubfieldRow::new()
                    .with("RCNM", Value::Integer(i64::from(class_code)))
                    .with("RCID", Value::Integer(i64::from(rcid)))
                    .with("RVER", Value::Integer(1))
                    .with("RUIN", Value::Integer(instruction)),
            ),
        );
        Self { record }
    }

    /// Override the record version (RVER).
    pub fn version(mut self, version: i64) -> Self {
        let mut row = self
            .record
            .field("VRID")
            .and_then(FieldValue::as_row)
            .cloned()
            .unwrap_or_default();
        row.set("RVER", Value::Integer(version));
        self.record.insert("VRID", FieldValue::Row(row));
        self
    }

    /// Stored 2-D coordinates, in file order.
    pub fn points(mut self, points: &[(i64, i64)]) -> Self {
        self.record
            .insert("SG2D", FieldValue::Rows(coordinate_rows(points)));
        self
    }

    /// Stored 3-D soundings as (x, y, depth) triples.
    pub fn soundings(mut self, points: &[(i64, i64, i64)]) -> Self {
        let rows = points
            .iter()
            .map(|&(x, y, depth)| {
                SubfieldRow::new()
                    .with("YCOO", Value::Integer(y))
                    .with("XCOO", Value::Integer(x))
                    .with("VE3D", Value::Integer(depth))
            })
            .collect();
        self.record.insert("SG3D", FieldValue::Rows(rows));
        self
    }

    /// Raw VRPT rows.
    pub fn references(mut self, rows: Vec<SubfieldRow>) -> Self {
        self.record.insert("VRPT", FieldValue::Rows(rows));
        self
    }

    /// Bounding connected nodes of an edge: beginning, then end.
    pub fn bounding_nodes(self, begin_rcid: u32, end_rcid: u32) -> Self {
        self.references(vec![
            vrpt_row(CONNECTED_NODE, begin_rcid, 1),
            vrpt_row(CONNECTED_NODE, end_rcid, 2),
        ])
    }

    /// A coordinate patch: SGCC control plus replacement SG2D rows.
    /// `mode` is the CCUI code (1 insert, 2 delete, 3 replace).
    pub fn coordinate_patch(
        mut self,
        mode: i64,
        index: i64,
        count: i64,
        points: &[(i64, i64)],
    ) -> Self {
        self.record.insert(
            "SGCC",
            FieldValue::Row(
                SubfieldRow::new()
                    .with("CCUI", Value::Integer(mode))
                    .with("CCIX", Value::Integer(index))
                    .with("CCNC", Value::Integer(count)),
            ),
        );
        if !points.is_empty() {
            self.record
                .insert("SG2D", FieldValue::Rows(coordinate_rows(points)));
        }
        self
    }

    /// A pointer patch: VRPC control plus replacement VRPT rows.
    pub fn reference_patch(
        mut self,
        mode: i64,
        index: i64,
        count: i64,
        rows: Vec<SubfieldRow>,
    ) -> Self {
        self.record.insert(
            "VRPC",
            FieldValue::Row(
                SubfieldRow::new()
                    .with("VPUI", Value::Integer(mode))
                    .with("VPIX", Value::Integer(index))
                    .with("NVPT", Value::Integer(count)),
            ),
        );
        if !rows.is_empty() {
            self.record.insert("VRPT", FieldValue::Rows(rows));
        }
        self
    }

    /// Finish the record.
    pub fn build(self) -> Record {
        self.record
    }
}

/// A connected-node insert at stored coordinates (x, y).
pub fn connected_node(rcid: u32, x: i64, y: i64) -> Record {
    VectorBuilder::new(CONNECTED_NODE, rcid, 1)
        .points(&[(x, y)])
        .build()
}

/// An isolated-node insert at stored coordinates (x, y).
pub fn isolated_node(rcid: u32, x: i64, y: i64) -> Record {
    VectorBuilder::new(ISOLATED_NODE, rcid, 1)
        .points(&[(x, y)])
        .build()
}

/// An edge insert running from `begin` through `points` to `end`.
pub fn edge(rcid: u32, begin: u32, end: u32, points: &[(i64, i64)]) -> Record {
    VectorBuilder::new(EDGE, rcid, 1)
        .points(points)
        .bounding_nodes(begin, end)
        .build()
}

// ===========================================================================
// Feature records
// ===========================================================================

/// Chainable builder for one feature record.
pub struct FeatureBuilder {
    record: Record,
}

impl FeatureBuilder {
    /// Start a feature record. `primitive` is the PRIM code (1 point,
    /// 2 line, 3 area, 255 null); `instruction` is the RUIN code.
    pub fn new(
        object_code: i64,
        primitive: i64,
        agency: u16,
        fidn: u32,
        fids: u16,
        instruction: i64,
    ) -> Self {
        let mut record = Record::new(TAG_WIDTH);
        record.insert("0001", FieldValue::Single(Value::Integer(i64::from(fidn))));
        record.insert(
            "FRID",
            FieldValue::Row(
                SubfieldRow::new()
                    .with("RCNM", Value::Integer(100))
                    .with("RCID", Value::Integer(i64::from(fidn)))
                    .with("PRIM", Value::Integer(primitive))
                    .with("GRUP", Value::Integer(1))
                    .with("OBJL", Value::Integer(object_code))
                    .with("RVER", Value::Integer(1))
                    .with("RUIN", Value::Integer(instruction)),
            ),
        );
        record.insert(
            "FOID",
            FieldValue::Row(
                SubfieldRow::new()
                    .with("AGEN", Value::Integer(i64::from(agency)))
                    .with("FIDN", Value::Integer(i64::from(fidn)))
                    .with("FIDS", Value::Integer(i64::from(fids))),
            ),
        );
        Self { record }
    }

    /// Override the record version (RVER).
    pub fn version(mut self, version: i64) -> Self {
        let mut row = self
            .record
            .field("FRID")
            .and_then(FieldValue::as_row)
            .cloned()
            .unwrap_or_default();
        row.set("RVER", Value::Integer(version));
        self.record.insert("FRID", FieldValue::Row(row));
        self
    }

    /// ATTF rows as (attribute code, value) pairs.
    pub fn attributes(mut self, attributes: &[(i64, &str)]) -> Self {
        self.record
            .insert("ATTF", FieldValue::Rows(attribute_rows(attributes)));
        self
    }

    /// NATF rows as (attribute code, value) pairs.
    pub fn national_attributes(mut self, attributes: &[(i64, &str)]) -> Self {
        self.record
            .insert("NATF", FieldValue::Rows(attribute_rows(attributes)));
        self
    }

    /// FSPT rows.
    pub fn spatial(mut self, rows: Vec<SubfieldRow>) -> Self {
        self.record.insert("FSPT", FieldValue::Rows(rows));
        self
    }

    /// FFPT rows.
    pub fn feature_references(mut self, rows: Vec<SubfieldRow>) -> Self {
        self.record.insert("FFPT", FieldValue::Rows(rows));
        self
    }

    /// A spatial-pointer patch: FSPC control plus replacement FSPT rows.
    pub fn spatial_patch(
        mut self,
        mode: i64,
        index: i64,
        count: i64,
        rows: Vec<SubfieldRow>,
    ) -> Self {
        self.record.insert(
            "FSPC",
            FieldValue::Row(
                SubfieldRow::new()
                    .with("FSUI", Value::Integer(mode))
                    .with("FSIX", Value::Integer(index))
                    .with("NSPT", Value::Integer(count)),
            ),
        );
        if !rows.is_empty() {
            self.record.insert("FSPT", FieldValue::Rows(rows));
        }
        self
    }

    /// A feature-pointer patch: FFPC control plus replacement FFPT rows.
    pub fn reference_patch(
        mut self,
        mode: i64,
        index: i64,
        count: i64,
        rows: Vec<SubfieldRow>,
    ) -> Self {
        self.record.insert(
            "FFPC",
            FieldValue::Row(
                SubfieldRow::new()
                    .with("FFUI", Value::Integer(mode))
                    .with("FFIX", Value::Integer(index))
                    .with("NFPT", Value::Integer(count)),
            ),
        );
        if !rows.is_empty() {
            self.record.insert("FFPT", FieldValue::Rows(rows));
        }
        self
    }

    /// Finish the record.
    pub fn build(self) -> Record {
        self.record
    }
}

// ===========================================================================
// Whole files
// ===========================================================================

/// Wrap records in a file over the chart descriptor set.
pub fn chart_file(records: Vec<Record>) -> DataFile {
    let mut file = DataFile::new(chart_metadata());
    for record in records {
        file.add_record(record);
    }
    file
}

/// Wrap records in a file over the catalog descriptor set.
pub fn catalog_file(records: Vec<Record>) -> DataFile {
    let mut file = DataFile::new(catalog_metadata());
    for record in records {
        file.add_record(record);
    }
    file
}

/// One CATD record. Bounds are fixed; the interesting parts (path, kind,
/// recorded CRC) are parameters.
pub fn catalog_record(record_id: i64, file: &str, implementation: &str, crc: &str) -> Record {
    let mut record = Record::new(TAG_WIDTH);
    record.insert("0001", FieldValue::Single(Value::Integer(record_id)));
    record.insert(
        "CATD",
        FieldValue::Row(
            SubfieldRow::new()
                .with("RCNM", Value::Text("CD".to_string()))
                .with("RCID", Value::Integer(record_id))
                .with("FILE", Value::Text(file.to_string()))
                .with("LFIL", Value::Text(String::new()))
                .with("VOLM", Value::Text("V01X01".to_string()))
                .with("IMPL", Value::Text(implementation.to_string()))
                .with("SLAT", Value::Decimal(Decimal::parse("51.7").unwrap()))
                .with("WLON", Value::Decimal(Decimal::parse("3.1").unwrap()))
                .with("NLAT", Value::Decimal(Decimal::parse("52.9").unwrap()))
                .with("ELON", Value::Decimal(Decimal::parse("4.8").unwrap()))
                .with("CRCS", Value::Text(crc.to_string()))
                .with("COMT", Value::Text(String::new())),
        ),
    );
    record
}

// ===========================================================================
// Canonical cell
// ===========================================================================

/// Records of the canonical base cell.
///
/// Factors are 10/10, so stored integers map to tenths: two connected
/// nodes at (4, 52) and (5, 53), an edge between them through two interior
/// points, a depth-area line feature over the edge, and a buoy on the
/// first node.
pub fn base_cell_records(name: &str) -> Vec<Record> {
    vec![
        dataset_identification(name, "2", "0"),
        dataset_parameters(10, 10),
        connected_node(1, 40, 520),
        connected_node(2, 50, 530),
        edge(9, 1, 2, &[(43, 523), (46, 526)]),
        FeatureBuilder::new(42, 2, 550, 100, 1, 1)
            .attributes(&[(87, "0"), (88, "10")])
            .spatial(vec![fspt_row(EDGE, 9, 1, 1)])
            .build(),
        FeatureBuilder::new(17, 1, 550, 200, 1, 1)
            .spatial(vec![fspt_row(CONNECTED_NODE, 1, 255, 255)])
            .build(),
    ]
}
