//! Reading real `.xlsx` workbooks end to end.
//!
//! The workbook is assembled in memory: a zip holding the handful of
//! Office Open XML parts calamine needs, with one inline-string worksheet.

use chrono::NaiveDate;
use serde_json::json;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::CompressionMethod;

use sheetmap::{ingest_bytes, read_bytes, CellValue, IngestOptions, MappingTable, SourceFormat};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Clients" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

// Style 1 uses the built-in date format 14 (mm-dd-yy).
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#;

// Header B1 is missing, row 3 is blank and row 4 only fills column A.
const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>USER_ID</t></is></c><c r="C1" t="inlineStr"><is><t>ACTIVE</t></is></c><c r="D1" t="inlineStr"><is><t>BORN</t></is></c><c r="E1" t="inlineStr"><is><t>NAME</t></is></c></row>
<row r="2"><c r="A2"><v>42</v></c><c r="B2" t="inlineStr"><is><t>junk</t></is></c><c r="C2" t="b"><v>1</v></c><c r="D2" s="1"><v>45000</v></c><c r="E2" t="inlineStr"><is><t>bob</t></is></c></row>
<row r="4"><c r="A4"><v>7</v></c></row>
</sheetData>
</worksheet>"#;

fn clients_xlsx() -> Vec<u8> {
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/styles.xml", STYLES),
        ("xl/worksheets/sheet1.xml", SHEET),
    ];

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

fn mappings() -> MappingTable {
    [
        ("USER_ID", "$.user.id"),
        ("ACTIVE", "$.user.active"),
        ("BORN", "$.user.born"),
        ("NAME", "$.user.name"),
    ]
    .into_iter()
    .collect()
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

#[test]
fn headers_skip_blank_column() {
    let table = read_bytes(&clients_xlsx(), "clients.xlsx").unwrap();

    assert_eq!(table.format, SourceFormat::Xlsx);
    assert_eq!(table.headers, vec!["USER_ID", "ACTIVE", "BORN", "NAME"]);
    assert_eq!(table.encoding, None);
    assert!(table.rows.iter().all(|row| row.len() == 4));
}

#[test]
fn typed_cells_are_decoded() {
    let table = read_bytes(&clients_xlsx(), "clients.xlsx").unwrap();
    let first = &table.rows[0];

    let born = NaiveDate::from_ymd_opt(2023, 3, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(first.get("USER_ID"), Some(&CellValue::Number(42.0)));
    assert_eq!(first.get("ACTIVE"), Some(&CellValue::Bool(true)));
    assert_eq!(first.get("BORN"), Some(&CellValue::DateTime(born)));
    assert_eq!(first.get("NAME"), Some(&CellValue::Text("bob".into())));
}

#[test]
fn blank_rows_and_short_rows_are_kept() {
    let table = read_bytes(&clients_xlsx(), "clients.xlsx").unwrap();

    assert_eq!(table.row_count(), 3);
    assert!(table.rows[1].iter().all(|(_, cell)| cell.is_empty()));
    assert_eq!(table.rows[2].get("USER_ID"), Some(&CellValue::Number(7.0)));
    assert_eq!(table.rows[2].get("NAME"), Some(&CellValue::Empty));
}

#[test]
fn unknown_extension_reads_as_xlsx() {
    let table = read_bytes(&clients_xlsx(), "clients.export").unwrap();
    assert_eq!(table.format, SourceFormat::Xlsx);
    assert_eq!(table.row_count(), 3);
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[test]
fn ingest_workbook_builds_nested_records() {
    let result = ingest_bytes(&clients_xlsx(), "clients.xlsx", &mappings(), IngestOptions::default()).unwrap();

    assert_eq!(
        result.records,
        vec![
            json!({"user": {"id": 42, "active": true, "born": "2023-03-15T00:00:00", "name": "bob"}}),
            json!({"user": {"id": "", "active": "", "born": "", "name": ""}}),
            json!({"user": {"id": 7, "active": "", "born": "", "name": ""}}),
        ]
    );
    assert_eq!(result.table.format, SourceFormat::Xlsx);
    assert_eq!(result.table.row_count, 3);
    assert!(result.unmapped_columns.is_empty());
    assert!(result.skipped.is_empty());
}
