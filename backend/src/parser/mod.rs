//! Tabular reader: turns an uploaded spreadsheet into a header plus rows.
//!
//! The format is picked from the file extension:
//!
//! | Extension                | Reader                       |
//! |--------------------------|------------------------------|
//! | `.xlsx`, `.xlsm`         | [`workbook`] (Office Open XML) |
//! | `.xls`                   | [`workbook`] (BIFF)          |
//! | `.csv`, `.tsv`, `.txt`   | [`delimited`] (auto encoding / delimiter) |
//! | anything else            | treated as `.xlsx`           |
//!
//! Only the first worksheet is read and its first row is the header.
//! Blank header cells drop their whole column.

pub mod delimited;
pub mod workbook;

use serde::Serialize;
use std::path::Path;

use crate::error::ReaderResult;
use crate::models::{CellValue, RawRow};

pub use delimited::{decode_content, detect_delimiter, detect_encoding, read_delimited};
pub use workbook::read_workbook;

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SourceFormat {
    /// Detect the format from a file name, case-insensitively.
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let extension = Path::new(&lower)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "xls" => SourceFormat::Xls,
            "csv" | "tsv" | "txt" => SourceFormat::Csv,
            _ => SourceFormat::Xlsx,
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Xlsx => write!(f, "xlsx"),
            SourceFormat::Xls => write!(f, "xls"),
            SourceFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Decoded table with reader metadata.
#[derive(Debug, Clone)]
pub struct Table {
    /// Non-blank header names, in column order.
    pub headers: Vec<String>,
    /// One entry per data row.
    pub rows: Vec<RawRow>,
    pub format: SourceFormat,
    /// Detected text encoding (delimited input only).
    pub encoding: Option<String>,
    /// Detected delimiter (delimited input only).
    pub delimiter: Option<char>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn empty(format: SourceFormat) -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
            format,
            encoding: None,
            delimiter: None,
        }
    }
}

/// Read a file from disk, detecting the format from its name.
pub fn read_file<P: AsRef<Path>>(path: P) -> ReaderResult<Table> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    read_bytes(&bytes, name)
}

/// Read uploaded bytes; `file_name` only drives format detection.
pub fn read_bytes(bytes: &[u8], file_name: &str) -> ReaderResult<Table> {
    if bytes.is_empty() {
        return Ok(Table::empty(SourceFormat::from_file_name(file_name)));
    }

    match SourceFormat::from_file_name(file_name) {
        SourceFormat::Csv => read_delimited(bytes),
        format => read_workbook(bytes, format),
    }
}

/// Pair each data row with the header, skipping blank header columns.
///
/// Cells missing at the end of a short row are [`CellValue::Empty`].
pub(crate) fn build_table<I>(
    header_cells: Vec<String>,
    data: I,
    format: SourceFormat,
) -> Table
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let columns: Vec<(usize, String)> = header_cells
        .into_iter()
        .enumerate()
        .filter(|(_, name)| !name.trim().is_empty())
        .collect();

    let rows = data
        .into_iter()
        .map(|cells| {
            columns
                .iter()
                .map(|(idx, name)| {
                    let value = cells.get(*idx).cloned().unwrap_or(CellValue::Empty);
                    (name.clone(), value)
                })
                .collect::<RawRow>()
        })
        .collect();

    Table {
        headers: columns.into_iter().map(|(_, name)| name).collect(),
        rows,
        format,
        encoding: None,
        delimiter: None,
    }
}
