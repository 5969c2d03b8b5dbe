//! Excel workbook decoding (`.xlsx` / `.xls`) via calamine.

use calamine::{open_workbook_from_rs, Data, DataType, Range, Reader, Xls, Xlsx};
use std::io::Cursor;

use super::{build_table, SourceFormat, Table};
use crate::error::{ReaderError, ReaderResult};
use crate::models::CellValue;

/// Decode the first worksheet of a workbook.
///
/// Every row below the header becomes a row of the table, blank rows
/// included. A sheet with no rows at all gives an empty table.
pub fn read_workbook(bytes: &[u8], format: SourceFormat) -> ReaderResult<Table> {
    let cursor = Cursor::new(bytes.to_vec());

    let range = match format {
        SourceFormat::Xls => {
            let mut workbook: Xls<_> = open_workbook_from_rs(cursor).map_err(calamine::Error::from)?;
            first_sheet(&mut workbook)?
        }
        _ => {
            let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor).map_err(calamine::Error::from)?;
            first_sheet(&mut workbook)?
        }
    };

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(build_table(Vec::new(), Vec::<Vec<CellValue>>::new(), format));
    };

    let headers: Vec<String> = header_row.iter().map(header_text).collect();
    let data: Vec<Vec<CellValue>> = rows
        .map(|cells| cells.iter().map(decode_cell).collect::<Vec<_>>())
        .collect();

    Ok(build_table(headers, data, format))
}

fn first_sheet<R>(workbook: &mut R) -> ReaderResult<Range<Data>>
where
    R: Reader<Cursor<Vec<u8>>>,
    calamine::Error: From<R::Error>,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReaderError::NoWorksheet)?
        .map_err(calamine::Error::from)?;
    Ok(range)
}

/// Header cells are read as displayed text.
fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => decode_cell(other).to_raw_string(),
    }
}

/// Map a calamine cell onto a [`CellValue`].
pub fn decode_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Number(*f),
        other => match other.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::text(other.to_string()),
        },
    }
}
