//! Delimited text (CSV) reading with encoding and delimiter auto-detection.
//!
//! Every cell comes out as text; type inference happens later, in the row
//! transformer.

use super::{build_table, SourceFormat, Table};
use crate::error::{ReaderError, ReaderResult};
use crate::models::CellValue;

/// Candidate delimiters, in tie-breaking order.
const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string with the given encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8. A leading
/// byte-order mark is removed.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ReaderResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => {
                let (text, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    return Err(ReaderError::Encoding(other.to_string()));
                }
                text.into_owned()
            }
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Defaults to `;` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = DELIMITERS[0];
    let mut best_count = 0;
    for &candidate in &DELIMITERS {
        let count = first_line.matches(candidate).count();
        if count > best_count {
            best_count = count;
            best = candidate;
        }
    }
    best
}

/// Read CSV bytes, auto-detecting encoding and delimiter.
pub fn read_delimited(bytes: &[u8]) -> ReaderResult<Table> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    let mut table = parse_delimited(&content, delimiter)?;
    table.encoding = Some(encoding);
    table.delimiter = Some(delimiter);
    Ok(table)
}

/// Parse already-decoded CSV text with an explicit delimiter.
///
/// Quoted fields are honoured and surrounding whitespace is trimmed. Rows
/// may be shorter or longer than the header. A line holding only
/// separators is a blank row and is kept; a line with no characters at all
/// is not a record.
pub fn parse_delimited(content: &str, delimiter: char) -> ReaderResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
        None => Vec::new(),
    };

    let mut data = Vec::new();
    for record in records {
        let record = record?;
        data.push(
            record
                .iter()
                .map(|field| CellValue::text(field.trim()))
                .collect::<Vec<_>>(),
        );
    }

    Ok(build_table(headers, data, SourceFormat::Csv))
}
