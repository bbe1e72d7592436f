//! CSV reading and writing with encoding and delimiter auto-detection.
//!
//! Converts raw CSV bytes into string-typed [`Table`]s and tables back into
//! CSV text. No loyalty-specific logic here - required-column lists come
//! from the caller.
//!
//! Every cell is kept as a verbatim string: no trimming, no numeric or date
//! typing. A cell absent from a short row is coerced to `""`. Quoting
//! follows RFC 4180 both ways (fields containing the delimiter, quotes, or
//! newlines are quoted; embedded quotes are doubled).

use std::path::Path;

use crate::error::{CsvError, CsvResult, LoadResult, SchemaError};
use crate::models::Table;

/// Result of parsing with detection metadata.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// The parsed table.
    pub table: Table,
    /// Detected or assumed encoding.
    pub encoding: String,
    /// Detected or caller-supplied delimiter.
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to text using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8. The UTF-8 path goes through
/// encoding_rs so a leading BOM (common in spreadsheet exports) is dropped
/// instead of ending up glued to the first column name.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => encoding_rs::UTF_8.decode(bytes).0.into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Scan for a quoted field left open at end of input.
///
/// The csv reader is permissive here and would swallow the rest of the
/// file into a single cell, so a truncated or mangled export is caught
/// before any row exists. A quote only opens a field at a field boundary;
/// a stray quote mid-value stays literal.
fn check_quoting(content: &str, delimiter: char) -> CsvResult<()> {
    let mut in_quotes = false;
    let mut opened_at = 0;
    let mut line = 1;
    let mut at_field_start = true;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => line += 1,
                _ => {}
            }
        } else {
            match c {
                '"' if at_field_start => {
                    in_quotes = true;
                    opened_at = line;
                    at_field_start = false;
                }
                '\n' => {
                    line += 1;
                    at_field_start = true;
                }
                c if c == delimiter => at_field_start = true,
                _ => at_field_start = false,
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote(opened_at));
    }
    Ok(())
}

/// Parse decoded CSV text into a [`Table`] with an explicit delimiter.
///
/// The first record is the header. Short data rows pad with `""`, cells
/// beyond the header are dropped, blank lines are skipped. Malformed input
/// (unbalanced quoting) aborts with an error - there is no partial parse.
///
/// The delimiter must be ASCII: the reader splits on a single byte, and a
/// wider character would land mid-sequence in UTF-8 text.
pub fn parse_decoded(content: &str, delimiter: char) -> CsvResult<Table> {
    if !delimiter.is_ascii() {
        return Err(CsvError::NonAsciiDelimiter(delimiter));
    }
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    check_quoting(content, delimiter)?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut table = Table::new(headers);
    for record in rdr.records() {
        let record = record?;
        table.push_row(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok(table)
}

/// Parse CSV bytes, auto-detecting encoding and (unless given) delimiter.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParsedTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let table = parse_decoded(&content, delimiter)?;

    Ok(ParsedTable {
        table,
        encoding,
        delimiter,
    })
}

/// Parse CSV bytes with full auto-detection.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParsedTable> {
    parse_bytes(bytes, None)
}

/// Parse a CSV file with full auto-detection.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParsedTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Check that every required column is present in the table's header.
///
/// On failure the error carries the complete list of missing names and the
/// complete list of columns actually present.
pub fn validate_columns(table: &Table, required: &[&str]) -> Result<(), SchemaError> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError {
            missing,
            present: table.headers().to_vec(),
        })
    }
}

/// Load and validate in one step: parse bytes, then verify `required`.
///
/// Schema failure aborts before any row-level processing; the returned
/// table's schema is the full set of input columns, not narrowed to
/// `required` - extra columns ride along into the excluded-rows output.
pub fn load_table(bytes: &[u8], required: &[&str]) -> LoadResult<Table> {
    let parsed = parse_bytes_auto(bytes)?;
    validate_columns(&parsed.table, required)?;
    Ok(parsed.table)
}

/// Serialize a table to CSV text: header row, then one line per row.
///
/// Comma-delimited, UTF-8, quoting only where RFC 4180 requires it.
pub fn serialize_csv(table: &Table) -> CsvResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(table.headers())?;
    for row in table.rows() {
        wtr.write_record(row.cells())?;
    }

    let buf = wtr
        .into_inner()
        .map_err(|e| CsvError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
