//! Encoding, delimiter and CSV plumbing for attendance exports.
//!
//! Uploads arrive as raw bytes in a legacy Korean code page. This module
//! decodes them, skips the banner line the export tool writes above the real
//! header, and reads the remaining text into a [`RawTable`]. On the way out it
//! serializes report rows as delimited text and encodes them back into the
//! same code page.
//!
//! - **Encoding**: labels resolve through `encoding_rs`; `cp949` and `ms949`
//!   are accepted as aliases of `windows-949` (EUC-KR), which is also the default.
//! - **Delimiter**: extension-based detection (`.tsv` → tab, else comma).
//! - **Repeated headers**: a second `소속` is read as `소속.1`, a third as
//!   `소속.2`, the way pandas-style readers mangle them.
//! - **Ragged rows**: the export leaves inconsistent trailing commas, so rows
//!   are read flexibly and padded to the header width.

use std::{collections::HashSet, io, path::Path};

use anyhow::{Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{EUC_KR, Encoding};
use log::debug;

use crate::{
    data::{RawTable, unique_column_name},
    error::ReportError,
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Prefix pandas-style readers give to header cells that are blank.
pub const UNNAMED_HEADER_PREFIX: &str = "Unnamed: ";

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    let Some(value) = label else {
        return Ok(EUC_KR);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("cp949") || trimmed.eq_ignore_ascii_case("ms949") {
        return Ok(EUC_KR);
    }
    Encoding::for_label(trimmed.as_bytes()).ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String, ReportError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(ReportError::Decode {
            encoding: encoding.name(),
        })
    } else {
        Ok(text.into_owned())
    }
}

/// Encodes `text`, failing on the first character the encoding cannot hold.
pub fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>, ReportError> {
    let (encoded, _, had_errors) = encoding.encode(text);
    if !had_errors {
        return Ok(encoded.into_owned());
    }
    let mut buf = [0u8; 4];
    let offending = text
        .chars()
        .find(|ch| encoding.encode(ch.encode_utf8(&mut buf)).2)
        .map(String::from)
        .unwrap_or_default();
    Err(ReportError::Encode {
        encoding: encoding.name(),
        text: offending,
    })
}

/// Drops the first physical line (the export banner).
pub fn skip_banner(text: &str) -> &str {
    match text.find('\n') {
        Some(idx) => &text[idx + 1..],
        None => "",
    }
}

pub fn open_csv_reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(text.as_bytes())
}

/// Reads header and data rows from already-decoded text that starts at the
/// header line.
pub fn parse_table(text: &str, delimiter: u8) -> Result<RawTable, ReportError> {
    let mut reader = open_csv_reader(text, delimiter);
    let mut seen = HashSet::new();
    let headers = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let name = if header.trim().is_empty() {
                format!("{UNNAMED_HEADER_PREFIX}{idx}")
            } else {
                header.to_string()
            };
            let unique = unique_column_name(&mut seen, &name);
            if unique != name {
                debug!("Repeated header '{}' read as '{unique}'", name.escape_debug());
            }
            unique
        })
        .collect::<Vec<_>>();
    let width = headers.len();

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            if record.iter().skip(width).any(|field| !field.is_empty()) {
                return Err(ReportError::RaggedRow {
                    row: row_idx + 1,
                    expected: width,
                    found: record.len(),
                });
            }
            debug!(
                "Row {} carries {} empty trailing field(s)",
                row_idx + 1,
                record.len() - width
            );
        }
        let mut row = record
            .iter()
            .take(width)
            .map(|field| (!field.is_empty()).then(|| field.to_string()))
            .collect::<Vec<_>>();
        row.resize(width, None);
        rows.push(row);
    }
    Ok(RawTable { headers, rows })
}

/// Decodes an export, skips its banner line and parses the rest.
pub fn read_export(
    bytes: &[u8],
    encoding: &'static Encoding,
    delimiter: u8,
) -> Result<RawTable, ReportError> {
    let text = decode_bytes(bytes, encoding)?;
    parse_table(skip_banner(&text), delimiter)
}

/// Serializes a table as delimited text encoded with `encoding`.
pub fn write_csv_bytes(
    headers: &[String],
    rows: &[Vec<String>],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<u8>, ReportError> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    let mut writer = builder.from_writer(Vec::new());
    writer.write_record(headers).map_err(ReportError::WriteCsv)?;
    for row in rows {
        writer.write_record(row).map_err(ReportError::WriteCsv)?;
    }
    let utf8 = writer
        .into_inner()
        .map_err(|err| ReportError::WriteCsv(csv::Error::from(err.into_error())))?;
    let text = String::from_utf8(utf8).map_err(|err| {
        ReportError::WriteCsv(csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, err)))
    })?;
    encode_text(&text, encoding)
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
