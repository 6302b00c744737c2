//! Materializes the header and data rows of a delimited file.

use std::path::Path;

use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    encoding::{EncodingDecision, secondary_encoding},
    error::{AuditError, Result},
    io_utils,
};

/// Decoded header plus data rows. Every data row is padded or truncated to
/// the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(idx).map(String::as_str).unwrap_or(""))
    }

    pub fn preview(&self, limit: usize) -> &[Vec<String>] {
        &self.rows[..self.rows.len().min(limit)]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// 1-based header row position.
    pub header_row: usize,
    pub delimiter: u8,
    pub preview_rows: usize,
    /// Encoding to retry with when the chosen one fails.
    pub default_encoding: &'static Encoding,
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: RawTable,
    /// Encoding that actually decoded the file.
    pub encoding: &'static Encoding,
    pub retried: bool,
}

/// Decodes `bytes` with `primary`, retrying once with the secondary
/// encoding. Both names are reported when neither succeeds.
pub fn decode_with_fallback(
    path: &Path,
    bytes: &[u8],
    primary: &'static Encoding,
    default: &'static Encoding,
) -> Result<(String, &'static Encoding, bool)> {
    if let Some((text, used)) = io_utils::decode_bytes(bytes, primary) {
        return Ok((text, used, false));
    }
    let fallback = secondary_encoding(primary, default);
    warn!(
        "Decoding {path:?} with {} failed; retrying with {}",
        primary.name(),
        fallback.name()
    );
    match io_utils::decode_bytes(bytes, fallback) {
        Some((text, used)) => Ok((text, used, true)),
        None => Err(AuditError::Decoding {
            path: path.to_path_buf(),
            primary: primary.name().to_string(),
            fallback: fallback.name().to_string(),
        }),
    }
}

pub fn load_table(
    path: &Path,
    decision: &EncodingDecision,
    options: &LoadOptions,
) -> Result<LoadedTable> {
    if options.header_row == 0 {
        return Err(AuditError::InvalidConfig(
            "header_row is 1-based and must be at least 1".to_string(),
        ));
    }
    let bytes = io_utils::read_all_bytes(path)?;
    let (text, encoding, retried) =
        decode_with_fallback(path, &bytes, decision.encoding, options.default_encoding)?;
    info!(
        "Reading {path:?} as {} with header row {}",
        encoding.name(),
        options.header_row
    );

    let table = parse_table(path, &text, options)?;
    info!(
        "Loaded {} record(s) across {} column(s) from {path:?}",
        table.row_count(),
        table.column_count()
    );
    info!("Header: {:?}", table.headers);
    let preview = table.preview(options.preview_rows);
    if !preview.is_empty() {
        info!("First {} row(s):", preview.len());
        for (idx, row) in preview.iter().enumerate() {
            info!("  row {}: {:?}", idx + 1, row);
        }
    }

    Ok(LoadedTable {
        table,
        encoding,
        retried,
    })
}

/// Splits decoded text into header and data rows. Records above the header
/// row are skipped; an input with no records at all is an empty table.
pub fn parse_table(path: &Path, text: &str, options: &LoadOptions) -> Result<RawTable> {
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), options.delimiter);
    let mut records = reader.records();
    let skip = options.header_row - 1;

    let mut seen = 0usize;
    let mut headers = None;
    for record in records.by_ref() {
        let record = record?;
        seen += 1;
        if seen > skip {
            headers = Some(record.iter().map(str::to_string).collect::<Vec<_>>());
            break;
        }
    }

    let Some(headers) = headers else {
        if seen == 0 {
            warn!("{path:?} contains no records");
            return Ok(RawTable::default());
        }
        return Err(AuditError::HeaderRowOutOfRange {
            path: path.to_path_buf(),
            header_row: options.header_row,
            records: seen,
        });
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable::new(headers, rows))
}
