//! I/O helpers shared by the detector, loader and serializers.
//!
//! - **Delimiter resolution**: extension-based default (`.tsv` → tab,
//!   anything else → comma) with manual override.
//! - **Encoding labels**: WHATWG labels via `encoding_rs`, plus the legacy
//!   code page names that show up in configuration files.
//! - **Decoding**: strict whole-buffer decoding that reports failure instead
//!   of substituting replacement characters.
//! - **Reader construction**: a headerless, flexible `csv::Reader` so the
//!   loader can pick the header row itself.

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

use encoding_rs::{Encoding, SHIFT_JIS};
use serde::Serialize;

use crate::error::{AuditError, Result};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Code page names that are not WHATWG labels but are common in exports.
fn legacy_label(lowered: &str) -> Option<&'static Encoding> {
    match lowered {
        "cp932" | "ms-932" | "shift-jis-2004" => Some(SHIFT_JIS),
        _ => None,
    }
}

pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    let trimmed = label.trim();
    if let Some(encoding) = legacy_label(&trimmed.to_ascii_lowercase()) {
        return Ok(encoding);
    }
    Encoding::for_label(trimmed.as_bytes()).ok_or_else(|| AuditError::UnknownEncoding {
        label: label.to_string(),
    })
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AuditError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Reads at most `max_lines` newline-terminated lines of raw bytes.
pub fn read_leading_lines(path: &Path, max_lines: usize) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut sample = Vec::new();
    for _ in 0..max_lines {
        let read = reader.read_until(b'\n', &mut sample)?;
        if read == 0 {
            break;
        }
    }
    Ok(sample)
}

pub fn read_all_bytes(path: &Path) -> Result<Vec<u8>> {
    ensure_exists(path)?;
    Ok(fs::read(path)?)
}

/// Decodes `bytes` in full, returning `None` on the first malformed sequence.
///
/// A byte order mark takes precedence over `encoding`; the encoding actually
/// used is returned alongside the text.
pub fn decode_bytes(
    bytes: &[u8],
    encoding: &'static Encoding,
) -> Option<(String, &'static Encoding)> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        None
    } else {
        Some((text.into_owned(), used))
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Writes `value` as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
