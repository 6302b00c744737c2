//! Per-column audit of cell values against the column type.

use std::{fs::File, io::BufReader, path::Path};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    data::{is_blank, value_matches},
    error::Result,
    io_utils,
    loader::RawTable,
    schema::{ColumnType, Schema},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// 1-based data row number; the first row after the header is row 1.
    pub row_index: usize,
    pub raw_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConsistency {
    pub column_name: String,
    pub inferred_type: ColumnType,
    pub match_ratio: f64,
    pub non_empty_count: usize,
    pub empty_count: usize,
    pub mismatch_count: usize,
    pub mismatches: Vec<Mismatch>,
    pub all_mismatch_rows: Vec<usize>,
    pub sample_value: String,
}

impl ColumnConsistency {
    pub fn is_below(&self, threshold: f64) -> bool {
        self.match_ratio < threshold
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsistencyReport {
    pub columns: Vec<ColumnConsistency>,
}

impl ConsistencyReport {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn low_consistency(&self, threshold: f64) -> impl Iterator<Item = &ColumnConsistency> {
        self.columns.iter().filter(move |c| c.is_below(threshold))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        io_utils::write_json(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        io_utils::ensure_exists(path)?;
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AuditOptions {
    pub mismatch_sample_limit: usize,
    pub warn_ratio: f64,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            mismatch_sample_limit: 10,
            warn_ratio: 0.90,
        }
    }
}

pub fn audit_column<'a, I>(
    column_name: &str,
    ty: ColumnType,
    values: I,
    sample_limit: usize,
) -> ColumnConsistency
where
    I: IntoIterator<Item = &'a str>,
{
    let mut non_empty = 0usize;
    let mut empty = 0usize;
    let mut mismatches = Vec::new();
    let mut all_rows = Vec::new();
    let mut sample_value = None;

    for (idx, value) in values.into_iter().enumerate() {
        if is_blank(value) {
            empty += 1;
            continue;
        }
        non_empty += 1;
        if sample_value.is_none() {
            sample_value = Some(value.to_string());
        }
        if value_matches(value, ty) {
            continue;
        }
        let row_index = idx + 1;
        all_rows.push(row_index);
        if mismatches.len() < sample_limit {
            mismatches.push(Mismatch {
                row_index,
                raw_value: value.to_string(),
            });
        }
    }

    let match_ratio = if non_empty == 0 {
        1.0
    } else {
        (non_empty - all_rows.len()) as f64 / non_empty as f64
    };

    ColumnConsistency {
        column_name: column_name.to_string(),
        inferred_type: ty,
        match_ratio,
        non_empty_count: non_empty,
        empty_count: empty,
        mismatch_count: all_rows.len(),
        mismatches,
        all_mismatch_rows: all_rows,
        sample_value: sample_value.unwrap_or_default(),
    }
}

/// Audits every column of `table` against `schema`. A table without data
/// rows produces an empty report.
pub fn audit_table(
    table: &RawTable,
    schema: &Schema,
    options: &AuditOptions,
) -> ConsistencyReport {
    if table.row_count() == 0 {
        return ConsistencyReport::default();
    }
    let columns = schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, profile)| {
            let result = audit_column(
                &profile.origin_name,
                profile.inferred_type,
                table.column_values(idx),
                options.mismatch_sample_limit,
            );
            if result.is_below(options.warn_ratio) {
                warn!(
                    "Column '{}' has low type consistency ({:.2}%) for {}: {} mismatching value(s)",
                    result.column_name,
                    result.match_ratio * 100.0,
                    result.inferred_type,
                    result.mismatch_count
                );
                let (rows, values): (Vec<usize>, Vec<&str>) = result
                    .mismatches
                    .iter()
                    .map(|m| (m.row_index, m.raw_value.as_str()))
                    .unzip();
                warn!("  sample values: {values:?}");
                warn!("  sample rows: {rows:?}");
            }
            result
        })
        .collect();
    ConsistencyReport { columns }
}
