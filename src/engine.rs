//! The end-to-end pipeline: detect → load → infer → audit → serialize.
//!
//! Nothing is written until every fallible read step has succeeded, so a
//! missing file or an undecodable input never leaves a partial schema
//! behind.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{
    config::AuditConfig,
    consistency::{AuditOptions, ConsistencyReport, audit_table},
    encoding::{ChardetGuesser, EncodingDecision, EncodingGuesser, detect_encoding},
    error::{AuditError, Result},
    inference::infer_schema,
    loader::{LoadOptions, LoadedTable, load_table},
    schema::Schema,
};

/// Where the two documents produced by a run are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub schema: PathBuf,
    pub consistency: PathBuf,
}

impl OutputPaths {
    pub fn for_input(config: &AuditConfig, csv_path: &Path) -> Self {
        Self {
            schema: config.schema_path_for(csv_path),
            consistency: config.consistency_path_for(csv_path),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub input: PathBuf,
    pub encoding: EncodingDecision,
    /// Encoding that decoded the file; differs from `encoding` after a retry.
    pub decoded_with: &'static encoding_rs::Encoding,
    pub headers: Vec<String>,
    pub preview: Vec<Vec<String>>,
    pub row_count: usize,
    pub schema: Schema,
    pub consistency: ConsistencyReport,
    pub written: Option<OutputPaths>,
}

impl InferenceOutcome {
    pub fn low_consistency_columns(&self, threshold: f64) -> Vec<&str> {
        self.consistency
            .low_consistency(threshold)
            .map(|c| c.column_name.as_str())
            .collect()
    }
}

pub struct SchemaInferenceEngine {
    config: AuditConfig,
    guesser: Box<dyn EncodingGuesser>,
}

impl SchemaInferenceEngine {
    pub fn new(config: AuditConfig) -> Result<Self> {
        Ok(Self {
            config: config.validated()?,
            guesser: Box::new(ChardetGuesser),
        })
    }

    pub fn with_guesser(mut self, guesser: Box<dyn EncodingGuesser>) -> Self {
        self.guesser = guesser;
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    fn load_options(&self) -> Result<LoadOptions> {
        Ok(LoadOptions {
            header_row: self.config.header_row,
            delimiter: self.config.delimiter_byte(),
            preview_rows: self.config.preview_rows,
            default_encoding: self.config.default_encoding()?,
        })
    }

    fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            mismatch_sample_limit: self.config.mismatch_sample_limit,
            warn_ratio: self.config.warn_ratio,
        }
    }

    pub fn detect(
        &self,
        path: &Path,
        encoding_override: Option<&str>,
    ) -> Result<EncodingDecision> {
        detect_encoding(path, encoding_override, &self.config, self.guesser.as_ref())
    }

    pub fn load(
        &self,
        path: &Path,
        encoding_override: Option<&str>,
    ) -> Result<(EncodingDecision, LoadedTable)> {
        let decision = self.detect(path, encoding_override)?;
        let loaded = load_table(path, &decision, &self.load_options()?)?;
        Ok((decision, loaded))
    }

    /// Runs detection, loading, inference and the audit without writing.
    pub fn infer(
        &self,
        path: &Path,
        encoding_override: Option<&str>,
    ) -> Result<InferenceOutcome> {
        info!("Processing {path:?}");
        let (decision, loaded) = self.load(path, encoding_override)?;
        let table = &loaded.table;

        let schema = infer_schema(table, self.config.acceptance_ratio);
        let consistency = audit_table(table, &schema, &self.audit_options());
        log_summary(path, &consistency, self.config.warn_ratio);

        Ok(InferenceOutcome {
            input: path.to_path_buf(),
            encoding: decision,
            decoded_with: loaded.encoding,
            headers: table.headers.clone(),
            preview: table.preview(self.config.preview_rows).to_vec(),
            row_count: table.row_count(),
            schema,
            consistency,
            written: None,
        })
    }

    /// Full pipeline; writes the schema and consistency documents to
    /// `outputs`. The two are written as a pair: when the report cannot be
    /// written the schema just saved is removed again.
    pub fn run(
        &self,
        path: &Path,
        encoding_override: Option<&str>,
        outputs: &OutputPaths,
    ) -> Result<InferenceOutcome> {
        let mut outcome = self.infer(path, encoding_override)?;
        outcome.schema.save(&outputs.schema)?;
        if let Err(err) = outcome.consistency.save(&outputs.consistency) {
            warn!(
                "Writing {:?} failed; removing {:?}",
                outputs.consistency, outputs.schema
            );
            if let Err(cleanup) = fs::remove_file(&outputs.schema) {
                warn!("Could not remove {:?}: {cleanup}", outputs.schema);
            }
            return Err(err);
        }
        info!(
            "Wrote schema for {} column(s) to {:?} and consistency report to {:?}",
            outcome.schema.len(),
            outputs.schema,
            outputs.consistency
        );
        outcome.written = Some(outputs.clone());
        Ok(outcome)
    }

    /// Audits `path` against a previously written schema instead of a fresh
    /// inference. Header names must line up with the schema columns.
    pub fn verify(
        &self,
        path: &Path,
        schema: &Schema,
        encoding_override: Option<&str>,
    ) -> Result<ConsistencyReport> {
        let (_, loaded) = self.load(path, encoding_override)?;
        let table = &loaded.table;
        let differences = schema.header_differences(&table.headers);
        if let Some((position, expected, found)) = differences.first() {
            return Err(AuditError::SchemaMismatch {
                path: path.to_path_buf(),
                detail: format!(
                    "column {position} expected '{expected}' but found '{found}' ({} difference(s))",
                    differences.len()
                ),
            });
        }
        let report = audit_table(table, schema, &self.audit_options());
        log_summary(path, &report, self.config.warn_ratio);
        Ok(report)
    }
}

fn log_summary(path: &Path, report: &ConsistencyReport, threshold: f64) {
    if report.is_empty() {
        info!("{path:?} has no data rows; consistency report is empty");
        return;
    }
    let low: Vec<&str> = report
        .low_consistency(threshold)
        .map(|c| c.column_name.as_str())
        .collect();
    if low.is_empty() {
        info!(
            "All columns are at least {:.0}% type-consistent",
            threshold * 100.0
        );
    } else {
        warn!(
            "{} column(s) below {:.0}% type consistency: {}",
            low.len(),
            threshold * 100.0,
            low.join(", ")
        );
    }
}
