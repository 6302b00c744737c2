//! Run configuration.
//!
//! Settings are read from a YAML document with a `csv_files` section:
//!
//! ```yaml
//! csv_files:
//!   csv_dir: data/csv
//!   schema_dir: data/csv/schema
//!   default_encoding: cp932
//!   header_row: 1
//! ```
//!
//! Missing keys fall back to [`AuditConfig::default`]. Command-line flags are
//! applied on top by the binary before the config reaches the engine.

use std::{
    fs,
    path::{Path, PathBuf},
};

use encoding_rs::Encoding;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AuditError, Result},
    io_utils,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Directory bare file names are resolved against.
    pub csv_dir: PathBuf,
    /// Directory the schema and consistency documents are written to.
    pub schema_dir: PathBuf,
    pub default_encoding: String,
    pub default_csv_file: Option<String>,
    /// 1-based position of the header row.
    pub header_row: usize,
    pub delimiter: char,
    pub detection_sample_lines: usize,
    pub min_confidence: f32,
    pub preview_rows: usize,
    /// Share of non-empty cells a candidate type must match to be chosen.
    pub acceptance_ratio: f64,
    pub warn_ratio: f64,
    pub mismatch_sample_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("data/csv"),
            schema_dir: PathBuf::from("data/csv/schema"),
            default_encoding: "cp932".to_string(),
            default_csv_file: None,
            header_row: 1,
            delimiter: ',',
            detection_sample_lines: 10,
            min_confidence: 0.70,
            preview_rows: 5,
            acceptance_ratio: 0.90,
            warn_ratio: 0.90,
            mismatch_sample_limit: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    csv_files: AuditConfig,
}

impl AuditConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: SettingsFile = serde_yaml::from_str(raw)?;
        settings.csv_files.validated()
    }

    pub fn load(path: &Path) -> Result<Self> {
        io_utils::ensure_exists(path)?;
        let raw = fs::read_to_string(path)?;
        debug!("Loaded settings from {path:?}");
        Self::from_yaml_str(&raw)
    }

    /// Loads `explicit` when given, else [`DEFAULT_CONFIG_PATH`] when it
    /// exists, else the built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validated(self) -> Result<Self> {
        if self.header_row == 0 {
            return Err(AuditError::InvalidConfig(
                "header_row is 1-based and must be at least 1".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(AuditError::InvalidConfig(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )));
        }
        for (name, ratio) in [
            ("acceptance_ratio", self.acceptance_ratio),
            ("warn_ratio", self.warn_ratio),
            ("min_confidence", f64::from(self.min_confidence)),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(AuditError::InvalidConfig(format!(
                    "{name} must be between 0.0 and 1.0, got {ratio}"
                )));
            }
        }
        if self.detection_sample_lines == 0 {
            return Err(AuditError::InvalidConfig(
                "detection_sample_lines must be at least 1".to_string(),
            ));
        }
        self.default_encoding()?;
        Ok(self)
    }

    pub fn default_encoding(&self) -> Result<&'static Encoding> {
        io_utils::encoding_for_label(&self.default_encoding)
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    /// Resolves a CSV argument: paths that exist as given win, otherwise the
    /// name is looked up under `csv_dir`.
    pub fn resolve_csv_path(&self, name: &Path) -> PathBuf {
        if name.exists() || name.is_absolute() {
            name.to_path_buf()
        } else {
            self.csv_dir.join(name)
        }
    }

    pub fn schema_path_for(&self, csv_path: &Path) -> PathBuf {
        self.schema_dir
            .join(format!("{}_schema.json", file_stem(csv_path)))
    }

    pub fn consistency_path_for(&self, csv_path: &Path) -> PathBuf {
        self.schema_dir
            .join(format!("{}_consistency.json", file_stem(csv_path)))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}
