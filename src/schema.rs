//! Schema descriptor model and JSON persistence.
//!
//! A [`Schema`] is persisted as a bare JSON array of column objects in header
//! order. Every entry carries all four fields, including the reserved
//! `after_name` and `description` slots, even when they are empty.

use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::Result, io_utils};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Str,
    Int,
    Float,
    Date,
    Timestamp,
    Boolean,
}

impl ColumnType {
    /// Candidate order used by inference, strictest first. `Str` is the
    /// catch-all and always comes last.
    pub const PRECEDENCE: [ColumnType; 6] = [
        ColumnType::Boolean,
        ColumnType::Timestamp,
        ColumnType::Date,
        ColumnType::Int,
        ColumnType::Float,
        ColumnType::Str,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Str => "STR",
            ColumnType::Int => "INT",
            ColumnType::Float => "FLOAT",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STR" => Ok(ColumnType::Str),
            "INT" => Ok(ColumnType::Int),
            "FLOAT" => Ok(ColumnType::Float),
            "DATE" => Ok(ColumnType::Date),
            "TIMESTAMP" => Ok(ColumnType::Timestamp),
            "BOOLEAN" => Ok(ColumnType::Boolean),
            other => Err(format!(
                "Unknown column type '{other}'. Expected one of STR, INT, FLOAT, DATE, TIMESTAMP, BOOLEAN"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub origin_name: String,
    pub inferred_type: ColumnType,
    #[serde(default)]
    pub after_name: String,
    #[serde(default)]
    pub description: String,
}

impl ColumnProfile {
    pub fn new(origin_name: impl Into<String>, inferred_type: ColumnType) -> Self {
        Self {
            origin_name: origin_name.into(),
            inferred_type,
            after_name: String::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub columns: Vec<ColumnProfile>,
}

impl Schema {
    /// Every header starts out as `STR`.
    pub fn from_headers(headers: &[String]) -> Self {
        let columns = headers
            .iter()
            .map(|name| ColumnProfile::new(name.clone(), ColumnType::Str))
            .collect();
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Header names that differ from the schema, as `(position, expected, found)`.
    pub fn header_differences(&self, headers: &[String]) -> Vec<(usize, String, String)> {
        let width = self.columns.len().max(headers.len());
        (0..width)
            .filter_map(|idx| {
                let expected = self
                    .columns
                    .get(idx)
                    .map(|c| c.origin_name.as_str())
                    .unwrap_or("");
                let found = headers.get(idx).map(String::as_str).unwrap_or("");
                (expected != found).then(|| (idx + 1, expected.to_string(), found.to_string()))
            })
            .collect()
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
