use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer column types from CSV exports and audit every cell against them",
    long_about = None
)]
pub struct Cli {
    /// Settings file (defaults to config/settings.yml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer a schema and write the schema and consistency documents
    Infer(InferArgs),
    /// Audit a CSV file against a previously written schema
    Verify(VerifyArgs),
    /// Show the detected encoding and the first rows of a CSV file
    Preview(PreviewArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputOptions {
    /// Character encoding of the input file (skips detection)
    #[arg(long)]
    pub encoding: Option<String>,
    /// 1-based position of the header row
    #[arg(long = "header-row")]
    pub header_row: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    /// CSV file to process; bare names are looked up under the configured csv_dir
    #[arg(required_unless_present = "use_default", conflicts_with = "use_default")]
    pub csv_file: Option<PathBuf>,
    /// Process the default_csv_file named in the settings file
    #[arg(long = "use-default")]
    pub use_default: bool,
    /// Directory for the schema and consistency documents
    #[arg(long = "schema-dir")]
    pub schema_dir: Option<PathBuf>,
    #[command(flatten)]
    pub input: InputOptions,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// CSV file to audit
    #[arg(short = 'i', long = "input")]
    pub input_file: PathBuf,
    /// Schema document produced by `infer`
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Where to write the consistency report (printed only when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub input: InputOptions,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// CSV file to preview
    #[arg(short = 'i', long = "input")]
    pub input_file: PathBuf,
    /// Number of data rows to display
    #[arg(long, default_value_t = 5)]
    pub rows: usize,
    #[command(flatten)]
    pub input: InputOptions,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
