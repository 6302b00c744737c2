pub mod cli;
pub mod config;
pub mod consistency;
pub mod data;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod inference;
pub mod io_utils;
pub mod loader;
pub mod preview;
pub mod schema;
pub mod table;
pub mod verify;

use std::{
    env,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InferArgs, InputOptions},
    config::AuditConfig,
    engine::{InferenceOutcome, OutputPaths, SchemaInferenceEngine},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_schema_audit", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = AuditConfig::discover(cli.config.as_deref())
        .with_context(|| format!("Loading settings from {:?}", cli.config))?;
    match cli.command {
        Commands::Infer(args) => handle_infer(config, &args),
        Commands::Verify(args) => verify::execute(config, &args),
        Commands::Preview(args) => preview::execute(config, &args),
    }
}

/// Applies command-line overrides on top of the settings file. A `.tsv`
/// input switches the default comma to a tab unless a delimiter was given.
pub(crate) fn apply_input_overrides(
    mut config: AuditConfig,
    input: &InputOptions,
    path: &Path,
) -> AuditConfig {
    if let Some(header_row) = input.header_row {
        config.header_row = header_row;
    }
    match input.delimiter {
        Some(delimiter) => config.delimiter = delimiter as char,
        None if config.delimiter_byte() == io_utils::DEFAULT_CSV_DELIMITER => {
            config.delimiter = io_utils::resolve_input_delimiter(path, None) as char;
        }
        None => {}
    }
    config
}

fn resolve_infer_input(config: &AuditConfig, args: &InferArgs) -> Result<PathBuf> {
    let name = match (&args.csv_file, args.use_default) {
        (Some(path), _) => path.clone(),
        (None, true) => config
            .default_csv_file
            .as_ref()
            .filter(|name| !name.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("default_csv_file is not set in the settings file"))?,
        (None, false) => return Err(anyhow!("No CSV file given; pass a path or --use-default")),
    };
    Ok(config.resolve_csv_path(&name))
}

fn handle_infer(config: AuditConfig, args: &InferArgs) -> Result<()> {
    let input = resolve_infer_input(&config, args)?;
    let mut config = apply_input_overrides(config, &args.input, &input);
    if let Some(dir) = &args.schema_dir {
        config.schema_dir = dir.clone();
    }
    info!(
        "Inferring schema for '{}' with delimiter '{}'",
        input.display(),
        io_utils::printable_delimiter(config.delimiter_byte())
    );

    let outputs = OutputPaths::for_input(&config, &input);
    let engine = SchemaInferenceEngine::new(config).context("Validating settings")?;
    let outcome = engine
        .run(&input, args.input.encoding.as_deref(), &outputs)
        .with_context(|| format!("Processing {input:?}"))?;
    print_outcome(&engine, &outcome, args.input.encoding.as_deref());
    Ok(())
}

fn print_outcome(
    engine: &SchemaInferenceEngine,
    outcome: &InferenceOutcome,
    requested: Option<&str>,
) {
    let config = engine.config();
    println!("File: {}", outcome.input.display());
    match requested {
        Some(label) => println!("Encoding: {} (requested '{label}')", outcome.decoded_with.name()),
        None => println!(
            "Encoding: {} (detected, confidence {:.2}{})",
            outcome.decoded_with.name(),
            outcome.encoding.confidence,
            if outcome.encoding.fallback_used {
                ", default used"
            } else {
                ""
            }
        ),
    }
    println!("Header row: {}", config.header_row);
    println!("Columns: {}", outcome.headers.len());
    println!("Records: {}", outcome.row_count);
    if let Some(written) = &outcome.written {
        println!("Schema: {}", written.schema.display());
        println!("Consistency report: {}", written.consistency.display());
    }

    if outcome.schema.is_empty() {
        println!("\nNo columns inferred.");
        return;
    }
    println!();
    table::print_table(
        &table::schema_summary_headers(),
        &table::schema_summary_rows(&outcome.schema, &outcome.consistency),
    );
    println!("\nType totals:");
    for (ty, count) in table::type_totals(&outcome.schema) {
        println!("  {ty}: {count} column(s)");
    }

    let low = outcome.low_consistency_columns(config.warn_ratio);
    if low.is_empty() {
        println!(
            "\nAll columns are at least {:.0}% type-consistent.",
            config.warn_ratio * 100.0
        );
    } else {
        println!(
            "\nWarning: {} column(s) below {:.0}% type consistency: {}",
            low.len(),
            config.warn_ratio * 100.0,
            low.join(", ")
        );
    }
}
